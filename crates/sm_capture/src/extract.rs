use scraper::{Html, Selector};
use sm_core::Result;

/// Characters of paragraph text kept per page.
pub const PARAGRAPH_BUDGET: usize = 100;

/// Readable text of a loaded page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContent {
    pub title: String,
    pub headings: Vec<String>,
    /// Paragraph texts joined by a space, cut to [`PARAGRAPH_BUDGET`] characters.
    pub paragraphs: String,
}

impl PageContent {
    /// `"{title} {headings} {paragraphs}"`, the text stored for a visit.
    pub fn to_record_content(&self) -> String {
        format!(
            "{} {} {}",
            self.title,
            self.headings.join(" "),
            self.paragraphs
        )
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| sm_core::Error::Capture(format!("Invalid selector {}: {:?}", css, e)))
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub fn extract_content(html: &str) -> Result<PageContent> {
    let document = Html::parse_document(html);

    let title = document
        .select(&selector("title")?)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let headings = document
        .select(&selector("h1, h2")?)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect();

    let paragraphs = document
        .select(&selector("p")?)
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(PARAGRAPH_BUDGET)
        .collect();

    Ok(PageContent {
        title,
        headings,
        paragraphs,
    })
}
