use chrono::{DateTime, Utc};
use sm_core::PageRecord;
use url::Url;

use crate::extract::PageContent;

/// Short UTC date stored with each record, e.g. `Mon, Oct 19, 2026`.
pub fn format_capture_date(at: DateTime<Utc>) -> String {
    at.format("%a, %b %d, %Y").to_string()
}

/// Only web pages are recorded.
pub fn is_capturable(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| matches!(parsed.scheme(), "http" | "https"))
        .unwrap_or(false)
}

pub fn build_record(url: &str, content: &PageContent, captured_at: DateTime<Utc>) -> PageRecord {
    PageRecord {
        url: url.to_string(),
        title: content.title.clone(),
        content: content.to_record_content(),
        captured_at: format_capture_date(captured_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_capture_date() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 23, 59, 0).unwrap();
        assert_eq!(format_capture_date(at), "Mon, Oct 19, 2026");
        let at = Utc.with_ymd_and_hms(2026, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(format_capture_date(at), "Thu, Mar 05, 2026");
    }

    #[test]
    fn test_is_capturable() {
        assert!(is_capturable("https://example.com/a"));
        assert!(is_capturable("http://localhost:3000"));
        assert!(!is_capturable("chrome://extensions"));
        assert!(!is_capturable("file:///tmp/a.html"));
        assert!(!is_capturable("not a url"));
    }

    #[test]
    fn test_build_record() {
        let content = PageContent {
            title: "T".into(),
            headings: vec!["H1".into(), "H2".into()],
            paragraphs: "body".into(),
        };
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 8, 0, 0).unwrap();
        let record = build_record("https://t.test", &content, at);
        assert_eq!(record.title, "T");
        assert_eq!(record.content, "T H1 H2 body");
        assert_eq!(record.captured_at, "Mon, Oct 19, 2026");
    }
}
