use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A visited page as kept in the local history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: String,
    pub content: String,
    /// Short UTC calendar date of the capture. Stored as `date` on disk.
    #[serde(rename = "date")]
    pub captured_at: String,
}

impl PageRecord {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        captured_at: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            content: content.into(),
            captured_at: captured_at.into(),
        }
    }
}

/// A bookmark as uploaded for the bookmark corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkEntry {
    pub url: String,
    pub content: String,
}

/// Which corpus a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadFlag {
    History,
    Bookmark,
}

impl UploadFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::History => "history",
            Self::Bookmark => "bookmark",
        }
    }

    /// The service keeps one corpus per user and flag, keyed `{user}:h` or `{user}:b`.
    pub fn scoped_user_id(&self, user_id: &str) -> String {
        let suffix = match self {
            Self::History => 'h',
            Self::Bookmark => 'b',
        };
        format!("{}:{}", user_id, suffix)
    }
}

impl std::fmt::Display for UploadFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One matched source in a final search result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub source_url: String,
    pub title: String,
    pub match_date: String,
}

impl Document {
    /// Reads a `{metadata: {source, title, date}}` entry. Missing fields become empty
    /// strings, so every entry of a result list maps to one document, even one that
    /// is not an object.
    pub fn from_value(value: &Value) -> Self {
        let metadata = value.get("metadata");
        let field = |name: &str| {
            metadata
                .and_then(|m| m.get(name))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            source_url: field("source"),
            title: field("title"),
            match_date: field("date"),
        }
    }
}

/// Terminal result of one search invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub documents: Vec<Document>,
    pub summary_text: String,
    pub format: Option<Value>,
    pub error_message: Option<String>,
}

impl SearchOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_message.is_some()
    }

    /// A successful search that matched nothing. Distinct from an error.
    pub fn is_empty_result(&self) -> bool {
        !self.is_error() && self.documents.is_empty()
    }
}
