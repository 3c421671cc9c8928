use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Capture error: {0}")]
    Capture(String),

    #[error("A search is already in flight for this session")]
    SearchInFlight,

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_and_messages() {
        let io: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(io, Error::Io(_)));

        let parse: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(parse, Error::Serialization(_)));

        assert_eq!(
            Error::Storage("navigationData is not a list".into()).to_string(),
            "Storage error: navigationData is not a list"
        );
        assert_eq!(
            Error::SearchInFlight.to_string(),
            "A search is already in flight for this session"
        );
    }
}
