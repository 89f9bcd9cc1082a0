use thiserror::Error;

#[derive(Error, Debug)]
pub enum WhoisError {
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    #[error("No record found for {0}")]
    NoRecord(String),

    #[error("TLD for \"{0}\" not supported")]
    UnsupportedTld(String),

    #[error("Network timeout")]
    Timeout,

    #[error("IO error: {0}")]
    IoError(#[from] tokio::io::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Request to {url} failed with status {status}")]
    RequestFailed { url: String, status: u16 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Response too large")]
    ResponseTooLarge,

    #[error("Public suffix list error: {0}")]
    SuffixList(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio::time::error::Elapsed> for WhoisError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        WhoisError::Timeout
    }
}

impl WhoisError {
    /// Errors a caller may reasonably retry the whole lookup for.
    pub fn is_transient(&self) -> bool {
        match self {
            WhoisError::Timeout | WhoisError::IoError(_) | WhoisError::HttpError(_) | WhoisError::RateLimited(_) => true,
            WhoisError::InvalidDomain(_)
            | WhoisError::NoRecord(_)
            | WhoisError::UnsupportedTld(_)
            | WhoisError::RequestFailed { .. }
            | WhoisError::InvalidUrl(_)
            | WhoisError::ResponseTooLarge
            | WhoisError::SuffixList(_)
            | WhoisError::ConfigError(_)
            | WhoisError::Internal(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_and_missing_are_distinct() {
        let missing = WhoisError::NoRecord("example.zz".to_string()).to_string();
        let unsupported = WhoisError::UnsupportedTld("example.zz".to_string()).to_string();
        assert_eq!(missing, "No record found for example.zz");
        assert_eq!(unsupported, "TLD for \"example.zz\" not supported");
    }

    #[test]
    fn test_transient_classification() {
        assert!(WhoisError::Timeout.is_transient());
        assert!(WhoisError::RateLimited("rdap".into()).is_transient());
        assert!(!WhoisError::UnsupportedTld("zz".into()).is_transient());
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        let permanent = [
            WhoisError::InvalidDomain("x".into()),
            WhoisError::NoRecord("example.zz".into()),
            WhoisError::RequestFailed { url: "https://rdap.example/".into(), status: 500 },
            WhoisError::InvalidUrl(url::ParseError::EmptyHost),
            WhoisError::ResponseTooLarge,
            WhoisError::SuffixList("bad rule".into()),
            WhoisError::Internal("bootstrap".into()),
        ];
        assert!(permanent.iter().all(|e| !e.is_transient()));
    }
}
