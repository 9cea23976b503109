use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Profile includes no url or htmlContent to extract details from")]
    NoProfileData,

    #[error("Profile page {url} is unusable ({reason}) and no htmlContent was provided")]
    PageUnavailable { url: String, reason: String },

    #[error("The scraped profile wasn't a profile at all")]
    BogusProfile,

    #[error("No non-blank content region found in page")]
    NoContent,

    #[error("Unable to extract details from profile data: {source}")]
    ProfileDetailsProcessing {
        #[source]
        source: Box<ScraperError>,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Transport error: {message}")]
    TransportMessage { message: String },

    #[error("Completion response could not be parsed: {message}")]
    Parse { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to publish to '{sink}': {message}")]
    Publish { sink: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration '{field}'")]
    MissingConfigError { field: String },
}

/// 錯誤分類，重試策略只依據分類決定行為
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    InputDefect,
    BogusProfile,
    Content,
    Transport,
    Parse,
    Sink,
    Configuration,
}

impl ScraperError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ScraperError::NoProfileData | ScraperError::PageUnavailable { .. } => {
                FailureKind::InputDefect
            }
            ScraperError::BogusProfile => FailureKind::BogusProfile,
            ScraperError::NoContent => FailureKind::Content,
            ScraperError::ProfileDetailsProcessing { source } => source.kind(),
            ScraperError::Transport(_) | ScraperError::TransportMessage { .. } => {
                FailureKind::Transport
            }
            ScraperError::Parse { .. } | ScraperError::Serialization(_) => FailureKind::Parse,
            ScraperError::Io(_) | ScraperError::Publish { .. } => FailureKind::Sink,
            ScraperError::ConfigError { .. }
            | ScraperError::ConfigValidationError { .. }
            | ScraperError::InvalidConfigValueError { .. }
            | ScraperError::MissingConfigError { .. } => FailureKind::Configuration,
        }
    }

    /// 缺少輸入與非個人頁面屬於永久性錯誤，其餘處理錯誤都可以重試
    pub fn is_retryable(&self) -> bool {
        match self.kind() {
            FailureKind::InputDefect | FailureKind::BogusProfile | FailureKind::Configuration => {
                false
            }
            FailureKind::Content | FailureKind::Transport | FailureKind::Parse | FailureKind::Sink => {
                true
            }
        }
    }

    /// 包裝選取或擷取階段的錯誤；兩種終止性錯誤維持原樣
    pub fn into_processing(self) -> Self {
        match self {
            ScraperError::NoProfileData
            | ScraperError::PageUnavailable { .. }
            | ScraperError::BogusProfile
            | ScraperError::ProfileDetailsProcessing { .. } => self,
            other => ScraperError::ProfileDetailsProcessing {
                source: Box::new(other),
            },
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        ScraperError::Parse {
            message: message.into(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            FailureKind::Configuration => "Check the TOML configuration file and required environment variables",
            FailureKind::Transport => "Check network connectivity and the completion endpoint",
            FailureKind::Sink => "Check that the output directory exists and is writable",
            FailureKind::InputDefect => "Inspect the dead-letter sink for the rejected message",
            FailureKind::BogusProfile => "No action needed; the page was not a faculty profile",
            FailureKind::Content | FailureKind::Parse => "Retry later or review the page manually",
        }
    }
}

pub type Result<T> = std::result::Result<T, ScraperError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_kinds_are_not_retryable() {
        assert!(!ScraperError::NoProfileData.is_retryable());
        assert!(!ScraperError::BogusProfile.is_retryable());
        assert!(!ScraperError::MissingConfigError {
            field: "completion.api_key".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_processing_errors_are_retryable() {
        assert!(ScraperError::NoContent.is_retryable());
        assert!(ScraperError::parse("no brackets").is_retryable());
        assert!(ScraperError::TransportMessage {
            message: "timed out".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_unusable_page_is_terminal_and_names_the_url() {
        let err = ScraperError::PageUnavailable {
            url: "https://x.edu/people/gone".to_string(),
            reason: "HTTP 404".to_string(),
        }
        .into_processing();

        assert_eq!(err.kind(), FailureKind::InputDefect);
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("https://x.edu/people/gone"));
        assert!(err.to_string().contains("HTTP 404"));
        assert!(!err.to_string().contains("no url"));
    }

    #[test]
    fn test_into_processing_keeps_terminal_errors() {
        let err = ScraperError::BogusProfile.into_processing();
        assert!(matches!(err, ScraperError::BogusProfile));

        let err = ScraperError::NoProfileData.into_processing();
        assert!(matches!(err, ScraperError::NoProfileData));
    }

    #[test]
    fn test_into_processing_wraps_and_preserves_kind() {
        let err = ScraperError::parse("missing ']'").into_processing();
        assert!(matches!(err, ScraperError::ProfileDetailsProcessing { .. }));
        assert_eq!(err.kind(), FailureKind::Parse);
        assert!(err.is_retryable());

        // Wrapping twice is a no-op
        let again = err.into_processing();
        match again {
            ScraperError::ProfileDetailsProcessing { source } => {
                assert!(matches!(*source, ScraperError::Parse { .. }))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
