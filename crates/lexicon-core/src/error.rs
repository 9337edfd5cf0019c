use thiserror::Error;

/// Top-level error type for Lexicon.
///
/// Subsystem crates define their own error types and convert into this one
/// where a failure has to cross a crate boundary (startup, config, I/O).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LexiconError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("HTTP client error: {0}")]
    Http(String),
}

impl From<toml::de::Error> for LexiconError {
    fn from(err: toml::de::Error) -> Self {
        LexiconError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for LexiconError {
    fn from(err: toml::ser::Error) -> Self {
        LexiconError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for LexiconError {
    fn from(err: serde_json::Error) -> Self {
        LexiconError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Lexicon operations.
pub type Result<T> = std::result::Result<T, LexiconError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(LexiconError, &str)> = vec![
            (
                LexiconError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                LexiconError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
            (
                LexiconError::Http("builder failed".to_string()),
                "HTTP client error: builder failed",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: LexiconError = io_err.into();
        assert!(matches!(err, LexiconError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let err: std::result::Result<toml::Value, _> = toml::from_str("invalid = [[[");
        let err: LexiconError = err.unwrap_err().into();
        assert!(matches!(err, LexiconError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: LexiconError = err.unwrap_err().into();
        assert!(matches!(err, LexiconError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
