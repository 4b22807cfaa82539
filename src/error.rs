use thiserror::Error;

// Internal error types for detailed error categorization
#[derive(Error, Debug)]
pub enum Error {
    #[error("Keypath `{keypath}` cannot be located: {reason}")]
    Keypath { keypath: String, reason: String },

    #[error("Codec process failure: {0}")]
    OracleFailure(String),

    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Input file error: {0}")]
    Input(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a keypath error for `keypath` with a human readable reason
    pub fn keypath(keypath: &str, reason: impl Into<String>) -> Self {
        Self::Keypath {
            keypath: keypath.to_string(),
            reason:  reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
