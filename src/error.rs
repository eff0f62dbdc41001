use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Oracle API error: {0}")]
    OracleApi(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Invalid classification label: {0}")]
    InvalidLabel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Vectorization failed: {0}")]
    Vectorize(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Failed to replace catalog file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors the classifier absorbs by falling back to the heuristic path.
    pub fn is_oracle_failure(&self) -> bool {
        matches!(
            self,
            Error::OracleApi(_)
                | Error::ParseError(_)
                | Error::InvalidLabel(_)
                | Error::Network(_)
                | Error::Serialization(_)
        )
    }
}
