use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Provider '{0}' is already registered")]
    DuplicateName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Setup-time misconfiguration that must abort startup rather than a turn.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Config(_) | Error::DuplicateName(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
