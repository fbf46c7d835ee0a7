use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupportError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Session closed")]
    SessionClosed,
}

impl From<&str> for SupportError {
    fn from(error: &str) -> Self {
        SupportError::ConfigError(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SupportError>;
