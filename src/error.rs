use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage request failed: {0}")]
    Network(String),

    #[error("Storage credentials rejected: {0}")]
    Auth(String),

    #[error("Spreadsheet error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Persistence(#[from] diesel::result::Error),

    #[error("Database connection error: {0}")]
    Connection(#[from] diesel::ConnectionError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
