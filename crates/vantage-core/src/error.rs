use thiserror::Error;

/// Errors shared by every Vantage component.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Home directory could not be determined")]
    NoHomeDir,

    #[error("Config error: {0}")]
    Config(#[from] ::config::ConfigError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
