//! Error types for the signal bot

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("API error: {0}")]
    Api(String),

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Signal not found: {0}")]
    SignalNotFound(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
