use crate::{config::ConfigError, history::HistoryError, scrape::FetchError};

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("history error: {0}")]
    History(#[from] HistoryError),

    #[error("io error: {0:?}")]
    IO(#[from] std::io::Error),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Short message meant for the person running the command.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidUrl(input) => {
                format!("'{input}' does not look like a valid URL.")
            }
            AppError::Fetch(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
