use std::io;

use shopmeta_core::widgets::WidgetError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] shopmeta_core::Error),
    #[error(transparent)]
    Widget(#[from] WidgetError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Nothing to change; pass --title and/or --link")]
    NothingToChange,
    #[error("Invalid {kind} id '{value}'")]
    InvalidId { kind: &'static str, value: String },
    #[error("No {kind} id found in path '{path}'")]
    NoEntityInPath { kind: &'static str, path: String },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error(
        "Admin API is not configured. Run `shopmeta config init --api-url <URL>` or set SHOPMETA_API_URL."
    )]
    ApiNotConfigured,
}
