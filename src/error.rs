//! @acp:module "Errors"
//! @acp:summary "Library error type and result alias"
//! @acp:domain cli
//! @acp:layer model

use std::path::PathBuf;

use thiserror::Error;

/// @acp:summary "Errors raised by the fxstubs library"
#[derive(Debug, Error)]
pub enum FxError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    /// A single source file could not be read; the run continues without it
    #[error("Failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid glob pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    #[error("{0}")]
    Other(String),
}

impl From<handlebars::TemplateError> for FxError {
    fn from(err: handlebars::TemplateError) -> Self {
        FxError::Template(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, FxError>;
