//! Engine error

use jot_a11y::A11yError;
use jot_dom::DomError;

/// Engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Accessibility error: {0}")]
    A11y(#[from] A11yError),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("Unknown controller: {0}")]
    UnknownController(String),
}
