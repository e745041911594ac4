//! Error types
//!
//! Effects are decorative: the scheduler logs these and skips the affected
//! feature. Only configuration loading hands them back to the caller.

use thiserror::Error;

use crate::surface::Layer;

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("Surface cannot create layer: {0}")]
    LayerUnavailable(Layer),

    #[error("Element not found: {0}")]
    ElementMissing(String),

    #[error("Audio backend unavailable: {0}")]
    AudioUnavailable(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type ThemeResult<T> = Result<T, ThemeError>;
