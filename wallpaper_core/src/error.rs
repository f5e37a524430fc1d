// Typed errors with thiserror. Surface meaningful messages to JS.
// Media failures never land here: a layer that never decodes just never reports ready.

use thiserror::Error;

use crate::types::InstanceId;

/// Engine error types.
#[derive(Error, Debug)]
pub enum WallpaperError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid source: {0}")]
    InvalidSource(String),

    #[error("Cannot fit media of size {width}x{height}")]
    DegenerateSize { width: f64, height: f64 },

    #[error("Unknown wallpaper instance {0}")]
    UnknownInstance(InstanceId),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for WallpaperError {
    fn from(err: serde_json::Error) -> Self {
        WallpaperError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for WallpaperError {
    fn from(err: url::ParseError) -> Self {
        WallpaperError::InvalidSource(err.to_string())
    }
}
