use std::io;

use thiserror::Error;

/// Errors raised by the scoring toolkit.
///
/// Scorers themselves never fail on bad text; these come from the model store,
/// dataset uploads, configuration and model/feature shape checks.
#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CBOR error: {0}")]
    Cbor(#[from] serde_cbor::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("stored `{key}` has schema version {found}, expected {expected}")]
    VersionMismatch {
        key: String,
        found: u32,
        expected: u32,
    },

    #[error("feature dimension mismatch: model expects {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("invalid model `{key}`: {reason}")]
    InvalidModel { key: &'static str, reason: String },

    #[error("invalid dataset: {0}")]
    InvalidDataset(String),
}

pub type Result<T> = std::result::Result<T, ScoringError>;
