//! Error types for configuration and run I/O.

use std::path::PathBuf;

/// Invalid configuration: a bad environment override or an out-of-range
/// parameter.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key}={value:?} is not a valid {expected}")]
    InvalidValue {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParam { name: &'static str, reason: String },
}

/// Errors surfaced by a simulation run or by reading run outputs.
#[derive(Debug, thiserror::Error)]
pub enum LatticeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("missing input {} (produced by `{producer}`)", path.display())]
    MissingInput {
        path: PathBuf,
        producer: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, LatticeError>;

/// Attach a path to an I/O error.
pub(crate) fn io_at(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> LatticeError {
    let path = path.into();
    move |source| LatticeError::Io { path, source }
}
