use std::path::PathBuf;
use thiserror::Error;

/// Typed failure for a single document or for pipeline setup.
///
/// Classification itself never fails; these cover the edges around it:
/// reading a layout dump, validating its contents, and building the
/// configured rule set.
#[derive(Debug, Error)]
pub enum OutlineError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse layout dump {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("batch setup failed: {0}")]
    Batch(String),
}

pub type Result<T> = std::result::Result<T, OutlineError>;
