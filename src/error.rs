use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Content parsed but is not the expected tabular layout.
    #[error("unexpected layout in {}: {reason}", .path.display())]
    Shape { path: PathBuf, reason: String },

    #[error("column '{column}' not found")]
    MissingColumn { column: String },

    #[error("column '{column}' holds a non-text value at row {row}")]
    NotText { column: String, row: usize },

    #[error("cannot join on '{column}': left keys are {left}, right keys are {right}")]
    KeyTypeMismatch {
        column: String,
        left: &'static str,
        right: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            PipelineError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            PipelineError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}
