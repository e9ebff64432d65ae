use std::path::PathBuf;
use thiserror::Error;
use vibzmat::core::io::viewer::ViewerError;
use vibzmat::engine::error::EngineError;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Vibzmat(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse file '{path}': {source}", path = path.display())]
    FileParsing {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write '{path}': {source}", path = path.display())]
    FileWriting {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Viewer error: {0}")]
    Viewer(#[from] ViewerError),

    #[error("Geometries differ")]
    Mismatch,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    Argument(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn parsing(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        Self::FileParsing {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn writing(path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        Self::FileWriting {
            path: path.into(),
            source: source.into(),
        }
    }
}
