// Error taxonomy for analysis requests and startup artifact loading.

use std::path::PathBuf;

use thiserror::Error;

use crate::sentiment::Source;

/// Errors raised while analyzing a piece of text.
///
/// Each kind has a defined outcome for the caller:
/// - `InvalidInput` is recovered locally by asking the user for new text.
/// - `ModelLoad` only happens at startup and means the application cannot run.
/// - `Inference` affects a single analyzer on a single call; the other
///   analyzer's result is still shown.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("text to analyze is empty")]
    InvalidInput,

    #[error("failed to load model `{model}`: {message}")]
    ModelLoad { model: String, message: String },

    #[error("{analyzer} analyzer failed: {message}")]
    Inference { analyzer: Source, message: String },
}

impl AnalysisError {
    pub(crate) fn inference(analyzer: Source, message: impl Into<String>) -> Self {
        AnalysisError::Inference {
            analyzer,
            message: message.into(),
        }
    }

    /// True for errors that must stop the application instead of being shown
    /// next to a partial result.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AnalysisError::ModelLoad { .. })
    }
}

/// Errors raised while reading a lexicon file.
#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read lexicon file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid lexicon entry on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("lexicon contains no entries")]
    Empty,
}
