//! Error types for the annotator.
//!
//! The scoring core itself cannot fail. Everything here comes from the
//! edges: the external analyzer process, CoNLL-U intake, and config files.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnnotateError {
    /// I/O errors (reading inputs, talking to the analyzer process)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The external analyzer ran but reported failure
    #[error("analyzer error: {0}")]
    Analyzer(String),

    /// Malformed CoNLL-U input
    #[error("CoNLL-U error at line {line}: {message}")]
    Conllu { line: usize, message: String },

    /// A parsed token could not be located in the raw text
    #[error("cannot align token {form:?} at character {offset}")]
    Alignment { form: String, offset: usize },

    /// Invalid configuration file
    #[error("config error: {0}")]
    Config(String),

    /// Result serialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AnnotateError {
    pub fn conllu<S: Into<String>>(line: usize, message: S) -> Self {
        AnnotateError::Conllu {
            line,
            message: message.into(),
        }
    }
}

/// Result type for annotator operations.
pub type Result<T> = std::result::Result<T, AnnotateError>;
