//! Annotator configuration.

use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{AnnotateError, Result};

/// What to do with a passive participle that has no auxiliary ("tehty työ").
///
/// Such participles are adjectival and never count as passive clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ParticiplePolicy {
    /// Leave them unannotated.
    #[default]
    Exclude,
    /// Highlight them as `passive` spans without counting them.
    Emit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Copy the covered text into each span.
    pub debug_text: bool,
    pub participles: ParticiplePolicy,
    /// Run the difficult-sentence classifier.
    pub difficult_sentences: bool,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            debug_text: false,
            participles: ParticiplePolicy::Exclude,
            difficult_sentences: true,
        }
    }
}

impl AnnotatorConfig {
    /// Load a JSON config file. Missing keys take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: AnnotatorConfig = serde_json::from_str(&raw)
            .map_err(|e| AnnotateError::Config(format!("{}: {e}", path.as_ref().display())))?;
        log::debug!("loaded config from {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"participles": "emit"}}"#).unwrap();
        let config = AnnotatorConfig::from_file(file.path()).unwrap();
        assert_eq!(config.participles, ParticiplePolicy::Emit);
        assert!(config.difficult_sentences);
        assert!(!config.debug_text);
    }

    #[test]
    fn invalid_json_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{participles").unwrap();
        assert!(matches!(
            AnnotatorConfig::from_file(file.path()),
            Err(AnnotateError::Config(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            AnnotatorConfig::from_file("/nonexistent/annotator.json"),
            Err(AnnotateError::Io(_))
        ));
    }
}
