//! Stylistic annotation of Finnish prose.
//!
//! Given text analyzed by an external dependency parser, the annotator
//! highlights adverbs, passive-voice constructions and hard-to-read
//! sentences, and reports Wiio readability grades for the whole text.
//!
//! ```no_run
//! use fi_style_annotator::{Annotator, CommandAnalyzer, FinnishHyphenator};
//!
//! let analyzer = CommandAnalyzer::new("udpipe")
//!     .args(["--tokenize", "--tag", "--parse", "finnish-tdt.udpipe"]);
//! let annotator = Annotator::new(analyzer, FinnishHyphenator::new());
//! let result = annotator.analyze("Koulussa opiskellaan kieliä.")?;
//! println!("{}", result.count_passive_sentences);
//! # Ok::<(), fi_style_annotator::AnnotateError>(())
//! ```

use std::collections::BTreeSet;

use serde::Serialize;

pub mod analyzer;
pub mod config;
pub mod conllu;
pub mod document;
pub mod error;
pub mod passive;
pub mod readability;
pub mod sentences;
pub mod spans;

pub use analyzer::{
    CommandAnalyzer, CommandHyphenator, ConlluAnalyzer, FinnishHyphenator, Hyphenator,
    LanguageAnalyzer,
};
pub use config::{AnnotatorConfig, ParticiplePolicy};
pub use document::{Document, Morphology, PartOfSpeech, Sentence, Token};
pub use error::{AnnotateError, Result};

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Adverb,
    Passive,
    Difficult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpanAnnotation {
    /// Character offset.
    pub start: usize,
    /// Length in characters.
    pub length: usize,
    pub label: Label,
    /// Covered text, only filled in with `debug_text`.
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub annotations: Vec<SpanAnnotation>,
    pub count_words: usize,
    pub count_sentences: usize,
    pub count_adverb_words: usize,
    pub count_passive_sentences: usize,
    pub readability: f64,
    pub readability_long_words: f64,
}

impl AnalysisResult {
    fn empty() -> Self {
        let scores = readability::WordStats::default().scores();
        AnalysisResult {
            annotations: vec![],
            count_words: 0,
            count_sentences: 0,
            count_adverb_words: 0,
            count_passive_sentences: 0,
            readability: scores.readability,
            readability_long_words: scores.readability_long_words,
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Holds the analyzer and hyphenator for the lifetime of the process.
/// Neither is mutated after construction, so one annotator can serve
/// concurrent callers.
pub struct Annotator<A, H = FinnishHyphenator> {
    analyzer: A,
    hyphenator: H,
    config: AnnotatorConfig,
}

impl<A: LanguageAnalyzer, H: Hyphenator> Annotator<A, H> {
    pub fn new(analyzer: A, hyphenator: H) -> Self {
        Self::with_config(analyzer, hyphenator, AnnotatorConfig::default())
    }

    pub fn with_config(analyzer: A, hyphenator: H, config: AnnotatorConfig) -> Self {
        Self {
            analyzer,
            hyphenator,
            config,
        }
    }

    /// Analyze raw text. Analyzer failures are returned as-is.
    pub fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        if text.trim().is_empty() {
            return Ok(AnalysisResult::empty());
        }
        let doc = self.analyzer.analyze_text(text)?;
        Ok(self.annotate(&doc))
    }

    /// Annotate an already analyzed document.
    pub fn annotate(&self, doc: &Document) -> AnalysisResult {
        let tokens = doc.tokens();
        readability::prime_hyphenator(tokens, &self.hyphenator);

        // 1. Passive constructions
        let passives = passive::match_passives(tokens);
        let counted_passives = spans::coalesce(tokens, &passives.clausal, Label::Passive);
        let passive_spans = match self.config.participles {
            ParticiplePolicy::Exclude => counted_passives.clone(),
            ParticiplePolicy::Emit => {
                let all: BTreeSet<usize> = passives.clausal.union(&passives.adjectival).copied().collect();
                spans::coalesce(tokens, &all, Label::Passive)
            }
        };

        // 2. Adverbs
        let adverbs: Vec<usize> = tokens
            .iter()
            .filter(|t| t.is_word() && t.pos == PartOfSpeech::Adv)
            .map(|t| t.index)
            .collect();
        let adverb_spans = spans::single_token_spans(tokens, &adverbs, Label::Adverb);

        // 3. Difficult sentences
        let difficult_spans = if self.config.difficult_sentences {
            readability::difficult_sentences(doc, &self.hyphenator)
        } else {
            vec![]
        };

        // 4. Sentence counts
        let counts = sentences::count_sentences(doc, &counted_passives);

        // 5. Whole-document readability
        let scores = readability::readability(tokens, &self.hyphenator);

        let mut annotations = passive_spans;
        annotations.extend(adverb_spans);
        annotations.extend(difficult_spans);
        spans::sort_annotations(&mut annotations);
        if self.config.debug_text {
            for annotation in &mut annotations {
                annotation.text = Some(doc.slice_chars(annotation.start, annotation.length).to_string());
            }
        }

        log::debug!(
            "{} annotations, {} passive tokens, {} sentences",
            annotations.len(),
            passives.clausal.len(),
            counts.sentences
        );

        AnalysisResult {
            annotations,
            count_words: readability::count_words(tokens),
            count_sentences: counts.sentences,
            count_adverb_words: adverbs.len(),
            count_passive_sentences: counts.passive_sentences,
            readability: scores.readability,
            readability_long_words: scores.readability_long_words,
        }
    }
}
