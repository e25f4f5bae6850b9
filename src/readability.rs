//! Wiio readability (formulas 9 and 10 of Osmo A. Wiio, "Readability,
//! comprehension and readership", 1968, p. 78).
//!
//! Both formulas estimate a school grade, roughly 1 to 12. Above 9 reads
//! as difficult, below 6 as easy. `readability` also weighs how heavily
//! nouns and verbs are modified; `readability_long_words` only looks at
//! word length.

use serde::Serialize;

use crate::analyzer::Hyphenator;
use crate::document::{Document, PartOfSpeech, Token};
use crate::spans::span_over;
use crate::{Label, SpanAnnotation};

// ---------------------------------------------------------------------------
// Hyperparameters
// ---------------------------------------------------------------------------

struct Hyperparameters {
    min_sample_words: usize,
    short_sample_score: f64,
    long_word_syllables: usize,
    difficult_min_words: usize,
    // (minimum word count, score threshold), longest sentences first
    difficult_thresholds: &'static [(usize, f64)],
}

static HP: Hyperparameters = Hyperparameters {
    min_sample_words: 10,
    short_sample_score: 7.0,
    long_word_syllables: 4,
    difficult_min_words: 8,
    difficult_thresholds: &[(12, 9.0), (10, 10.0), (8, 12.0)],
};

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReadabilityScores {
    pub readability: f64,
    pub readability_long_words: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordStats {
    pub words: usize,
    pub long_words: usize,
    /// Adjectives and adverbs.
    pub modifiers: usize,
    /// Nouns and verbs.
    pub heads: usize,
}

impl WordStats {
    pub fn collect<H: Hyphenator + ?Sized>(tokens: &[Token], hyphenator: &H) -> Self {
        let mut stats = WordStats::default();
        for token in tokens.iter().filter(|t| t.is_word()) {
            stats.words += 1;

            if hyphenator.syllables(base_form(token)) >= HP.long_word_syllables {
                stats.long_words += 1;
            }

            match token.pos {
                PartOfSpeech::Adj | PartOfSpeech::Adv => stats.modifiers += 1,
                PartOfSpeech::Noun | PartOfSpeech::Verb => stats.heads += 1,
                _ => {}
            }
        }
        stats
    }

    pub fn modification_ratio(&self) -> f64 {
        if self.heads == 0 {
            0.0
        } else {
            100.0 * self.modifiers as f64 / self.heads as f64
        }
    }

    pub fn scores(&self) -> ReadabilityScores {
        // Too few words to estimate from.
        if self.words < HP.min_sample_words {
            return ReadabilityScores {
                readability: HP.short_sample_score,
                readability_long_words: HP.short_sample_score,
            };
        }

        let long_word_pct = self.long_words as f64 / self.words as f64 * 100.0;
        ReadabilityScores {
            readability: 0.7 + 0.3 * long_word_pct + 0.05 * self.modification_ratio(),
            readability_long_words: 2.7 + 0.3 * long_word_pct,
        }
    }
}

/// The form whose syllables are counted: the lemma when there is one.
fn base_form(token: &Token) -> &str {
    if token.lemma.is_empty() {
        &token.text
    } else {
        &token.lemma
    }
}

/// Hand every counted word to the hyphenator in one batch.
pub fn prime_hyphenator<H: Hyphenator + ?Sized>(tokens: &[Token], hyphenator: &H) {
    let words: Vec<&str> = tokens
        .iter()
        .filter(|t| t.is_word())
        .map(base_form)
        .collect();
    hyphenator.prime(&words);
}

pub fn count_words(tokens: &[Token]) -> usize {
    tokens.iter().filter(|t| t.is_word()).count()
}

pub fn readability<H: Hyphenator + ?Sized>(tokens: &[Token], hyphenator: &H) -> ReadabilityScores {
    WordStats::collect(tokens, hyphenator).scores()
}

// ---------------------------------------------------------------------------
// Difficult sentences
// ---------------------------------------------------------------------------

/// Shorter sentences need a higher score: the estimate is noisier on small
/// samples.
pub fn is_difficult(word_count: usize, score: f64) -> bool {
    HP.difficult_thresholds
        .iter()
        .find(|(min_words, _)| word_count >= *min_words)
        .map_or(false, |&(_, threshold)| score > threshold)
}

/// Drop leading and trailing whitespace tokens.
pub fn trim_space(tokens: &[Token]) -> &[Token] {
    let start = tokens
        .iter()
        .position(|t| !t.is_space())
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|t| !t.is_space())
        .map_or(start, |i| i + 1);
    &tokens[start..end]
}

pub fn difficult_sentences<H: Hyphenator + ?Sized>(
    doc: &Document,
    hyphenator: &H,
) -> Vec<SpanAnnotation> {
    let mut spans = Vec::new();
    for sentence in doc.sentences() {
        let tokens = trim_space(doc.tokens_in(sentence));
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            continue;
        };
        let words = count_words(tokens);
        if words < HP.difficult_min_words {
            continue;
        }

        let score = readability(tokens, hyphenator).readability;
        log::debug!(
            "{score:.2} ({words} words) -- {}",
            doc.slice_chars(first.offset, last.end() - first.offset)
        );
        if is_difficult(words, score) {
            spans.push(span_over(first, last, Label::Difficult));
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_rows() {
        assert!(is_difficult(8, 12.1));
        assert!(!is_difficult(8, 11.9));
        assert!(!is_difficult(9, 12.0));
        assert!(is_difficult(10, 10.5));
        assert!(!is_difficult(11, 10.0));
        assert!(is_difficult(12, 9.01));
        assert!(!is_difficult(30, 9.0));
        assert!(!is_difficult(7, 50.0));
    }

    #[test]
    fn no_heads_means_zero_ratio() {
        let stats = WordStats {
            words: 12,
            long_words: 0,
            modifiers: 3,
            heads: 0,
        };
        assert_eq!(stats.modification_ratio(), 0.0);
    }

    #[test]
    fn wiio_formulas() {
        let stats = WordStats {
            words: 20,
            long_words: 5,
            modifiers: 4,
            heads: 8,
        };
        let scores = stats.scores();
        // 25% long words, modification ratio 50
        assert!((scores.readability_long_words - 10.2).abs() < 1e-9);
        assert!((scores.readability - 10.7).abs() < 1e-9);
    }

    #[test]
    fn short_sample_is_fixed() {
        let stats = WordStats {
            words: 9,
            long_words: 9,
            modifiers: 9,
            heads: 1,
        };
        assert_eq!(
            stats.scores(),
            ReadabilityScores {
                readability: 7.0,
                readability_long_words: 7.0,
            }
        );
    }
}
