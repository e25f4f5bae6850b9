//! External collaborators: the linguistic analyzer and the hyphenator.

use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::document::Document;
use crate::error::{AnnotateError, Result};

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Turns raw text into an analyzed [`Document`].
pub trait LanguageAnalyzer: Send + Sync {
    fn analyze_text(&self, text: &str) -> Result<Document>;
}

/// Marks syllable boundaries in a word with `-`.
pub trait Hyphenator: Send + Sync {
    fn hyphenate(&self, word: &str) -> String;

    fn syllables(&self, word: &str) -> usize {
        self.hyphenate(word).matches('-').count() + 1
    }

    /// Called once per document with every word about to be hyphenated.
    fn prime(&self, _words: &[&str]) {}
}

impl<T: LanguageAnalyzer + ?Sized> LanguageAnalyzer for Box<T> {
    fn analyze_text(&self, text: &str) -> Result<Document> {
        (**self).analyze_text(text)
    }
}

impl<T: Hyphenator + ?Sized> Hyphenator for Box<T> {
    fn hyphenate(&self, word: &str) -> String {
        (**self).hyphenate(word)
    }

    fn prime(&self, words: &[&str]) {
        (**self).prime(words)
    }
}

// ---------------------------------------------------------------------------
// External parser process
// ---------------------------------------------------------------------------

/// Runs an external parser that reads text on stdin and writes CoNLL-U on
/// stdout, e.g. `udpipe --tokenize --tag --parse finnish-tdt.udpipe`.
#[derive(Debug, Clone)]
pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Run `program` with `input` on stdin and return its stdout.
///
/// A non-zero exit is reported with the program's stderr, even when it quit
/// before consuming its input.
fn run_command(program: &str, args: &[String], input: &str) -> Result<String> {
    log::info!("running {program} {args:?}");
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| AnnotateError::Analyzer(format!("{program}: stdin unavailable")))?;

    // Feed stdin from a separate thread so a large output cannot fill the
    // stdout pipe while we are still writing.
    let (output, written) = std::thread::scope(|scope| {
        let writer = scope.spawn(move || stdin.write_all(input.as_bytes()));
        let output = child.wait_with_output();
        let written = writer
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
        (output, written)
    });
    let output = output?;

    if !output.status.success() {
        if let Err(e) = &written {
            log::debug!("{program} stopped reading its input: {e}");
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AnnotateError::Analyzer(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    written?;
    String::from_utf8(output.stdout)
        .map_err(|e| AnnotateError::Analyzer(format!("{program} output is not UTF-8: {e}")))
}

impl LanguageAnalyzer for CommandAnalyzer {
    fn analyze_text(&self, text: &str) -> Result<Document> {
        let conllu = run_command(&self.program, &self.args, text)?;
        Document::from_conllu_with_text(text, &conllu)
    }
}

/// Treats its input as CoNLL-U that has already been produced by a parser.
/// Offsets refer to the text rebuilt from the token forms.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConlluAnalyzer;

impl LanguageAnalyzer for ConlluAnalyzer {
    fn analyze_text(&self, text: &str) -> Result<Document> {
        Document::from_conllu(text)
    }
}

// ---------------------------------------------------------------------------
// Finnish hyphenation
// ---------------------------------------------------------------------------

static DIPHTHONGS: Lazy<HashSet<(char, char)>> = Lazy::new(|| {
    [
        "ai", "ei", "oi", "ui", "yi", "äi", "öi", "au", "eu", "iu", "ou", "ey", "iy", "äy", "öy",
    ]
    .iter()
    .filter_map(|d| {
        let mut chars = d.chars();
        Some((chars.next()?, chars.next()?))
    })
    .collect()
});

// These only form a diphthong in the first syllable of a word.
static FIRST_SYLLABLE_DIPHTHONGS: Lazy<HashSet<(char, char)>> =
    Lazy::new(|| [('i', 'e'), ('u', 'o'), ('y', 'ö')].into_iter().collect());

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y' | 'ä' | 'ö' | 'å')
}

/// Rule-based Finnish syllabification.
///
/// A syllable break goes before a consonant that is followed by a vowel,
/// and between two vowels that form neither a long vowel nor a diphthong.
/// Compound boundaries are not detected; existing hyphens are kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct FinnishHyphenator;

impl FinnishHyphenator {
    pub fn new() -> Self {
        FinnishHyphenator
    }
}

impl Hyphenator for FinnishHyphenator {
    fn hyphenate(&self, word: &str) -> String {
        let chars: Vec<char> = word.chars().collect();
        let lower: Vec<char> = chars
            .iter()
            .map(|c| c.to_lowercase().next().unwrap_or(*c))
            .collect();

        let mut out = String::with_capacity(word.len() + 4);
        let mut seen_vowel = false;
        let mut nucleus = 0usize;
        let mut first_syllable = true;

        for (i, &c) in lower.iter().enumerate() {
            if !c.is_alphabetic() {
                out.push(chars[i]);
                seen_vowel = false;
                nucleus = 0;
                first_syllable = true;
                continue;
            }

            if is_vowel(c) {
                if nucleus > 0 {
                    let prev = lower[i - 1];
                    let joins = nucleus == 1
                        && (prev == c
                            || DIPHTHONGS.contains(&(prev, c))
                            || (first_syllable && FIRST_SYLLABLE_DIPHTHONGS.contains(&(prev, c))));
                    if !joins {
                        out.push('-');
                        first_syllable = false;
                        nucleus = 0;
                    }
                }
                nucleus += 1;
                seen_vowel = true;
            } else {
                nucleus = 0;
                let vowel_follows = lower.get(i + 1).map_or(false, |&n| is_vowel(n));
                if seen_vowel && vowel_follows {
                    out.push('-');
                    first_syllable = false;
                    seen_vowel = false;
                }
            }
            out.push(chars[i]);
        }
        out
    }
}

// ---------------------------------------------------------------------------
// External hyphenator
// ---------------------------------------------------------------------------

/// Runs a dictionary-backed hyphenator such as libvoikko's
/// `voikkohyphenate`, which reads one word per line and prints each one
/// with `-` at the syllable boundaries. Unlike the rule-based fallback it
/// knows where compounds join.
///
/// Results are cached. When the program fails, the words it was given are
/// hyphenated by [`FinnishHyphenator`] instead.
#[derive(Debug, Default)]
pub struct CommandHyphenator {
    program: String,
    args: Vec<String>,
    cache: Mutex<HashMap<String, String>>,
    fallback: FinnishHyphenator,
}

impl CommandHyphenator {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn cached(&self, word: &str) -> Option<String> {
        self.cache.lock().ok()?.get(word).cloned()
    }

    /// Hyphenate `words` in one run of the program.
    fn run(&self, words: &[&str]) -> Result<Vec<String>> {
        let mut input = words.join("\n");
        input.push('\n');
        let output = run_command(&self.program, &self.args, &input)?;
        let lines: Vec<String> = output.lines().map(|l| l.trim().to_string()).collect();
        if lines.len() != words.len() {
            return Err(AnnotateError::Analyzer(format!(
                "{} returned {} lines for {} words",
                self.program,
                lines.len(),
                words.len()
            )));
        }
        Ok(lines)
    }
}

impl Hyphenator for CommandHyphenator {
    fn hyphenate(&self, word: &str) -> String {
        if let Some(hit) = self.cached(word) {
            return hit;
        }
        self.prime(&[word]);
        self.cached(word).unwrap_or_else(|| self.fallback.hyphenate(word))
    }

    fn prime(&self, words: &[&str]) {
        let mut missing: Vec<&str> = words
            .iter()
            .copied()
            .filter(|w| !w.is_empty() && !w.contains(char::is_whitespace))
            .filter(|w| self.cached(w).is_none())
            .collect();
        missing.sort_unstable();
        missing.dedup();
        if missing.is_empty() {
            return;
        }

        let hyphenated = self.run(&missing).unwrap_or_else(|e| {
            log::warn!("hyphenator failed, using built-in rules: {e}");
            missing.iter().map(|w| self.fallback.hyphenate(w)).collect()
        });
        if let Ok(mut cache) = self.cache.lock() {
            for (word, result) in missing.iter().zip(hyphenated) {
                cache.insert(word.to_string(), result);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphenates_common_words() {
        let h = FinnishHyphenator::new();
        assert_eq!(h.hyphenate("opiskella"), "o-pis-kel-la");
        assert_eq!(h.hyphenate("kieli"), "kie-li");
        assert_eq!(h.hyphenate("hauskaa"), "haus-kaa");
        assert_eq!(h.hyphenate("tietoa"), "tie-to-a");
        assert_eq!(h.hyphenate("Koulu"), "Kou-lu");
        assert_eq!(h.hyphenate("lääkäri"), "lää-kä-ri");
    }

    #[test]
    fn counts_syllables() {
        let h = FinnishHyphenator::new();
        assert_eq!(h.syllables("jo"), 1);
        assert_eq!(h.syllables("sosiaalinen"), 5);
        assert_eq!(h.hyphenate("EU-ympäristömerkintä"), "EU-ym-pä-ris-tö-mer-kin-tä");
        assert_eq!(h.syllables("EU-ympäristömerkintä"), 8);
    }

    #[test]
    fn word_without_vowels_is_one_syllable() {
        let h = FinnishHyphenator::new();
        assert_eq!(h.hyphenate("str"), "str");
        assert_eq!(h.syllables(""), 1);
    }

    #[test]
    fn missing_program_is_an_io_error() {
        let analyzer = CommandAnalyzer::new("/nonexistent/fi-parser-for-tests");
        assert!(matches!(
            analyzer.analyze_text("Tule jo!"),
            Err(AnnotateError::Io(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn command_hyphenator_uses_program_output() {
        // Splits only at the compound boundary of "kirjakauppa"
        let h = CommandHyphenator::new("sed").args(["s/ak/a-k/g"]);
        h.prime(&["kirjakauppa", "talo", "kirjakauppa"]);
        assert_eq!(h.hyphenate("kirjakauppa"), "kirja-kauppa");
        assert_eq!(h.hyphenate("talo"), "talo");
        assert_eq!(h.syllables("kirjakauppa"), 2);
    }

    #[test]
    fn command_hyphenator_falls_back_to_rules() {
        let h = CommandHyphenator::new("/nonexistent/hyphenator-for-tests");
        assert_eq!(h.hyphenate("opiskella"), "o-pis-kel-la");
    }
}
