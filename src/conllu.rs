//! CoNLL-U intake.
//!
//! The external parsers we drive (UDPipe, the Turku pipeline, spaCy via
//! `spacy-conll`) all speak CoNLL-U, so it is the one wire format the
//! annotator needs to read. Only the columns the scorer uses are kept.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::document::{Morphology, PartOfSpeech};
use crate::error::{AnnotateError, Result};

static WORD_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-9][0-9]*$").unwrap());

// Multiword token ranges, e.g. "3-4".
static RANGE_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([1-9][0-9]*)-([1-9][0-9]*)$").unwrap());

// Enhanced-graph empty nodes ("5.1") have no surface form.
static EMPTY_NODE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+\.[0-9]+$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct ConlluToken {
    /// 1-based id within the sentence.
    pub id: usize,
    pub form: String,
    pub lemma: String,
    pub upos: PartOfSpeech,
    pub feats: Morphology,
    /// 1-based head id within the sentence, 0 for the root.
    pub head: usize,
    /// Whitespace that follows the token in the source text.
    pub space_after: String,
}

/// A surface token split into several syntactic words ("ettei" is
/// "että" + "ei"). Its form and spacing are what appear in the text.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiwordToken {
    /// First and last word id covered, inclusive.
    pub first: usize,
    pub last: usize,
    pub form: String,
    pub space_after: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConlluSentence {
    /// Syntactic words, in id order.
    pub tokens: Vec<ConlluToken>,
    /// Multiword ranges, in id order.
    pub multiwords: Vec<MultiwordToken>,
}

/// One stretch of the source text and the words it holds.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceToken<'a> {
    pub form: &'a str,
    pub space_after: &'a str,
    pub words: &'a [ConlluToken],
}

impl ConlluSentence {
    /// The sentence as it is written: multiword ranges collapse into their
    /// surface form, every other word stands for itself.
    pub fn surface_tokens(&self) -> Vec<SurfaceToken<'_>> {
        let mut out = Vec::with_capacity(self.tokens.len());
        let mut ranges = self.multiwords.iter().peekable();
        let mut i = 0;
        while i < self.tokens.len() {
            let token = &self.tokens[i];
            match ranges.peek() {
                Some(range) if range.first == token.id => {
                    let end = range.last.min(self.tokens.len()).max(i + 1);
                    out.push(SurfaceToken {
                        form: &range.form,
                        space_after: &range.space_after,
                        words: &self.tokens[i..end],
                    });
                    ranges.next();
                    i = end;
                }
                _ => {
                    out.push(SurfaceToken {
                        form: &token.form,
                        space_after: &token.space_after,
                        words: &self.tokens[i..i + 1],
                    });
                    i += 1;
                }
            }
        }
        out
    }
}

/// Parse a CoNLL-U document into sentences.
pub fn parse(input: &str) -> Result<Vec<ConlluSentence>> {
    let mut sentences = Vec::new();
    let mut current = ConlluSentence::default();
    let mut current_start = 1;

    for (i, raw_line) in input.lines().enumerate() {
        let line_no = i + 1;
        let line = raw_line.trim_end_matches('\r');

        if line.trim().is_empty() {
            if !(current.tokens.is_empty() && current.multiwords.is_empty()) {
                finish_sentence(&current, current_start)?;
                sentences.push(std::mem::take(&mut current));
            }
            current_start = line_no + 1;
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() != 10 {
            return Err(AnnotateError::conllu(
                line_no,
                format!("expected 10 tab-separated columns, found {}", columns.len()),
            ));
        }
        let id = columns[0];
        if EMPTY_NODE_ID_RE.is_match(id) {
            continue;
        }
        if let Some(caps) = RANGE_ID_RE.captures(id) {
            let bound = |i: usize| {
                caps[i]
                    .parse::<usize>()
                    .map_err(|_| AnnotateError::conllu(line_no, format!("invalid range {id:?}")))
            };
            current.multiwords.push(MultiwordToken {
                first: bound(1)?,
                last: bound(2)?,
                form: columns[1].to_string(),
                space_after: space_after(columns[9]),
            });
            continue;
        }
        if !WORD_ID_RE.is_match(id) {
            return Err(AnnotateError::conllu(line_no, format!("invalid token id {id:?}")));
        }
        current.tokens.push(parse_token(line_no, &columns)?);
    }

    if !(current.tokens.is_empty() && current.multiwords.is_empty()) {
        finish_sentence(&current, current_start)?;
        sentences.push(current);
    }
    log::trace!("parsed {} CoNLL-U sentences", sentences.len());
    Ok(sentences)
}

fn parse_token(line_no: usize, columns: &[&str]) -> Result<ConlluToken> {
    let id: usize = columns[0]
        .parse()
        .map_err(|_| AnnotateError::conllu(line_no, format!("invalid token id {:?}", columns[0])))?;
    let form = columns[1].to_string();
    let lemma = match columns[2] {
        "_" if form != "_" => form.clone(),
        lemma => lemma.to_string(),
    };
    let upos: PartOfSpeech = columns[3]
        .parse()
        .map_err(|e: String| AnnotateError::conllu(line_no, e))?;
    let feats: Morphology = columns[5]
        .parse()
        .map_err(|e: String| AnnotateError::conllu(line_no, e))?;
    let head: usize = match columns[6] {
        "_" => 0,
        head => head
            .parse()
            .map_err(|_| AnnotateError::conllu(line_no, format!("invalid head {head:?}")))?,
    };

    Ok(ConlluToken {
        id,
        form,
        lemma,
        upos,
        feats,
        head,
        space_after: space_after(columns[9]),
    })
}

fn finish_sentence(sentence: &ConlluSentence, line_no: usize) -> Result<()> {
    let count = sentence.tokens.len();
    for (i, token) in sentence.tokens.iter().enumerate() {
        if token.id != i + 1 {
            return Err(AnnotateError::conllu(
                line_no,
                format!("token ids are not sequential at {:?}", token.form),
            ));
        }
        if token.head > count {
            return Err(AnnotateError::conllu(
                line_no,
                format!("head {} of {:?} is outside the sentence", token.head, token.form),
            ));
        }
    }
    let mut covered = 0;
    for range in &sentence.multiwords {
        if range.first <= covered || range.first >= range.last || range.last > count {
            return Err(AnnotateError::conllu(
                line_no,
                format!("invalid multiword range {}-{} {:?}", range.first, range.last, range.form),
            ));
        }
        covered = range.last;
    }
    Ok(())
}

/// Whitespace after a token, from the MISC column.
fn space_after(misc: &str) -> String {
    let mut spaces = " ".to_string();
    for item in misc.split('|') {
        if item == "SpaceAfter=No" {
            spaces.clear();
        } else if let Some(escaped) = item.strip_prefix("SpacesAfter=") {
            spaces = unescape_spaces(escaped);
        }
    }
    spaces
}

/// UDPipe escapes whitespace in `SpacesAfter` values.
fn unescape_spaces(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('p') => out.push('|'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Rebuild the source text from surface forms and trailing whitespace.
/// Whitespace after the final token is dropped.
pub fn reconstruct_text(sentences: &[ConlluSentence]) -> String {
    let mut text = String::new();
    let mut pending = "";
    for sentence in sentences {
        for surface in sentence.surface_tokens() {
            text.push_str(pending);
            text.push_str(surface.form);
            pending = surface.space_after;
        }
    }
    text
}
