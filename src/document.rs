use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::conllu::{self, ConlluSentence, SurfaceToken};
use crate::error::{AnnotateError, Result};

// ---------------------------------------------------------------------------
// Part of speech
// ---------------------------------------------------------------------------

/// Universal Dependencies part-of-speech tag, plus `Space` for the
/// whitespace tokens produced during alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartOfSpeech {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
    Space,
}

impl FromStr for PartOfSpeech {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let pos = match s {
            "ADJ" => PartOfSpeech::Adj,
            "ADP" => PartOfSpeech::Adp,
            "ADV" => PartOfSpeech::Adv,
            "AUX" => PartOfSpeech::Aux,
            "CCONJ" => PartOfSpeech::Cconj,
            "DET" => PartOfSpeech::Det,
            "INTJ" => PartOfSpeech::Intj,
            "NOUN" => PartOfSpeech::Noun,
            "NUM" => PartOfSpeech::Num,
            "PART" => PartOfSpeech::Part,
            "PRON" => PartOfSpeech::Pron,
            "PROPN" => PartOfSpeech::Propn,
            "PUNCT" => PartOfSpeech::Punct,
            "SCONJ" => PartOfSpeech::Sconj,
            "SYM" => PartOfSpeech::Sym,
            "VERB" => PartOfSpeech::Verb,
            "X" | "_" => PartOfSpeech::X,
            "SPACE" => PartOfSpeech::Space,
            other => return Err(format!("unknown part-of-speech tag {other:?}")),
        };
        Ok(pos)
    }
}

// ---------------------------------------------------------------------------
// Morphology
// ---------------------------------------------------------------------------

/// Morphological features of a token, e.g. `Voice=Pass|VerbForm=Part`.
///
/// A feature may carry several values (`PronType=Int,Rel`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Morphology {
    features: BTreeMap<String, BTreeSet<String>>,
}

impl Morphology {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.features
            .entry(name.to_string())
            .or_default()
            .insert(value.to_string());
    }

    /// Values of feature `name`; empty when the feature is absent.
    pub fn get<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.features
            .get(name)
            .into_iter()
            .flat_map(|values| values.iter().map(String::as_str))
    }

    pub fn has(&self, name: &str, value: &str) -> bool {
        self.features
            .get(name)
            .map_or(false, |values| values.contains(value))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.features.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FromStr for Morphology {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut morph = Morphology::new();
        let s = s.trim();
        if s.is_empty() || s == "_" {
            return Ok(morph);
        }
        for pair in s.split('|') {
            let (name, values) = pair
                .split_once('=')
                .ok_or_else(|| format!("feature {pair:?} is not Name=Value"))?;
            if name.is_empty() || values.is_empty() {
                return Err(format!("feature {pair:?} is not Name=Value"));
            }
            for value in values.split(',') {
                morph.insert(name, value);
            }
        }
        Ok(morph)
    }
}

impl fmt::Display for Morphology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.features.is_empty() {
            return f.write_str("_");
        }
        let mut first = true;
        for (name, values) in &self.features {
            if !first {
                f.write_str("|")?;
            }
            first = false;
            let joined: Vec<&str> = values.iter().map(String::as_str).collect();
            write!(f, "{name}={}", joined.join(","))?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tokens and sentences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Position in the document's token sequence.
    pub index: usize,
    /// Character offset into the document text.
    pub offset: usize,
    /// Length in characters.
    pub length: usize,
    pub text: String,
    /// Whitespace following the token.
    pub whitespace: String,
    pub pos: PartOfSpeech,
    pub morph: Morphology,
    /// Document index of the dependency head, `None` for roots.
    pub head: Option<usize>,
    pub lemma: String,
}

impl Token {
    /// Character offset one past the token's last character.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn is_space(&self) -> bool {
        self.pos == PartOfSpeech::Space || self.text.chars().all(char::is_whitespace)
    }

    pub fn is_punct(&self) -> bool {
        self.pos == PartOfSpeech::Punct
            || (!self.text.is_empty() && self.text.chars().all(is_punctuation_char))
    }

    /// Counted as a word: neither whitespace nor punctuation.
    pub fn is_word(&self) -> bool {
        !(self.is_space() || self.is_punct())
    }
}

/// Punctuation in the Unicode sense. Math, currency and modifier symbols
/// (`=`, `+`, `$`, `^`, ...) are words.
fn is_punctuation_char(c: char) -> bool {
    if c.is_ascii() {
        return c.is_ascii_punctuation() && !"$+<=>^`|~".contains(c);
    }
    matches!(
        c,
        '\u{00A1}'
            | '\u{00A7}'
            | '\u{00AB}'
            | '\u{00B6}'
            | '\u{00B7}'
            | '\u{00BB}'
            | '\u{00BF}'
            | '\u{2010}'..='\u{2027}'
            | '\u{2030}'..='\u{205E}'
            | '\u{3001}'..='\u{3003}'
    )
}

/// Half-open range `[start, end)` of token indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentence {
    pub start: usize,
    pub end: usize,
}

impl Sentence {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// An analyzed text. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    text: String,
    /// Byte offset of every character of `text`.
    char_starts: Vec<usize>,
    tokens: Vec<Token>,
    sentences: Vec<Sentence>,
}

impl Document {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn sentences(&self) -> impl Iterator<Item = &Sentence> + '_ {
        self.sentences.iter()
    }

    pub fn tokens_in(&self, sentence: &Sentence) -> &[Token] {
        let end = sentence.end.min(self.tokens.len());
        let start = sentence.start.min(end);
        &self.tokens[start..end]
    }

    /// `length` characters of the text starting at character `start`,
    /// clamped to the end of the text.
    pub fn slice_chars(&self, start: usize, length: usize) -> &str {
        let byte = |i: usize| self.char_starts.get(i).copied().unwrap_or(self.text.len());
        let begin = byte(start);
        let end = byte(start.saturating_add(length)).max(begin);
        &self.text[begin..end]
    }

    /// Parse a CoNLL-U document, rebuilding the text from the token forms
    /// and their `SpaceAfter`/`SpacesAfter` annotations.
    pub fn from_conllu(input: &str) -> Result<Document> {
        let sentences = conllu::parse(input)?;
        let text = conllu::reconstruct_text(&sentences);
        Document::align(&text, sentences)
    }

    /// Parse CoNLL-U produced for `text` and place its tokens on `text`.
    pub fn from_conllu_with_text(text: &str, input: &str) -> Result<Document> {
        let sentences = conllu::parse(input)?;
        Document::align(text, sentences)
    }

    /// Place parsed sentences on the raw text.
    ///
    /// Whitespace between tokens is split the way spaCy does it: a single
    /// leading space is the previous token's trailing whitespace, anything
    /// beyond becomes a `Space` token owned by the preceding sentence.
    ///
    /// The words of a multiword token ("ettei" = "että" + "ei") all share
    /// the character extent of the surface form.
    pub fn align(text: &str, parsed: Vec<ConlluSentence>) -> Result<Document> {
        let chars: Vec<char> = text.chars().collect();
        let mut aligner = Aligner {
            chars: &chars,
            pos: 0,
            tokens: Vec::new(),
        };
        let mut sentences: Vec<Sentence> = Vec::with_capacity(parsed.len());

        for sent in parsed {
            let gap_start = aligner.tokens.len();
            aligner.consume_gap();
            let start = match sentences.last_mut() {
                Some(prev) => {
                    prev.end = aligner.tokens.len();
                    aligner.tokens.len()
                }
                None => gap_start,
            };

            let mut local_to_doc = Vec::with_capacity(sent.tokens.len());
            for (i, surface) in sent.surface_tokens().into_iter().enumerate() {
                if i > 0 {
                    aligner.consume_gap();
                }
                local_to_doc.extend(aligner.place(surface)?);
            }

            for (parsed_token, &doc_index) in sent.tokens.iter().zip(&local_to_doc) {
                let head = match parsed_token.head {
                    0 => None,
                    h => local_to_doc.get(h - 1).copied(),
                };
                aligner.tokens[doc_index].head = head;
            }

            sentences.push(Sentence {
                start,
                end: aligner.tokens.len(),
            });
        }

        if !sentences.is_empty() {
            aligner.consume_gap();
            if let Some(last) = sentences.last_mut() {
                last.end = aligner.tokens.len();
            }
        }
        if aligner.pos < chars.len() {
            let rest: String = chars[aligner.pos..].iter().take(20).collect();
            return Err(AnnotateError::Alignment {
                form: rest,
                offset: aligner.pos,
            });
        }

        Ok(Document {
            text: text.to_string(),
            char_starts: text.char_indices().map(|(i, _)| i).collect(),
            tokens: aligner.tokens,
            sentences,
        })
    }
}

struct Aligner<'a> {
    chars: &'a [char],
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Aligner<'a> {
    fn consume_gap(&mut self) {
        let gap_start = self.pos;
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
        if gap_start == self.pos {
            return;
        }

        let mut rest_start = gap_start;
        if let Some(prev) = self.tokens.last_mut() {
            if prev.pos != PartOfSpeech::Space && self.chars[gap_start] == ' ' {
                prev.whitespace.push(' ');
                rest_start += 1;
            }
        }
        if rest_start < self.pos {
            let text: String = self.chars[rest_start..self.pos].iter().collect();
            self.tokens.push(Token {
                index: self.tokens.len(),
                offset: rest_start,
                length: self.pos - rest_start,
                lemma: text.clone(),
                text,
                whitespace: String::new(),
                pos: PartOfSpeech::Space,
                morph: Morphology::new(),
                head: None,
            });
        }
    }

    /// Place one surface token at the current position and return the
    /// document indices of its words.
    fn place(&mut self, surface: SurfaceToken<'_>) -> Result<Range<usize>> {
        let form: Vec<char> = surface.form.chars().collect();
        if form.is_empty() || !self.chars[self.pos..].starts_with(&form) {
            return Err(AnnotateError::Alignment {
                form: surface.form.to_string(),
                offset: self.pos,
            });
        }
        let first = self.tokens.len();
        for word in surface.words {
            self.tokens.push(Token {
                index: self.tokens.len(),
                offset: self.pos,
                length: form.len(),
                text: word.form.clone(),
                whitespace: String::new(),
                pos: word.upos,
                morph: word.feats.clone(),
                head: None,
                lemma: word.lemma.clone(),
            });
        }
        self.pos += form.len();
        Ok(first..self.tokens.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_valued_features() {
        let morph: Morphology = "PronType=Int,Rel|Voice=Pass".parse().unwrap();
        assert!(morph.has("Voice", "Pass"));
        assert!(morph.has("PronType", "Rel"));
        assert_eq!(morph.get("PronType").collect::<Vec<_>>(), vec!["Int", "Rel"]);
        assert_eq!(morph.get("Mood").count(), 0);
        assert_eq!(morph.to_string(), "PronType=Int,Rel|Voice=Pass");
    }

    #[test]
    fn underscore_is_no_features() {
        let morph: Morphology = "_".parse().unwrap();
        assert!(morph.is_empty());
        assert!("Voice".parse::<Morphology>().is_err());
    }

    #[test]
    fn punctuation_versus_symbols() {
        let tok = |text: &str| Token {
            index: 0,
            offset: 0,
            length: text.chars().count(),
            text: text.to_string(),
            whitespace: String::new(),
            pos: PartOfSpeech::X,
            morph: Morphology::new(),
            head: None,
            lemma: text.to_string(),
        };
        assert!(tok(",(").is_punct());
        assert!(tok("#").is_punct());
        assert!(tok("%").is_punct());
        assert!(tok("\u{2013}").is_punct());
        assert!(!tok("=").is_punct());
        assert!(tok("=").is_word());
        assert!(tok("\n\n").is_space());
    }

    const SANOIN_ETTEI: &str = "\
1\tSanoin\tsanoa\tVERB\t_\tMood=Ind|Person=1|VerbForm=Fin|Voice=Act\t0\troot\t_\tSpaceAfter=No
2\t,\t,\tPUNCT\t_\t_\t6\tpunct\t_\t_
3-4\tettei\t_\t_\t_\t_\t_\t_\t_\t_
3\tettä\tettä\tSCONJ\t_\t_\t6\tmark\t_\t_
4\tei\tei\tAUX\t_\tPolarity=Neg\t6\taux\t_\t_
5\thän\thän\tPRON\t_\tCase=Nom\t6\tnsubj\t_\t_
6\ttule\ttulla\tVERB\t_\tConnegative=Yes\t1\tccomp\t_\tSpaceAfter=No
7\t.\t.\tPUNCT\t_\t_\t1\tpunct\t_\tSpaceAfter=No
";

    #[test]
    fn multiword_token_aligns_to_its_surface_form() {
        let text = "Sanoin, ettei hän tule.";
        let doc = Document::from_conllu_with_text(text, SANOIN_ETTEI).unwrap();
        let placed: Vec<(&str, usize, usize)> = doc
            .tokens()
            .iter()
            .map(|t| (t.text.as_str(), t.offset, t.length))
            .collect();
        assert_eq!(
            placed,
            vec![
                ("Sanoin", 0, 6),
                (",", 6, 1),
                ("että", 8, 5),
                ("ei", 8, 5),
                ("hän", 14, 3),
                ("tule", 18, 4),
                (".", 22, 1),
            ]
        );
        assert_eq!(doc.tokens()[3].head, Some(5));
        assert_eq!(doc.slice_chars(8, 5), "ettei");
    }

    #[test]
    fn multiword_token_rebuilds_surface_text() {
        let doc = Document::from_conllu(SANOIN_ETTEI).unwrap();
        assert_eq!(doc.text(), "Sanoin, ettei hän tule.");
        assert_eq!(doc.tokens()[4].offset, 14);
    }

    #[test]
    fn slices_by_character() {
        let doc = Document::from_conllu_with_text("Tyttö lukee.", "\
1\tTyttö\ttyttö\tNOUN\t_\t_\t2\tnsubj\t_\t_
2\tlukee\tlukea\tVERB\t_\t_\t0\troot\t_\tSpaceAfter=No
3\t.\t.\tPUNCT\t_\t_\t2\tpunct\t_\tSpaceAfter=No
")
        .unwrap();
        assert_eq!(doc.slice_chars(6, 5), "lukee");
        assert_eq!(doc.slice_chars(3, 2), "tö");
        assert_eq!(doc.slice_chars(10, 50), "e.");
        assert_eq!(doc.slice_chars(40, 2), "");
    }
}
