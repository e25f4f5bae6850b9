//! Passive-voice detection over the dependency tree.
//!
//! Finnish forms the passive morphologically ("opiskellaan") or
//! periphrastically with auxiliaries governed by a passive participle
//! ("on tehty", "olisi voitu tehdä"). The matcher collects the token indices
//! of both; coalescing them into spans happens in [`crate::spans`].

use std::collections::BTreeSet;

use crate::document::{PartOfSpeech, Token};

// ---------------------------------------------------------------------------
// Morphology predicates
// ---------------------------------------------------------------------------

/// A passive VERB. Forms carrying a possessor suffix (`Person[psor]`) share
/// the surface morphology but are not passives.
pub fn is_passive_finite_verb(token: &Token) -> bool {
    token.pos == PartOfSpeech::Verb
        && token.morph.has("Voice", "Pass")
        && !token.morph.contains("Person[psor]")
}

pub fn is_participle(token: &Token) -> bool {
    token.morph.has("VerbForm", "Part")
}

/// Indices of the tokens that govern at least one AUX.
pub fn aux_heads(tokens: &[Token]) -> BTreeSet<usize> {
    tokens
        .iter()
        .filter(|t| t.pos == PartOfSpeech::Aux)
        .filter_map(|t| t.head)
        .collect()
}

/// A passive verb that heads a passive clause: finite, or a participle
/// governing an auxiliary.
pub fn is_passive_word(token: &Token, aux_heads: &BTreeSet<usize>) -> bool {
    is_passive_finite_verb(token) && (!is_participle(token) || aux_heads.contains(&token.index))
}

/// Index of the passive verb governing the AUX at `index`.
fn passive_head(tokens: &[Token], index: usize) -> Option<usize> {
    let token = &tokens[index];
    if token.pos != PartOfSpeech::Aux {
        return None;
    }
    let head = token.head.filter(|&h| h != index && h < tokens.len())?;
    is_passive_finite_verb(&tokens[head]).then_some(head)
}

/// True when the AUX at `index` governs into a passive verb and every token
/// strictly between the two is another AUX of the same verb.
pub fn aux_joins_chain(tokens: &[Token], index: usize) -> bool {
    let Some(head) = passive_head(tokens, index) else {
        return false;
    };
    let (low, high) = if index < head {
        (index, head)
    } else {
        (head, index)
    };
    tokens[low + 1..high]
        .iter()
        .all(|t| t.pos == PartOfSpeech::Aux && t.head == Some(head))
}

// ---------------------------------------------------------------------------
// Matcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassiveMatches {
    /// Tokens of passive clauses: passive verbs and their auxiliaries.
    pub clausal: BTreeSet<usize>,
    /// Passive participles without an auxiliary, used adjectivally.
    pub adjectival: BTreeSet<usize>,
}

impl PassiveMatches {
    pub fn is_empty(&self) -> bool {
        self.clausal.is_empty() && self.adjectival.is_empty()
    }
}

/// Auxiliaries separated from their passive verb by other material stay in
/// `clausal`; coalescing turns them into spans of their own.
pub fn match_passives(tokens: &[Token]) -> PassiveMatches {
    let mut matches = PassiveMatches::default();
    let governors = aux_heads(tokens);

    for (i, token) in tokens.iter().enumerate() {
        if !token.is_word() {
            continue;
        }
        match token.pos {
            PartOfSpeech::Verb if is_passive_finite_verb(token) => {
                if is_passive_word(token, &governors) {
                    matches.clausal.insert(i);
                } else {
                    log::trace!("adjectival participle {:?} at {}", token.text, token.offset);
                    matches.adjectival.insert(i);
                }
            }
            PartOfSpeech::Aux if passive_head(tokens, i).is_some() => {
                if !aux_joins_chain(tokens, i) {
                    log::trace!("detached auxiliary {:?} at {}", token.text, token.offset);
                }
                matches.clausal.insert(i);
            }
            _ => {}
        }
    }
    matches
}
