use crate::document::{Document, Token};
use crate::readability::trim_space;
use crate::SpanAnnotation;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SentenceCounts {
    pub sentences: usize,
    pub passive_sentences: usize,
}

/// Count sentences and the ones containing the start of a passive span.
///
/// Sentences come in text order, so a single pointer over the sorted
/// passive starts is never rewound.
pub fn count_sentences(doc: &Document, passive_spans: &[SpanAnnotation]) -> SentenceCounts {
    let mut starts: Vec<usize> = passive_spans.iter().map(|s| s.start).collect();
    starts.sort_unstable();
    starts.push(usize::MAX);

    let mut counts = SentenceCounts::default();
    let mut next = 0;
    for sentence in doc.sentences() {
        let tokens = trim_space(doc.tokens_in(sentence));
        if !tokens.iter().any(Token::is_word) {
            continue;
        }
        let (Some(first), Some(last)) = (tokens.first(), tokens.last()) else {
            continue;
        };
        let (start, end) = (first.offset, last.end());
        counts.sentences += 1;

        while starts[next] < start {
            next += 1;
        }
        if starts[next] < end {
            counts.passive_sentences += 1;
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Label;

    fn passive_at(start: usize) -> SpanAnnotation {
        SpanAnnotation {
            start,
            length: 1,
            label: Label::Passive,
            text: None,
        }
    }

    const TWO_SENTENCES: &str = "\
1\tSitä\tse\tPRON\t_\t_\t2\tobj\t_\t_
2\ttehdään\ttehdä\tVERB\t_\tVoice=Pass\t0\troot\t_\tSpaceAfter=No
3\t.\t.\tPUNCT\t_\t_\t2\tpunct\t_\t_

1\tHyvä\thyvä\tADJ\t_\t_\t0\troot\t_\tSpaceAfter=No
2\t!\t!\tPUNCT\t_\t_\t1\tpunct\t_\tSpacesAfter=\\n\\n

1\t...\t...\tPUNCT\t_\t_\t0\troot\t_\tSpaceAfter=No
";

    #[test]
    fn punctuation_only_sentence_is_not_counted() {
        let doc = Document::from_conllu(TWO_SENTENCES).unwrap();
        let counts = count_sentences(&doc, &[]);
        assert_eq!(counts.sentences, 2);
        assert_eq!(counts.passive_sentences, 0);
    }

    #[test]
    fn passive_start_marks_its_sentence() {
        let doc = Document::from_conllu(TWO_SENTENCES).unwrap();
        // "Sitä tehdään. Hyvä!" -> "tehdään" starts at 5
        let counts = count_sentences(&doc, &[passive_at(5)]);
        assert_eq!(counts.passive_sentences, 1);

        let counts = count_sentences(&doc, &[passive_at(14)]);
        assert_eq!(counts.passive_sentences, 1);

        let counts = count_sentences(&doc, &[passive_at(14), passive_at(0), passive_at(5)]);
        assert_eq!(counts.passive_sentences, 2);
    }
}
