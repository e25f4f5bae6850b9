use std::collections::BTreeSet;
use std::ops::Range;

use crate::document::Token;
use crate::{Label, SpanAnnotation};

/// Maximal runs of consecutive indices, in ascending order.
pub fn index_runs(indices: &BTreeSet<usize>) -> Vec<Range<usize>> {
    let mut runs: Vec<Range<usize>> = Vec::new();
    for &i in indices {
        match runs.last_mut() {
            Some(run) if run.end == i => run.end = i + 1,
            _ => runs.push(i..i + 1),
        }
    }
    runs
}

/// Span from the start of `first` to the end of `last`, excluding any
/// trailing whitespace.
pub fn span_over(first: &Token, last: &Token, label: Label) -> SpanAnnotation {
    SpanAnnotation {
        start: first.offset,
        length: last.end().saturating_sub(first.offset),
        label,
        text: None,
    }
}

/// One span per run of consecutive token indices.
pub fn coalesce(tokens: &[Token], indices: &BTreeSet<usize>, label: Label) -> Vec<SpanAnnotation> {
    index_runs(indices)
        .into_iter()
        .map(|run| span_over(&tokens[run.start], &tokens[run.end - 1], label))
        .collect()
}

/// One span per token, no merging. Words of one multiword token share an
/// extent and yield a single span.
pub fn single_token_spans(tokens: &[Token], indices: &[usize], label: Label) -> Vec<SpanAnnotation> {
    let mut spans: Vec<SpanAnnotation> = indices
        .iter()
        .map(|&i| span_over(&tokens[i], &tokens[i], label))
        .collect();
    spans.dedup();
    spans
}

/// Order by start, longer spans first on ties.
pub fn sort_annotations(annotations: &mut [SpanAnnotation]) {
    annotations.sort_by(|a, b| a.start.cmp(&b.start).then(b.length.cmp(&a.length)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_split_on_gaps() {
        let indices: BTreeSet<usize> = [1, 2, 3, 5, 8, 9].into_iter().collect();
        assert_eq!(index_runs(&indices), vec![1..4, 5..6, 8..10]);
    }

    #[test]
    fn no_indices_no_runs() {
        assert!(index_runs(&BTreeSet::new()).is_empty());
    }

    #[test]
    fn ties_sort_longest_first() {
        let span = |start, length, label| SpanAnnotation {
            start,
            length,
            label,
            text: None,
        };
        let mut spans = vec![
            span(10, 3, Label::Adverb),
            span(0, 5, Label::Passive),
            span(10, 40, Label::Difficult),
        ];
        sort_annotations(&mut spans);
        let order: Vec<(usize, usize)> = spans.iter().map(|s| (s.start, s.length)).collect();
        assert_eq!(order, vec![(0, 5), (10, 40), (10, 3)]);
    }
}
