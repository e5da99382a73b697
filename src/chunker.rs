//! Deterministic splitting of documents into bounded, overlapping chunks.
//!
//! The splitter prefers the coarsest boundary that still fits the window:
//! paragraph break, then sentence end, then word break, then a hard
//! character cut. Chunks never cross document boundaries.

use crate::loader::Document;

/// A bounded span of one document's text; the unit of embedding and
/// retrieval. `text` is exactly the `[start, end)` character range of the
/// parent document.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Id of the parent document (its source URL).
    pub source: String,
    /// Position of this chunk within the parent document.
    pub ordinal: usize,
    /// Character offset range into the parent text.
    pub start: usize,
    pub end: usize,
    /// Characters shared with the previous chunk of the same document.
    pub overlap_with_prev: usize,
    pub text: String,
}

/// Split every document into chunks of at most `max_len` characters.
/// Consecutive chunks of one document overlap by `overlap` characters
/// where backtracking keeps the walk moving forward.
pub fn split_documents(docs: &[Document], max_len: usize, overlap: usize) -> Vec<Chunk> {
    debug_assert!(overlap < max_len);

    let mut chunks = Vec::new();
    for doc in docs {
        split_document(doc, max_len, overlap, &mut chunks);
    }
    chunks
}

fn split_document(doc: &Document, max_len: usize, overlap: usize, out: &mut Vec<Chunk>) {
    let chars: Vec<char> = doc.text.chars().collect();
    let total = chars.len();

    let mut ordinal = 0;
    let mut start = 0usize;
    let mut prev_end: Option<usize> = None;

    while start < total {
        let window_end = (start + max_len).min(total);
        let end = if window_end == total {
            total
        } else {
            split_point(&chars, start, overlap, window_end)
        };

        let text: String = chars[start..end].iter().collect();
        if !text.trim().is_empty() {
            let overlap_with_prev = prev_end
                .map(|pe| pe.saturating_sub(start))
                .unwrap_or(0);
            out.push(Chunk {
                source: doc.source.clone(),
                ordinal,
                start,
                end,
                overlap_with_prev,
                text,
            });
            ordinal += 1;
        }

        if end == total {
            break;
        }

        prev_end = Some(end);
        let back = end.saturating_sub(overlap);
        start = if back > start { back } else { end };
    }
}

/// Split position in `(start + overlap, limit]`, coarsest boundary first.
/// The floor keeps every chunk extending past the region the next chunk
/// re-covers; the hard cut at `limit` always qualifies since
/// `overlap < max_len`.
fn split_point(chars: &[char], start: usize, overlap: usize, limit: usize) -> usize {
    let floor = start + overlap;
    if let Some(pos) = last_paragraph_break(chars, floor, limit) {
        return pos;
    }
    if let Some(pos) = last_sentence_break(chars, floor, limit) {
        return pos;
    }
    if let Some(pos) = last_word_break(chars, floor, limit) {
        return pos;
    }
    limit
}

/// Position just after the last `\n\n` in `(floor, limit]`.
fn last_paragraph_break(chars: &[char], floor: usize, limit: usize) -> Option<usize> {
    let mut i = limit;
    while i > floor && i >= 2 {
        if chars[i - 1] == '\n' && chars[i - 2] == '\n' {
            return Some(i);
        }
        i -= 1;
    }
    None
}

/// Position just after the last `.`/`!`/`?` + whitespace pair in
/// `(floor, limit]`.
fn last_sentence_break(chars: &[char], floor: usize, limit: usize) -> Option<usize> {
    let mut i = limit;
    while i > floor && i >= 2 {
        if chars[i - 1].is_whitespace() && matches!(chars[i - 2], '.' | '!' | '?') {
            return Some(i);
        }
        i -= 1;
    }
    None
}

/// Position just after the last whitespace in `(floor, limit]`.
fn last_word_break(chars: &[char], floor: usize, limit: usize) -> Option<usize> {
    let mut i = limit;
    while i > floor && i >= 1 {
        if chars[i - 1].is_whitespace() {
            return Some(i);
        }
        i -= 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(source: &str, text: &str) -> Document {
        Document {
            source: source.to_string(),
            text: text.to_string(),
            title: None,
        }
    }

    #[test]
    fn same_input_same_output() {
        let docs = vec![doc("a", &"The quick brown fox jumps over the lazy dog. ".repeat(30))];
        let first = split_documents(&docs, 120, 30);
        let second = split_documents(&docs, 120, 30);
        assert_eq!(first, second);
        assert!(first.len() > 1);
    }

    #[test]
    fn chunks_respect_the_size_bound() {
        let docs = vec![doc("a", &"Sentence one here. And sentence two. ".repeat(50))];
        for chunk in split_documents(&docs, 100, 20) {
            assert!(chunk.text.chars().count() <= 100);
            assert_eq!(chunk.end - chunk.start, chunk.text.chars().count());
        }
    }

    #[test]
    fn consecutive_chunks_share_the_overlap_region() {
        let docs = vec![doc("a", &"word ".repeat(200))];
        let chunks = split_documents(&docs, 100, 25);
        assert!(chunks.len() > 2);

        for pair in chunks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert_eq!(next.start, prev.end - next.overlap_with_prev);

            let prev_chars: Vec<char> = prev.text.chars().collect();
            let next_chars: Vec<char> = next.text.chars().collect();
            let shared = next.overlap_with_prev;
            assert!(shared > 0);
            assert_eq!(
                prev_chars[prev_chars.len() - shared..],
                next_chars[..shared]
            );
        }
    }

    #[test]
    fn chunks_never_cross_documents() {
        let docs = vec![
            doc("doc-a", &"Alpha text in the first document. ".repeat(10)),
            doc("doc-b", &"Beta text in the second document. ".repeat(10)),
        ];
        let chunks = split_documents(&docs, 80, 10);

        for chunk in &chunks {
            let parent = docs.iter().find(|d| d.source == chunk.source).unwrap();
            assert!(chunk.end <= parent.text.chars().count());
        }
        assert!(chunks.iter().any(|c| c.source == "doc-a"));
        assert!(chunks.iter().any(|c| c.source == "doc-b"));

        // ordinals restart per document
        let first_b = chunks.iter().find(|c| c.source == "doc-b").unwrap();
        assert_eq!(first_b.ordinal, 0);
    }

    #[test]
    fn paragraph_breaks_win_over_sentence_breaks() {
        let text = format!("{}\n\n{}", "First paragraph. Short.", "Second paragraph follows here.");
        let docs = vec![doc("a", &text)];
        let chunks = split_documents(&docs, 30, 5);

        // the first chunk ends exactly at the paragraph break
        assert!(chunks[0].text.ends_with("\n\n"));
        assert!(chunks[0].text.starts_with("First paragraph."));
    }

    #[test]
    fn unbroken_text_falls_back_to_hard_cuts() {
        let docs = vec![doc("a", &"x".repeat(250))];
        let chunks = split_documents(&docs, 100, 20);

        assert!(chunks.len() >= 3);
        assert_eq!(chunks[0].text.chars().count(), 100);
        assert_eq!(chunks[1].start, chunks[0].end - 20);
    }

    #[test]
    fn short_document_is_one_chunk() {
        let docs = vec![doc("a", "Tiny document.")];
        let chunks = split_documents(&docs, 1000, 200);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Tiny document.");
        assert_eq!(chunks[0].start, 0);
        assert_eq!(chunks[0].overlap_with_prev, 0);
    }

    #[test]
    fn empty_document_yields_no_chunks() {
        let docs = vec![doc("a", "")];
        assert!(split_documents(&docs, 100, 10).is_empty());
    }
}
