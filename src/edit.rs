//! The fundamental edit primitive: non-overlapping byte-span edits over an
//! immutable source buffer.
//!
//! All rewriter operations (removal, reconfiguration, insertion of new
//! declarations) compile down to span edits accumulated here. Intelligence
//! lives in span acquisition, not application: edits are recorded against
//! original-buffer coordinates and composited in a single rendering pass, so
//! the caller never has to reason about shifting offsets.

/// One recorded edit. `start == end` encodes a pure insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SpanEdit {
    start: usize,
    end: usize,
    text: String,
    /// Insertion sequence, used as a stable tie-break when rendering.
    seq: usize,
}

/// Accumulates edits against an immutable source buffer and renders the final
/// text on demand.
///
/// Edits must not target overlapping ranges. Overlap is a programming error in
/// the caller, checked with an assertion at insertion time rather than tolerated
/// at render time.
#[derive(Debug, Clone)]
pub struct SourceEdits {
    source: String,
    edits: Vec<SpanEdit>,
}

impl SourceEdits {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            edits: Vec::new(),
        }
    }

    /// Original buffer this engine was created over.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Remove the characters in `[start, end)`, plus pure whitespace
    /// immediately to the left of `start` and a single line break immediately
    /// to the right of `end`, so removing a whole declaration does not leave a
    /// blank line behind.
    pub fn delete(&mut self, start: usize, end: usize) {
        let bytes = self.source.as_bytes();

        let mut start = start;
        while start > 0 && matches!(bytes[start - 1], b' ' | b'\t') {
            start -= 1;
        }

        let mut end = end;
        if end < bytes.len() && bytes[end] == b'\r' {
            end += 1;
        }
        if end < bytes.len() && bytes[end] == b'\n' {
            end += 1;
        }

        self.push(SpanEdit {
            start,
            end,
            text: String::new(),
            seq: self.edits.len(),
        });
    }

    /// Insert `text` immediately before the byte position `pos`.
    pub fn insert_before(&mut self, pos: usize, text: impl Into<String>) {
        self.push(SpanEdit {
            start: pos,
            end: pos,
            text: text.into(),
            seq: self.edits.len(),
        });
    }

    /// Substitute `text` for the characters in `[start, end)`.
    pub fn replace(&mut self, start: usize, end: usize, text: impl Into<String>) {
        self.push(SpanEdit {
            start,
            end,
            text: text.into(),
            seq: self.edits.len(),
        });
    }

    fn push(&mut self, edit: SpanEdit) {
        assert!(
            edit.start <= edit.end && edit.end <= self.source.len(),
            "edit range {}..{} out of bounds for buffer of length {}",
            edit.start,
            edit.end,
            self.source.len()
        );

        for existing in &self.edits {
            assert!(
                !overlaps(existing, &edit),
                "overlapping edits: {}..{} conflicts with {}..{}",
                edit.start,
                edit.end,
                existing.start,
                existing.end
            );
        }

        self.edits.push(edit);
    }

    /// Apply all accumulated edits over the original buffer and return the
    /// resulting text. Idempotent: calling again with no new edits returns the
    /// same text.
    pub fn render(&self) -> String {
        let mut ordered: Vec<&SpanEdit> = self.edits.iter().collect();
        ordered.sort_by_key(|e| (e.start, e.end, e.seq));

        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for edit in ordered {
            out.push_str(&self.source[cursor..edit.start]);
            out.push_str(&edit.text);
            cursor = edit.end;
        }
        out.push_str(&self.source[cursor..]);
        out
    }
}

/// Two edits conflict when their ranges share interior characters, or when an
/// insertion point falls strictly inside a replaced range. Insertions at the
/// same position, and ranges that merely touch at a boundary, are fine.
fn overlaps(a: &SpanEdit, b: &SpanEdit) -> bool {
    let (ins, span) = if a.start == a.end { (a, b) } else { (b, a) };

    if ins.start == ins.end {
        if span.start == span.end {
            return false;
        }
        return span.start < ins.start && ins.start < span.end;
    }

    a.start < b.end && b.start < a.end
}
