//! Span rewriting across text node boundaries.
//!
//! The first node touched by a span absorbs the whole replacement and keeps
//! its formatting. Other touched nodes lose the overlapping characters and
//! are deleted when nothing remains. Text before and after the span stays in
//! its original node.

use std::ops::Range;

use tracing::debug;

use crate::flatten::FlattenedText;
use crate::image::InlineImage;
use crate::package::ParagraphNodes;

/// What a span is rewritten to.
#[derive(Debug, Clone, Copy)]
pub enum Replacement<'a> {
    Text(&'a str),
    Image(&'a InlineImage),
}

/// Rewrite `span` of the paragraph described by `flat`.
///
/// `flat` must reflect the paragraph's current nodes. Returns `false` when the
/// span touches no node.
pub fn rewrite_span<P>(
    paragraph: &mut P,
    flat: &FlattenedText,
    span: &Range<usize>,
    replacement: Replacement<'_>,
) -> bool
where
    P: ParagraphNodes + ?Sized,
{
    let overlapping = flat.nodes_overlapping(span);
    let Some((first, rest)) = overlapping.split_first() else {
        debug!(start = span.start, end = span.end, "Span touches no text node");
        return false;
    };

    // Trailing nodes first, highest index first, so lower indexes stay valid.
    for node in rest.iter().rev() {
        let text = &flat.as_str()[node.range()];
        let cut = span.end.min(node.end()) - node.start;
        let remaining = &text[cut..];
        if remaining.is_empty() {
            paragraph.remove(node.node);
        } else {
            paragraph.set_text(node.node, remaining);
        }
    }

    let text = &flat.as_str()[first.range()];
    let local_start = span.start - first.start;
    let local_end = span.end.min(first.end()) - first.start;
    let prefix = &text[..local_start];
    let suffix = &text[local_end..];

    match replacement {
        Replacement::Text(value) => {
            let updated = format!("{prefix}{value}{suffix}");
            if updated.is_empty() {
                paragraph.remove(first.node);
            } else {
                paragraph.set_text(first.node, &updated);
            }
        }
        Replacement::Image(image) => {
            let updated = format!("{prefix}{suffix}");
            paragraph.set_text(first.node, &updated);
            paragraph.insert_image(first.node, prefix.len(), image);
        }
    }
    true
}
