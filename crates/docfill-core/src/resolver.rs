//! Placeholder resolution over a paragraph.

use std::ops::Range;

use crate::flatten::FlattenedText;
use crate::pattern::{ImageProps, PatternMatch, PlaceholderKind, PlaceholderPattern};

/// Characters of context kept on each side of an occurrence.
const CONTEXT_RADIUS: usize = 40;

/// Placeholder found in one paragraph during one traversal pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderOccurrence {
    pub kind: PlaceholderKind,
    /// Matched text exactly as it appears in the paragraph.
    pub raw: String,
    pub name: String,
    /// Byte span in the flattened paragraph text.
    pub span: Range<usize>,
    pub image: Option<ImageProps>,
}

impl PlaceholderOccurrence {
    fn from_match(text: &str, m: PatternMatch) -> Self {
        Self {
            kind: m.kind,
            raw: text[m.span.clone()].to_owned(),
            name: m.name,
            span: m.span,
            image: m.image,
        }
    }
}

/// A paragraph's flattened text and the occurrences found in it.
#[derive(Debug, Clone)]
pub struct ResolvedParagraph {
    pub text: FlattenedText,
    pub occurrences: Vec<PlaceholderOccurrence>,
}

impl ResolvedParagraph {
    /// Context snippet for `occurrence`.
    pub fn context(&self, occurrence: &PlaceholderOccurrence) -> String {
        context_snippet(self.text.as_str(), &occurrence.span)
    }
}

/// Flatten `nodes` and run `pattern` over the result.
pub fn resolve<T: AsRef<str>>(pattern: &PlaceholderPattern, nodes: &[T]) -> ResolvedParagraph {
    let text = FlattenedText::new(nodes);
    let occurrences = pattern
        .find_all(text.as_str())
        .into_iter()
        .map(|m| PlaceholderOccurrence::from_match(text.as_str(), m))
        .collect();
    ResolvedParagraph { text, occurrences }
}

/// Text around `span`, at most 40 characters per side, trimmed.
///
/// A truncated side is marked with `…`.
pub fn context_snippet(text: &str, span: &Range<usize>) -> String {
    let before = &text[..span.start];
    let after = &text[span.end..];

    let start = before
        .char_indices()
        .rev()
        .nth(CONTEXT_RADIUS - 1)
        .map_or(0, |(i, _)| i);
    let end = after
        .char_indices()
        .nth(CONTEXT_RADIUS)
        .map_or(after.len(), |(i, _)| i);

    let core = format!("{}{}{}", &before[start..], &text[span.clone()], &after[..end]);
    let mut snippet = String::with_capacity(core.len() + 6);
    if start > 0 {
        snippet.push('…');
    }
    snippet.push_str(core.trim());
    if end < after.len() {
        snippet.push('…');
    }
    snippet
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_split_token_detected_once() {
        let pattern = PlaceholderPattern::default();
        let resolved = resolve(&pattern, &["Dear ", "{{cli", "ent_name}}", ", welcome."]);

        assert_eq!(resolved.occurrences.len(), 1);
        let occurrence = &resolved.occurrences[0];
        assert_eq!(occurrence.kind, PlaceholderKind::Text);
        assert_eq!(occurrence.name, "client_name");
        assert_eq!(occurrence.raw, "{{client_name}}");

        let nodes: Vec<usize> = resolved
            .text
            .nodes_overlapping(&occurrence.span)
            .iter()
            .map(|n| n.node)
            .collect();
        assert_eq!(nodes, vec![1, 2]);
    }

    #[test]
    fn test_three_way_split() {
        let pattern = PlaceholderPattern::default();
        let resolved = resolve(&pattern, &["{", "{na", "me}", "}"]);

        assert_eq!(resolved.occurrences.len(), 1);
        assert_eq!(resolved.occurrences[0].span, 0..8);
    }

    #[test]
    fn test_context_short_paragraph() {
        let pattern = PlaceholderPattern::default();
        let resolved = resolve(&pattern, &["  Hello {{name}}!  "]);

        assert_eq!(resolved.context(&resolved.occurrences[0]), "Hello {{name}}!");
    }

    #[test]
    fn test_context_truncated_both_sides() {
        let text = format!("{}{{{{x}}}}{}", "a".repeat(50), "b".repeat(50));
        let span = 50..55;
        let snippet = context_snippet(&text, &span);

        assert_eq!(
            snippet,
            format!("…{}{{{{x}}}}{}…", "a".repeat(40), "b".repeat(40))
        );
    }

    #[test]
    fn test_context_multibyte() {
        let text = format!("{}{{{{x}}}}", "é".repeat(45));
        let span = text.len() - 5..text.len();
        let snippet = context_snippet(&text, &span);

        assert!(snippet.starts_with('…'));
        assert_eq!(snippet.chars().filter(|c| *c == 'é').count(), 40);
    }
}
