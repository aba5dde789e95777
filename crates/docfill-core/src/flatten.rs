//! Paragraph text reconstruction.
//!
//! Word processors split runs at arbitrary character positions, so a
//! placeholder typed as `{{client_name}}` may be stored as `{{cli` and
//! `ent_name}}` in two runs. Concatenating the run texts without separators
//! restores the text as the reader sees it.

use std::ops::Range;

/// Opaque identifier of the formatting run a text node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunHandle(pub usize);

/// Text node borrowed from a paragraph for one traversal pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextNode {
    pub content: String,
    pub run: RunHandle,
}

impl TextNode {
    pub fn new(content: impl Into<String>, run: usize) -> Self {
        Self {
            content: content.into(),
            run: RunHandle(run),
        }
    }
}

impl AsRef<str> for TextNode {
    fn as_ref(&self) -> &str {
        &self.content
    }
}

/// Position of one node inside the flattened text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSpan {
    /// Index of the node in the paragraph.
    pub node: usize,
    /// Byte offset of the node's first character.
    pub start: usize,
    /// Byte length of the node's content.
    pub len: usize,
}

impl NodeSpan {
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Concatenated paragraph text with a node boundary index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedText {
    text: String,
    nodes: Vec<NodeSpan>,
}

impl FlattenedText {
    pub fn new<T: AsRef<str>>(nodes: &[T]) -> Self {
        let capacity = nodes.iter().map(|n| n.as_ref().len()).sum();
        let mut text = String::with_capacity(capacity);
        let mut spans = Vec::with_capacity(nodes.len());

        for (index, node) in nodes.iter().enumerate() {
            let content = node.as_ref();
            spans.push(NodeSpan {
                node: index,
                start: text.len(),
                len: content.len(),
            });
            text.push_str(content);
        }

        Self { text, nodes: spans }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Boundary index, one entry per node.
    pub fn nodes(&self) -> &[NodeSpan] {
        &self.nodes
    }

    /// Content of node `index` as seen in the flattened text.
    pub fn node_text(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(|n| &self.text[n.range()])
    }

    /// Nodes whose byte range intersects `span`, in order.
    ///
    /// Empty nodes never overlap anything.
    pub fn nodes_overlapping(&self, span: &Range<usize>) -> Vec<NodeSpan> {
        self.nodes
            .iter()
            .filter(|n| n.len > 0 && n.start < span.end && n.end() > span.start)
            .copied()
            .collect()
    }

    /// Map a flattened offset to `(node, offset within node)`.
    ///
    /// The end-of-text offset maps to the end of the last non-empty node.
    pub fn locate(&self, offset: usize) -> Option<(usize, usize)> {
        if let Some(node) = self
            .nodes
            .iter()
            .find(|n| n.start <= offset && offset < n.end())
        {
            return Some((node.node, offset - node.start));
        }
        if offset == self.text.len() {
            return self
                .nodes
                .iter()
                .rev()
                .find(|n| n.len > 0)
                .map(|n| (n.node, n.len));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_round_trip() {
        let nodes = ["Dear ", "{{cli", "", "ent_name}}", ", welcome."];
        let flat = FlattenedText::new(&nodes);

        assert_eq!(flat.as_str(), nodes.concat());
        for (index, node) in nodes.iter().enumerate() {
            assert_eq!(flat.node_text(index), Some(*node));
        }
        let total: usize = flat.nodes().iter().map(|n| n.len).sum();
        assert_eq!(total, flat.len());
    }

    #[test]
    fn test_nodes_overlapping_skips_empty() {
        let flat = FlattenedText::new(&["Dear ", "{{cli", "", "ent_name}}", "!"]);
        let overlapping: Vec<usize> = flat
            .nodes_overlapping(&(5..20))
            .iter()
            .map(|n| n.node)
            .collect();

        assert_eq!(overlapping, vec![1, 3]);
    }

    #[test]
    fn test_locate() {
        let flat = FlattenedText::new(&["ab", "", "cd"]);

        assert_eq!(flat.locate(0), Some((0, 0)));
        assert_eq!(flat.locate(2), Some((2, 0)));
        assert_eq!(flat.locate(4), Some((2, 2)));
        assert_eq!(flat.locate(5), None);
    }

    #[test]
    fn test_text_nodes_flatten() {
        let nodes = vec![TextNode::new("{{na", 0), TextNode::new("me}}", 1)];
        let flat = FlattenedText::new(&nodes);
        assert_eq!(flat.as_str(), "{{name}}");
    }
}
