//! Element tree for OOXML parts.
//!
//! Parts are held as a tree of [`XmlNode`]s using the text/tail model: an
//! element's `text` precedes its first child and each child's `tail` follows
//! that child's end tag. Attributes keep their document order and namespace
//! declarations are kept as ordinary attributes so a round trip reproduces
//! them.

mod parser;
mod serializer;

pub use parser::parse_document;
pub use serializer::serialize_document;

/// Element in a parsed part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Qualified tag name, prefix included (e.g. `w:t`).
    pub tag: String,
    /// Attributes in document order.
    pub attrs: Vec<(String, String)>,
    /// Text before the first child.
    pub text: String,
    /// Text after the end tag.
    pub tail: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Create a new node with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append an attribute.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Append a child.
    #[must_use]
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set `key`, replacing the value in place when it already exists.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key.to_owned(), value)),
        }
    }

    /// Node at `path`, a list of child indices starting from `self`.
    pub fn at(&self, path: &[usize]) -> Option<&XmlNode> {
        path.iter()
            .try_fold(self, |node, &i| node.children.get(i))
    }

    pub fn at_mut(&mut self, path: &[usize]) -> Option<&mut XmlNode> {
        path.iter()
            .try_fold(self, |node, &i| node.children.get_mut(i))
    }

    /// Remove child `index`, moving its tail onto the previous sibling (or
    /// into this node's text) so surrounding character data survives.
    pub fn detach_child(&mut self, index: usize) -> Option<XmlNode> {
        if index >= self.children.len() {
            return None;
        }
        let mut child = self.children.remove(index);
        let tail = std::mem::take(&mut child.tail);
        match index.checked_sub(1).and_then(|i| self.children.get_mut(i)) {
            Some(previous) => previous.tail.push_str(&tail),
            None => self.text.push_str(&tail),
        }
        Some(child)
    }
}

/// A parsed part: optional XML declaration plus the root element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    /// Whether the source started with an `<?xml ...?>` declaration.
    pub declaration: bool,
    pub root: XmlNode,
}
