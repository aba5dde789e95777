//! `[Content_Types].xml` handling.

use crate::error::DocxError;
use crate::xml::{XmlDocument, XmlNode, parse_document, serialize_document};

/// Entry name of the content types part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

#[derive(Debug, Clone)]
pub struct ContentTypes {
    document: XmlDocument,
    modified: bool,
}

impl ContentTypes {
    pub fn parse(xml: &str) -> Result<Self, DocxError> {
        Ok(Self {
            document: parse_document(xml, CONTENT_TYPES_PART)?,
            modified: false,
        })
    }

    /// Content type registered for `extension`, ignoring case.
    pub fn default_for(&self, extension: &str) -> Option<&str> {
        self.document
            .root
            .children
            .iter()
            .filter(|node| node.tag == "Default")
            .find(|node| {
                node.attr("Extension")
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
            })
            .and_then(|node| node.attr("ContentType"))
    }

    /// Register a `Default` entry for `extension` unless one exists.
    ///
    /// New entries go after the existing defaults so overrides stay last.
    /// Returns whether an entry was added.
    pub fn ensure_default(&mut self, extension: &str, content_type: &str) -> bool {
        if self.default_for(extension).is_some() {
            return false;
        }

        let children = &mut self.document.root.children;
        let position = children
            .iter()
            .rposition(|node| node.tag == "Default")
            .map_or(0, |i| i + 1);
        children.insert(
            position,
            XmlNode::new("Default")
                .with_attr("Extension", extension)
                .with_attr("ContentType", content_type),
        );
        self.modified = true;
        true
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn to_xml(&self) -> String {
        serialize_document(&self.document)
    }
}
