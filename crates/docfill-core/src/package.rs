//! Collaborator traits for document packages.
//!
//! The engine never touches the container format directly. A
//! [`PackageOpener`] produces a [`DocumentPackage`], which exposes parts,
//! paragraphs and text nodes by id and hands out a [`ParagraphNodes`]
//! editor for rewriting.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::PackageError;
use crate::flatten::TextNode;
use crate::image::{ImageData, InlineImage};

/// Identifier of a document part (header, body or footer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartId(pub usize);

/// Identifier of a paragraph within a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParagraphId {
    pub part: PartId,
    pub index: usize,
}

impl ParagraphId {
    pub fn new(part: PartId, index: usize) -> Self {
        Self { part, index }
    }
}

/// Where a part sits in the traversal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    Header(usize),
    Body,
    Footer(usize),
}

/// Section label attached to placeholder locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Section {
    pub part: PartKind,
    pub in_table: bool,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.part {
            PartKind::Header(i) => write!(f, "Header{i}")?,
            PartKind::Body => f.write_str("Body")?,
            PartKind::Footer(i) => write!(f, "Footer{i}")?,
        }
        if self.in_table {
            f.write_str(" (Table)")?;
        }
        Ok(())
    }
}

/// Node-level editor for a single paragraph.
pub trait ParagraphNodes {
    /// Current text nodes in reading order.
    fn text_nodes(&self) -> Vec<TextNode>;

    /// Replace the content of node `index`, keeping its formatting.
    fn set_text(&mut self, index: usize, text: &str);

    /// Delete node `index`.
    fn remove(&mut self, index: usize);

    /// Split node `index` at byte offset `at` and place `image` in between.
    fn insert_image(&mut self, index: usize, at: usize, image: &InlineImage);
}

/// An opened document.
pub trait DocumentPackage {
    fn header_parts(&self) -> Vec<PartId>;

    fn body_part(&self) -> PartId;

    fn footer_parts(&self) -> Vec<PartId>;

    /// All paragraphs of `part` in document order, table paragraphs included.
    fn paragraphs(&self, part: PartId) -> Vec<ParagraphId>;

    /// Paragraphs of each table cell of `part`, nested cells listed separately.
    fn table_cells(&self, part: PartId) -> Vec<Vec<ParagraphId>>;

    fn text_nodes(&self, paragraph: ParagraphId) -> Vec<TextNode>;

    /// Editor for `paragraph`, or `None` when the id is unknown.
    fn paragraph_mut(&mut self, paragraph: ParagraphId) -> Option<Box<dyn ParagraphNodes + '_>>;

    /// Store image bytes in the package and return the relationship id that
    /// `part` uses to reference them.
    fn register_image(&mut self, part: PartId, image: &ImageData) -> Result<String, PackageError>;

    /// Whether any edit or registration happened since opening.
    fn is_modified(&self) -> bool;

    /// Write the package to `target`.
    fn save(&mut self, target: &Path) -> Result<(), PackageError>;
}

/// Opens documents by path.
pub trait PackageOpener: Send + Sync {
    type Package: DocumentPackage;

    /// Open `path`. With `mutable == false` the package rejects saving.
    fn open(&self, path: &Path, mutable: bool) -> Result<Self::Package, PackageError>;
}

/// Creates safety copies of documents before they are modified.
pub trait Backup: Send + Sync {
    /// Copy `path` and return the location of the copy.
    fn backup(&self, path: &Path) -> std::io::Result<PathBuf>;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_section_labels() {
        let header = Section {
            part: PartKind::Header(1),
            in_table: false,
        };
        let body_table = Section {
            part: PartKind::Body,
            in_table: true,
        };
        let footer = Section {
            part: PartKind::Footer(0),
            in_table: false,
        };

        assert_eq!(header.to_string(), "Header1");
        assert_eq!(body_table.to_string(), "Body (Table)");
        assert_eq!(footer.to_string(), "Footer0");
    }
}
