//! In-memory document packages for testing.
//!
//! Provides [`MemoryOpener`] and [`MemoryDocument`] for exercising the scan
//! and replace engines without real document files.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::error::PackageError;
use crate::flatten::TextNode;
use crate::image::{ImageData, InlineImage};
use crate::package::{DocumentPackage, PackageOpener, ParagraphId, ParagraphNodes, PartId};

/// Node of an in-memory paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryNode {
    Text(TextNode),
    Image(InlineImage),
}

/// Paragraph made of text nodes and inline images.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryParagraph {
    nodes: Vec<MemoryNode>,
}

impl MemoryParagraph {
    /// Paragraph with one text node per entry, each in its own run.
    pub fn from_texts(texts: &[&str]) -> Self {
        let nodes = texts
            .iter()
            .enumerate()
            .map(|(run, text)| MemoryNode::Text(TextNode::new(*text, run)))
            .collect();
        Self { nodes }
    }

    pub fn nodes(&self) -> &[MemoryNode] {
        &self.nodes
    }

    /// Concatenated text, images omitted.
    pub fn text(&self) -> String {
        self.text_nodes().into_iter().map(|n| n.content).collect()
    }

    /// Position in `nodes` of the `index`-th text node.
    fn position(&self, index: usize) -> Option<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n, MemoryNode::Text(_)))
            .nth(index)
            .map(|(pos, _)| pos)
    }
}

impl ParagraphNodes for MemoryParagraph {
    fn text_nodes(&self) -> Vec<TextNode> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                MemoryNode::Text(text) => Some(text.clone()),
                MemoryNode::Image(_) => None,
            })
            .collect()
    }

    fn set_text(&mut self, index: usize, text: &str) {
        if let Some(pos) = self.position(index)
            && let MemoryNode::Text(node) = &mut self.nodes[pos]
        {
            text.clone_into(&mut node.content);
        }
    }

    fn remove(&mut self, index: usize) {
        if let Some(pos) = self.position(index) {
            self.nodes.remove(pos);
        }
    }

    fn insert_image(&mut self, index: usize, at: usize, image: &InlineImage) {
        let Some(pos) = self.position(index) else {
            return;
        };
        let MemoryNode::Text(node) = self.nodes.remove(pos) else {
            return;
        };
        let run = node.run;
        let (before, after) = node.content.split_at(at);

        let mut replacement = Vec::with_capacity(3);
        if !before.is_empty() {
            replacement.push(MemoryNode::Text(TextNode {
                content: before.to_owned(),
                run,
            }));
        }
        replacement.push(MemoryNode::Image(image.clone()));
        if !after.is_empty() {
            replacement.push(MemoryNode::Text(TextNode {
                content: after.to_owned(),
                run,
            }));
        }
        self.nodes.splice(pos..pos, replacement);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct MemoryPart {
    paragraphs: Vec<MemoryParagraph>,
    cells: Vec<Vec<usize>>,
}

/// Image registered in a [`MemoryDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredImage {
    pub part: PartId,
    pub relationship_id: String,
    pub image: ImageData,
}

/// Document content: parts, paragraphs, table cells and registered images.
///
/// # Example
///
/// ```ignore
/// use docfill_core::MemoryDocument;
///
/// let document = MemoryDocument::new()
///     .with_header(&[&["Ref: {{ref}}"]])
///     .with_paragraph(&["Dear ", "{{cli", "ent}}"])
///     .with_table_cell(&[&["{{amount}}"]]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDocument {
    parts: Vec<MemoryPart>,
    headers: Vec<PartId>,
    body: PartId,
    footers: Vec<PartId>,
    images: Vec<RegisteredImage>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self {
            parts: vec![MemoryPart::default()],
            headers: Vec::new(),
            body: PartId(0),
            footers: Vec::new(),
            images: Vec::new(),
        }
    }
}

impl MemoryDocument {
    /// Create a document with an empty body.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a body paragraph with one text node per entry.
    #[must_use]
    pub fn with_paragraph(mut self, texts: &[&str]) -> Self {
        self.parts[self.body.0]
            .paragraphs
            .push(MemoryParagraph::from_texts(texts));
        self
    }

    /// Append a body table cell holding the given paragraphs.
    #[must_use]
    pub fn with_table_cell(mut self, paragraphs: &[&[&str]]) -> Self {
        let part = &mut self.parts[self.body.0];
        let mut cell = Vec::with_capacity(paragraphs.len());
        for texts in paragraphs {
            cell.push(part.paragraphs.len());
            part.paragraphs.push(MemoryParagraph::from_texts(texts));
        }
        part.cells.push(cell);
        self
    }

    /// Declare a body cell over existing body paragraphs.
    #[must_use]
    pub fn with_cell_over(mut self, paragraphs: &[usize]) -> Self {
        self.parts[self.body.0].cells.push(paragraphs.to_vec());
        self
    }

    /// Append a header part.
    #[must_use]
    pub fn with_header(mut self, paragraphs: &[&[&str]]) -> Self {
        let id = self.push_part(paragraphs);
        self.headers.push(id);
        self
    }

    /// Append a footer part.
    #[must_use]
    pub fn with_footer(mut self, paragraphs: &[&[&str]]) -> Self {
        let id = self.push_part(paragraphs);
        self.footers.push(id);
        self
    }

    fn push_part(&mut self, paragraphs: &[&[&str]]) -> PartId {
        let paragraphs = paragraphs
            .iter()
            .map(|texts| MemoryParagraph::from_texts(texts))
            .collect();
        self.parts.push(MemoryPart {
            paragraphs,
            cells: Vec::new(),
        });
        PartId(self.parts.len() - 1)
    }

    /// Text of every body paragraph.
    pub fn body_texts(&self) -> Vec<String> {
        self.part_texts(self.body)
    }

    /// Text of every paragraph of `part`.
    pub fn part_texts(&self, part: PartId) -> Vec<String> {
        self.parts
            .get(part.0)
            .map(|p| p.paragraphs.iter().map(MemoryParagraph::text).collect())
            .unwrap_or_default()
    }

    pub fn paragraph(&self, id: ParagraphId) -> Option<&MemoryParagraph> {
        self.parts.get(id.part.0)?.paragraphs.get(id.index)
    }

    pub fn images(&self) -> &[RegisteredImage] {
        &self.images
    }
}

/// Opened [`MemoryDocument`].
#[derive(Debug)]
pub struct MemoryPackage {
    document: MemoryDocument,
    mutable: bool,
    modified: bool,
    saves: Arc<RwLock<Vec<(PathBuf, MemoryDocument)>>>,
}

impl MemoryPackage {
    pub fn document(&self) -> &MemoryDocument {
        &self.document
    }
}

impl DocumentPackage for MemoryPackage {
    fn header_parts(&self) -> Vec<PartId> {
        self.document.headers.clone()
    }

    fn body_part(&self) -> PartId {
        self.document.body
    }

    fn footer_parts(&self) -> Vec<PartId> {
        self.document.footers.clone()
    }

    fn paragraphs(&self, part: PartId) -> Vec<ParagraphId> {
        self.document.parts.get(part.0).map_or_else(Vec::new, |p| {
            (0..p.paragraphs.len())
                .map(|index| ParagraphId::new(part, index))
                .collect()
        })
    }

    fn table_cells(&self, part: PartId) -> Vec<Vec<ParagraphId>> {
        self.document.parts.get(part.0).map_or_else(Vec::new, |p| {
            p.cells
                .iter()
                .map(|cell| cell.iter().map(|&i| ParagraphId::new(part, i)).collect())
                .collect()
        })
    }

    fn text_nodes(&self, paragraph: ParagraphId) -> Vec<TextNode> {
        self.document
            .paragraph(paragraph)
            .map(ParagraphNodes::text_nodes)
            .unwrap_or_default()
    }

    fn paragraph_mut(&mut self, paragraph: ParagraphId) -> Option<Box<dyn ParagraphNodes + '_>> {
        let target = self
            .document
            .parts
            .get_mut(paragraph.part.0)?
            .paragraphs
            .get_mut(paragraph.index)?;
        self.modified = true;
        Some(Box::new(target))
    }

    fn register_image(&mut self, part: PartId, image: &ImageData) -> Result<String, PackageError> {
        if !self.mutable {
            return Err(PackageError::ReadOnly);
        }
        if let Some(existing) = self
            .document
            .images
            .iter()
            .find(|r| r.part == part && r.image.bytes == image.bytes)
        {
            return Ok(existing.relationship_id.clone());
        }
        let relationship_id = format!("rIdImg{}", self.document.images.len() + 1);
        self.document.images.push(RegisteredImage {
            part,
            relationship_id: relationship_id.clone(),
            image: image.clone(),
        });
        self.modified = true;
        Ok(relationship_id)
    }

    fn is_modified(&self) -> bool {
        self.modified
    }

    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    fn save(&mut self, target: &Path) -> Result<(), PackageError> {
        if !self.mutable {
            return Err(PackageError::ReadOnly);
        }
        self.saves
            .write()
            .unwrap()
            .push((target.to_path_buf(), self.document.clone()));
        self.modified = false;
        Ok(())
    }
}

impl ParagraphNodes for &mut MemoryParagraph {
    fn text_nodes(&self) -> Vec<TextNode> {
        (**self).text_nodes()
    }

    fn set_text(&mut self, index: usize, text: &str) {
        (**self).set_text(index, text);
    }

    fn remove(&mut self, index: usize) {
        (**self).remove(index);
    }

    fn insert_image(&mut self, index: usize, at: usize, image: &InlineImage) {
        (**self).insert_image(index, at, image);
    }
}

/// Opener over a fixed set of in-memory documents.
///
/// Unknown paths fail with a not-found I/O error. Paths registered with
/// [`MemoryOpener::with_corrupt`] fail as corrupt packages.
#[derive(Debug, Default)]
pub struct MemoryOpener {
    documents: HashMap<PathBuf, MemoryDocument>,
    corrupt: HashSet<PathBuf>,
    saves: Arc<RwLock<Vec<(PathBuf, MemoryDocument)>>>,
}

impl MemoryOpener {
    /// Create an opener with no documents.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `document` under `path`.
    #[must_use]
    pub fn with_document(mut self, path: impl Into<PathBuf>, document: MemoryDocument) -> Self {
        self.documents.insert(path.into(), document);
        self
    }

    /// Make `path` fail to open as a corrupt package.
    #[must_use]
    pub fn with_corrupt(mut self, path: impl Into<PathBuf>) -> Self {
        self.corrupt.insert(path.into());
        self
    }

    /// Every save so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn saved(&self) -> Vec<(PathBuf, MemoryDocument)> {
        self.saves.read().unwrap().clone()
    }
}

impl PackageOpener for MemoryOpener {
    type Package = MemoryPackage;

    fn open(&self, path: &Path, mutable: bool) -> Result<MemoryPackage, PackageError> {
        if self.corrupt.contains(path) {
            return Err(PackageError::Corrupt("not a valid package".to_owned()));
        }
        let document = self
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::from(std::io::ErrorKind::NotFound))?;
        Ok(MemoryPackage {
            document,
            mutable,
            modified: false,
            saves: Arc::clone(&self.saves),
        })
    }
}
