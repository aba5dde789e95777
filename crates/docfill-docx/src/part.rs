//! WordprocessingML parts (body, headers, footers).

use crate::error::DocxError;
use crate::xml::{XmlDocument, XmlNode, parse_document, serialize_document};

/// A parsed story part with its paragraph and table-cell index.
///
/// Paragraphs are addressed by their position in a pre-order walk of the
/// tree. The index stores the child-index path to each `w:p`, so it must be
/// rebuilt with [`Part::reindex`] after edits that add or remove elements.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub document: XmlDocument,
    paragraphs: Vec<Vec<usize>>,
    cells: Vec<Vec<usize>>,
    pub modified: bool,
}

impl Part {
    pub fn parse(name: &str, xml: &str) -> Result<Self, DocxError> {
        let mut part = Self {
            name: name.to_owned(),
            document: parse_document(xml, name)?,
            paragraphs: Vec::new(),
            cells: Vec::new(),
            modified: false,
        };
        part.reindex();
        Ok(part)
    }

    pub fn reindex(&mut self) {
        let mut index = Index::default();
        index.walk(&self.document.root, &mut Vec::new());
        self.paragraphs = index.paragraphs;
        self.cells = index.cells;
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Paragraph indices of each `w:tc`, innermost cell only.
    pub fn cells(&self) -> &[Vec<usize>] {
        &self.cells
    }

    pub fn paragraph(&self, index: usize) -> Option<&XmlNode> {
        let path = self.paragraphs.get(index)?;
        self.document.root.at(path)
    }

    pub fn paragraph_mut(&mut self, index: usize) -> Option<&mut XmlNode> {
        let path = self.paragraphs.get(index)?;
        self.document.root.at_mut(path)
    }

    /// Highest `wp:docPr` id in the part; drawing ids must be unique.
    pub fn max_drawing_id(&self) -> u32 {
        fn walk(node: &XmlNode, max: &mut u32) {
            if node.tag == "wp:docPr"
                && let Some(id) = node.attr("id").and_then(|v| v.parse::<u32>().ok())
            {
                *max = (*max).max(id);
            }
            for child in &node.children {
                walk(child, max);
            }
        }

        let mut max = 0;
        walk(&self.document.root, &mut max);
        max
    }

    pub fn to_xml(&self) -> String {
        serialize_document(&self.document)
    }
}

#[derive(Default)]
struct Index {
    paragraphs: Vec<Vec<usize>>,
    cells: Vec<Vec<usize>>,
    open_cells: Vec<usize>,
}

impl Index {
    fn walk(&mut self, node: &XmlNode, path: &mut Vec<usize>) {
        for (i, child) in node.children.iter().enumerate() {
            path.push(i);
            match child.tag.as_str() {
                "w:p" => {
                    let index = self.paragraphs.len();
                    self.paragraphs.push(path.clone());
                    if let Some(&cell) = self.open_cells.last() {
                        self.cells[cell].push(index);
                    }
                    self.walk(child, path);
                }
                "w:tc" => {
                    self.open_cells.push(self.cells.len());
                    self.cells.push(Vec::new());
                    self.walk(child, path);
                    self.open_cells.pop();
                }
                _ => self.walk(child, path),
            }
            path.pop();
        }
    }
}
