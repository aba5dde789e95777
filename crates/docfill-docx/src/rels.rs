//! Part relationships (`_rels/*.rels`).

use crate::error::DocxError;
use crate::xml::{XmlDocument, XmlNode, parse_document, serialize_document};

const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Relationship type of an embedded image.
pub const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// A single `Relationship` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub kind: String,
    pub target: String,
    pub external: bool,
}

/// Relationships of one part.
#[derive(Debug, Clone)]
pub struct Relationships {
    document: XmlDocument,
    modified: bool,
}

impl Relationships {
    pub fn parse(xml: &str, name: &str) -> Result<Self, DocxError> {
        Ok(Self {
            document: parse_document(xml, name)?,
            modified: false,
        })
    }

    /// An empty relationships part, for parts that had none.
    pub fn empty() -> Self {
        Self {
            document: XmlDocument {
                declaration: true,
                root: XmlNode::new("Relationships").with_attr("xmlns", RELATIONSHIPS_NS),
            },
            modified: false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Relationship> + '_ {
        self.document
            .root
            .children
            .iter()
            .filter(|node| node.tag == "Relationship")
            .filter_map(|node| {
                Some(Relationship {
                    id: node.attr("Id")?.to_owned(),
                    kind: node.attr("Type")?.to_owned(),
                    target: node.attr("Target")?.to_owned(),
                    external: node.attr("TargetMode") == Some("External"),
                })
            })
    }

    /// Internal relationships whose type ends with `/{suffix}`, in document
    /// order. Matching on the suffix covers both transitional and strict
    /// namespaces.
    pub fn of_type(&self, suffix: &str) -> Vec<Relationship> {
        self.iter()
            .filter(|rel| !rel.external && rel.kind.rsplit('/').next() == Some(suffix))
            .collect()
    }

    /// Add a relationship and return its new id.
    pub fn add(&mut self, kind: &str, target: &str) -> String {
        let taken: Vec<String> = self.iter().map(|rel| rel.id).collect();
        let id = (1..)
            .map(|n| format!("rId{n}"))
            .find(|id| !taken.contains(id))
            .unwrap_or_default();

        self.document.root.children.push(
            XmlNode::new("Relationship")
                .with_attr("Id", id.clone())
                .with_attr("Type", kind)
                .with_attr("Target", target),
        );
        self.modified = true;
        id
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn to_xml(&self) -> String {
        serialize_document(&self.document)
    }
}

/// Path of the relationships part belonging to `part`.
///
/// `word/document.xml` maps to `word/_rels/document.xml.rels` and the
/// package itself (empty name) to `_rels/.rels`.
pub fn rels_path(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the part that owns it.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_owned();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Target string that `source_part` uses to reference `part`.
pub fn relative_target(source_part: &str, part: &str) -> String {
    let dir = source_part.rsplit_once('/').map_or("", |(dir, _)| dir);
    if dir.is_empty() {
        return part.to_owned();
    }
    match part.strip_prefix(dir).and_then(|rest| rest.strip_prefix('/')) {
        Some(relative) => relative.to_owned(),
        None => format!("/{part}"),
    }
}
