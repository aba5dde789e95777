//! DOCX package: zip container, part discovery and saving.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use docfill_core::{
    DocumentPackage, ImageData, PackageError, PackageOpener, ParagraphId, ParagraphNodes, PartId,
    TextNode,
};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use crate::content_types::{CONTENT_TYPES_PART, ContentTypes};
use crate::error::DocxError;
use crate::paragraph::{self, DocxParagraph};
use crate::part::Part;
use crate::rels::{IMAGE_REL_TYPE, Relationships, rels_path, relative_target, resolve_target};

/// Main part location used when the package relationships do not name one.
const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// Entries under this prefix are stored uncompressed.
const MEDIA_PREFIX: &str = "word/media/";

/// Opens `.docx` files as [`DocxPackage`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxOpener;

impl DocxOpener {
    pub fn new() -> Self {
        Self
    }
}

impl PackageOpener for DocxOpener {
    type Package = DocxPackage;

    fn open(&self, path: &Path, mutable: bool) -> Result<DocxPackage, PackageError> {
        Ok(DocxPackage::open(path, mutable)?)
    }
}

/// Raw zip entry, kept in archive order.
#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    dir: bool,
}

/// An opened DOCX document.
///
/// Parts are numbered body first, then headers, then footers, each group in
/// relationship order. Entries that are never edited are written back
/// byte-for-byte on save.
#[derive(Debug)]
pub struct DocxPackage {
    entries: Vec<Entry>,
    parts: Vec<Part>,
    headers: Vec<PartId>,
    footers: Vec<PartId>,
    relationships: BTreeMap<String, Relationships>,
    content_types: ContentTypes,
    /// New media entries, in registration order.
    media: Vec<(String, Vec<u8>)>,
    /// Relationship id per part and content hash.
    registered: HashMap<(PartId, String), String>,
    next_drawing_id: u32,
    mutable: bool,
}

impl DocxPackage {
    /// Read the package at `path`.
    pub fn open(path: &Path, mutable: bool) -> Result<Self, DocxError> {
        let entries = read_entries(File::open(path)?)?;

        let content_types = entry_text(&entries, CONTENT_TYPES_PART)?
            .ok_or_else(|| DocxError::MissingPart(CONTENT_TYPES_PART.to_owned()))
            .and_then(ContentTypes::parse)?;

        let main = read_relationships(&entries, &rels_path(""))?
            .and_then(|rels| rels.of_type("officeDocument").into_iter().next())
            .map_or_else(
                || DEFAULT_MAIN_PART.to_owned(),
                |rel| resolve_target("", &rel.target),
            );
        let body_xml = entry_text(&entries, &main)?
            .ok_or_else(|| DocxError::MissingPart(main.clone()))?;
        let mut parts = vec![Part::parse(&main, body_xml)?];

        let mut relationships = BTreeMap::new();
        let mut headers = Vec::new();
        let mut footers = Vec::new();
        let main_rels_name = rels_path(&main);
        if let Some(main_rels) = read_relationships(&entries, &main_rels_name)? {
            for (kind, ids) in [("header", &mut headers), ("footer", &mut footers)] {
                for rel in main_rels.of_type(kind) {
                    let name = resolve_target(&main, &rel.target);
                    let Some(xml) = entry_text(&entries, &name)? else {
                        warn!(package = %path.display(), part = %name, "Referenced part is missing");
                        continue;
                    };
                    ids.push(PartId(parts.len()));
                    parts.push(Part::parse(&name, xml)?);
                }
            }
            relationships.insert(main_rels_name, main_rels);
        }

        let next_drawing_id = parts.iter().map(Part::max_drawing_id).max().unwrap_or(0) + 1;
        debug!(
            package = %path.display(),
            headers = headers.len(),
            footers = footers.len(),
            "Opened package"
        );

        Ok(Self {
            entries,
            parts,
            headers,
            footers,
            relationships,
            content_types,
            media: Vec::new(),
            registered: HashMap::new(),
            next_drawing_id,
            mutable,
        })
    }

    /// Serialize the package to zip bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocxError> {
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let options = |name: &str| {
            if name.starts_with(MEDIA_PREFIX) {
                stored
            } else {
                deflated
            }
        };

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let mut written = HashSet::new();

        for entry in &self.entries {
            written.insert(entry.name.as_str());
            if entry.dir {
                zip.add_directory(entry.name.as_str(), deflated)?;
                continue;
            }
            zip.start_file(entry.name.as_str(), options(entry.name.as_str()))?;
            match self.rewritten(&entry.name) {
                Some(xml) => zip.write_all(xml.as_bytes())?,
                None => zip.write_all(&entry.data)?,
            }
        }

        // Relationship parts created by image registration
        for (name, rels) in &self.relationships {
            if rels.is_modified() && !written.contains(name.as_str()) {
                zip.start_file(name.as_str(), deflated)?;
                zip.write_all(rels.to_xml().as_bytes())?;
            }
        }

        for (name, data) in &self.media {
            zip.start_file(name.as_str(), options(name.as_str()))?;
            zip.write_all(data)?;
        }

        Ok(zip.finish()?.into_inner())
    }

    /// New content for an existing entry, if it was modified.
    fn rewritten(&self, name: &str) -> Option<String> {
        if name == CONTENT_TYPES_PART {
            return self.content_types.is_modified().then(|| self.content_types.to_xml());
        }
        if let Some(part) = self.parts.iter().find(|p| p.name == name) {
            return part.modified.then(|| part.to_xml());
        }
        self.relationships
            .get(name)
            .filter(|rels| rels.is_modified())
            .map(Relationships::to_xml)
    }

    fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id.0)
    }
}

impl DocumentPackage for DocxPackage {
    fn header_parts(&self) -> Vec<PartId> {
        self.headers.clone()
    }

    fn body_part(&self) -> PartId {
        PartId(0)
    }

    fn footer_parts(&self) -> Vec<PartId> {
        self.footers.clone()
    }

    fn paragraphs(&self, part: PartId) -> Vec<ParagraphId> {
        let count = self.part(part).map_or(0, Part::paragraph_count);
        (0..count).map(|i| ParagraphId::new(part, i)).collect()
    }

    fn table_cells(&self, part: PartId) -> Vec<Vec<ParagraphId>> {
        self.part(part)
            .map(|p| {
                p.cells()
                    .iter()
                    .map(|cell| cell.iter().map(|&i| ParagraphId::new(part, i)).collect())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn text_nodes(&self, paragraph: ParagraphId) -> Vec<TextNode> {
        self.part(paragraph.part)
            .and_then(|p| p.paragraph(paragraph.index))
            .map(paragraph::text_nodes)
            .unwrap_or_default()
    }

    fn paragraph_mut(&mut self, paragraph: ParagraphId) -> Option<Box<dyn ParagraphNodes + '_>> {
        let part = self.parts.get_mut(paragraph.part.0)?;
        let editor = DocxParagraph::new(part, paragraph.index, &mut self.next_drawing_id)?;
        Some(Box::new(editor))
    }

    fn register_image(&mut self, part: PartId, image: &ImageData) -> Result<String, PackageError> {
        if !self.mutable {
            return Err(PackageError::ReadOnly);
        }
        let part_name = self
            .part(part)
            .map(|p| p.name.clone())
            .ok_or_else(|| PackageError::MissingPart(format!("part #{}", part.0)))?;

        let digest = Sha256::digest(&image.bytes);
        let hash = hex::encode(&digest[..8]);
        if let Some(id) = self.registered.get(&(part, hash.clone())) {
            return Ok(id.clone());
        }

        let extension = image.format.extension();
        let media_name = format!("{MEDIA_PREFIX}docfill-{hash}.{extension}");
        let exists = self.entries.iter().any(|e| e.name == media_name)
            || self.media.iter().any(|(name, _)| *name == media_name);
        if !exists {
            self.media.push((media_name.clone(), image.bytes.clone()));
        }
        self.content_types
            .ensure_default(extension, image.format.content_type());

        let rels_name = rels_path(&part_name);
        let rels = match self.relationships.entry(rels_name) {
            std::collections::btree_map::Entry::Occupied(e) => e.into_mut(),
            std::collections::btree_map::Entry::Vacant(e) => {
                let loaded =
                    read_relationships(&self.entries, e.key())?.unwrap_or_else(Relationships::empty);
                e.insert(loaded)
            }
        };
        let id = rels.add(IMAGE_REL_TYPE, &relative_target(&part_name, &media_name));

        debug!(part = %part_name, media = %media_name, relationship = %id, "Registered image");
        self.registered.insert((part, hash), id.clone());
        Ok(id)
    }

    fn is_modified(&self) -> bool {
        self.parts.iter().any(|p| p.modified)
            || !self.media.is_empty()
            || self.content_types.is_modified()
            || self.relationships.values().any(Relationships::is_modified)
    }

    fn save(&mut self, target: &Path) -> Result<(), PackageError> {
        if !self.mutable {
            return Err(PackageError::ReadOnly);
        }
        let bytes = self.to_bytes()?;
        write_atomically(target, &bytes)?;
        debug!(target = %target.display(), bytes = bytes.len(), "Saved package");
        Ok(())
    }
}

fn read_entries(file: File) -> Result<Vec<Entry>, DocxError> {
    let mut archive = zip::ZipArchive::new(file)?;
    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        entries.push(Entry {
            name: entry.name().to_owned(),
            dir: entry.is_dir(),
            data,
        });
    }
    Ok(entries)
}

fn entry_text<'a>(entries: &'a [Entry], name: &str) -> Result<Option<&'a str>, DocxError> {
    match entries.iter().find(|e| e.name == name) {
        Some(entry) => Ok(Some(std::str::from_utf8(&entry.data)?)),
        None => Ok(None),
    }
}

fn read_relationships(entries: &[Entry], name: &str) -> Result<Option<Relationships>, DocxError> {
    entry_text(entries, name)?
        .map(|xml| Relationships::parse(xml, name))
        .transpose()
}

/// Write `bytes` to a temporary file next to `target`, then move it into
/// place so a failed write never leaves a truncated document.
fn write_atomically(target: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = target
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(target).map_err(|e| e.error)?;
    Ok(())
}
