//! DOCX collaborators for the docfill engine.
//!
//! - [`DocxOpener`] / [`DocxPackage`] read and write Office Open XML word
//!   processing packages, exposing headers, body and footers to the engine
//! - [`DocxParagraph`] edits `w:t` text nodes in place and inserts inline
//!   pictures
//! - [`discover`] turns command-line inputs into a list of documents
//! - [`FileBackup`] makes timestamped copies before documents are modified

mod backup;
mod content_types;
mod discovery;
mod drawing;
mod error;
#[cfg(test)]
mod fixture;
mod package;
mod paragraph;
mod part;
mod rels;
pub mod xml;

pub use backup::FileBackup;
pub use discovery::{DiscoveryError, discover};
pub use error::DocxError;
pub use package::{DocxOpener, DocxPackage};
pub use paragraph::{DocxParagraph, text_nodes};
