//! Placeholder detection and replacement engine for word-processing documents.
//!
//! The engine finds `{{name}}` style placeholders in document text, even when
//! the word processor split them across several formatting runs, and
//! replaces them with mapped values or inline images.
//!
//! # Architecture
//!
//! - [`PlaceholderPattern`] matches text and image placeholder syntax in a
//!   flat string
//! - [`FlattenedText`] joins a paragraph's text nodes and remembers where
//!   each node starts
//! - [`resolve`] runs the pattern over a paragraph
//! - [`rewrite_span`] edits the nodes a span covers, keeping formatting
//! - [`traverse`] walks headers, body and footers of a [`DocumentPackage`]
//! - [`Scanner`] and [`Replacer`] drive batches of files with failure
//!   isolation, bounded parallelism and cooperative cancellation
//!
//! The container format lives behind the [`PackageOpener`],
//! [`DocumentPackage`] and [`ParagraphNodes`] traits. In-memory
//! implementations are available behind the `mock` feature.
//!
//! # Example
//!
//! ```ignore
//! use docfill_core::{CancellationToken, PlaceholderPattern, Scanner};
//!
//! let scanner = Scanner::new(opener);
//! let result = scanner.scan(&files, &PlaceholderPattern::default(), &CancellationToken::new())?;
//! for placeholder in &result.placeholders {
//!     println!("{}: {}", placeholder.name, placeholder.total_occurrences);
//! }
//! ```

mod cancel;
mod error;
mod flatten;
mod image;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod package;
mod pattern;
mod replace;
mod resolver;
mod rewriter;
mod scan;
mod traversal;

pub use cancel::CancellationToken;
pub use error::{EngineError, ErrorKind, FileError, MappingError, PackageError};
pub use flatten::{FlattenedText, NodeSpan, RunHandle, TextNode};
pub use image::{
    EMU_PER_PIXEL, ImageData, ImageFormat, InlineImage, fit_within, pixels_to_emu,
};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MemoryDocument, MemoryNode, MemoryOpener, MemoryPackage, MemoryParagraph};
pub use package::{
    Backup, DocumentPackage, PackageOpener, ParagraphId, ParagraphNodes, PartId, PartKind,
    Section,
};
pub use pattern::{
    DEFAULT_PATTERN, ImageProps, PatternMatch, PatternOptions, PlaceholderKind,
    PlaceholderPattern, validate_pattern,
};
pub use replace::{
    FileReplaceResult, MAX_KEY_LEN, ReplaceOptions, ReplaceResult, ReplacementMap, Replacer,
    UnreplacedPlaceholder, sanitize_value,
};
pub use resolver::{PlaceholderOccurrence, ResolvedParagraph, context_snippet, resolve};
pub use rewriter::{Replacement, rewrite_span};
pub use scan::{Accumulator, BatchStatus, Placeholder, PlaceholderLocation, ScanResult, Scanner};
pub use traversal::{TraversalStats, traverse};
