//! Error types for DOCX package access.

use std::str::Utf8Error;

use docfill_core::PackageError;

/// Error while reading or writing a DOCX package.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DocxError {
    /// Zip container error.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error.
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] Utf8Error),

    /// Encoding error during XML parsing.
    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A part the package cannot work without is absent.
    #[error("missing part: {0}")]
    MissingPart(String),

    /// XML document without a root element.
    #[error("no root element in {0}")]
    Empty(String),

    /// Input ended while an element was still open.
    #[error("unexpected end of XML inside <{tag}>")]
    Truncated { tag: String },
}

impl From<DocxError> for PackageError {
    fn from(error: DocxError) -> Self {
        match error {
            DocxError::Io(source) => Self::Io(source),
            DocxError::Zip(zip::result::ZipError::Io(source)) => Self::Io(source),
            DocxError::MissingPart(name) => Self::MissingPart(name),
            other => Self::Corrupt(other.to_string()),
        }
    }
}
