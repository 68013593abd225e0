//! Error types for reading office documents.

use std::str::Utf8Error;

/// Error while reading a WordprocessingML package or part.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum OoxmlError {
    /// XML parsing error.
    #[error("XML parse error")]
    XmlParse(#[from] quick_xml::Error),

    /// UTF-8 decoding error.
    #[error("UTF-8 error")]
    Utf8(#[from] Utf8Error),

    /// Encoding error during XML parsing.
    #[error("encoding error")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    /// The part contains no root element.
    #[error("empty XML part")]
    EmptyPart,

    /// The archive could not be opened or read.
    #[error("invalid document archive")]
    Archive(#[from] zip::result::ZipError),

    /// I/O error while reading a part.
    #[error("I/O error")]
    Io(#[from] std::io::Error),

    /// A part required by the package is absent.
    #[error("missing package part: {0}")]
    MissingPart(String),
}
