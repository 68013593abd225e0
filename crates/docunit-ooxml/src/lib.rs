//! WordprocessingML reader for the docunit conversion engine.
//!
//! Provides the raw document tree the element parser consumes:
//!
//! - [`XmlParser`] / [`XmlNode`]: quick-xml based element tree for any part
//! - [`RawDocument`] and its block, run and drawing nodes
//! - [`StyleTable`]: named styles with `basedOn` inheritance
//! - [`ImageTable`]: embedded images keyed by relationship id
//! - [`DocxPackage`]: reads a `.docx` zip container into a [`RawDocument`]
//!
//! # Example
//!
//! ```ignore
//! use std::fs::File;
//! use docunit_ooxml::DocxPackage;
//!
//! let document = DocxPackage::open(File::open("decision.docx")?)?.read()?;
//! println!("{} blocks", document.body.len());
//! ```

mod document;
mod error;
mod package;
mod reader;
mod styles;
mod tree;
mod xml;

pub use document::{
    ImageData, ImageTable, Placement, RawBlock, RawDocument, RawDrawing, RawGraphic,
    RawGraphicData, RawParagraph, RawPicture, RawRun, RawRunContent, RawTable, RawTableCell,
    RawTableRow, RunProperties,
};
pub use error::OoxmlError;
pub use package::DocxPackage;
pub use reader::{read_blocks, read_body, read_paragraph};
pub use styles::{NamedStyle, StyleTable};
pub use tree::XmlNode;
pub use xml::XmlParser;
