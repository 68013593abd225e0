//! Element model, parser and HTML renderer for docunit.
//!
//! Turns a [`RawDocument`](docunit_ooxml::RawDocument) into a typed,
//! order-preserving element tree and serializes elements into HTML
//! fragments for the editor:
//!
//! - [`DocumentElement`]: closed set of element kinds
//! - [`Styles`] / [`StyleResolver`]: CSS style sets and inline-over-named resolution
//! - [`convert`] / [`ElementParser`]: raw tree to element model
//! - [`HtmlRenderer`]: element model to HTML, with optional `data-id`
//!
//! # Example
//!
//! ```ignore
//! use docunit_elements::{HtmlRenderer, ParserOptions, convert};
//!
//! let converted = convert(&raw_document, &ParserOptions::default())?;
//! let renderer = HtmlRenderer::new();
//! for element in &converted.elements {
//!     println!("{}", renderer.render(element));
//! }
//! ```

mod error;
mod html;
mod model;
mod parser;
mod style;

pub use error::ConversionError;
pub use html::{HtmlRenderer, ID_ATTRIBUTE};
pub use model::{
    BorderNumberElement, ConvertedDocument, DocumentElement, FooterElement, ImageElement,
    MetadataProperty, ParagraphElement, RunElement, TableCellElement, TableElement, TextElement,
};
pub use parser::{DEFAULT_BORDER_NUMBER_STYLE, ElementParser, ParserOptions, convert};
pub use style::{StyleResolver, Styles, apply_alignment, apply_text_style, resolve};
