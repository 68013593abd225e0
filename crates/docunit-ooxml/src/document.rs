//! Typed raw document tree.
//!
//! These types mirror the WordprocessingML structure closely and carry only
//! what the element parser consumes: block nodes, local style overrides,
//! drawings and the lookup tables that belong to a document.

use std::collections::HashMap;

use crate::styles::StyleTable;

/// A fully loaded document: body, footers, lookup tables and properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDocument {
    /// Top-level body blocks in document order.
    pub body: Vec<RawBlock>,
    /// Footer parts in part-name order, each a list of blocks.
    pub footers: Vec<Vec<RawBlock>>,
    /// Named styles of the document.
    pub styles: StyleTable,
    /// Images keyed by relationship id.
    pub images: ImageTable,
    /// Custom document properties in declaration order.
    pub properties: Vec<(String, String)>,
}

/// Block-level node.
#[derive(Debug, Clone, PartialEq)]
pub enum RawBlock {
    Paragraph(RawParagraph),
    Table(RawTable),
}

/// Run-level formatting overrides (`w:rPr`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunProperties {
    /// `w:b`.
    pub bold: Option<bool>,
    /// `w:sz`, in half-points.
    pub size: Option<u32>,
    /// `w:u@w:val`, e.g. `single`, `double`, `none`.
    pub underline: Option<String>,
}

impl RunProperties {
    /// True when no property is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bold.is_none() && self.size.is_none() && self.underline.is_none()
    }
}

/// A paragraph (`w:p`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawParagraph {
    /// Paragraph style id (`w:pStyle`).
    pub style_id: Option<String>,
    /// Alignment (`w:jc`), e.g. `center`, `both`.
    pub alignment: Option<String>,
    /// Paragraph default run properties (`w:pPr/w:rPr`).
    pub run_properties: RunProperties,
    /// Whether the paragraph carries a `w:pPr` element at all.
    pub has_properties: bool,
    /// Runs in document order.
    pub runs: Vec<RawRun>,
}

/// A run (`w:r`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRun {
    /// Character style id (`w:rStyle`).
    pub style_id: Option<String>,
    /// Local formatting overrides.
    pub properties: RunProperties,
    /// Run content in document order.
    pub content: Vec<RawRunContent>,
}

impl RawRun {
    /// True when the run contains at least one text node.
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.content
            .iter()
            .any(|c| matches!(c, RawRunContent::Text(_)))
    }
}

/// Content of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum RawRunContent {
    Text(String),
    Tab,
    Drawing(RawDrawing),
}

/// A drawing (`w:drawing`) with its inline or anchored graphics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDrawing {
    pub graphics: Vec<RawGraphic>,
}

/// How a graphic is placed in the text flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// `wp:inline`.
    Inline,
    /// `wp:anchor` (floating).
    Anchor,
}

/// One `wp:inline` or `wp:anchor` element.
#[derive(Debug, Clone, PartialEq)]
pub struct RawGraphic {
    pub placement: Placement,
    /// Extent in EMU (`wp:extent@cx`, `@cy`).
    pub extent: Option<(u64, u64)>,
    /// `a:graphic/a:graphicData`, if present.
    pub data: Option<RawGraphicData>,
}

/// Graphic data of a drawing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGraphicData {
    /// Content kind URI (`a:graphicData@uri`).
    pub uri: String,
    /// Picture content, when the graphic is a `pic:pic`.
    pub picture: Option<RawPicture>,
}

/// A picture (`pic:pic`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPicture {
    /// Relationship id of the embedded image (`a:blip@r:embed`).
    pub embed: Option<String>,
}

/// A table (`w:tbl`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<RawTableRow>,
}

/// A table row (`w:tr`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTableRow {
    pub cells: Vec<RawTableCell>,
}

/// A table cell (`w:tc`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTableCell {
    /// Horizontal span (`w:gridSpan`).
    pub grid_span: Option<u32>,
    /// Cell content; may contain nested tables.
    pub blocks: Vec<RawBlock>,
}

/// Binary image data with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Images of a document keyed by relationship id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageTable {
    images: HashMap<String, ImageData>,
}

impl ImageTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image under a relationship id.
    pub fn insert(&mut self, id: impl Into<String>, image: ImageData) {
        self.images.insert(id.into(), image);
    }

    /// Builder variant of [`insert`](Self::insert).
    #[must_use]
    pub fn with_image(mut self, id: impl Into<String>, image: ImageData) -> Self {
        self.insert(id, image);
        self
    }

    /// Look up an image by relationship id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ImageData> {
        self.images.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
