//! Element model of converted documents.
//!
//! A closed set of element kinds produced by the parser and consumed by the
//! renderer and the border-number editor. The model is serializable so a
//! persisted element can be edited and re-rendered without the source file.

use serde::{Deserialize, Serialize};

use crate::style::Styles;

/// A converted document element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentElement {
    Paragraph(ParagraphElement),
    Run(RunElement),
    BorderNumber(BorderNumberElement),
    Table(TableElement),
    TableCell(TableCellElement),
    Image(ImageElement),
    Tab,
    MetadataProperty(MetadataProperty),
    Footer(FooterElement),
}

impl DocumentElement {
    /// Whether the element renders an identity attribute when one is supplied.
    #[must_use]
    pub fn has_element_id(&self) -> bool {
        matches!(
            self,
            Self::Paragraph(_) | Self::BorderNumber(_) | Self::Footer(_)
        )
    }

    /// Snake-case name of the variant, as used in the serialized form.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Paragraph(_) => "paragraph",
            Self::Run(_) => "run",
            Self::BorderNumber(_) => "border_number",
            Self::Table(_) => "table",
            Self::TableCell(_) => "table_cell",
            Self::Image(_) => "image",
            Self::Tab => "tab",
            Self::MetadataProperty(_) => "metadata_property",
            Self::Footer(_) => "footer",
        }
    }

    #[must_use]
    pub fn as_paragraph(&self) -> Option<&ParagraphElement> {
        match self {
            Self::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_border_number(&self) -> Option<&BorderNumberElement> {
        match self {
            Self::BorderNumber(b) => Some(b),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_border_number(&self) -> bool {
        matches!(self, Self::BorderNumber(_))
    }
}

impl From<ParagraphElement> for DocumentElement {
    fn from(paragraph: ParagraphElement) -> Self {
        Self::Paragraph(paragraph)
    }
}

impl From<BorderNumberElement> for DocumentElement {
    fn from(border_number: BorderNumberElement) -> Self {
        Self::BorderNumber(border_number)
    }
}

/// A paragraph: its own style set, its runs and the clearfix flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphElement {
    #[serde(default, skip_serializing_if = "Styles::is_empty")]
    pub styles: Styles,
    pub runs: Vec<RunElement>,
    #[serde(default)]
    pub clearfix: bool,
}

impl ParagraphElement {
    /// Paragraph with a single unstyled text run.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![RunElement::Text(TextElement::new(text))],
            ..Default::default()
        }
    }

    /// Concatenated text of all text runs.
    #[must_use]
    pub fn text(&self) -> String {
        self.runs
            .iter()
            .filter_map(|run| match run {
                RunElement::Text(text) => Some(text.content.as_str()),
                _ => None,
            })
            .collect()
    }

    /// True when the paragraph shows nothing: no images and only blank text.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|run| match run {
            RunElement::Text(text) => text.content.trim().is_empty(),
            RunElement::Tab => true,
            RunElement::InlineImage(_) => false,
        })
    }
}

/// Inline content of a paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunElement {
    Text(TextElement),
    InlineImage(ImageElement),
    Tab,
}

/// Text of a run with the run's own resolved style.
///
/// The content is HTML-safe: it is escaped when the element is parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextElement {
    pub content: String,
    #[serde(default, skip_serializing_if = "Styles::is_empty")]
    pub styles: Styles,
}

impl TextElement {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            styles: Styles::new(),
        }
    }
}

/// A border-number marker and the content that belongs to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderNumberElement {
    pub number: String,
    #[serde(default)]
    pub children: Vec<DocumentElement>,
}

impl BorderNumberElement {
    #[must_use]
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            children: Vec::new(),
        }
    }

    /// Numeric value of the leading digits (`"12a"` is 12).
    #[must_use]
    pub fn numeric_value(&self) -> Option<u32> {
        let digits: String = self
            .number
            .trim()
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }
}

/// A table, flattened into its cells in row-then-cell order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableElement {
    pub cells: Vec<TableCellElement>,
}

/// Flattened text of one table cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCellElement {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_span: Option<u32>,
}

/// An embedded image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageElement {
    pub content_type: String,
    pub base64_content: String,
    /// Width in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// A custom document property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataProperty {
    pub key: String,
    pub value: String,
}

/// Content of a document footer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FooterElement {
    pub children: Vec<DocumentElement>,
}

/// The parsed intermediate form of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedDocument {
    /// Top-level body elements in document order.
    pub elements: Vec<DocumentElement>,
    pub footers: Vec<FooterElement>,
    pub properties: Vec<MetadataProperty>,
}

impl ConvertedDocument {
    /// The elements persisted for the document: body first, then footers.
    #[must_use]
    pub fn into_top_level(self) -> Vec<DocumentElement> {
        let mut elements = self.elements;
        elements.extend(self.footers.into_iter().map(DocumentElement::Footer));
        elements
    }

    /// Value of a custom property by key.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}
