//! Raw document tree to element model.
//!
//! The parser receives the document's lookup tables as read-only context
//! and produces exactly one element per block. Any structural violation
//! fails the whole document.

use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use docunit_ooxml::{
    ImageTable, Placement, RawBlock, RawDocument, RawDrawing, RawParagraph, RawRun,
    RawRunContent, RawTable, StyleTable,
};

use crate::error::ConversionError;
use crate::model::{
    BorderNumberElement, ConvertedDocument, DocumentElement, FooterElement, ImageElement,
    MetadataProperty, ParagraphElement, RunElement, TableCellElement, TableElement, TextElement,
};
use crate::style::StyleResolver;

/// Paragraph style id that marks a border number.
pub const DEFAULT_BORDER_NUMBER_STYLE: &str = "RandNummer";

/// EMU per pixel at 96 dpi.
const EMU_PER_PIXEL: u64 = 9525;

/// Parser settings.
#[derive(Debug, Clone)]
pub struct ParserOptions {
    /// Paragraph style id that marks a border number.
    pub border_number_style: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            border_number_style: DEFAULT_BORDER_NUMBER_STYLE.to_owned(),
        }
    }
}

/// Parse a whole raw document into its intermediate form.
///
/// # Errors
///
/// Returns the first [`ConversionError`] found anywhere in the document.
pub fn convert(
    document: &RawDocument,
    options: &ParserOptions,
) -> Result<ConvertedDocument, ConversionError> {
    let parser = ElementParser::new(&document.styles, &document.images, options);

    let elements = document
        .body
        .iter()
        .map(|block| parser.parse_block(block))
        .collect::<Result<Vec<_>, _>>()?;

    let footers = document
        .footers
        .iter()
        .map(|blocks| parser.parse_footer(blocks))
        .collect::<Result<Vec<_>, _>>()?;

    let properties = document
        .properties
        .iter()
        .map(|(key, value)| MetadataProperty {
            key: key.clone(),
            value: value.clone(),
        })
        .collect();

    tracing::debug!(
        elements = elements.len(),
        footers = footers.len(),
        "Converted document"
    );

    Ok(ConvertedDocument {
        elements,
        footers,
        properties,
    })
}

/// Builds elements from raw blocks.
pub struct ElementParser<'a> {
    resolver: StyleResolver<'a>,
    images: &'a ImageTable,
    options: &'a ParserOptions,
}

impl<'a> ElementParser<'a> {
    #[must_use]
    pub fn new(styles: &'a StyleTable, images: &'a ImageTable, options: &'a ParserOptions) -> Self {
        Self {
            resolver: StyleResolver::new(styles),
            images,
            options,
        }
    }

    /// Parse one body block.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] for malformed drawings or unresolved images.
    pub fn parse_block(&self, block: &RawBlock) -> Result<DocumentElement, ConversionError> {
        match block {
            RawBlock::Table(table) => Ok(DocumentElement::Table(flatten_table(table))),
            RawBlock::Paragraph(p) if self.is_border_number(p) => {
                Ok(DocumentElement::BorderNumber(parse_border_number(p)))
            }
            RawBlock::Paragraph(p) => self.parse_paragraph(p).map(DocumentElement::Paragraph),
        }
    }

    /// Parse the blocks of a footer part.
    ///
    /// # Errors
    ///
    /// Same conditions as [`parse_block`](Self::parse_block).
    pub fn parse_footer(&self, blocks: &[RawBlock]) -> Result<FooterElement, ConversionError> {
        let children = blocks
            .iter()
            .map(|block| self.parse_block(block))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FooterElement { children })
    }

    /// A marker needs the reserved style and either text or paragraph properties without runs.
    fn is_border_number(&self, p: &RawParagraph) -> bool {
        let has_content =
            p.runs.iter().any(RawRun::has_text) || (p.runs.is_empty() && p.has_properties);
        has_content && p.style_id.as_deref() == Some(self.options.border_number_style.as_str())
    }

    fn parse_paragraph(&self, p: &RawParagraph) -> Result<ParagraphElement, ConversionError> {
        let mut runs = Vec::new();
        for run in &p.runs {
            self.parse_run(run, &mut runs)?;
        }
        let clearfix = runs
            .iter()
            .any(|run| matches!(run, RunElement::InlineImage(_)));

        Ok(ParagraphElement {
            styles: self.resolver.paragraph_styles(p),
            runs,
            clearfix,
        })
    }

    fn parse_run(&self, run: &RawRun, out: &mut Vec<RunElement>) -> Result<(), ConversionError> {
        let styles = self.resolver.run_styles(run);
        let mut text = String::new();

        for content in &run.content {
            match content {
                RawRunContent::Text(t) => text.push_str(t),
                RawRunContent::Tab => {
                    flush_text(&mut text, &styles, out);
                    out.push(RunElement::Tab);
                }
                RawRunContent::Drawing(drawing) => {
                    flush_text(&mut text, &styles, out);
                    out.push(RunElement::InlineImage(self.parse_drawing(drawing)?));
                }
            }
        }
        flush_text(&mut text, &styles, out);
        Ok(())
    }

    fn parse_drawing(&self, drawing: &RawDrawing) -> Result<ImageElement, ConversionError> {
        let graphic = match drawing.graphics.as_slice() {
            [] => return Err(ConversionError::NoGraphicData),
            [graphic] => graphic,
            _ => return Err(ConversionError::MultipleGraphics),
        };
        if graphic.placement != Placement::Inline {
            return Err(ConversionError::UnsupportedDrawing);
        }

        let data = graphic
            .data
            .as_ref()
            .ok_or(ConversionError::NoGraphicData)?;
        let embed = data
            .picture
            .as_ref()
            .and_then(|picture| picture.embed.as_deref())
            .ok_or(ConversionError::NotAPicture)?;
        let image = self
            .images
            .get(embed)
            .ok_or_else(|| ConversionError::MissingImage(embed.to_owned()))?;

        let (width, height) = graphic.extent.map_or((None, None), |(cx, cy)| {
            (emu_to_pixels(cx), emu_to_pixels(cy))
        });

        Ok(ImageElement {
            content_type: image.content_type.clone(),
            base64_content: BASE64_STANDARD.encode(&image.bytes),
            width,
            height,
        })
    }
}

/// The number text is the concatenation of every text run, in order.
fn parse_border_number(p: &RawParagraph) -> BorderNumberElement {
    let mut number = String::new();
    for run in &p.runs {
        for content in &run.content {
            if let RawRunContent::Text(text) = content {
                number.push_str(text);
            }
        }
    }
    BorderNumberElement::new(escape(&number))
}

fn flatten_table(table: &RawTable) -> TableElement {
    let cells = table
        .rows
        .iter()
        .flat_map(|row| &row.cells)
        .map(|cell| {
            let mut text = String::new();
            collect_text(&cell.blocks, &mut text);
            TableCellElement {
                text: escape(&text),
                column_span: cell.grid_span,
            }
        })
        .collect();
    TableElement { cells }
}

/// Text of blocks in paragraph-then-run order, descending into nested tables.
fn collect_text(blocks: &[RawBlock], out: &mut String) {
    for block in blocks {
        match block {
            RawBlock::Paragraph(p) => {
                for run in &p.runs {
                    for content in &run.content {
                        if let RawRunContent::Text(text) = content {
                            out.push_str(text);
                        }
                    }
                }
            }
            RawBlock::Table(table) => {
                for cell in table.rows.iter().flat_map(|row| &row.cells) {
                    collect_text(&cell.blocks, out);
                }
            }
        }
    }
}

fn flush_text(text: &mut String, styles: &crate::style::Styles, out: &mut Vec<RunElement>) {
    if text.is_empty() {
        return;
    }
    out.push(RunElement::Text(TextElement {
        content: escape(text),
        styles: styles.clone(),
    }));
    text.clear();
}

fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

fn emu_to_pixels(emu: u64) -> Option<u32> {
    u32::try_from(emu / EMU_PER_PIXEL).ok()
}

#[cfg(test)]
mod tests {
    use docunit_ooxml::{
        ImageData, NamedStyle, RawGraphic, RawGraphicData, RawPicture, RawTableCell, RawTableRow,
        RunProperties,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::style::Styles;

    const PICTURE_URI: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

    fn text_run(text: &str) -> RawRun {
        RawRun {
            content: vec![RawRunContent::Text(text.to_owned())],
            ..Default::default()
        }
    }

    fn paragraph(runs: Vec<RawRun>) -> RawParagraph {
        RawParagraph {
            runs,
            ..Default::default()
        }
    }

    fn marker(runs: Vec<RawRun>) -> RawParagraph {
        RawParagraph {
            style_id: Some(DEFAULT_BORDER_NUMBER_STYLE.to_owned()),
            has_properties: true,
            runs,
            ..Default::default()
        }
    }

    fn picture(placement: Placement, embed: &str) -> RawGraphic {
        RawGraphic {
            placement,
            extent: Some((952_500, 476_250)),
            data: Some(RawGraphicData {
                uri: PICTURE_URI.to_owned(),
                picture: Some(RawPicture {
                    embed: Some(embed.to_owned()),
                }),
            }),
        }
    }

    fn drawing_run(graphics: Vec<RawGraphic>) -> RawRun {
        RawRun {
            content: vec![RawRunContent::Drawing(RawDrawing { graphics })],
            ..Default::default()
        }
    }

    fn document(body: Vec<RawBlock>) -> RawDocument {
        RawDocument {
            body,
            images: ImageTable::new().with_image(
                "rId1",
                ImageData {
                    bytes: b"png".to_vec(),
                    content_type: "image/png".to_owned(),
                },
            ),
            ..Default::default()
        }
    }

    fn convert_default(body: Vec<RawBlock>) -> Result<ConvertedDocument, ConversionError> {
        convert(&document(body), &ParserOptions::default())
    }

    #[test]
    fn test_border_number_then_paragraph() {
        let result = convert_default(vec![
            RawBlock::Paragraph(marker(vec![text_run("12"), text_run("a")])),
            RawBlock::Paragraph(paragraph(vec![text_run("Hello")])),
        ])
        .unwrap();

        assert_eq!(
            result.elements,
            vec![
                DocumentElement::BorderNumber(BorderNumberElement::new("12a")),
                DocumentElement::Paragraph(ParagraphElement::from_text("Hello")),
            ]
        );
    }

    #[test]
    fn test_marker_style_without_text_is_paragraph() {
        let result = convert_default(vec![RawBlock::Paragraph(marker(vec![RawRun {
            content: vec![RawRunContent::Tab],
            ..Default::default()
        }]))])
        .unwrap();

        assert!(matches!(result.elements[0], DocumentElement::Paragraph(_)));
    }

    #[test]
    fn test_marker_without_runs_but_with_properties() {
        let result = convert_default(vec![RawBlock::Paragraph(marker(Vec::new()))]).unwrap();

        assert_eq!(
            result.elements[0],
            DocumentElement::BorderNumber(BorderNumberElement::new(""))
        );
    }

    #[test]
    fn test_marker_without_runs_and_without_properties_is_paragraph() {
        let mut p = marker(Vec::new());
        p.has_properties = false;

        let result = convert_default(vec![RawBlock::Paragraph(p)]).unwrap();

        assert!(matches!(result.elements[0], DocumentElement::Paragraph(_)));
    }

    #[test]
    fn test_custom_marker_style() {
        let mut p = marker(vec![text_run("1")]);
        p.style_id = Some("Rn".to_owned());
        let options = ParserOptions {
            border_number_style: "Rn".to_owned(),
        };

        let result = convert(&document(vec![RawBlock::Paragraph(p)]), &options).unwrap();

        assert!(result.elements[0].is_border_number());
    }

    #[test]
    fn test_text_is_escaped() {
        let result =
            convert_default(vec![RawBlock::Paragraph(paragraph(vec![text_run("a < b & c")]))])
                .unwrap();

        let p = result.elements[0].as_paragraph().unwrap();
        assert_eq!(p.text(), "a &lt; b &amp; c");
    }

    #[test]
    fn test_run_and_paragraph_styles_stay_separate() {
        let mut p = paragraph(vec![RawRun {
            properties: RunProperties {
                bold: Some(true),
                ..Default::default()
            },
            content: vec![RawRunContent::Text("x".to_owned())],
            ..Default::default()
        }]);
        p.run_properties.size = Some(24);
        p.alignment = Some("center".to_owned());

        let result = convert_default(vec![RawBlock::Paragraph(p)]).unwrap();
        let p = result.elements[0].as_paragraph().unwrap();

        assert_eq!(p.styles.to_css(), "font-size: 12pt; text-align: center;");
        let RunElement::Text(text) = &p.runs[0] else {
            panic!("expected text run");
        };
        assert_eq!(text.styles, Styles::new().with("font-weight", "bold"));
    }

    #[test]
    fn test_run_named_style() {
        let mut doc = document(vec![RawBlock::Paragraph(paragraph(vec![RawRun {
            style_id: Some("Strong".to_owned()),
            content: vec![RawRunContent::Text("x".to_owned())],
            ..Default::default()
        }]))]);
        doc.styles = StyleTable::new().with_style(
            "Strong",
            NamedStyle {
                run: RunProperties {
                    underline: Some("single".to_owned()),
                    ..Default::default()
                },
                ..Default::default()
            },
        );

        let result = convert(&doc, &ParserOptions::default()).unwrap();
        let p = result.elements[0].as_paragraph().unwrap();

        assert!(p.styles.is_empty());
        let RunElement::Text(text) = &p.runs[0] else {
            panic!("expected text run");
        };
        assert_eq!(text.styles.to_css(), "text-decoration: underline;");
    }

    #[test]
    fn test_tabs_split_text() {
        let run = RawRun {
            content: vec![
                RawRunContent::Text("a".to_owned()),
                RawRunContent::Tab,
                RawRunContent::Text("b".to_owned()),
                RawRunContent::Text("c".to_owned()),
            ],
            ..Default::default()
        };

        let result = convert_default(vec![RawBlock::Paragraph(paragraph(vec![run]))]).unwrap();
        let p = result.elements[0].as_paragraph().unwrap();

        assert_eq!(
            p.runs,
            vec![
                RunElement::Text(TextElement::new("a")),
                RunElement::Tab,
                RunElement::Text(TextElement::new("bc")),
            ]
        );
    }

    #[test]
    fn test_inline_image() {
        let result = convert_default(vec![RawBlock::Paragraph(paragraph(vec![drawing_run(
            vec![picture(Placement::Inline, "rId1")],
        )]))])
        .unwrap();
        let p = result.elements[0].as_paragraph().unwrap();

        assert!(p.clearfix);
        assert_eq!(
            p.runs,
            vec![RunElement::InlineImage(ImageElement {
                content_type: "image/png".to_owned(),
                base64_content: "cG5n".to_owned(),
                width: Some(100),
                height: Some(50),
            })]
        );
    }

    #[test]
    fn test_two_graphics_fail() {
        let result = convert_default(vec![
            RawBlock::Paragraph(paragraph(vec![text_run("ok")])),
            RawBlock::Paragraph(paragraph(vec![drawing_run(vec![
                picture(Placement::Inline, "rId1"),
                picture(Placement::Anchor, "rId1"),
            ])])),
        ]);

        assert_eq!(result, Err(ConversionError::MultipleGraphics));
    }

    #[test]
    fn test_anchored_drawing_fails() {
        let result = convert_default(vec![RawBlock::Paragraph(paragraph(vec![drawing_run(
            vec![picture(Placement::Anchor, "rId1")],
        )]))]);

        assert_eq!(result, Err(ConversionError::UnsupportedDrawing));
    }

    #[test]
    fn test_drawing_without_graphic_data_fails() {
        let mut graphic = picture(Placement::Inline, "rId1");
        graphic.data = None;

        let result =
            convert_default(vec![RawBlock::Paragraph(paragraph(vec![drawing_run(vec![graphic])]))]);

        assert_eq!(result, Err(ConversionError::NoGraphicData));
    }

    #[test]
    fn test_empty_drawing_fails() {
        let result =
            convert_default(vec![RawBlock::Paragraph(paragraph(vec![drawing_run(Vec::new())]))]);

        assert_eq!(result, Err(ConversionError::NoGraphicData));
    }

    #[test]
    fn test_non_picture_fails() {
        let mut graphic = picture(Placement::Inline, "rId1");
        graphic.data = Some(RawGraphicData {
            uri: "http://schemas.openxmlformats.org/drawingml/2006/chart".to_owned(),
            picture: None,
        });

        let result =
            convert_default(vec![RawBlock::Paragraph(paragraph(vec![drawing_run(vec![graphic])]))]);

        assert_eq!(result, Err(ConversionError::NotAPicture));
    }

    #[test]
    fn test_unresolved_image_fails() {
        let result = convert_default(vec![RawBlock::Paragraph(paragraph(vec![drawing_run(
            vec![picture(Placement::Inline, "rId99")],
        )]))]);

        assert_eq!(
            result,
            Err(ConversionError::MissingImage("rId99".to_owned()))
        );
    }

    #[test]
    fn test_table_is_flattened() {
        let nested = RawTable {
            rows: vec![RawTableRow {
                cells: vec![RawTableCell {
                    grid_span: None,
                    blocks: vec![RawBlock::Paragraph(paragraph(vec![text_run("inner")]))],
                }],
            }],
        };
        let table = RawTable {
            rows: vec![
                RawTableRow {
                    cells: vec![
                        RawTableCell {
                            grid_span: Some(2),
                            blocks: vec![
                                RawBlock::Paragraph(paragraph(vec![text_run("a"), text_run("b")])),
                                RawBlock::Paragraph(paragraph(vec![text_run("c")])),
                            ],
                        },
                        RawTableCell {
                            grid_span: None,
                            blocks: vec![RawBlock::Table(nested)],
                        },
                    ],
                },
                RawTableRow {
                    cells: vec![RawTableCell {
                        grid_span: None,
                        blocks: vec![RawBlock::Paragraph(paragraph(vec![text_run("d")]))],
                    }],
                },
            ],
        };

        let result = convert_default(vec![RawBlock::Table(table)]).unwrap();

        assert_eq!(
            result.elements[0],
            DocumentElement::Table(TableElement {
                cells: vec![
                    TableCellElement {
                        text: "abc".to_owned(),
                        column_span: Some(2),
                    },
                    TableCellElement {
                        text: "inner".to_owned(),
                        column_span: None,
                    },
                    TableCellElement {
                        text: "d".to_owned(),
                        column_span: None,
                    },
                ],
            })
        );
    }

    #[test]
    fn test_footers_and_properties() {
        let mut doc = document(Vec::new());
        doc.footers = vec![vec![RawBlock::Paragraph(paragraph(vec![text_run("Seite")]))]];
        doc.properties = vec![("Gericht".to_owned(), "BGH".to_owned())];

        let result = convert(&doc, &ParserOptions::default()).unwrap();

        assert_eq!(result.footers.len(), 1);
        assert_eq!(
            result.footers[0].children,
            vec![DocumentElement::Paragraph(ParagraphElement::from_text("Seite"))]
        );
        assert_eq!(result.property("Gericht"), Some("BGH"));
    }

    #[test]
    fn test_property_values_stay_raw_until_rendered() {
        let mut doc = document(Vec::new());
        doc.properties = vec![("Titel".to_owned(), "A & \"B\"".to_owned())];

        let result = convert(&doc, &ParserOptions::default()).unwrap();

        assert_eq!(result.property("Titel"), Some("A & \"B\""));
    }

    #[test]
    fn test_failing_footer_fails_document() {
        let mut doc = document(vec![RawBlock::Paragraph(paragraph(vec![text_run("ok")]))]);
        doc.footers = vec![vec![RawBlock::Paragraph(paragraph(vec![drawing_run(vec![
            picture(Placement::Anchor, "rId1"),
        ])]))]];

        let result = convert(&doc, &ParserOptions::default());

        assert_eq!(result, Err(ConversionError::UnsupportedDrawing));
    }
}
