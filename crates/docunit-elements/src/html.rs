//! HTML serialization of the element model.
//!
//! Rendering is pure: the output depends only on the element and the
//! optional identity token. Text content is written as-is because it was
//! escaped when the element was parsed.

use std::fmt::Write;

use crate::model::{
    BorderNumberElement, DocumentElement, FooterElement, ImageElement, MetadataProperty,
    ParagraphElement, RunElement, TableCellElement, TableElement,
};

/// Identity attribute written on every element that carries an id.
pub const ID_ATTRIBUTE: &str = "data-id";

/// Non-breaking spaces standing in for a tab stop.
const TAB: &str = "&nbsp;&nbsp;&nbsp;&nbsp;";

const TABLE_STYLE: &str = "border-collapse: collapse;";
const CELL_STYLE: &str = "min-width: 5px; padding: 12px;";

/// Serializes elements to HTML fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render an element without an identity attribute.
    #[must_use]
    pub fn render(&self, element: &DocumentElement) -> String {
        self.render_with_id(element, None)
    }

    /// Render an element, embedding `id` when the element carries identity.
    ///
    /// The id is ignored for elements without identity (tables, images, ...).
    #[must_use]
    pub fn render_with_id(&self, element: &DocumentElement, id: Option<&str>) -> String {
        let mut out = String::new();
        self.write_element(&mut out, element, id);
        out
    }

    fn write_element(&self, out: &mut String, element: &DocumentElement, id: Option<&str>) {
        match element {
            DocumentElement::Paragraph(p) => write_paragraph(out, p, id),
            DocumentElement::Run(run) => write_run(out, run),
            DocumentElement::BorderNumber(b) => self.write_border_number(out, b, id),
            DocumentElement::Table(table) => write_table(out, table),
            DocumentElement::TableCell(cell) => write_cell(out, cell),
            DocumentElement::Image(image) => write_image(out, image),
            DocumentElement::Tab => out.push_str(TAB),
            DocumentElement::MetadataProperty(property) => write_meta(out, property),
            DocumentElement::Footer(footer) => self.write_footer(out, footer, id),
        }
    }

    fn write_border_number(&self, out: &mut String, b: &BorderNumberElement, id: Option<&str>) {
        out.push_str("<border-number");
        write_id(out, id);
        out.push('>');
        let _ = write!(out, "<number>{}</number>", b.number);
        if !b.children.is_empty() {
            out.push_str("<content>");
            self.write_children(out, &b.children);
            out.push_str("</content>");
        }
        out.push_str("</border-number>");
    }

    fn write_footer(&self, out: &mut String, footer: &FooterElement, id: Option<&str>) {
        out.push_str("<footer");
        write_id(out, id);
        out.push('>');
        self.write_children(out, &footer.children);
        out.push_str("</footer>");
    }

    /// Nested elements never carry identity of their own.
    fn write_children(&self, out: &mut String, children: &[DocumentElement]) {
        for child in children {
            self.write_element(out, child, None);
        }
    }
}

fn write_paragraph(out: &mut String, p: &ParagraphElement, id: Option<&str>) {
    out.push_str("<p");
    write_id(out, id);
    if p.clearfix {
        out.push_str(r#" class="clearfix""#);
    }
    out.push_str(&p.styles.to_attribute());
    out.push('>');
    for run in &p.runs {
        write_run(out, run);
    }
    out.push_str("</p>");
}

fn write_id(out: &mut String, id: Option<&str>) {
    if let Some(id) = id {
        let _ = write!(
            out,
            r#" {ID_ATTRIBUTE}="{}""#,
            html_escape::encode_double_quoted_attribute(id)
        );
    }
}

fn write_run(out: &mut String, run: &RunElement) {
    match run {
        RunElement::Text(text) if text.styles.is_empty() => out.push_str(&text.content),
        RunElement::Text(text) => {
            let _ = write!(
                out,
                "<span{}>{}</span>",
                text.styles.to_attribute(),
                text.content
            );
        }
        RunElement::InlineImage(image) => write_image(out, image),
        RunElement::Tab => out.push_str(TAB),
    }
}

fn write_image(out: &mut String, image: &ImageElement) {
    let _ = write!(
        out,
        r#"<img src="data:{};base64,{}""#,
        html_escape::encode_double_quoted_attribute(&image.content_type),
        image.base64_content
    );
    if let Some(width) = image.width {
        let _ = write!(out, r#" width="{width}""#);
    }
    if let Some(height) = image.height {
        let _ = write!(out, r#" height="{height}""#);
    }
    out.push_str(" />");
}

fn write_table(out: &mut String, table: &TableElement) {
    let _ = write!(out, r#"<table style="{TABLE_STYLE}"><tr>"#);
    for cell in &table.cells {
        write_cell(out, cell);
    }
    out.push_str("</tr></table>");
}

fn write_cell(out: &mut String, cell: &TableCellElement) {
    out.push_str("<td");
    if let Some(span) = cell.column_span {
        let _ = write!(out, r#" colspan="{span}""#);
    }
    let _ = write!(out, r#" style="{CELL_STYLE}">{}</td>"#, cell.text);
}

fn write_meta(out: &mut String, property: &MetadataProperty) {
    let _ = write!(
        out,
        r#"<meta name="{}" content="{}" />"#,
        html_escape::encode_double_quoted_attribute(&property.key),
        html_escape::encode_double_quoted_attribute(&property.value)
    );
}
