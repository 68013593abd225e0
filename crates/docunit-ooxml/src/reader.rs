//! Conversion of WordprocessingML element trees into raw document nodes.

use crate::document::{
    Placement, RawBlock, RawDrawing, RawGraphic, RawGraphicData, RawParagraph, RawPicture,
    RawRun, RawRunContent, RawTable, RawTableCell, RawTableRow,
};
use crate::styles::parse_run_properties;
use crate::tree::XmlNode;

/// Read the body blocks of a `w:document` root.
///
/// Returns an empty list when the document has no body.
#[must_use]
pub fn read_body(document: &XmlNode) -> Vec<RawBlock> {
    document.child("body").map(read_blocks).unwrap_or_default()
}

/// Read the blocks of a container (`w:body`, `w:tc`, `w:ftr`, `w:sdtContent`).
#[must_use]
pub fn read_blocks(container: &XmlNode) -> Vec<RawBlock> {
    let mut blocks = Vec::new();
    collect_blocks(container, &mut blocks);
    blocks
}

fn collect_blocks(container: &XmlNode, blocks: &mut Vec<RawBlock>) {
    for node in &container.children {
        match node.local_name() {
            "p" => blocks.push(RawBlock::Paragraph(read_paragraph(node))),
            "tbl" => blocks.push(RawBlock::Table(read_table(node))),
            "sdt" => {
                if let Some(content) = node.child("sdtContent") {
                    collect_blocks(content, blocks);
                }
            }
            _ => {}
        }
    }
}

/// Read a `w:p` element.
#[must_use]
pub fn read_paragraph(p: &XmlNode) -> RawParagraph {
    let ppr = p.child("pPr");
    let mut runs = Vec::new();
    collect_runs(p, &mut runs);

    RawParagraph {
        style_id: ppr.and_then(|ppr| ppr.child_val("pStyle")).map(str::to_owned),
        alignment: ppr.and_then(|ppr| ppr.child_val("jc")).map(str::to_owned),
        run_properties: ppr
            .and_then(|ppr| ppr.child("rPr"))
            .map(parse_run_properties)
            .unwrap_or_default(),
        has_properties: ppr.is_some(),
        runs,
    }
}

/// Collect runs, flattening inline wrappers in document order.
fn collect_runs(container: &XmlNode, runs: &mut Vec<RawRun>) {
    for node in &container.children {
        match node.local_name() {
            "r" => runs.push(read_run(node)),
            "hyperlink" | "ins" | "smartTag" | "fldSimple" | "customXml" => {
                collect_runs(node, runs);
            }
            "sdt" => {
                if let Some(content) = node.child("sdtContent") {
                    collect_runs(content, runs);
                }
            }
            _ => {}
        }
    }
}

fn read_run(r: &XmlNode) -> RawRun {
    let rpr = r.child("rPr");
    let mut content = Vec::new();
    collect_run_content(r, &mut content);

    RawRun {
        style_id: rpr.and_then(|rpr| rpr.child_val("rStyle")).map(str::to_owned),
        properties: rpr.map(parse_run_properties).unwrap_or_default(),
        content,
    }
}

fn collect_run_content(container: &XmlNode, content: &mut Vec<RawRunContent>) {
    for node in &container.children {
        match node.local_name() {
            "t" => content.push(RawRunContent::Text(node.text.clone())),
            "tab" => content.push(RawRunContent::Tab),
            "drawing" => content.push(RawRunContent::Drawing(read_drawing(node))),
            "AlternateContent" => {
                if let Some(choice) = node.child("Choice") {
                    collect_run_content(choice, content);
                }
            }
            _ => {}
        }
    }
}

fn read_drawing(drawing: &XmlNode) -> RawDrawing {
    let graphics = drawing
        .children
        .iter()
        .filter_map(|node| {
            let placement = match node.local_name() {
                "inline" => Placement::Inline,
                "anchor" => Placement::Anchor,
                _ => return None,
            };
            Some(RawGraphic {
                placement,
                extent: node.child("extent").and_then(read_extent),
                data: node
                    .child("graphic")
                    .and_then(|g| g.child("graphicData"))
                    .map(read_graphic_data),
            })
        })
        .collect();
    RawDrawing { graphics }
}

fn read_extent(extent: &XmlNode) -> Option<(u64, u64)> {
    let cx = extent.attr("cx")?.parse().ok()?;
    let cy = extent.attr("cy")?.parse().ok()?;
    Some((cx, cy))
}

fn read_graphic_data(data: &XmlNode) -> RawGraphicData {
    RawGraphicData {
        uri: data.attr("uri").unwrap_or_default().to_owned(),
        picture: data.child("pic").map(|pic| RawPicture {
            embed: pic
                .child("blipFill")
                .and_then(|fill| fill.child("blip"))
                .and_then(|blip| blip.attr("embed"))
                .map(str::to_owned),
        }),
    }
}

fn read_table(tbl: &XmlNode) -> RawTable {
    RawTable {
        rows: tbl
            .children_named("tr")
            .map(|tr| RawTableRow {
                cells: tr
                    .children_named("tc")
                    .map(|tc| RawTableCell {
                        grid_span: tc
                            .child("tcPr")
                            .and_then(|pr| pr.child_val("gridSpan"))
                            .and_then(|v| v.parse().ok()),
                        blocks: read_blocks(tc),
                    })
                    .collect(),
            })
            .collect(),
    }
}
