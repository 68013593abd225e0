//! `.docx` package reader.
//!
//! Opens the zip container, resolves the main document relationships and
//! assembles a [`RawDocument`]:
//!
//! ```text
//! [Content_Types].xml             content types (image fallback: extension)
//! word/document.xml               body
//! word/styles.xml                 named styles (optional)
//! word/_rels/document.xml.rels    image and footer relationships
//! word/footerN.xml                footers, ordered by part name
//! docProps/custom.xml             custom properties (optional)
//! ```

use std::collections::HashMap;
use std::io::{Read, Seek};

use zip::ZipArchive;

use crate::document::{ImageData, ImageTable, RawDocument};
use crate::error::OoxmlError;
use crate::reader::{read_blocks, read_body};
use crate::styles::StyleTable;
use crate::tree::XmlNode;
use crate::xml::XmlParser;

const DOCUMENT_PART: &str = "word/document.xml";
const STYLES_PART: &str = "word/styles.xml";
const DOCUMENT_RELS_PART: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";
const CUSTOM_PROPERTIES_PART: &str = "docProps/custom.xml";

/// Relationship type suffixes (the full URI differs between strict and transitional).
const IMAGE_REL: &str = "/image";
const FOOTER_REL: &str = "/footer";

/// A package relationship from `document.xml.rels`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    id: String,
    kind: String,
    /// Part name resolved against `word/`.
    part: String,
}

/// Reader over an opened `.docx` archive.
pub struct DocxPackage<R: Read + Seek> {
    archive: ZipArchive<R>,
    parser: XmlParser,
}

impl<R: Read + Seek> DocxPackage<R> {
    /// Open a package from a seekable reader.
    ///
    /// # Errors
    ///
    /// Returns [`OoxmlError::Archive`] if the data is not a zip archive.
    pub fn open(reader: R) -> Result<Self, OoxmlError> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
            parser: XmlParser::new(),
        })
    }

    /// Read the whole package into a raw document tree.
    ///
    /// # Errors
    ///
    /// Fails if the main document part is missing or any XML part is malformed.
    pub fn read(&mut self) -> Result<RawDocument, OoxmlError> {
        let document_xml = self
            .read_text(DOCUMENT_PART)?
            .ok_or_else(|| OoxmlError::MissingPart(DOCUMENT_PART.to_owned()))?;
        let body = read_body(&self.parser.parse(&document_xml)?);

        let styles = match self.read_text(STYLES_PART)? {
            Some(xml) => StyleTable::from_xml(&self.parser.parse(&xml)?),
            None => StyleTable::new(),
        };

        let relationships = self.relationships()?;
        let content_types = self.content_types()?;

        let mut images = ImageTable::new();
        for rel in relationships.iter().filter(|r| r.kind.ends_with(IMAGE_REL)) {
            let Some(bytes) = self.read_bytes(&rel.part)? else {
                tracing::warn!(part = %rel.part, "Image part referenced but missing");
                continue;
            };
            let content_type = content_types.resolve(&rel.part);
            images.insert(rel.id.clone(), ImageData { bytes, content_type });
        }

        let mut footer_parts: Vec<&str> = relationships
            .iter()
            .filter(|r| r.kind.ends_with(FOOTER_REL))
            .map(|r| r.part.as_str())
            .collect();
        footer_parts.sort_unstable();
        footer_parts.dedup();
        let mut footers = Vec::with_capacity(footer_parts.len());
        for part in footer_parts {
            if let Some(xml) = self.read_text(part)? {
                footers.push(read_blocks(&self.parser.parse(&xml)?));
            }
        }

        let properties = match self.read_text(CUSTOM_PROPERTIES_PART)? {
            Some(xml) => custom_properties(&self.parser.parse(&xml)?),
            None => Vec::new(),
        };

        tracing::debug!(
            blocks = body.len(),
            footers = footers.len(),
            images = images.len(),
            styles = styles.len(),
            "Read document package"
        );

        Ok(RawDocument {
            body,
            footers,
            styles,
            images,
            properties,
        })
    }

    fn relationships(&mut self) -> Result<Vec<Relationship>, OoxmlError> {
        let Some(xml) = self.read_text(DOCUMENT_RELS_PART)? else {
            return Ok(Vec::new());
        };
        let root = self.parser.parse(&xml)?;
        Ok(root
            .children_named("Relationship")
            .filter(|rel| rel.attr("TargetMode") != Some("External"))
            .filter_map(|rel| {
                Some(Relationship {
                    id: rel.attr("Id")?.to_owned(),
                    kind: rel.attr("Type")?.to_owned(),
                    part: resolve_target("word", rel.attr("Target")?),
                })
            })
            .collect())
    }

    fn content_types(&mut self) -> Result<ContentTypes, OoxmlError> {
        match self.read_text(CONTENT_TYPES_PART)? {
            Some(xml) => Ok(ContentTypes::from_xml(&self.parser.parse(&xml)?)),
            None => Ok(ContentTypes::default()),
        }
    }

    fn read_bytes(&mut self, part: &str) -> Result<Option<Vec<u8>>, OoxmlError> {
        let mut file = match self.archive.by_name(part) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    fn read_text(&mut self, part: &str) -> Result<Option<String>, OoxmlError> {
        self.read_bytes(part)?
            .map(|bytes| String::from_utf8(bytes).map_err(|e| OoxmlError::from(e.utf8_error())))
            .transpose()
    }
}

/// Resolve a relationship target against the source part's directory.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_owned();
    }
    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }
    segments.join("/")
}

/// Content types declared in `[Content_Types].xml`.
#[derive(Debug, Default)]
struct ContentTypes {
    defaults: HashMap<String, String>,
    overrides: HashMap<String, String>,
}

impl ContentTypes {
    fn from_xml(root: &XmlNode) -> Self {
        let mut types = Self::default();
        for node in &root.children {
            match (node.local_name(), node.attr("ContentType")) {
                ("Default", Some(ct)) => {
                    if let Some(ext) = node.attr("Extension") {
                        types.defaults.insert(ext.to_ascii_lowercase(), ct.to_owned());
                    }
                }
                ("Override", Some(ct)) => {
                    if let Some(part) = node.attr("PartName") {
                        types
                            .overrides
                            .insert(part.trim_start_matches('/').to_owned(), ct.to_owned());
                    }
                }
                _ => {}
            }
        }
        types
    }

    fn resolve(&self, part: &str) -> String {
        if let Some(ct) = self.overrides.get(part) {
            return ct.clone();
        }
        let ext = part
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        self.defaults
            .get(&ext)
            .cloned()
            .unwrap_or_else(|| content_type_for_extension(&ext).to_owned())
    }
}

fn content_type_for_extension(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "application/octet-stream",
    }
}

/// Name/value pairs of `docProps/custom.xml`.
fn custom_properties(root: &XmlNode) -> Vec<(String, String)> {
    root.children_named("property")
        .filter_map(|property| {
            let name = property.attr("name")?;
            let value = property
                .children
                .first()
                .map(XmlNode::text_content)
                .unwrap_or_default();
            Some((name.to_owned(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use pretty_assertions::assert_eq;
    use zip::write::SimpleFileOptions;

    use super::*;
    use crate::document::RawBlock;

    fn build_package(parts: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in parts {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        let mut cursor = writer.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:pPr><w:pStyle w:val="RandNummer"/></w:pPr><w:r><w:t>1</w:t></w:r></w:p>
<w:p><w:r><w:t>Text</w:t></w:r></w:p>
</w:body></w:document>"#;

    const RELS: &str = r#"<Relationships>
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
<Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
<Relationship Id="rId6" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image2.jpeg"/>
<Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer2.xml"/>
<Relationship Id="rId8" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>
<Relationship Id="rId10" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;

    const CONTENT_TYPES: &str = r#"<Types>
<Default Extension="png" ContentType="image/png"/>
<Default Extension="xml" ContentType="application/xml"/>
</Types>"#;

    const CUSTOM: &str = r#"<Properties xmlns:vt="urn:vt">
<property fmtid="{D5CDD505}" pid="2" name="Gericht"><vt:lpwstr>BGH</vt:lpwstr></property>
<property fmtid="{D5CDD505}" pid="3" name="Aktenzeichen"><vt:lpwstr>IX ZR 1/24</vt:lpwstr></property>
</Properties>"#;

    #[test]
    fn test_read_full_package() {
        let cursor = build_package(&[
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("word/document.xml", DOCUMENT.as_bytes()),
            ("word/_rels/document.xml.rels", RELS.as_bytes()),
            (
                "word/styles.xml",
                br#"<w:styles><w:style w:styleId="RandNummer"><w:name w:val="RandNummer"/></w:style></w:styles>"#,
            ),
            ("word/media/image1.png", &[0x89, 0x50, 0x4e, 0x47]),
            ("word/media/image2.jpeg", &[0xff, 0xd8]),
            ("word/footer1.xml", b"<w:ftr><w:p><w:r><w:t>Seite 1</w:t></w:r></w:p></w:ftr>"),
            ("word/footer2.xml", b"<w:ftr><w:p><w:r><w:t>Seite 2</w:t></w:r></w:p></w:ftr>"),
            ("docProps/custom.xml", CUSTOM.as_bytes()),
        ]);

        let document = DocxPackage::open(cursor).unwrap().read().unwrap();

        assert_eq!(document.body.len(), 2);
        assert!(document.styles.get("RandNummer").is_some());

        let png = document.images.get("rId5").unwrap();
        assert_eq!(png.content_type, "image/png");
        assert_eq!(png.bytes, vec![0x89, 0x50, 0x4e, 0x47]);
        assert_eq!(document.images.get("rId6").unwrap().content_type, "image/jpeg");

        assert_eq!(document.footers.len(), 2);
        let RawBlock::Paragraph(first) = &document.footers[0][0] else {
            panic!("expected paragraph");
        };
        assert!(first.runs[0].has_text());

        assert_eq!(
            document.properties,
            vec![
                ("Gericht".to_owned(), "BGH".to_owned()),
                ("Aktenzeichen".to_owned(), "IX ZR 1/24".to_owned()),
            ]
        );
    }

    #[test]
    fn test_minimal_package() {
        let cursor = build_package(&[("word/document.xml", DOCUMENT.as_bytes())]);

        let document = DocxPackage::open(cursor).unwrap().read().unwrap();

        assert_eq!(document.body.len(), 2);
        assert!(document.styles.is_empty());
        assert!(document.images.is_empty());
        assert!(document.footers.is_empty());
    }

    #[test]
    fn test_missing_document_part() {
        let cursor = build_package(&[("word/styles.xml", b"<w:styles/>")]);

        let result = DocxPackage::open(cursor).unwrap().read();

        assert!(matches!(result, Err(OoxmlError::MissingPart(part)) if part == DOCUMENT_PART));
    }

    #[test]
    fn test_not_an_archive() {
        let result = DocxPackage::open(Cursor::new(b"plain text".to_vec()));

        assert!(matches!(result, Err(OoxmlError::Archive(_))));
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("word", "media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_target("word", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("word", "/word/media/a.png"), "word/media/a.png");
        assert_eq!(resolve_target("word", "./footer1.xml"), "word/footer1.xml");
    }

    #[test]
    fn test_content_type_fallback() {
        let types = ContentTypes::default();

        assert_eq!(types.resolve("word/media/a.JPG"), "image/jpeg");
        assert_eq!(types.resolve("word/media/a.emf"), "image/x-emf");
        assert_eq!(types.resolve("word/media/a"), "application/octet-stream");
    }
}
