//! Named-style table (`word/styles.xml`).

use std::collections::{HashMap, HashSet};

use crate::document::RunProperties;
use crate::tree::XmlNode;

/// A named style definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedStyle {
    /// Display name (`w:name`).
    pub name: Option<String>,
    /// Parent style id (`w:basedOn`).
    pub based_on: Option<String>,
    /// Run properties defined directly on the style.
    pub run: RunProperties,
    /// Paragraph alignment defined directly on the style.
    pub alignment: Option<String>,
}

/// Named styles keyed by style id.
///
/// Property lookups follow the `basedOn` chain and return the first value
/// defined along it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleTable {
    styles: HashMap<String, NamedStyle>,
}

impl StyleTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a style.
    pub fn insert(&mut self, id: impl Into<String>, style: NamedStyle) {
        self.styles.insert(id.into(), style);
    }

    /// Builder variant of [`insert`](Self::insert).
    #[must_use]
    pub fn with_style(mut self, id: impl Into<String>, style: NamedStyle) -> Self {
        self.insert(id, style);
        self
    }

    /// Style defined directly under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&NamedStyle> {
        self.styles.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Effective run properties of a style, with inherited values filled in.
    ///
    /// Returns `None` when the style id is unknown.
    #[must_use]
    pub fn run_properties(&self, id: &str) -> Option<RunProperties> {
        self.get(id)?;
        Some(RunProperties {
            bold: self.inherited(id, |s| s.run.bold),
            size: self.inherited(id, |s| s.run.size),
            underline: self.inherited(id, |s| s.run.underline.clone()),
        })
    }

    /// Effective alignment of a style.
    #[must_use]
    pub fn alignment(&self, id: &str) -> Option<String> {
        self.inherited(id, |s| s.alignment.clone())
    }

    fn inherited<T>(&self, id: &str, pick: impl Fn(&NamedStyle) -> Option<T>) -> Option<T> {
        let mut visited = HashSet::new();
        let mut current = Some(id);
        while let Some(style_id) = current {
            if !visited.insert(style_id) {
                break;
            }
            let style = self.styles.get(style_id)?;
            if let Some(value) = pick(style) {
                return Some(value);
            }
            current = style.based_on.as_deref();
        }
        None
    }

    /// Build the table from a parsed `w:styles` element.
    #[must_use]
    pub fn from_xml(root: &XmlNode) -> Self {
        let mut table = Self::new();
        for style in root.children_named("style") {
            let Some(id) = style.attr("styleId") else {
                continue;
            };
            let named = NamedStyle {
                name: style.child_val("name").map(str::to_owned),
                based_on: style.child_val("basedOn").map(str::to_owned),
                run: style
                    .child("rPr")
                    .map(parse_run_properties)
                    .unwrap_or_default(),
                alignment: style
                    .child("pPr")
                    .and_then(|ppr| ppr.child_val("jc"))
                    .map(str::to_owned),
            };
            table.insert(id, named);
        }
        table
    }
}

/// Parse a `w:rPr` element.
pub(crate) fn parse_run_properties(rpr: &XmlNode) -> RunProperties {
    RunProperties {
        bold: rpr.child("b").map(on_off),
        size: rpr.child_val("sz").and_then(|v| v.parse().ok()),
        underline: rpr
            .child("u")
            .map(|u| u.attr("val").unwrap_or("single").to_owned()),
    }
}

/// WML toggle: present without value, or with any value other than an off value, is on.
fn on_off(node: &XmlNode) -> bool {
    node.attr("val")
        .is_none_or(|v| !matches!(v, "0" | "false" | "off"))
}
