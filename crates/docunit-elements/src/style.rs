//! Style sets and effective-style resolution.

use std::collections::BTreeMap;

use docunit_ooxml::{RawParagraph, RawRun, RunProperties, StyleTable};
use serde::{Deserialize, Serialize};

/// The only property whose values accumulate instead of being replaced.
const ACCUMULATING_PROPERTY: &str = "text-decoration";

/// CSS properties attached to an element.
///
/// Properties are kept sorted by name, which is also the rendering order.
/// Values of `text-decoration` accumulate in insertion order; every other
/// property holds a single value where the last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Styles(BTreeMap<String, Vec<String>>);

impl Styles {
    /// Create an empty style set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property value.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        let values = self.0.entry(name.to_owned()).or_default();
        if name == ACCUMULATING_PROPERTY {
            if !values.contains(&value) {
                values.push(value);
            }
        } else {
            *values = vec![value];
        }
    }

    /// Builder variant of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Values of a property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// CSS declaration list, e.g. `font-size: 12pt; font-weight: bold;`.
    #[must_use]
    pub fn to_css(&self) -> String {
        self.0
            .iter()
            .map(|(name, values)| format!("{name}: {};", values.join(" ")))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The ` style="..."` attribute, or an empty string when no property is set.
    #[must_use]
    pub fn to_attribute(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!(r#" style="{}""#, self.to_css())
        }
    }
}

/// Resolve a property: an inline value overrides the named-style value.
pub fn resolve<T>(inline: Option<T>, named: Option<T>) -> Option<T> {
    inline.or(named)
}

/// Resolves effective styles against a document's named-style table.
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver<'a> {
    styles: &'a StyleTable,
}

impl<'a> StyleResolver<'a> {
    #[must_use]
    pub fn new(styles: &'a StyleTable) -> Self {
        Self { styles }
    }

    /// Effective bold/size/underline, each resolved independently.
    #[must_use]
    pub fn effective(&self, inline: &RunProperties, style_id: Option<&str>) -> RunProperties {
        let named = style_id.and_then(|id| self.styles.run_properties(id));
        let named = named.unwrap_or_default();
        RunProperties {
            bold: resolve(inline.bold, named.bold),
            size: resolve(inline.size, named.size),
            underline: resolve(inline.underline.clone(), named.underline),
        }
    }

    /// Styles of a run's text, from its own properties and character style.
    #[must_use]
    pub fn run_styles(&self, run: &RawRun) -> Styles {
        let mut styles = Styles::new();
        apply_text_style(
            &mut styles,
            &self.effective(&run.properties, run.style_id.as_deref()),
        );
        styles
    }

    /// The paragraph's own styles: alignment plus its default text style.
    ///
    /// Run styles are resolved separately and never merged into this set.
    #[must_use]
    pub fn paragraph_styles(&self, paragraph: &RawParagraph) -> Styles {
        let style_id = paragraph.style_id.as_deref();
        let mut styles = Styles::new();

        let named_alignment = style_id.and_then(|id| self.styles.alignment(id));
        if let Some(align) = resolve(paragraph.alignment.clone(), named_alignment) {
            apply_alignment(&mut styles, &align);
        }
        apply_text_style(
            &mut styles,
            &self.effective(&paragraph.run_properties, style_id),
        );
        styles
    }
}

/// Map effective text properties onto CSS.
///
/// Only `single` underlines are mapped; bold `false` emits nothing.
pub fn apply_text_style(styles: &mut Styles, props: &RunProperties) {
    if props.bold == Some(true) {
        styles.set("font-weight", "bold");
    }
    if let Some(size) = props.size {
        styles.set("font-size", font_size(size));
    }
    if props.underline.as_deref() == Some("single") {
        styles.set("text-decoration", "underline");
    }
}

/// Map an alignment value onto CSS. Only `center` is mapped.
pub fn apply_alignment(styles: &mut Styles, alignment: &str) {
    if alignment == "center" {
        styles.set("text-align", "center");
    }
}

/// Half-points to points.
fn font_size(half_points: u32) -> String {
    if half_points % 2 == 0 {
        format!("{}pt", half_points / 2)
    } else {
        format!("{}.5pt", half_points / 2)
    }
}
