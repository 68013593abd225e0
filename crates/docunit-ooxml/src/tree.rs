//! Generic element tree for XML parts.

use std::collections::HashMap;

/// Node in a parsed XML part.
///
/// Tags and attribute keys keep their namespace prefix (`w:p`, `r:embed`);
/// the lookup helpers match on the local name only, since producers are
/// free to choose prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Qualified element name.
    pub tag: String,
    /// Direct text content before the first child.
    pub text: String,
    /// Text after the element (XML tail).
    pub tail: String,
    /// Element attributes keyed by qualified name.
    pub attrs: HashMap<String, String>,
    /// Child elements.
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Create a new node with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Set text content.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Add an attribute.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Set children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<XmlNode>) -> Self {
        self.children = children;
        self
    }

    /// Tag name without namespace prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        local_part(&self.tag)
    }

    /// Check the local tag name.
    #[must_use]
    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// First child with the given local name.
    #[must_use]
    pub fn child(&self, local: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.is(local))
    }

    /// All children with the given local name, in document order.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.is(local))
    }

    /// Attribute value by local name.
    #[must_use]
    pub fn attr(&self, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| local_part(key) == local)
            .map(|(_, value)| value.as_str())
    }

    /// Value of the `val` attribute of the named child (`<w:jc w:val="center"/>`).
    #[must_use]
    pub fn child_val(&self, local: &str) -> Option<&str> {
        self.child(local).and_then(|c| c.attr("val"))
    }

    /// Text of this node and all descendants, without tails of this node.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.children {
            out.push_str(&child.text_content());
            out.push_str(&child.tail);
        }
        out
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name_strips_prefix() {
        assert_eq!(XmlNode::new("w:p").local_name(), "p");
        assert_eq!(XmlNode::new("body").local_name(), "body");
    }

    #[test]
    fn test_attr_matches_local_name() {
        let node = XmlNode::new("a:blip").with_attr("r:embed", "rId5");
        assert_eq!(node.attr("embed"), Some("rId5"));
        assert_eq!(node.attr("link"), None);
    }

    #[test]
    fn test_child_val() {
        let node = XmlNode::new("w:pPr")
            .with_children(vec![XmlNode::new("w:jc").with_attr("w:val", "center")]);
        assert_eq!(node.child_val("jc"), Some("center"));
        assert_eq!(node.child_val("pStyle"), None);
    }

    #[test]
    fn test_text_content_includes_tails() {
        let mut inner = XmlNode::new("b").with_text("bold");
        inner.tail = " tail".to_owned();
        let node = XmlNode::new("p").with_text("a ").with_children(vec![inner]);
        assert_eq!(node.text_content(), "a bold tail");
    }
}
