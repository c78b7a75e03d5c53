// ABOUTME: Markup serialization for the arena tree, HTML and XML flavors.
// ABOUTME: Includes text/attribute escaping and the XHTML self-closed tag post-fix.

use ego_tree::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::tree::{MarkupTree, NodeData};

/// Elements serialized without a closing tag in HTML.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text content is emitted raw in HTML.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Self-closed forms of these elements are rejected by common HTML
/// consumers, so XHTML output expands them to explicit pairs.
static SELF_CLOSED_FIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(script|select|textarea)(\b[^>]*?)\s*/>").expect("static regex")
});

/// Output flavor for [`serialize_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Html,
    Xml,
}

/// Serializes one node (and its subtree) into `out`.
pub fn serialize_node(tree: &MarkupTree, id: NodeId, flavor: Flavor, out: &mut String) {
    let node = match tree.get(id) {
        Some(node) => node,
        None => return,
    };
    match node.value() {
        NodeData::Document => {
            for child in node.children() {
                serialize_node(tree, child.id(), flavor, out);
            }
        }
        NodeData::Doctype(name) => {
            out.push_str("<!DOCTYPE ");
            out.push_str(name);
            out.push('>');
        }
        NodeData::Element(el) => {
            out.push('<');
            out.push_str(&el.name);
            for (key, value) in &el.attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                escape_attr(value, out);
                out.push('"');
            }
            let has_children = node.first_child().is_some();
            match flavor {
                Flavor::Xml => {
                    if !has_children {
                        out.push_str("/>");
                        return;
                    }
                    out.push('>');
                }
                Flavor::Html => {
                    out.push('>');
                    if !has_children && VOID_ELEMENTS.contains(&el.name.as_str()) {
                        return;
                    }
                }
            }
            let raw_text =
                flavor == Flavor::Html && RAW_TEXT_ELEMENTS.contains(&el.name.as_str());
            for child in node.children() {
                if raw_text {
                    if let NodeData::Text(text) = child.value() {
                        out.push_str(text);
                        continue;
                    }
                }
                serialize_node(tree, child.id(), flavor, out);
            }
            out.push_str("</");
            out.push_str(&el.name);
            out.push('>');
        }
        NodeData::Text(text) => escape_text(text, out),
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            if !data.is_empty() {
                out.push(' ');
                out.push_str(data);
            }
            out.push('>');
        }
    }
}

/// Serializes the children of a node rather than the node itself.
pub fn serialize_children(tree: &MarkupTree, id: NodeId, flavor: Flavor, out: &mut String) {
    let node = match tree.get(id) {
        Some(node) => node,
        None => return,
    };
    for child in node.children() {
        serialize_node(tree, child.id(), flavor, out);
    }
}

/// Rewrites self-closed `<script/>`, `<select/>` and `<textarea/>` tags to
/// explicit open/close pairs.
pub fn fix_xhtml_markup(markup: &str) -> String {
    SELF_CLOSED_FIX_RE
        .replace_all(markup, "<${1}${2}></${1}>")
        .into_owned()
}

fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_html, parse_xml};
    use pretty_assertions::assert_eq;

    fn html_markup(input: &str) -> String {
        let tree = parse_html(input);
        let mut out = String::new();
        serialize_node(&tree, tree.root().id(), Flavor::Html, &mut out);
        out
    }

    #[test]
    fn serializes_void_elements_without_close_tag() {
        let out = html_markup("<html><head></head><body><br><img src=\"x.png\"></body></html>");
        assert!(out.contains("<br>"));
        assert!(out.contains("<img src=\"x.png\">"));
        assert!(!out.contains("</br>"));
        assert!(!out.contains("</img>"));
    }

    #[test]
    fn escapes_text_and_attributes() {
        let out = html_markup("<html><body><p title=\"a&quot;b\">1 &lt; 2</p></body></html>");
        assert!(out.contains("title=\"a&quot;b\""));
        assert!(out.contains("1 &lt; 2"));
    }

    #[test]
    fn script_text_is_emitted_raw() {
        let out = html_markup("<html><head><script>if (a < b) {}</script></head></html>");
        assert!(out.contains("if (a < b) {}"));
    }

    #[test]
    fn xml_empty_elements_self_close() {
        let tree = parse_xml("<root><a/><b>x</b></root>").unwrap();
        let mut out = String::new();
        serialize_node(&tree, tree.root().id(), Flavor::Xml, &mut out);
        assert_eq!(out, "<root><a/><b>x</b></root>");
    }

    #[test]
    fn fix_xhtml_expands_self_closed_textarea() {
        assert_eq!(
            fix_xhtml_markup("<div><textarea/></div>"),
            "<div><textarea></textarea></div>"
        );
        assert_eq!(
            fix_xhtml_markup("<script src=\"a.js\" />"),
            "<script src=\"a.js\"></script>"
        );
        // Other self-closed elements are untouched.
        assert_eq!(fix_xhtml_markup("<br/>"), "<br/>");
    }
}
