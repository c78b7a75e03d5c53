// ABOUTME: The Document wrapper owning one parsed markup tree plus its type/charset bookkeeping.
// ABOUTME: Implements the loader, fragment materialization, serialization, import and node metadata.

use std::collections::HashMap;
use std::fmt;

use ego_tree::NodeId;
use serde_json::Value;

use crate::charset;
use crate::error::MarkupError;
use crate::parse::{parse_html, parse_xml};
use crate::serialize::{fix_xhtml_markup, serialize_node, Flavor};
use crate::tree::{copy_subtree, MarkupTree};

/// Doctype prepended to materialized HTML fragments. Also the token that
/// marks a document as XHTML when found in the markup.
pub const DEFAULT_DOCTYPE: &str = "<!DOCTYPE html>";

const XHTML_DOCTYPE: &str = "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Transitional//EN\" \
     \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd\">";

/// Synthetic container element wrapped around XML fragments.
const FAKE_TAG: &str = "fake";

/// The detected media type of a loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentKind {
    #[default]
    Html,
    Xml,
    Xhtml,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Html => "text/html",
            ContentKind::Xml => "text/xml",
            ContentKind::Xhtml => "application/xhtml+xml",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returns true if the first ~100 characters carry an XML declaration.
pub fn looks_like_xml(markup: &str) -> bool {
    let end = markup
        .char_indices()
        .nth(100)
        .map(|(i, _)| i)
        .unwrap_or(markup.len());
    markup[..end].contains("<?xml")
}

/// Returns true if the markup carries the XHTML/HTML5 doctype token.
pub fn has_xhtml_doctype(markup: &str) -> bool {
    markup.contains("<!DOCTYPE html")
}

/// Heuristic: an HTML blob is a fragment when it has neither an `<html`
/// tag nor a doctype. Malformed input can misclassify; callers treat this
/// as best-effort.
pub fn is_fragment_html(markup: &str) -> bool {
    let lower = markup.to_lowercase();
    !lower.contains("<html") && !lower.contains("<!doctype")
}

/// Heuristic: an XML blob is a fragment when it lacks an XML declaration.
pub fn is_fragment_xml(markup: &str) -> bool {
    !markup.contains("<?xml")
}

/// One loaded markup blob: the parsed arena tree, its detected kind and
/// charset, fragment bookkeeping, and a per-node metadata side table keyed
/// by the arena node id.
#[derive(Debug)]
pub struct Document {
    tree: MarkupTree,
    kind: ContentKind,
    charset: String,
    pub is_xml: bool,
    pub is_xhtml: bool,
    pub is_html: bool,
    pub is_fragment: bool,
    root: NodeId,
    data: HashMap<NodeId, HashMap<String, Value>>,
}

impl Document {
    /// Load a document from a markup string with an optional declared
    /// content type (`text/html;charset=gb2312` style).
    ///
    /// Without a declared type, the first ~100 characters decide XML vs.
    /// HTML; HTML is the default. Malformed HTML never fails; malformed
    /// XML is a hard [`MarkupError`].
    pub fn load(markup: &str, content_type: Option<&str>) -> Result<Self, MarkupError> {
        match content_type {
            Some(ct) => {
                let (kind, requested) = charset::split_content_type(ct);
                let requested = requested.as_deref();
                match kind.as_str() {
                    "text/html" => Ok(Self::load_html(markup, requested, None)),
                    "text/xml" | "application/xhtml+xml" => {
                        Self::load_xml(markup, requested, kind.contains("xhtml"), None)
                    }
                    other if other.contains("xml") => {
                        Self::load_xml(markup, requested, other.contains("xhtml"), None)
                    }
                    _ => Ok(Self::load_html(markup, requested, None)),
                }
            }
            None => {
                if looks_like_xml(markup) {
                    Self::load_xml(markup, None, false, None)
                } else {
                    Ok(Self::load_html(markup, None, None))
                }
            }
        }
    }

    /// Load a document from raw bytes, resolving the charset first.
    ///
    /// The content-type charset wins when its label is valid; otherwise
    /// detection picks among the embedded declaration and the bytes.
    pub fn load_bytes(body: &[u8], content_type: Option<&str>) -> Result<Self, MarkupError> {
        let (decoded, _) = charset::decode_bytes(body, content_type);
        Self::load(&decoded, content_type)
    }

    /// Wrap an already-parsed tree without re-running the loader.
    pub fn from_tree(tree: MarkupTree, kind: ContentKind, charset: impl Into<String>) -> Self {
        let root = tree.root().id();
        Self {
            tree,
            kind,
            charset: charset.into(),
            is_xml: !matches!(kind, ContentKind::Html),
            is_xhtml: matches!(kind, ContentKind::Xhtml),
            is_html: matches!(kind, ContentKind::Html),
            is_fragment: false,
            root,
            data: HashMap::new(),
        }
    }

    fn load_html(markup: &str, requested: Option<&str>, fragment: Option<bool>) -> Self {
        let is_fragment = fragment.unwrap_or_else(|| is_fragment_html(markup));
        let document_charset = charset::charset_from_html(markup);
        let mut markup = markup.to_string();
        if document_charset.is_some() {
            markup = charset::relocate_meta_to_head(&markup);
        }
        let mut resolved = document_charset
            .clone()
            .or_else(|| requested.map(str::to_string))
            .unwrap_or_else(|| charset::DEFAULT_CHARSET.to_lowercase());
        let add_document_charset = document_charset.is_none();

        if let (Some(req), Some(doc)) = (requested, document_charset.as_deref()) {
            if !req.eq_ignore_ascii_case(doc) {
                // The markup is already decoded in memory, so conversion is
                // declaration-level: rewrite the meta tag to the requested
                // label. Mismatches are tolerated, never an error; byte-level
                // transcoding happens in load_bytes.
                markup = charset::set_html_charset(&markup, req, false);
                resolved = req.to_string();
            }
        }

        if is_fragment {
            return Self::materialize_html_fragment(&markup, &resolved);
        }

        if add_document_charset {
            markup = charset::set_html_charset(&markup, &resolved, false);
        }
        let tree = parse_html(&markup);
        let root = tree.root().id();
        Self {
            tree,
            kind: ContentKind::Html,
            charset: resolved,
            is_xml: false,
            is_xhtml: false,
            is_html: true,
            is_fragment: false,
            root,
            data: HashMap::new(),
        }
    }

    fn load_xml(
        markup: &str,
        requested: Option<&str>,
        content_type_is_xhtml: bool,
        fragment: Option<bool>,
    ) -> Result<Self, MarkupError> {
        let is_xhtml = content_type_is_xhtml || has_xhtml_doctype(markup);
        let is_fragment = fragment.unwrap_or_else(|| {
            if is_xhtml {
                is_fragment_html(markup)
            } else {
                is_fragment_xml(markup)
            }
        });
        let document_charset = charset::charset_from_xml(markup).or_else(|| {
            if is_xhtml {
                // XHTML may declare its charset in the HTML meta tag instead.
                charset::charset_from_html(markup)
            } else {
                None
            }
        });
        let resolved = document_charset
            .or_else(|| requested.map(str::to_string))
            .unwrap_or_else(|| charset::DEFAULT_CHARSET.to_lowercase());

        if is_fragment {
            return Self::materialize_xml_fragment(markup, &resolved, is_xhtml);
        }

        let tree = parse_xml(markup)?;
        let root = tree.root().id();
        let kind = if is_xhtml {
            ContentKind::Xhtml
        } else {
            ContentKind::Xml
        };
        Ok(Self {
            tree,
            kind,
            charset: resolved,
            is_xml: true,
            is_xhtml,
            is_html: false,
            is_fragment: false,
            root,
            data: HashMap::new(),
        })
    }

    /// Wraps an HTML fragment in a full skeleton so the parser accepts it,
    /// then re-derives the logical root as the synthetic `<body>` container.
    fn materialize_html_fragment(markup: &str, charset_label: &str) -> Self {
        let no_body = !markup.to_lowercase().contains("<body");
        let mut full = String::with_capacity(markup.len() + 128);
        full.push_str(DEFAULT_DOCTYPE);
        full.push_str("<html><head><meta http-equiv=\"Content-Type\" content=\"text/html;charset=");
        full.push_str(charset_label);
        full.push_str("\"></head>");
        if no_body {
            full.push_str("<body>");
        }
        full.push_str(markup);
        if no_body {
            full.push_str("</body>");
        }
        full.push_str("</html>");

        let tree = parse_html(&full);
        let root = find_element(&tree, "body").unwrap_or_else(|| tree.root().id());
        Self {
            tree,
            kind: ContentKind::Html,
            charset: charset_label.to_string(),
            is_xml: false,
            is_xhtml: false,
            is_html: true,
            is_fragment: true,
            root,
            data: HashMap::new(),
        }
    }

    /// Wraps an XML fragment in a synthetic `<fake>` container so the
    /// parser accepts it; the container becomes the logical root.
    fn materialize_xml_fragment(
        markup: &str,
        charset_label: &str,
        is_xhtml: bool,
    ) -> Result<Self, MarkupError> {
        let wrapped = if is_xhtml {
            format!(
                "{}{}<{} xmlns=\"http://www.w3.org/1999/xhtml\">{}</{}>",
                charset::xml_declaration(charset_label),
                XHTML_DOCTYPE,
                FAKE_TAG,
                markup,
                FAKE_TAG
            )
        } else {
            format!(
                "{}<{}>{}</{}>",
                charset::xml_declaration(charset_label),
                FAKE_TAG,
                markup,
                FAKE_TAG
            )
        };
        let tree = parse_xml(&wrapped)?;
        let root = find_element(&tree, FAKE_TAG).ok_or_else(|| {
            MarkupError::fragment(
                "LoadXml",
                Some(anyhow::anyhow!("synthetic container missing after parse")),
            )
        })?;
        Ok(Self {
            tree,
            kind: if is_xhtml {
                ContentKind::Xhtml
            } else {
                ContentKind::Xml
            },
            charset: charset_label.to_string(),
            is_xml: true,
            is_xhtml,
            is_html: false,
            is_fragment: true,
            root,
            data: HashMap::new(),
        })
    }

    /// An empty HTML fragment document used as the scratch target for
    /// partial serialization.
    fn html_fragment_shell(charset_label: &str) -> Self {
        Self::materialize_html_fragment("", charset_label)
    }

    pub fn tree(&self) -> &MarkupTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut MarkupTree {
        &mut self.tree
    }

    /// The logical root: the document node, or the synthetic container for
    /// fragments.
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Where imported content is attached: the fragment container, the
    /// `<body>` of a full HTML document, or the root element of an XML
    /// document.
    pub fn content_root(&self) -> NodeId {
        if self.is_fragment {
            return self.root;
        }
        if self.is_html {
            return find_element(&self.tree, "body").unwrap_or(self.root);
        }
        self.tree
            .root()
            .children()
            .find(|n| n.value().as_element().is_some())
            .map(|n| n.id())
            .unwrap_or(self.root)
    }

    /// Serialize the whole document.
    ///
    /// Fragments are serialized through their synthetic container and the
    /// wrapper markers are stripped back out of the text. XHTML output gets
    /// the self-closed tag post-fix.
    pub fn markup(&self) -> String {
        let mut out = String::new();
        if self.is_fragment {
            let flavor = if self.is_xml { Flavor::Xml } else { Flavor::Html };
            serialize_node(&self.tree, self.tree.root().id(), flavor, &mut out);
            let stripped = if self.is_xml {
                strip_fake_wrapper(&out)
            } else {
                strip_body_wrapper(&out)
            };
            return self.maybe_fix_xhtml(stripped);
        }
        if self.is_xml {
            out.push_str(&charset::xml_declaration(&self.charset));
            serialize_node(&self.tree, self.tree.root().id(), Flavor::Xml, &mut out);
        } else {
            serialize_node(&self.tree, self.tree.root().id(), Flavor::Html, &mut out);
        }
        self.maybe_fix_xhtml(out)
    }

    /// Serialize a subset of nodes.
    ///
    /// With `inner` set, each target's children are serialized instead of
    /// the node itself. A target equal to a fragment's root is replaced by
    /// its children to avoid re-wrapping. HTML subsets go through a
    /// temporary fragment document; XML subsets serialize directly.
    pub fn markup_nodes(&self, nodes: &[NodeId], inner: bool) -> String {
        let mut targets: Vec<NodeId> = Vec::new();
        for &id in nodes {
            if self.is_fragment && !inner && id == self.root {
                if let Some(node) = self.tree.get(self.root) {
                    targets.extend(node.children().map(|c| c.id()));
                }
            } else {
                targets.push(id);
            }
        }

        let loop_ids: Vec<NodeId> = if inner {
            let mut ids = Vec::new();
            for &id in &targets {
                match self.tree.get(id) {
                    Some(node) if node.first_child().is_some() => {
                        ids.extend(node.children().map(|c| c.id()));
                    }
                    Some(_) => ids.push(id),
                    None => {}
                }
            }
            ids
        } else {
            targets
        };

        let out = if self.is_xml {
            let mut s = String::new();
            for id in &loop_ids {
                serialize_node(&self.tree, *id, Flavor::Xml, &mut s);
            }
            s
        } else {
            let mut shell = Self::html_fragment_shell(&self.charset);
            let shell_root = shell.root;
            for id in &loop_ids {
                copy_subtree(&self.tree, *id, &mut shell.tree, shell_root);
            }
            shell.markup()
        };
        self.maybe_fix_xhtml(out)
    }

    /// Serialize the children of each target node ("inner markup").
    pub fn inner_markup(&self, nodes: &[NodeId]) -> String {
        self.markup_nodes(nodes, true)
    }

    /// Deep-copy nodes from another document under this document's content
    /// root. The source is untouched. Returns the ids of the copies.
    pub fn import_nodes(&mut self, source: &Document, nodes: &[NodeId]) -> Vec<NodeId> {
        let parent = self.content_root();
        let mut imported = Vec::with_capacity(nodes.len());
        for &id in nodes {
            if let Some(new_id) = copy_subtree(source.tree(), id, &mut self.tree, parent) {
                imported.push(new_id);
            }
        }
        imported
    }

    /// Parse a markup string as a standalone fragment in this document's
    /// kind/charset context, then import its children.
    pub fn import_markup(&mut self, markup: &str) -> Result<Vec<NodeId>, MarkupError> {
        let fragment = self.fragment_in_context(markup)?;
        let children: Vec<NodeId> = fragment
            .tree
            .get(fragment.root)
            .map(|n| n.children().map(|c| c.id()).collect())
            .unwrap_or_default();
        Ok(self.import_nodes(&fragment, &children))
    }

    fn fragment_in_context(&self, markup: &str) -> Result<Document, MarkupError> {
        if self.is_xml {
            Self::materialize_xml_fragment(markup, &self.charset, self.is_xhtml)
        } else {
            Ok(Self::materialize_html_fragment(markup, &self.charset))
        }
    }

    /// Attach a metadata value to a node. Lookups stay valid for the
    /// document's lifetime because arena ids are stable.
    pub fn set_node_data(&mut self, node: NodeId, key: impl Into<String>, value: Value) {
        self.data.entry(node).or_default().insert(key.into(), value);
    }

    pub fn node_data(&self, node: NodeId, key: &str) -> Option<&Value> {
        self.data.get(&node).and_then(|entries| entries.get(key))
    }

    pub fn remove_node_data(&mut self, node: NodeId, key: &str) -> Option<Value> {
        self.data.get_mut(&node).and_then(|entries| entries.remove(key))
    }

    fn maybe_fix_xhtml(&self, markup: String) -> String {
        if self.is_xhtml {
            fix_xhtml_markup(&markup)
        } else {
            markup
        }
    }
}

/// First element with the given name, in document order.
fn find_element(tree: &MarkupTree, name: &str) -> Option<NodeId> {
    tree.root()
        .descendants()
        .find(|n| {
            n.value()
                .as_element()
                .map(|el| el.name == name)
                .unwrap_or(false)
        })
        .map(|n| n.id())
}

/// Strips the synthetic `<fake>` wrapper out of serialized XML fragment
/// markup by locating its opening/closing markers.
fn strip_fake_wrapper(markup: &str) -> String {
    let open = match markup.find("<fake") {
        Some(pos) => pos,
        None => return markup.to_string(),
    };
    let start = match markup[open..].find('>') {
        Some(pos) => open + pos + 1,
        None => return markup.to_string(),
    };
    let end = match markup.rfind("</fake>") {
        Some(pos) if pos >= start => pos,
        _ => return markup.to_string(),
    };
    markup[start..end].to_string()
}

/// Strips the synthetic `<body>` wrapper out of serialized HTML fragment
/// markup.
fn strip_body_wrapper(markup: &str) -> String {
    let start = match markup.find("<body>") {
        Some(pos) => pos + "<body>".len(),
        None => return markup.to_string(),
    };
    let end = match markup.rfind("</body>") {
        Some(pos) if pos >= start => pos,
        _ => return markup.to_string(),
    };
    markup[start..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn html_fragment_round_trips() {
        let doc = Document::load("<p>hello <b>world</b></p><p>two</p>", None).unwrap();
        assert!(doc.is_fragment);
        assert!(doc.is_html);
        assert_eq!(doc.markup(), "<p>hello <b>world</b></p><p>two</p>");
    }

    #[test]
    fn full_html_document_is_not_a_fragment() {
        let doc = Document::load("<html><body><p>x</p></body></html>", None).unwrap();
        assert!(!doc.is_fragment);
        assert_eq!(doc.kind(), ContentKind::Html);
        assert!(doc.markup().contains("<p>x</p>"));
    }

    #[test]
    fn doctype_marks_full_document() {
        let doc = Document::load("<!doctype html><p>x</p>", None).unwrap();
        assert!(!doc.is_fragment);
    }

    #[test]
    fn declared_charset_mismatch_rewrites_meta() {
        let html = "<html><head><meta http-equiv=\"Content-Type\" \
                    content=\"text/html;charset=utf-8\"></head><body><p>hi</p></body></html>";
        let doc = Document::load(html, Some("text/html;charset=gb2312")).unwrap();
        assert_eq!(doc.charset(), "gb2312");
        let out = doc.markup();
        assert!(out.contains("charset=gb2312"), "got: {}", out);
        assert!(!out.contains("charset=utf-8"));
    }

    #[test]
    fn missing_charset_falls_back_to_requested_then_default() {
        let doc = Document::load("<html><body></body></html>", Some("text/html;charset=gb2312"))
            .unwrap();
        assert_eq!(doc.charset(), "gb2312");

        let doc = Document::load("<html><body></body></html>", None).unwrap();
        assert_eq!(doc.charset().to_lowercase(), "utf-8");
    }

    #[test]
    fn xml_document_loads_and_serializes() {
        let doc = Document::load(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><root><item>a</item></root>",
            None,
        )
        .unwrap();
        assert!(doc.is_xml);
        assert!(!doc.is_fragment);
        assert_eq!(doc.kind(), ContentKind::Xml);
        assert_eq!(
            doc.markup(),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><root><item>a</item></root>"
        );
    }

    #[test]
    fn malformed_xml_fails_the_load() {
        let err = Document::load("<?xml version=\"1.0\"?><root><a></root>", None).unwrap_err();
        assert!(err.is_malformed_xml());
    }

    #[test]
    fn malformed_html_never_fails() {
        let doc = Document::load("<p>unclosed<div>", None).unwrap();
        assert!(doc.markup().contains("unclosed"));
    }

    #[test]
    fn xml_fragment_materializes_through_fake_wrapper() {
        let doc = Document::load("<item>a</item><item>b</item>", Some("text/xml")).unwrap();
        assert!(doc.is_fragment);
        assert_eq!(doc.markup(), "<item>a</item><item>b</item>");
    }

    #[test]
    fn xhtml_self_closed_textarea_expands() {
        let xml = "<?xml version=\"1.0\"?><html xmlns=\"http://www.w3.org/1999/xhtml\">\
                   <body><textarea></textarea></body></html>";
        let doc = Document::load(xml, Some("application/xhtml+xml")).unwrap();
        assert!(doc.is_xhtml);
        let out = doc.markup();
        assert!(
            out.contains("<textarea></textarea>"),
            "self-closed textarea must expand, got: {}",
            out
        );
    }

    #[test]
    fn xhtml_detected_from_content_type_string() {
        let doc = Document::load("<r/>", Some("application/xhtml+xml;charset=utf-8")).unwrap();
        assert!(doc.is_xhtml);
        assert_eq!(doc.kind(), ContentKind::Xhtml);
    }

    #[test]
    fn import_nodes_copies_and_leaves_source_intact() {
        let src = Document::load("<div id=\"a\"><p>text</p></div>", None).unwrap();
        let mut dst = Document::load("<html><head></head><body></body></html>", None).unwrap();

        let src_children: Vec<_> = src
            .tree()
            .get(src.root_id())
            .unwrap()
            .children()
            .map(|c| c.id())
            .collect();
        let before = src.markup();
        let imported = dst.import_nodes(&src, &src_children);

        assert_eq!(imported.len(), src_children.len());
        assert_eq!(src.markup(), before);
        for (orig, copy) in src_children.iter().zip(&imported) {
            assert!(crate::tree::structural_eq(
                src.tree(),
                *orig,
                dst.tree(),
                *copy
            ));
        }
        assert!(dst.markup().contains("<div id=\"a\"><p>text</p></div>"));
    }

    #[test]
    fn import_markup_parses_in_destination_context() {
        let mut dst = Document::load("<html><head></head><body></body></html>", None).unwrap();
        let imported = dst.import_markup("<p>new</p>").unwrap();
        assert_eq!(imported.len(), 1);
        assert!(dst.markup().contains("<p>new</p>"));
    }

    #[test]
    fn partial_serialization_and_inner_markup() {
        let doc = Document::load("<div><p>one</p><p>two</p></div>", None).unwrap();
        let div = doc
            .tree()
            .get(doc.root_id())
            .unwrap()
            .children()
            .next()
            .unwrap()
            .id();
        assert_eq!(doc.markup_nodes(&[div], false), "<div><p>one</p><p>two</p></div>");
        assert_eq!(doc.inner_markup(&[div]), "<p>one</p><p>two</p>");
    }

    #[test]
    fn fragment_root_in_subset_expands_to_children() {
        let doc = Document::load("<p>a</p><p>b</p>", None).unwrap();
        assert_eq!(doc.markup_nodes(&[doc.root_id()], false), "<p>a</p><p>b</p>");
    }

    #[test]
    fn node_data_is_stable_across_lookups() {
        let mut doc = Document::load("<p>x</p>", None).unwrap();
        let p = doc
            .tree()
            .get(doc.root_id())
            .unwrap()
            .children()
            .next()
            .unwrap()
            .id();
        doc.set_node_data(p, "visited", json!(true));
        assert_eq!(doc.node_data(p, "visited"), Some(&json!(true)));
        assert_eq!(doc.node_data(p, "missing"), None);
        assert_eq!(doc.remove_node_data(p, "visited"), Some(json!(true)));
        assert_eq!(doc.node_data(p, "visited"), None);
    }

    #[test]
    fn load_bytes_decodes_gb2312_body() {
        // "你好" encoded as GB2312
        let (encoded, _, _) = encoding_rs::GB18030.encode("<p>你好</p>");
        let doc = Document::load_bytes(&encoded, Some("text/html;charset=gb2312")).unwrap();
        assert!(doc.markup().contains("你好"));
    }
}
