// ABOUTME: Parsing front-ends that build the arena tree from markup strings.
// ABOUTME: HTML goes through scraper (permissive), XML through quick-xml (strict).

use ego_tree::NodeId;
use quick_xml::events::Event;
use quick_xml::Reader;
use scraper::{Html, Node};

use crate::error::MarkupError;
use crate::tree::{ElementData, MarkupTree, NodeData};

/// Parse HTML permissively. Parse errors are recovered, never surfaced.
pub fn parse_html(markup: &str) -> MarkupTree {
    let html = Html::parse_document(markup);
    let mut tree = MarkupTree::new(NodeData::Document);
    let root = tree.root().id();
    convert_children(&html.tree, html.tree.root().id(), &mut tree, root);
    tree
}

fn convert_children(
    src: &ego_tree::Tree<Node>,
    src_id: NodeId,
    dst: &mut MarkupTree,
    dst_parent: NodeId,
) {
    let src_node = match src.get(src_id) {
        Some(node) => node,
        None => return,
    };
    for child in src_node.children() {
        let data = match child.value() {
            Node::Doctype(doctype) => Some(NodeData::Doctype(doctype.name().to_string())),
            Node::Comment(comment) => Some(NodeData::Comment(comment.to_string())),
            Node::Text(text) => Some(NodeData::Text(text.to_string())),
            Node::Element(el) => Some(NodeData::Element(ElementData {
                name: el.name().to_string(),
                attrs: el
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            })),
            Node::ProcessingInstruction(pi) => Some(NodeData::ProcessingInstruction {
                target: pi.target.to_string(),
                data: pi.data.to_string(),
            }),
            // html5ever only emits these at the top; flatten them.
            Node::Document | Node::Fragment => None,
        };
        match data {
            Some(data) => {
                let new_id = match dst.get_mut(dst_parent) {
                    Some(mut parent) => parent.append(data).id(),
                    None => return,
                };
                convert_children(src, child.id(), dst, new_id);
            }
            None => convert_children(src, child.id(), dst, dst_parent),
        }
    }
}

/// Parse XML strictly. Any well-formedness violation is a hard
/// MalformedXml error.
pub fn parse_xml(markup: &str) -> Result<MarkupTree, MarkupError> {
    let mut reader = Reader::from_str(markup);
    let mut tree = MarkupTree::new(NodeData::Document);
    let mut stack = vec![tree.root().id()];

    loop {
        let event = reader
            .read_event()
            .map_err(|e| MarkupError::malformed_xml("ParseXml", Some(anyhow::anyhow!(e))))?;
        match event {
            Event::Eof => break,
            Event::Decl(_) => {
                // The declaration's charset is handled by the loader.
            }
            Event::Start(ref e) => {
                let element = element_from_event(e.name().as_ref(), e.attributes())?;
                let parent = *stack.last().ok_or_else(|| {
                    MarkupError::malformed_xml("ParseXml", Some(anyhow::anyhow!("unbalanced tree")))
                })?;
                let id = append(&mut tree, parent, NodeData::Element(element));
                stack.push(id);
            }
            Event::End(_) => {
                if stack.len() <= 1 {
                    return Err(MarkupError::malformed_xml(
                        "ParseXml",
                        Some(anyhow::anyhow!("close tag without matching open tag")),
                    ));
                }
                stack.pop();
            }
            Event::Empty(ref e) => {
                let element = element_from_event(e.name().as_ref(), e.attributes())?;
                let parent = *stack.last().expect("stack holds at least the root");
                append(&mut tree, parent, NodeData::Element(element));
            }
            Event::Text(ref e) => {
                let text = e
                    .xml_content()
                    .map_err(|err| MarkupError::malformed_xml("ParseXml", Some(anyhow::anyhow!(err))))?;
                let parent = *stack.last().expect("stack holds at least the root");
                append_text(&mut tree, parent, &text);
            }
            Event::GeneralRef(ref e) => {
                let name = String::from_utf8_lossy(e.as_ref()).into_owned();
                let resolved = resolve_entity(&name).ok_or_else(|| {
                    MarkupError::malformed_xml(
                        "ParseXml",
                        Some(anyhow::anyhow!("unknown entity reference '&{name};'")),
                    )
                })?;
                let parent = *stack.last().expect("stack holds at least the root");
                append_text(&mut tree, parent, &resolved);
            }
            Event::CData(ref e) => {
                let parent = *stack.last().expect("stack holds at least the root");
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                append_text(&mut tree, parent, &text);
            }
            Event::Comment(ref e) => {
                let parent = *stack.last().expect("stack holds at least the root");
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                append(&mut tree, parent, NodeData::Comment(text));
            }
            Event::DocType(ref e) => {
                let parent = *stack.last().expect("stack holds at least the root");
                let name = String::from_utf8_lossy(e.as_ref()).trim().to_string();
                append(&mut tree, parent, NodeData::Doctype(name));
            }
            Event::PI(ref e) => {
                let parent = *stack.last().expect("stack holds at least the root");
                let content = String::from_utf8_lossy(e.as_ref()).into_owned();
                let (target, data) = match content.split_once(char::is_whitespace) {
                    Some((t, d)) => (t.to_string(), d.trim().to_string()),
                    None => (content, String::new()),
                };
                append(
                    &mut tree,
                    parent,
                    NodeData::ProcessingInstruction { target, data },
                );
            }
        }
    }

    if stack.len() != 1 {
        return Err(MarkupError::malformed_xml(
            "ParseXml",
            Some(anyhow::anyhow!("unclosed element at end of input")),
        ));
    }
    Ok(tree)
}

fn append(tree: &mut MarkupTree, parent: NodeId, data: NodeData) -> NodeId {
    tree.get_mut(parent)
        .expect("parent id comes from this tree")
        .append(data)
        .id()
}

/// Appends text under `parent`, merging into a trailing text node so
/// entity-split runs come back as one node.
fn append_text(tree: &mut MarkupTree, parent: NodeId, text: &str) {
    let last_text = tree
        .get(parent)
        .and_then(|node| node.last_child())
        .filter(|last| matches!(last.value(), NodeData::Text(_)))
        .map(|last| last.id());
    if let Some(id) = last_text {
        if let Some(mut node) = tree.get_mut(id) {
            if let NodeData::Text(existing) = node.value() {
                existing.push_str(text);
                return;
            }
        }
    }
    append(tree, parent, NodeData::Text(text.to_string()));
}

/// Resolves the predefined XML entities and numeric character references.
fn resolve_entity(name: &str) -> Option<String> {
    match name {
        "amp" => Some("&".to_string()),
        "lt" => Some("<".to_string()),
        "gt" => Some(">".to_string()),
        "apos" => Some("'".to_string()),
        "quot" => Some("\"".to_string()),
        _ => {
            let digits = name.strip_prefix('#')?;
            let code = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse().ok()?,
            };
            char::from_u32(code).map(String::from)
        }
    }
}

fn element_from_event(
    name: &[u8],
    attributes: quick_xml::events::attributes::Attributes<'_>,
) -> Result<ElementData, MarkupError> {
    let mut element = ElementData::new(String::from_utf8_lossy(name).into_owned());
    for attr in attributes {
        let attr =
            attr.map_err(|e| MarkupError::malformed_xml("ParseXml", Some(anyhow::anyhow!(e))))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| MarkupError::malformed_xml("ParseXml", Some(anyhow::anyhow!(e))))?
            .into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}
