// ABOUTME: Explicit document registry with selected-document tracking and target resolution.
// ABOUTME: Resolves ById/ByNode/Default targets to exactly one registered document.

use std::collections::HashMap;

use ego_tree::NodeId;

use crate::document::Document;
use crate::error::MarkupError;

/// A node addressed by its owning document's registry id plus its arena id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeHandle {
    pub document: String,
    pub node: NodeId,
}

impl NodeHandle {
    pub fn new(document: impl Into<String>, node: NodeId) -> Self {
        Self {
            document: document.into(),
            node,
        }
    }
}

/// The target document for an operation: an explicit id, a node whose
/// owning document should be used, or the currently selected document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Target {
    ById(String),
    ByNode(NodeHandle),
    #[default]
    Default,
}

/// Owns every loaded document and the "currently selected" id used as the
/// implicit default context. One registry per logical thread of control;
/// nothing here is synchronized.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: HashMap<String, Document>,
    selected: Option<String>,
    next_id: u64,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a markup string, register the resulting document and select it.
    /// Returns the new document's id.
    pub fn load(
        &mut self,
        markup: &str,
        content_type: Option<&str>,
    ) -> Result<String, MarkupError> {
        let doc = Document::load(markup, content_type)?;
        Ok(self.insert(doc))
    }

    /// Register an already-built document and select it.
    pub fn insert(&mut self, doc: Document) -> String {
        self.next_id += 1;
        let id = format!("doc-{}", self.next_id);
        self.documents.insert(id.clone(), doc);
        self.selected = Some(id.clone());
        id
    }

    /// Make `id` the implicit default for [`Target::Default`].
    pub fn select(&mut self, id: &str) -> Result<(), MarkupError> {
        if !self.documents.contains_key(id) {
            return Err(MarkupError::unknown_document("Select", id));
        }
        self.selected = Some(id.to_string());
        Ok(())
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Drop a document. It only actually dies once fragments derived from
    /// it are gone too, which ownership already guarantees.
    pub fn remove(&mut self, id: &str) -> Option<Document> {
        let doc = self.documents.remove(id);
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        doc
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Document> {
        self.documents.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Resolve a target to a registered document id.
    ///
    /// Resolution order: explicit id > the supplied node's owning document >
    /// the currently selected id.
    pub fn resolve<'a>(&'a self, target: &'a Target) -> Result<&'a str, MarkupError> {
        match target {
            Target::ById(id) => {
                if self.documents.contains_key(id.as_str()) {
                    Ok(id.as_str())
                } else {
                    Err(MarkupError::unknown_document("Resolve", id))
                }
            }
            Target::ByNode(handle) => {
                let owner = self.documents.get(&handle.document).ok_or_else(|| {
                    MarkupError::orphaned_node(
                        "Resolve",
                        Some(anyhow::anyhow!(
                            "node belongs to unregistered document '{}'",
                            handle.document
                        )),
                    )
                })?;
                if owner.tree().get(handle.node).is_none() {
                    return Err(MarkupError::orphaned_node(
                        "Resolve",
                        Some(anyhow::anyhow!("node id not present in owning document")),
                    ));
                }
                Ok(handle.document.as_str())
            }
            Target::Default => self
                .selected
                .as_deref()
                .ok_or_else(|| MarkupError::no_document("Resolve")),
        }
    }

    /// Resolve a target and borrow the document.
    pub fn document(&self, target: &Target) -> Result<&Document, MarkupError> {
        let id = self.resolve(target)?.to_string();
        self.documents
            .get(&id)
            .ok_or_else(|| MarkupError::unknown_document("Resolve", &id))
    }

    /// Resolve a target and borrow the document mutably.
    pub fn document_mut(&mut self, target: &Target) -> Result<&mut Document, MarkupError> {
        let id = self.resolve(target)?.to_string();
        self.documents
            .get_mut(&id)
            .ok_or_else(|| MarkupError::unknown_document("Resolve", &id))
    }
}
