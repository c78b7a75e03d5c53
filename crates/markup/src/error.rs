// ABOUTME: Error types for the markup document layer including ErrorCode enum and MarkupError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing different categories of markup failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// XML input could not be parsed. HTML never produces this; it is
    /// recovered permissively.
    MalformedXml,
    /// A node was supplied whose owning document is not registered.
    OrphanedNode,
    /// No document has ever been selected and no explicit target was given.
    NoDocument,
    /// An explicit document id does not resolve to a registered document.
    UnknownDocument,
    /// A fragment could not be materialized into a synthetic container.
    Fragment,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::MalformedXml => "malformed XML",
            ErrorCode::OrphanedNode => "orphaned node",
            ErrorCode::NoDocument => "no document selected",
            ErrorCode::UnknownDocument => "unknown document",
            ErrorCode::Fragment => "fragment error",
        };
        write!(f, "{}", s)
    }
}

/// The main error type for document operations.
#[derive(Debug, thiserror::Error)]
pub struct MarkupError {
    pub code: ErrorCode,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "markup: {}: {}", self.op, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl MarkupError {
    /// Create a MalformedXml error.
    pub fn malformed_xml(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            code: ErrorCode::MalformedXml,
            op: op.into(),
            source,
        }
    }

    /// Create an OrphanedNode error.
    pub fn orphaned_node(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            code: ErrorCode::OrphanedNode,
            op: op.into(),
            source,
        }
    }

    /// Create a NoDocument error.
    pub fn no_document(op: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NoDocument,
            op: op.into(),
            source: None,
        }
    }

    /// Create an UnknownDocument error.
    pub fn unknown_document(op: impl Into<String>, id: &str) -> Self {
        Self {
            code: ErrorCode::UnknownDocument,
            op: op.into(),
            source: Some(anyhow::anyhow!("no document registered under id '{}'", id)),
        }
    }

    /// Create a Fragment error.
    pub fn fragment(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self {
            code: ErrorCode::Fragment,
            op: op.into(),
            source,
        }
    }

    /// Returns true if this is a MalformedXml error.
    pub fn is_malformed_xml(&self) -> bool {
        self.code == ErrorCode::MalformedXml
    }

    /// Returns true if this is an OrphanedNode error.
    pub fn is_orphaned_node(&self) -> bool {
        self.code == ErrorCode::OrphanedNode
    }

    /// Returns true if this is a NoDocument error.
    pub fn is_no_document(&self) -> bool {
        self.code == ErrorCode::NoDocument
    }

    /// Returns true if this is an UnknownDocument error.
    pub fn is_unknown_document(&self) -> bool {
        self.code == ErrorCode::UnknownDocument
    }

    /// Returns true if this is a Fragment error.
    pub fn is_fragment(&self) -> bool {
        self.code == ErrorCode::Fragment
    }
}
