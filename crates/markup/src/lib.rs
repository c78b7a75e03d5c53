// ABOUTME: Main library entry point for the bookpress markup document layer.
// ABOUTME: Re-exports Document, ContentKind, DocumentRegistry, Target, NodeHandle, MarkupError, ErrorCode.

//! Markup document layer: loading, charset normalization, fragment
//! handling, serialization and cross-document import.
//!
//! A [`Document`] owns one parsed markup blob (HTML, XML or XHTML) as an
//! arena tree, together with its detected type, charset and fragment
//! bookkeeping. A [`DocumentRegistry`] tracks loaded documents by id and
//! resolves ambiguous [`Target`]s to exactly one of them.
//!
//! # Example
//!
//! ```
//! use bookpress_markup::Document;
//!
//! let doc = Document::load("<p>hello</p>", None).unwrap();
//! assert!(doc.is_fragment);
//! assert_eq!(doc.markup(), "<p>hello</p>");
//! ```

pub mod charset;
pub mod document;
pub mod error;
pub mod parse;
pub mod registry;
pub mod serialize;
pub mod tree;

pub use crate::document::{ContentKind, Document};
pub use crate::error::{ErrorCode, MarkupError};
pub use crate::registry::{DocumentRegistry, NodeHandle, Target};
pub use crate::tree::{ElementData, MarkupTree, NodeData};
