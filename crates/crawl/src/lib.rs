// ABOUTME: Main library entry point for the bookpress crawl pipeline.
// ABOUTME: Re-exports Crawler, CrawlOptions, CrawlError and the extraction/assembly helpers.

//! Crawl pipeline: fetch a tutorial site's table of contents, pull every
//! chapter's content block, assemble one printable HTML page and hand it
//! to an external wkhtmltopdf-compatible renderer.
//!
//! Everything is blocking and sequential; the sites this targets are
//! small, ordered books, not the open web.

pub mod assemble;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod options;
pub mod render;

pub use crate::crawler::Crawler;
pub use crate::error::CrawlError;
pub use crate::extract::MenuEntry;
pub use crate::options::{CrawlOptions, DEFAULT_CONTENT_SELECTOR, DEFAULT_MENU_SELECTOR};
