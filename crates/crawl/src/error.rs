// ABOUTME: Error types for the crawl pipeline.
// ABOUTME: Provides CrawlError covering config, fetch, empty-content, markup, render and I/O failures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while crawling and assembling the book.
///
/// There is no retry or partial-failure isolation: any error aborts the
/// whole run.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// A required option is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// An HTTP fetch failed; propagates and aborts the run.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        source: anyhow::Error,
    },

    /// A selector matched no content on a fetched page.
    #[error("no content matched '{selector}' at {url}")]
    EmptyContent { url: String, selector: String },

    /// The start URL could not be parsed.
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    /// A document-layer failure (malformed XML, orphaned node, …).
    #[error(transparent)]
    Markup(#[from] bookpress_markup::MarkupError),

    /// The external HTML-to-PDF renderer failed.
    #[error("renderer exited with status {status}: {output}")]
    Render { status: i32, output: String },

    /// A filesystem operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CrawlError {
    /// Creates a Config error with a custom message.
    pub fn config(msg: impl Into<String>) -> Self {
        CrawlError::Config(msg.into())
    }

    /// Creates a Fetch error for a URL.
    pub fn fetch(url: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        CrawlError::Fetch {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Creates an Io error for a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CrawlError::Io {
            path: path.into(),
            source,
        }
    }
}
