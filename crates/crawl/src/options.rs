// ABOUTME: Configuration options for a crawl run.
// ABOUTME: Provides CrawlOptions with builder-style setters, defaults and validation.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;

use crate::error::CrawlError;

/// Default CSS selector matching the table-of-contents links.
pub const DEFAULT_MENU_SELECTOR: &str = ".x-sidebar-left-content .uk-nav-side a";

/// Default CSS selector matching the article body on a chapter page.
pub const DEFAULT_CONTENT_SELECTOR: &str = ".x-wiki-content";

const DEFAULT_USER_AGENT: &str = concat!("bookpress/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Options controlling a crawl run.
///
/// Construct with [`CrawlOptions::new`] and chain the `with_*` setters.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// The table-of-contents URL. Chapter links are resolved against it.
    pub start_url: String,
    /// Directory for fetched chapter fragments and the assembled page.
    pub tmp_dir: PathBuf,
    /// Directory the rendered PDF is written to.
    pub out_dir: PathBuf,
    /// File name of the rendered PDF inside `out_dir`.
    pub pdf_file_name: String,
    /// Executable invoked to render HTML to PDF.
    pub renderer: String,
    /// CSS selector for the menu links on the start page.
    pub menu_selector: String,
    /// CSS selector for the content block on each chapter page.
    pub content_selector: String,
    /// User-Agent header sent with every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl CrawlOptions {
    pub fn new(start_url: impl Into<String>) -> Self {
        Self {
            start_url: start_url.into(),
            tmp_dir: PathBuf::from("./html"),
            out_dir: PathBuf::from("./pdf"),
            pdf_file_name: default_pdf_file_name(),
            renderer: "wkhtmltopdf".to_string(),
            menu_selector: DEFAULT_MENU_SELECTOR.to_string(),
            content_selector: DEFAULT_CONTENT_SELECTOR.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_tmp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tmp_dir = dir.into();
        self
    }

    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    pub fn with_pdf_file_name(mut self, name: impl Into<String>) -> Self {
        self.pdf_file_name = name.into();
        self
    }

    pub fn with_renderer(mut self, renderer: impl Into<String>) -> Self {
        self.renderer = renderer.into();
        self
    }

    pub fn with_menu_selector(mut self, selector: impl Into<String>) -> Self {
        self.menu_selector = selector.into();
        self
    }

    pub fn with_content_selector(mut self, selector: impl Into<String>) -> Self {
        self.content_selector = selector.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks that every required field is non-empty.
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.start_url.trim().is_empty() {
            return Err(CrawlError::config("start URL must not be empty"));
        }
        if self.pdf_file_name.trim().is_empty() {
            return Err(CrawlError::config("PDF file name must not be empty"));
        }
        if self.renderer.trim().is_empty() {
            return Err(CrawlError::config("renderer must not be empty"));
        }
        if self.menu_selector.trim().is_empty() {
            return Err(CrawlError::config("menu selector must not be empty"));
        }
        if self.content_selector.trim().is_empty() {
            return Err(CrawlError::config("content selector must not be empty"));
        }
        Ok(())
    }
}

fn default_pdf_file_name() -> String {
    format!("{}.pdf", Local::now().format("%Y-%m-%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let opts = CrawlOptions::new("https://example.com/wiki/toc");
        opts.validate().unwrap();
        assert!(opts.pdf_file_name.ends_with(".pdf"));
        assert_eq!(opts.renderer, "wkhtmltopdf");
    }

    #[test]
    fn empty_url_rejected() {
        let opts = CrawlOptions::new("  ");
        let err = opts.validate().unwrap_err();
        assert!(matches!(err, CrawlError::Config(_)));
    }

    #[test]
    fn builder_setters_apply() {
        let opts = CrawlOptions::new("https://example.com/")
            .with_tmp_dir("/tmp/pages")
            .with_renderer("weasyprint")
            .with_pdf_file_name("book.pdf");
        assert_eq!(opts.tmp_dir, PathBuf::from("/tmp/pages"));
        assert_eq!(opts.renderer, "weasyprint");
        assert_eq!(opts.pdf_file_name, "book.pdf");
    }

    #[test]
    fn empty_selector_rejected() {
        let opts = CrawlOptions::new("https://example.com/").with_menu_selector("");
        assert!(opts.validate().is_err());
    }
}
