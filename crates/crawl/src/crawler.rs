// ABOUTME: The crawl pipeline: menu, chapters, assembly, render.
// ABOUTME: Fetches each chapter once, caching the extracted block by menu index under the tmp dir.

use std::fs;
use std::path::PathBuf;

use url::Url;

use crate::assemble::{assemble, ASSEMBLED_FILE};
use crate::error::CrawlError;
use crate::extract::{extract_content, extract_menu, MenuEntry};
use crate::fetch::PageFetcher;
use crate::options::CrawlOptions;

/// Crawls a tutorial site's table of contents, fetches every chapter,
/// assembles one printable page and renders it to PDF.
///
/// The pipeline is strictly sequential. Chapter bodies are cached on disk
/// by menu index, so a rerun after a mid-crawl failure resumes where it
/// left off; stale caches are the operator's problem to clear.
pub struct Crawler {
    opts: CrawlOptions,
    fetcher: PageFetcher,
    base: Url,
}

impl Crawler {
    pub fn new(opts: CrawlOptions) -> Result<Self, CrawlError> {
        opts.validate()?;
        let base = Url::parse(&opts.start_url)
            .map_err(|_| CrawlError::InvalidUrl(opts.start_url.clone()))?;
        let fetcher = PageFetcher::new(&opts.user_agent, opts.timeout)?;
        Ok(Self {
            opts,
            fetcher,
            base,
        })
    }

    /// Run the whole pipeline. Returns the path of the rendered PDF.
    pub fn run(&self) -> Result<PathBuf, CrawlError> {
        fs::create_dir_all(&self.opts.tmp_dir)
            .map_err(|e| CrawlError::io(&self.opts.tmp_dir, e))?;
        fs::create_dir_all(&self.opts.out_dir)
            .map_err(|e| CrawlError::io(&self.opts.out_dir, e))?;

        let menu_html = self.fetcher.get(self.base.as_str())?;
        let entries = extract_menu(&menu_html, &self.opts.menu_selector)?;
        if entries.is_empty() {
            return Err(CrawlError::EmptyContent {
                url: self.base.to_string(),
                selector: self.opts.menu_selector.clone(),
            });
        }
        tracing::info!(total_pages = entries.len(), "menu extracted");

        let bodies = self.fetch_chapters(&entries)?;

        let page = assemble(&entries, &bodies, &self.base)?;
        let assembled_path = self.opts.tmp_dir.join(ASSEMBLED_FILE);
        fs::write(&assembled_path, &page).map_err(|e| CrawlError::io(&assembled_path, e))?;
        tracing::info!(path = %assembled_path.display(), "assembled page written");

        let pdf_path = self.opts.out_dir.join(&self.opts.pdf_file_name);
        crate::render::render_pdf(&self.opts.renderer, &assembled_path, &pdf_path)?;
        Ok(pdf_path)
    }

    /// Fetch the content block of every chapter, in menu order.
    ///
    /// Each block is cached as `<index>.html` in the tmp dir and the fetch
    /// is skipped on a cache hit.
    fn fetch_chapters(&self, entries: &[MenuEntry]) -> Result<Vec<String>, CrawlError> {
        let mut bodies = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let cache_path = self.opts.tmp_dir.join(format!("{index}.html"));
            if cache_path.exists() {
                tracing::info!(index, title = %entry.title, "using cached chapter");
                let cached = fs::read_to_string(&cache_path)
                    .map_err(|e| CrawlError::io(&cache_path, e))?;
                bodies.push(cached);
                continue;
            }

            let url = self
                .base
                .join(&entry.href)
                .map_err(|_| CrawlError::InvalidUrl(entry.href.clone()))?;
            tracing::info!(index, title = %entry.title, %url, "fetching chapter");
            let html = self.fetcher.get(url.as_str())?;

            let content = extract_content(&html, &self.opts.content_selector)?.ok_or_else(|| {
                CrawlError::EmptyContent {
                    url: url.to_string(),
                    selector: self.opts.content_selector.clone(),
                }
            })?;

            fs::write(&cache_path, &content).map_err(|e| CrawlError::io(&cache_path, e))?;
            bodies.push(content);
        }
        Ok(bodies)
    }
}
