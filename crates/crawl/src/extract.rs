// ABOUTME: Selector-based extraction of menu entries and chapter content.
// ABOUTME: Derives heading levels from the indent style of each menu link's parent.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::CrawlError;

/// One table-of-contents link: where it points, what it is called and how
/// deep it is nested (1-based, mapped to `<h1>`..`<h6>` on assembly).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub href: String,
    pub title: String,
    pub level: u8,
}

static MARGIN_LEVEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"margin-left:\s*(\d+)em").expect("margin regex compiles"));

/// Extract the menu entries from the table-of-contents page.
///
/// Links without an `href` are skipped. The nesting level comes from the
/// parent element's inline `margin-left: Nem` indent; links without one
/// default to level 2.
pub fn extract_menu(html: &str, selector: &str) -> Result<Vec<MenuEntry>, CrawlError> {
    let selector = parse_selector(selector, "menu")?;
    let doc = Html::parse_document(html);

    let mut entries = Vec::new();
    for link in doc.select(&selector) {
        let href = match link.value().attr("href") {
            Some(h) if !h.trim().is_empty() => h.to_string(),
            _ => continue,
        };
        let title = link.text().collect::<String>().trim().to_string();
        let level = link
            .parent()
            .and_then(ElementRef::wrap)
            .and_then(|parent| parent.value().attr("style"))
            .and_then(indent_level)
            .unwrap_or(2);
        entries.push(MenuEntry { href, title, level });
    }
    Ok(entries)
}

/// Extract the first content block matching `selector` from a chapter page.
/// Returns the block's inner markup, or `None` when nothing matches or the
/// match is empty.
pub fn extract_content(html: &str, selector: &str) -> Result<Option<String>, CrawlError> {
    let selector = parse_selector(selector, "content")?;
    let doc = Html::parse_document(html);

    match doc.select(&selector).next() {
        Some(block) => {
            let inner = block.inner_html();
            if inner.trim().is_empty() {
                Ok(None)
            } else {
                Ok(Some(inner))
            }
        }
        None => Ok(None),
    }
}

fn parse_selector(selector: &str, role: &str) -> Result<Selector, CrawlError> {
    Selector::parse(selector)
        .map_err(|e| CrawlError::config(format!("invalid {role} selector '{selector}': {e}")))
}

fn indent_level(style: &str) -> Option<u8> {
    let caps = MARGIN_LEVEL_RE.captures(style)?;
    let n: u8 = caps[1].parse().ok()?;
    Some(n.clamp(1, 6))
}
