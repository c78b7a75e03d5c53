// ABOUTME: Assembles fetched chapter fragments into one printable HTML page.
// ABOUTME: Inserts per-chapter headings and rewrites root-relative src attributes to absolute URLs.

use bookpress_markup::Document;
use ego_tree::NodeId;
use url::Url;

use crate::error::CrawlError;
use crate::extract::MenuEntry;

/// File name of the assembled page inside the tmp directory.
pub const ASSEMBLED_FILE: &str = "assembled.html";

const PAGE_SHELL: &str = "<html><head><title>book</title>\
<meta http-equiv=\"Content-Type\" content=\"text/html;charset=utf-8\">\
<style>body{font-size:24px;}</style></head><body></body></html>";

/// Build the single printable page from the menu entries and their fetched
/// content blocks, in menu order. Each chapter gets a heading whose level
/// matches the entry's menu indent, and every root-relative `src` inside a
/// chapter body is rewritten against `base` so the renderer can fetch it.
pub fn assemble(
    entries: &[MenuEntry],
    bodies: &[String],
    base: &Url,
) -> Result<String, CrawlError> {
    let mut doc = Document::load(PAGE_SHELL, Some("text/html;charset=utf-8"))?;

    for (entry, body) in entries.iter().zip(bodies) {
        let heading = format!(
            "<h{level}>{title}</h{level}>",
            level = entry.level,
            title = escape_text(&entry.title),
        );
        doc.import_markup(&heading)?;

        let imported = doc.import_markup(body)?;
        rewrite_relative_srcs(&mut doc, &imported, base);
    }

    Ok(doc.markup())
}

/// Point every `src="/..."` under the given subtrees at `base`.
/// Protocol-relative `//host/...` references are already absolute enough
/// and are left alone.
fn rewrite_relative_srcs(doc: &mut Document, roots: &[NodeId], base: &Url) {
    let mut pending = Vec::new();
    for &root in roots {
        let Some(node) = doc.tree().get(root) else {
            continue;
        };
        for descendant in node.descendants() {
            let Some(element) = descendant.value().as_element() else {
                continue;
            };
            if let Some(src) = element.attr("src") {
                if src.starts_with('/') && !src.starts_with("//") {
                    if let Ok(absolute) = base.join(src) {
                        pending.push((descendant.id(), absolute.to_string()));
                    }
                }
            }
        }
    }

    for (id, absolute) in pending {
        if let Some(mut node) = doc.tree_mut().get_mut(id) {
            if let Some(element) = node.value().as_element_mut() {
                element.set_attr("src", absolute);
            }
        }
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://books.example.com/wiki/toc").unwrap()
    }

    #[test]
    fn chapters_in_menu_order_with_headings() {
        let entries = vec![
            MenuEntry {
                href: "/wiki/intro".to_string(),
                title: "Introduction".to_string(),
                level: 1,
            },
            MenuEntry {
                href: "/wiki/setup".to_string(),
                title: "Setup".to_string(),
                level: 2,
            },
        ];
        let bodies = vec![
            "<p>welcome</p>".to_string(),
            "<p>install things</p>".to_string(),
        ];

        let page = assemble(&entries, &bodies, &base()).unwrap();
        let intro = page.find("<h1>Introduction</h1>").unwrap();
        let welcome = page.find("<p>welcome</p>").unwrap();
        let setup = page.find("<h2>Setup</h2>").unwrap();
        let install = page.find("<p>install things</p>").unwrap();
        assert!(intro < welcome && welcome < setup && setup < install);
    }

    #[test]
    fn root_relative_src_made_absolute() {
        let entries = vec![MenuEntry {
            href: "/wiki/pics".to_string(),
            title: "Pictures".to_string(),
            level: 1,
        }];
        let bodies = vec![
            r#"<p><img src="/files/a.png"><img src="//cdn.example.com/b.png"><img src="https://x.example.com/c.png"></p>"#
                .to_string(),
        ];

        let page = assemble(&entries, &bodies, &base()).unwrap();
        assert!(page.contains(r#"src="https://books.example.com/files/a.png""#));
        assert!(page.contains(r#"src="//cdn.example.com/b.png""#));
        assert!(page.contains(r#"src="https://x.example.com/c.png""#));
    }

    #[test]
    fn heading_titles_are_escaped() {
        let entries = vec![MenuEntry {
            href: "/wiki/ops".to_string(),
            title: "Tips & <tricks>".to_string(),
            level: 1,
        }];
        let bodies = vec!["<p>body</p>".to_string()];

        let page = assemble(&entries, &bodies, &base()).unwrap();
        assert!(page.contains("<h1>Tips &amp; &lt;tricks&gt;</h1>"));
    }

    #[test]
    fn shell_charset_survives() {
        let page = assemble(&[], &[], &base()).unwrap();
        assert!(page.to_lowercase().contains("charset=utf-8"));
        assert!(page.contains("<title>book</title>"));
    }
}
