// ABOUTME: End-to-end pipeline tests against a local mock HTTP server.
// ABOUTME: Verifies menu-order assembly, src rewriting, chapter caching and renderer failures.

use bookpress_crawl::{CrawlOptions, Crawler};
use httpmock::prelude::*;
use tempfile::TempDir;

const TOC_PAGE: &str = r#"<html><body>
  <div class="x-sidebar-left-content"><ul class="uk-nav-side">
    <li style="margin-left:1em;"><a href="/wiki/intro">Introduction</a></li>
    <li style="margin-left:2em;"><a href="/wiki/setup">Setup</a></li>
  </ul></div>
</body></html>"#;

const INTRO_PAGE: &str = r#"<html><body>
  <div class="x-wiki-content"><p>welcome</p><img src="/files/logo.png"></div>
</body></html>"#;

const SETUP_PAGE: &str = r#"<html><body>
  <div class="x-wiki-content"><p>install things</p></div>
</body></html>"#;

fn mock_site(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/wiki/toc");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(TOC_PAGE);
    });
    server.mock(|when, then| {
        when.method(GET).path("/wiki/intro");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(INTRO_PAGE);
    });
    server.mock(|when, then| {
        when.method(GET).path("/wiki/setup");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(SETUP_PAGE);
    });
}

fn options(server: &MockServer, tmp: &TempDir) -> CrawlOptions {
    CrawlOptions::new(server.url("/wiki/toc"))
        .with_tmp_dir(tmp.path().join("html"))
        .with_out_dir(tmp.path().join("pdf"))
        .with_pdf_file_name("book.pdf")
        .with_renderer("true")
}

#[test]
fn full_run_assembles_in_menu_order() {
    let server = MockServer::start();
    mock_site(&server);
    let tmp = TempDir::new().unwrap();

    let crawler = Crawler::new(options(&server, &tmp)).unwrap();
    let pdf_path = crawler.run().unwrap();
    assert_eq!(pdf_path, tmp.path().join("pdf").join("book.pdf"));

    let page = std::fs::read_to_string(tmp.path().join("html").join("assembled.html")).unwrap();
    let h1 = page.find("<h1>Introduction</h1>").unwrap();
    let welcome = page.find("<p>welcome</p>").unwrap();
    let h2 = page.find("<h2>Setup</h2>").unwrap();
    let install = page.find("<p>install things</p>").unwrap();
    assert!(h1 < welcome && welcome < h2 && h2 < install);

    // Root-relative images now point at the origin server.
    let absolute = format!(r#"src="{}""#, server.url("/files/logo.png"));
    assert!(page.contains(&absolute), "missing rewritten src in {page}");
}

#[test]
fn chapters_are_cached_by_menu_index() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/wiki/toc");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(TOC_PAGE);
    });
    server.mock(|when, then| {
        when.method(GET).path("/wiki/setup");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(SETUP_PAGE);
    });
    let intro_mock = server.mock(|when, then| {
        when.method(GET).path("/wiki/intro");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(INTRO_PAGE);
    });

    let tmp = TempDir::new().unwrap();
    let opts = options(&server, &tmp);

    // Pre-seed the first chapter's cache slot; the crawler must not fetch it.
    std::fs::create_dir_all(tmp.path().join("html")).unwrap();
    std::fs::write(
        tmp.path().join("html").join("0.html"),
        "<p>cached welcome</p>",
    )
    .unwrap();

    let crawler = Crawler::new(opts).unwrap();
    crawler.run().unwrap();

    assert_eq!(intro_mock.calls(), 0);
    let page = std::fs::read_to_string(tmp.path().join("html").join("assembled.html")).unwrap();
    assert!(page.contains("<p>cached welcome</p>"));
    assert!(page.contains("<p>install things</p>"));
}

#[test]
fn chapter_fetch_failure_aborts_run() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/wiki/toc");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body(TOC_PAGE);
    });
    server.mock(|when, then| {
        when.method(GET).path("/wiki/intro");
        then.status(500).body("boom");
    });

    let tmp = TempDir::new().unwrap();
    let crawler = Crawler::new(options(&server, &tmp)).unwrap();
    let err = crawler.run().unwrap_err();
    assert!(matches!(err, bookpress_crawl::CrawlError::Fetch { .. }));
}

#[test]
fn empty_menu_is_an_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/wiki/toc");
        then.status(200)
            .header("content-type", "text/html; charset=utf-8")
            .body("<html><body><p>no sidebar here</p></body></html>");
    });

    let tmp = TempDir::new().unwrap();
    let crawler = Crawler::new(options(&server, &tmp)).unwrap();
    let err = crawler.run().unwrap_err();
    assert!(matches!(
        err,
        bookpress_crawl::CrawlError::EmptyContent { .. }
    ));
}

#[test]
fn failing_renderer_surfaces_error() {
    let server = MockServer::start();
    mock_site(&server);
    let tmp = TempDir::new().unwrap();

    let opts = options(&server, &tmp).with_renderer("false");
    let crawler = Crawler::new(opts).unwrap();
    let err = crawler.run().unwrap_err();
    assert!(matches!(err, bookpress_crawl::CrawlError::Render { .. }));
}
