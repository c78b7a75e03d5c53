// ABOUTME: CLI for crawling a tutorial site into a single PDF.
// ABOUTME: Parses options, runs the bookpress-crawl pipeline and prints the output path.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use bookpress_crawl::{CrawlOptions, Crawler, DEFAULT_CONTENT_SELECTOR, DEFAULT_MENU_SELECTOR};
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Crawl an online tutorial's table of contents and render it to one PDF.
#[derive(Parser, Debug)]
#[command(name = "bookpress")]
#[command(about = "Crawl a tutorial site into a single PDF", long_about = None)]
struct Args {
    /// Table-of-contents URL of the tutorial to crawl.
    url: String,

    /// Directory for fetched chapters and the assembled page.
    #[arg(long, default_value = "./html")]
    tmp_dir: PathBuf,

    /// Directory the PDF is written to.
    #[arg(long, default_value = "./pdf")]
    out_dir: PathBuf,

    /// PDF file name (defaults to a timestamped name).
    #[arg(long)]
    output: Option<String>,

    /// HTML-to-PDF renderer executable.
    #[arg(long, default_value = "wkhtmltopdf")]
    renderer: String,

    /// CSS selector for the menu links on the start page.
    #[arg(long, default_value = DEFAULT_MENU_SELECTOR)]
    menu_selector: String,

    /// CSS selector for the content block on each chapter page.
    #[arg(long, default_value = DEFAULT_CONTENT_SELECTOR)]
    content_selector: String,

    /// User-Agent header sent with every request.
    #[arg(long)]
    user_agent: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut opts = CrawlOptions::new(&args.url)
        .with_tmp_dir(args.tmp_dir)
        .with_out_dir(args.out_dir)
        .with_renderer(args.renderer)
        .with_menu_selector(args.menu_selector)
        .with_content_selector(args.content_selector)
        .with_timeout(Duration::from_secs(args.timeout));
    if let Some(output) = args.output {
        opts = opts.with_pdf_file_name(output);
    }
    if let Some(user_agent) = args.user_agent {
        opts = opts.with_user_agent(user_agent);
    }

    let crawler = Crawler::new(opts)?;
    let pdf_path = crawler.run()?;
    println!("{}", pdf_path.display());
    Ok(())
}
