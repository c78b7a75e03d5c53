// ABOUTME: Invokes the external HTML-to-PDF renderer.
// ABOUTME: Shells out to a wkhtmltopdf-compatible executable and relays its output.

use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

use crate::error::CrawlError;

/// Render the assembled HTML page to a PDF by invoking the configured
/// renderer as `<renderer> --outline <html> --encode utf8 <pdf>`.
///
/// The renderer's stdout and stderr are relayed so progress output stays
/// visible. A non-zero exit status is an error.
pub fn render_pdf(renderer: &str, html_path: &Path, pdf_path: &Path) -> Result<(), CrawlError> {
    let mut cmd = Command::new(renderer);
    cmd.arg("--outline")
        .arg(html_path)
        .arg("--encode")
        .arg("utf8")
        .arg(pdf_path);
    tracing::info!(command = ?cmd, "invoking renderer");

    let output = cmd.output().map_err(|e| CrawlError::Render {
        status: -1,
        output: format!("failed to run '{renderer}': {e}"),
    })?;

    let _ = io::stdout().write_all(&output.stdout);
    let _ = io::stderr().write_all(&output.stderr);

    if !output.status.success() {
        let status = output.status.code().unwrap_or(-1);
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(CrawlError::Render {
            status,
            output: combined.trim().to_string(),
        });
    }

    tracing::info!(pdf = %pdf_path.display(), "renderer finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn succeeding_renderer_is_ok() {
        // `true` ignores its arguments and exits 0.
        let html = PathBuf::from("in.html");
        let pdf = PathBuf::from("out.pdf");
        render_pdf("true", &html, &pdf).unwrap();
    }

    #[test]
    fn failing_renderer_is_error() {
        let html = PathBuf::from("in.html");
        let pdf = PathBuf::from("out.pdf");
        let err = render_pdf("false", &html, &pdf).unwrap_err();
        assert!(matches!(err, CrawlError::Render { status: 1, .. }));
    }

    #[test]
    fn missing_renderer_is_error() {
        let html = PathBuf::from("in.html");
        let pdf = PathBuf::from("out.pdf");
        let err = render_pdf("definitely-not-a-real-renderer", &html, &pdf).unwrap_err();
        assert!(matches!(err, CrawlError::Render { status: -1, .. }));
    }
}
