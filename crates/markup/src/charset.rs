// ABOUTME: Charset extraction, detection and meta-declaration rewriting for loaded markup.
// ABOUTME: Handles content-type parsing, byte decoding via encoding_rs/chardetng, and meta relocation.

use once_cell::sync::Lazy;
use regex::Regex;

/// Fallback charset when neither the document nor the caller declares one.
pub const DEFAULT_CHARSET: &str = "UTF-8";

static META_CONTENT_TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?content-type["']?[^>]*>"#)
        .expect("static regex")
});

static META_CONTENT_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)content\s*=\s*["']([^"']+)["']"#).expect("static regex")
});

static META_CHARSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta\s+charset\s*=\s*["']?([a-zA-Z0-9_.:\-]+)["']?\s*/?>"#)
        .expect("static regex")
});

static XML_DECL_ENCODING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<\?xml[^>]+encoding\s*=\s*["']([^"']+)["']"#).expect("static regex")
});

/// Split a content-type string into (media type, charset), both lowercased.
///
/// `text/html; charset=gb2312` → `("text/html", Some("gb2312"))`.
pub fn split_content_type(content_type: &str) -> (String, Option<String>) {
    let lower = content_type.trim().to_lowercase();
    let mut parts = lower.splitn(2, ';');
    let kind = parts.next().unwrap_or_default().trim().to_string();
    let charset = parts.next().and_then(|rest| {
        rest.split(';').find_map(|param| {
            let trimmed = param.trim();
            trimmed
                .strip_prefix("charset=")
                .map(|c| c.trim_matches('"').trim_matches('\'').to_string())
        })
    });
    (kind, charset)
}

/// Extract the charset declared by a `Content-Type` meta tag or a
/// `<meta charset=…>` tag, if any.
pub fn charset_from_html(markup: &str) -> Option<String> {
    if let Some(meta) = META_CONTENT_TYPE_RE.find(markup) {
        if let Some(caps) = META_CONTENT_ATTR_RE.captures(meta.as_str()) {
            let (_, charset) = split_content_type(&caps[1]);
            if charset.is_some() {
                return charset;
            }
        }
    }
    META_CHARSET_RE
        .captures(markup)
        .map(|caps| caps[1].to_lowercase())
}

/// Extract the charset from an XML declaration's `encoding` attribute.
pub fn charset_from_xml(markup: &str) -> Option<String> {
    XML_DECL_ENCODING_RE
        .captures(markup)
        .map(|caps| caps[1].to_lowercase())
}

/// Repositions the `Content-Type` meta tag at the start of `<head>`.
///
/// Some consumers only honor the declaration when it appears before any
/// other head content. Returns the markup unchanged when there is no meta
/// tag or no head element.
pub fn relocate_meta_to_head(markup: &str) -> String {
    let meta = match META_CONTENT_TYPE_RE.find(markup) {
        Some(m) => m,
        None => return markup.to_string(),
    };
    let meta_tag = meta.as_str().to_string();
    let mut stripped = String::with_capacity(markup.len());
    stripped.push_str(&markup[..meta.start()]);
    stripped.push_str(&markup[meta.end()..]);

    let head_open = match find_tag_end(&stripped, "<head") {
        Some(pos) => pos,
        None => return markup.to_string(),
    };
    let mut out = String::with_capacity(stripped.len() + meta_tag.len());
    out.push_str(&stripped[..head_open]);
    out.push_str(&meta_tag);
    out.push_str(&stripped[head_open..]);
    out
}

/// Replaces any existing charset declaration with a `Content-Type` meta tag
/// for `charset`, inserting a head section when the markup lacks one.
pub fn set_html_charset(markup: &str, charset: &str, xhtml: bool) -> String {
    let cleaned = META_CONTENT_TYPE_RE.replace_all(markup, "");
    let cleaned = META_CHARSET_RE.replace_all(&cleaned, "");
    let meta = format!(
        "<meta http-equiv=\"Content-Type\" content=\"text/html;charset={}\"{}>",
        charset,
        if xhtml { " /" } else { "" }
    );
    if let Some(pos) = find_tag_end(&cleaned, "<head") {
        let mut out = String::with_capacity(cleaned.len() + meta.len());
        out.push_str(&cleaned[..pos]);
        out.push_str(&meta);
        out.push_str(&cleaned[pos..]);
        return out;
    }
    if let Some(pos) = find_tag_end(&cleaned, "<html") {
        let mut out = String::with_capacity(cleaned.len() + meta.len() + 13);
        out.push_str(&cleaned[..pos]);
        out.push_str("<head>");
        out.push_str(&meta);
        out.push_str("</head>");
        out.push_str(&cleaned[pos..]);
        return out;
    }
    format!("{}{}", meta, cleaned)
}

/// Builds an XML declaration for the given charset.
pub fn xml_declaration(charset: &str) -> String {
    format!("<?xml version=\"1.0\" encoding=\"{}\"?>", charset)
}

/// Finds the byte offset just past the `>` of the first occurrence of an
/// opening tag prefix such as `<head` or `<html`, case-insensitively.
///
/// Scans byte windows rather than lowercasing the haystack; lowercasing can
/// change byte lengths (ẞ → ß) and desync the offsets.
fn find_tag_end(markup: &str, prefix: &str) -> Option<usize> {
    let pattern = prefix.as_bytes();
    let start = markup
        .as_bytes()
        .windows(pattern.len())
        .position(|window| window.eq_ignore_ascii_case(pattern))?;
    let close = markup[start..].find('>')?;
    Some(start + close + 1)
}

/// Decode body bytes to a String using the content-type charset when valid,
/// otherwise chardetng detection. Returns the decoded text and the encoding
/// actually used.
pub fn decode_bytes(
    body: &[u8],
    content_type: Option<&str>,
) -> (String, &'static encoding_rs::Encoding) {
    if let Some(ct) = content_type {
        let (_, charset) = split_content_type(ct);
        if let Some(charset) = charset {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return (decoded.into_owned(), encoding);
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    (decoded.into_owned(), encoding)
}
