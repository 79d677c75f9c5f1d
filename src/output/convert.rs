//! HTML to Markdown conversion of the selected content
//!
//! The selected element is serialized by `scraper`, its link and image URLs
//! are made absolute by a `lol_html` rewriter, and the result is converted
//! with `html2md`, and optionally cut at a marker
//! string. Headings are always emitted in ATX (`#`) style.

use crate::output::OutputResult;
use lol_html::{element, HtmlRewriter, Settings};
use scraper::{Html, Selector};
use url::Url;

/// Cuts `markdown` at the first occurrence of `marker` (exclusive)
///
/// An empty marker, or one that does not occur, leaves the text unchanged.
///
/// # Examples
///
/// ```
/// use docs_to_markdown::output::truncate_at_marker;
///
/// assert_eq!(truncate_at_marker("keep STOP discard", "STOP"), "keep ");
/// assert_eq!(truncate_at_marker("keep all", "STOP"), "keep all");
/// ```
pub fn truncate_at_marker<'a>(markdown: &'a str, marker: &str) -> &'a str {
    if marker.is_empty() {
        return markdown;
    }

    match markdown.find(marker) {
        Some(index) => &markdown[..index],
        None => markdown,
    }
}

/// Converts an HTML fragment to Markdown
///
/// # Arguments
///
/// * `html` - The HTML to convert
/// * `ignore_after` - Optional marker; it and everything after it is dropped
pub fn html_to_markdown(html: &str, ignore_after: Option<&str>) -> String {
    let markdown = setext_to_atx(&html2md::parse_html(html));

    match ignore_after {
        Some(marker) => truncate_at_marker(&markdown, marker).to_string(),
        None => markdown,
    }
}

/// Rewrites setext headings (underlined with `=` or `-`) as ATX headings
///
/// Lines inside fenced code blocks are left alone.
pub fn setext_to_atx(markdown: &str) -> String {
    let lines: Vec<&str> = markdown.lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut in_fence = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        } else if !in_fence && !line.trim().is_empty() {
            if let Some(level) = lines.get(i + 1).and_then(|next| setext_level(next)) {
                out.push(format!("{} {}", "#".repeat(level), line.trim()));
                i += 2;
                continue;
            }
        }

        out.push(line.to_string());
        i += 1;
    }

    let mut result = out.join("\n");
    if markdown.ends_with('\n') {
        result.push('\n');
    }
    result
}

fn setext_level(line: &str) -> Option<usize> {
    let underline = line.trim();
    if underline.len() < 3 {
        return None;
    }

    if underline.chars().all(|c| c == '=') {
        Some(1)
    } else if underline.chars().all(|c| c == '-') {
        Some(2)
    } else {
        None
    }
}

/// Serializes the first element matching `selector`, with absolute URLs
///
/// `href` and `src` attributes of `a` and `img` elements are resolved
/// against `base` and spaces in them are encoded as `%20`.
///
/// # Returns
///
/// * `Ok(Some(String))` - The element's HTML
/// * `Ok(None)` - The selector does not parse or matches nothing
/// * `Err(OutputError)` - Rewriting the element's links failed
pub fn render_content(document: &Html, selector: &str, base: &Url) -> OutputResult<Option<String>> {
    let Ok(parsed) = Selector::parse(selector) else {
        return Ok(None);
    };
    let Some(element) = document.select(&parsed).next() else {
        return Ok(None);
    };

    absolutize_links(&element.html(), base).map(Some)
}

/// Extracts the main content of a page as Markdown
///
/// Combines [`render_content`] and [`html_to_markdown`].
pub fn content_to_markdown(
    document: &Html,
    selector: &str,
    base: &Url,
    ignore_after: Option<&str>,
) -> OutputResult<Option<String>> {
    Ok(render_content(document, selector, base)?.map(|html| html_to_markdown(&html, ignore_after)))
}

/// Rewrites `a[href]` and `img[src]` in an HTML fragment to absolute URLs
fn absolutize_links(html: &str, base: &Url) -> OutputResult<String> {
    let mut output = Vec::with_capacity(html.len());

    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: vec![
                element!("a[href]", |el| {
                    if let Some(href) = el.get_attribute("href") {
                        el.set_attribute("href", &absolutize(&href, base))?;
                    }
                    Ok(())
                }),
                element!("img[src]", |el| {
                    if let Some(src) = el.get_attribute("src") {
                        el.set_attribute("src", &absolutize(&src, base))?;
                    }
                    Ok(())
                }),
            ],
            ..Settings::default()
        },
        |chunk: &[u8]| output.extend_from_slice(chunk),
    );

    rewriter.write(html.as_bytes())?;
    rewriter.end()?;

    Ok(String::from_utf8_lossy(&output).into_owned())
}

fn absolutize(value: &str, base: &Url) -> String {
    let value = value.trim();

    // Same-page anchors and pseudo links stay as they are
    if value.starts_with('#') || value.starts_with("javascript:") || value.starts_with("mailto:") {
        return value.to_string();
    }

    match base.join(value) {
        Ok(absolute) => absolute.to_string(),
        Err(_) => value.to_string(),
    }
    .replace(' ', "%20")
}
