//! Display-name extraction for content files.
//!
//! Every content file can declare the name it should be listed under via a
//! small marker near the top of the file. Three marker styles exist because
//! the store holds three kinds of file:
//!
//! - **HTML comment marker**: `<!-- content-name: My Page -->` — the native
//!   style for HTML files, also valid inside Markdown.
//! - **Line comment marker**: `// content-name: widget` — for script files,
//!   where an HTML comment would be a syntax error.
//! - **Title line**: `title: My Page` — YAML-front-matter style, checked in
//!   the first few lines only so a stray `title:` deep in prose doesn't
//!   hijack the listing.
//!
//! ## Resolution contract
//!
//! The extractors run in a fixed, documented order — HTML marker, then line
//! marker, then title line — and the first non-empty result wins, regardless
//! of where each marker sits in the file. Files with no marker fall back to
//! their filename stem with dashes and underscores converted to spaces, so
//! `my-page.md` still lists as "my page".

/// How far into a file the `title:` extractor looks.
///
/// The comment markers scan the whole file; a bare `title:` line is only
/// trusted as front matter, i.e. near the top.
const TITLE_SCAN_LINES: usize = 10;

/// Resolve a display name from multiple extractor results.
///
/// Takes candidates in priority order and returns the first non-None,
/// non-empty value after trimming.
pub fn resolve(sources: &[Option<String>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

/// Extract a display name from file content using the marker precedence
/// described in the module docs. Returns `None` if no marker matches.
pub fn extract_display_name(content: &str) -> Option<String> {
    resolve(&[
        html_comment_marker(content),
        line_comment_marker(content),
        title_line(content),
    ])
}

/// Display name fallback: filename stem with `-`/`_` converted to spaces.
///
/// `my-page.md` → "my page", `snake_case.html` → "snake case".
pub fn fallback_from_filename(filename: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);
    stem.replace(['-', '_'], " ")
}

/// `<!-- content-name: NAME -->` anywhere in the file.
fn html_comment_marker(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("<!--")?.trim();
        let name = rest.strip_prefix("content-name:")?;
        let name = name.trim().trim_end_matches("-->").trim();
        Some(name.to_string())
    })
}

/// `// content-name: NAME` anywhere in the file.
fn line_comment_marker(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("//")?.trim();
        let name = rest.strip_prefix("content-name:")?;
        Some(name.trim().to_string())
    })
}

/// `title: NAME` within the first [`TITLE_SCAN_LINES`] lines.
fn title_line(content: &str) -> Option<String> {
    content.lines().take(TITLE_SCAN_LINES).find_map(|line| {
        let name = line.trim().strip_prefix("title:")?;
        Some(name.trim().trim_matches('"').to_string())
    })
}
