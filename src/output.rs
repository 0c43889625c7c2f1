//! CLI output formatting for the `check` command.
//!
//! Display is information-first: the header line for each entry is its
//! display name and positional index, with the backing filename and public
//! URL as indented context lines. Format functions are pure — they return
//! `Vec<String>` and do no I/O — with thin `print_*` wrappers for stdout.
//!
//! ```text
//! Content
//! 001 My Page
//!     Source: my-page.md
//!     URL: /content/md/my-page.md
//!
//! Media
//! 001 img_20260805_1754400000000000.png (67 bytes)
//! ```

use crate::media::MediaAsset;
use crate::store::ContentItem;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{pos:0>3}")
}

/// Format the content and media inventory.
pub fn format_inventory(items: &[ContentItem], assets: &[MediaAsset]) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push("Content".to_string());
    if items.is_empty() {
        lines.push("    (empty)".to_string());
    }
    for (idx, item) in items.iter().enumerate() {
        lines.push(format!("{} {}", format_index(idx + 1), item.display_name));
        lines.push(format!("    Source: {}", item.filename));
        lines.push(format!("    URL: {}", item.public_path));
    }

    lines.push(String::new());
    lines.push("Media".to_string());
    if assets.is_empty() {
        lines.push("    (empty)".to_string());
    }
    for (idx, asset) in assets.iter().enumerate() {
        lines.push(format!(
            "{} {} ({} bytes)",
            format_index(idx + 1),
            asset.filename,
            asset.size_bytes
        ));
    }

    lines
}

pub fn print_inventory(items: &[ContentItem], assets: &[MediaAsset]) {
    for line in format_inventory(items, assets) {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ContentKind;

    fn item(filename: &str, display_name: &str) -> ContentItem {
        ContentItem {
            filename: filename.to_string(),
            display_name: display_name.to_string(),
            kind: ContentKind::Markdown,
            public_path: format!("/content/md/{filename}"),
            size_bytes: 4,
            modified_at: 0,
        }
    }

    #[test]
    fn inventory_lists_items_with_source_context() {
        let lines = format_inventory(&[item("my-page.md", "My Page")], &[]);
        assert_eq!(lines[0], "Content");
        assert_eq!(lines[1], "001 My Page");
        assert_eq!(lines[2], "    Source: my-page.md");
        assert_eq!(lines[3], "    URL: /content/md/my-page.md");
    }

    #[test]
    fn empty_sections_are_marked() {
        let lines = format_inventory(&[], &[]);
        assert!(lines.contains(&"    (empty)".to_string()));
    }

    #[test]
    fn media_entries_show_size() {
        let assets = vec![MediaAsset {
            filename: "img_20260101_1.png".to_string(),
            url: "/media/img_20260101_1.png".to_string(),
            size_bytes: 67,
            modified_at: 0,
        }];
        let lines = format_inventory(&[], &assets);
        assert!(
            lines
                .iter()
                .any(|l| l.contains("img_20260101_1.png (67 bytes)"))
        );
    }
}
