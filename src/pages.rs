//! Server-rendered pages.
//!
//! Three pages exist: the homepage (content listing), the gallery (media
//! grid), and rendered markdown content. All HTML is generated with
//! [maud](https://maud.lambda.xyz/) — compile-time checked templates with
//! automatic escaping — and markdown bodies go through pulldown-cmark.
//!
//! The stylesheet is embedded at compile time; pages ship as single
//! self-contained documents with no asset round trips.

use crate::media::MediaAsset;
use crate::store::ContentItem;
use chrono::DateTime;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};

const CSS: &str = include_str!("../static/style.css");

/// Renders the base HTML document structure.
fn base_document(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(CSS)) }
            }
            body {
                (content)
            }
        }
    }
}

fn site_header(site_title: &str) -> Markup {
    html! {
        header.site-header {
            span { (site_title) }
            nav {
                a href="/" { "Home" }
                a href="/gallery" { "Gallery" }
            }
        }
    }
}

/// Format a unix-millis timestamp for listing display.
fn format_date(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// The homepage: every content item, newest first.
pub fn render_home(items: &[ContentItem]) -> Markup {
    let content = html! {
        (site_header("Home"))
        main {
            @if items.is_empty() {
                p.empty-note { "No content yet." }
            } @else {
                ul.content-list {
                    @for item in items {
                        li {
                            a href=(item.public_path) { (item.display_name) }
                            span.meta { (format_date(item.modified_at)) }
                        }
                    }
                }
            }
        }
    };
    base_document("Home", content)
}

/// The gallery: every uploaded image, newest first.
pub fn render_gallery(assets: &[MediaAsset]) -> Markup {
    let content = html! {
        (site_header("Gallery"))
        main {
            @if assets.is_empty() {
                p.empty-note { "No images yet." }
            } @else {
                div.gallery-grid {
                    @for asset in assets {
                        a href=(asset.url) {
                            img src=(asset.url) alt=(asset.filename) loading="lazy";
                        }
                    }
                }
            }
        }
    };
    base_document("Gallery", content)
}

/// A markdown content file rendered as a full page.
pub fn render_markdown_page(title: &str, markdown: &str) -> Markup {
    let parser = Parser::new(markdown);
    let mut body = String::new();
    md_html::push_html(&mut body, parser);

    let content = html! {
        (site_header(title))
        main.page {
            (PreEscaped(body))
        }
    };
    base_document(title, content)
}
