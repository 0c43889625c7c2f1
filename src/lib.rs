//! # flatsite
//!
//! A small personal-website server backed by flat files. The content
//! directory is the database: one file per page, the directory listing is
//! the index, and a git repository underneath provides history. A
//! browser-based editor drives the HTTP API to write pages, upload images,
//! and trigger content refreshes.
//!
//! # Architecture
//!
//! Everything shares one directory tree as its only persistent state:
//!
//! ```text
//! save / upload   →  content/ + media/   (Content Writer, Media Ingest)
//! listings        ←  content/ + media/   (Content Store — fresh scan, no cache)
//! git pull        →  content/ + media/   (Revision Trigger)
//! ```
//!
//! Mutations are acknowledged as soon as the file write lands; the git
//! commit behind each mutation is a spawned background task whose failure
//! is logged and never surfaced. See [`vcs`] for the contract.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | Content store — scan, read, save, delete, filename sanitization |
//! | [`metadata`] | Display-name extraction: ordered marker strategies with filename fallback |
//! | [`media`] | Image ingest — collision-resistant naming, validation, gallery listing |
//! | [`vcs`] | Background git commit/pull/push with a structured failure policy |
//! | [`reload`] | Process-manager reload candidates for the revision trigger |
//! | [`server`] | axum router, token auth, JSON envelopes |
//! | [`pages`] | Server-rendered HTML (maud): homepage, gallery, markdown pages |
//! | [`config`] | `config.toml` loading, validation, stock config |
//! | [`output`] | CLI inventory formatting for `check` |
//!
//! # Design Decisions
//!
//! ## Filesystem Over Database
//!
//! Pages live as loose `.md`/`.html`/`.js` files so they stay editable
//! with anything — the browser editor, `vim` over ssh, or a git push from
//! another machine. Listings re-scan on every request; with tens of files
//! the cost is unmeasurable and staleness bugs are impossible.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/): compile-time
//! checked templates, auto-escaped interpolation, no runtime template
//! directory to ship or get out of sync.
//!
//! ## Best-Effort Version Control
//!
//! The file write is the unit of success. Commits, pushes, pulls and
//! process reloads are background tasks that log their failures; a broken
//! git setup degrades the site to "no history" rather than "cannot save".

pub mod config;
pub mod media;
pub mod metadata;
pub mod output;
pub mod pages;
pub mod reload;
pub mod server;
pub mod store;
pub mod vcs;

#[cfg(test)]
pub(crate) mod test_helpers;
