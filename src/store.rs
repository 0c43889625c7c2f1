//! Flat-file content store.
//!
//! The content directory is the database: one file per page, the directory
//! listing is the index. No cache sits in front of it — every listing is a
//! fresh scan, so external writers (a `git pull`, a stray `vim` session)
//! are picked up immediately.
//!
//! ## Recognized content
//!
//! | Extension      | Kind     | Served via                |
//! |----------------|----------|---------------------------|
//! | `.md`          | markdown | `/content/md/<filename>` (rendered) |
//! | `.html` `.htm` | html     | `/content/<filename>` (raw) |
//! | `.js`          | script   | `/content/<filename>` (raw) |
//!
//! Anything else in the directory is ignored by listings and rejected by
//! saves.
//!
//! ## Filename safety
//!
//! Every filename coming in over the API is sanitized before touching the
//! filesystem: characters outside `[A-Za-z0-9._-]` are dropped, which makes
//! path separators vanish and confines all resolution to the store root.
//! Leading dots are stripped too, so dotfiles cannot be created or read.
//!
//! ## Write races
//!
//! Concurrent saves to the same filename are last-write-wins with no
//! conflict detection, matching the behavior of the editor this store was
//! built for. Saves to different filenames are independent.

use crate::metadata;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid filename: {0:?}")]
    InvalidName(String),
    #[error("unsupported file type: {0:?}")]
    UnsupportedType(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// Content file classification, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Markdown,
    Html,
    Script,
}

impl ContentKind {
    /// Classify a filename by extension. `None` for unrecognized types.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())?;
        match ext.as_str() {
            "md" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            "js" => Some(Self::Script),
            _ => None,
        }
    }

    /// Content type for serving the raw file.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Markdown => "text/markdown; charset=utf-8",
            Self::Html => "text/html; charset=utf-8",
            Self::Script => "text/javascript; charset=utf-8",
        }
    }
}

/// One file in the content store.
#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    /// Unique key within the store, sanitized to `[A-Za-z0-9._-]`.
    pub filename: String,
    /// Listing name from an in-file marker, or the filename stem.
    /// Serialized as `name` — the field the editor client renders.
    #[serde(rename = "name")]
    pub display_name: String,
    pub kind: ContentKind,
    /// Where the item is reachable: markdown routes through the render
    /// endpoint, html and script files are served directly.
    pub public_path: String,
    pub size_bytes: u64,
    /// Modification time as unix milliseconds.
    pub modified_at: i64,
}

/// Derive the public URL for a stored file. Pure function of name + kind.
pub fn public_path(filename: &str, kind: ContentKind) -> String {
    match kind {
        ContentKind::Markdown => format!("/content/md/{filename}"),
        ContentKind::Html | ContentKind::Script => format!("/content/{filename}"),
    }
}

/// Drop every character outside `[A-Za-z0-9._-]`, then strip leading dots.
///
/// Path separators are simply removed, so `../../etc/passwd` collapses to
/// `etcpasswd` and resolution can never escape the store root.
pub fn sanitize_filename(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect();
    kept.trim_start_matches('.').to_string()
}

/// The content store: a single directory of loose files.
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Sanitize a requested filename and resolve it inside the store root.
    fn resolve(&self, raw: &str) -> Result<(String, PathBuf), StoreError> {
        let clean = sanitize_filename(raw);
        if clean.is_empty() {
            return Err(StoreError::InvalidName(raw.to_string()));
        }
        let path = self.root.join(&clean);
        Ok((clean, path))
    }

    /// Scan the store, newest first.
    ///
    /// Non-recursive; only recognized extensions are included. Files that
    /// cannot be read or stat'd are skipped, not surfaced — a half-written
    /// or binary stray should not take the whole listing down. A missing
    /// store directory lists as empty (it is created on first save).
    pub fn list_items(&self) -> Result<Vec<ContentItem>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut items = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let filename = entry.file_name().to_string_lossy().to_string();
            let Some(kind) = ContentKind::from_filename(&filename) else {
                continue;
            };
            match self.build_item(&path, filename, kind) {
                Ok(item) => items.push(item),
                Err(err) => {
                    tracing::debug!(path = %path.display(), %err, "skipping unreadable entry");
                }
            }
        }

        items.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| a.filename.cmp(&b.filename))
        });
        Ok(items)
    }

    /// Read a stored file's content.
    pub fn read_item(&self, filename: &str) -> Result<String, StoreError> {
        let (clean, path) = self.resolve(filename)?;
        fs::read_to_string(&path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound(clean.clone()),
            _ => err.into(),
        })
    }

    /// Persist a file, overwriting any previous version.
    ///
    /// The store directory is created if absent. Version-control commit is
    /// the caller's concern; a failed commit must never undo a save.
    pub fn save_item(&self, filename: &str, content: &str) -> Result<ContentItem, StoreError> {
        let (clean, path) = self.resolve(filename)?;
        let kind = ContentKind::from_filename(&clean)
            .ok_or_else(|| StoreError::UnsupportedType(clean.clone()))?;
        fs::create_dir_all(&self.root)?;
        fs::write(&path, content)?;
        self.build_item(&path, clean, kind)
    }

    /// Remove a file. `NotFound` if it does not exist; nothing else on disk
    /// is touched in that case.
    pub fn delete_item(&self, filename: &str) -> Result<(), StoreError> {
        let (clean, path) = self.resolve(filename)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(clean));
        }
        fs::remove_file(&path)?;
        Ok(())
    }

    /// On-disk path of a stored file, for staging into version control.
    pub fn path_of(&self, filename: &str) -> Result<PathBuf, StoreError> {
        Ok(self.resolve(filename)?.1)
    }

    fn build_item(
        &self,
        path: &Path,
        filename: String,
        kind: ContentKind,
    ) -> Result<ContentItem, StoreError> {
        let meta = fs::metadata(path)?;
        let modified_at = meta
            .modified()
            .map(|t| DateTime::<Utc>::from(t).timestamp_millis())
            .unwrap_or_default();

        let content = fs::read_to_string(path)?;
        let display_name = metadata::extract_display_name(&content)
            .unwrap_or_else(|| metadata::fallback_from_filename(&filename));

        let public_path = public_path(&filename, kind);
        Ok(ContentItem {
            filename,
            display_name,
            kind,
            public_path,
            size_bytes: meta.len(),
            modified_at,
        })
    }
}
