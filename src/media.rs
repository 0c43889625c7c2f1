//! Media ingest: uploaded images and the gallery listing.
//!
//! Uploads are stored as-is in a flat media directory — no re-encoding, no
//! thumbnails. Each asset gets a generated name and is immutable from then
//! on: assets are only ever added, never updated.
//!
//! ## Naming
//!
//! Stored names follow `img_<YYYYMMDD>_<clock><ext>` where `<clock>` is a
//! microsecond unix timestamp. The date stamp keeps the directory listable
//! by eye; the clock value makes collisions practically impossible, and the
//! generator still checks the target path and bumps the clock until the
//! name is free, so even two uploads landing in the same instant get
//! distinct names.
//!
//! ## Validation
//!
//! An upload must both claim an `image/` MIME type and carry bytes that
//! look like a known raster format. The second check exists because the
//! MIME type comes from the client; one mislabeled PDF in the media
//! directory would break the gallery page forever.

use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not an image: {0:?}")]
    NotImage(String),
    #[error("unrecognized image data")]
    UnrecognizedFormat,
}

/// Extensions included in gallery listings.
const MEDIA_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// One stored image, as listed for the gallery.
#[derive(Debug, Clone, Serialize)]
pub struct MediaAsset {
    pub filename: String,
    pub url: String,
    pub size_bytes: u64,
    /// Modification time as unix milliseconds.
    pub modified_at: i64,
}

/// Result of a successful ingest: the stored asset plus embeddable markup.
#[derive(Debug, Clone, Serialize)]
pub struct StoredUpload {
    pub filename: String,
    pub url: String,
    pub alt: String,
    /// `![alt](url)` for markdown pages.
    pub markdown: String,
    /// An `<img>` tag with the editor's click-to-expand behavior.
    pub html: String,
}

/// The media directory: loose image files, created on demand.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate and store an uploaded image.
    ///
    /// `original_name` supplies the extension (and the default alt text);
    /// `mime` is the client-declared content type.
    pub fn store_upload(
        &self,
        bytes: &[u8],
        original_name: &str,
        mime: &str,
        alt: Option<&str>,
    ) -> Result<StoredUpload, MediaError> {
        if !mime.starts_with("image/") {
            return Err(MediaError::NotImage(mime.to_string()));
        }
        if image::guess_format(bytes).is_err() {
            return Err(MediaError::UnrecognizedFormat);
        }

        let filename = self.write_bytes(bytes, extension_of(original_name))?;
        let url = format!("/media/{filename}");
        let alt = alt
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(original_name)
            .to_string();

        Ok(StoredUpload {
            markdown: format!("![{alt}]({url})"),
            html: embed_snippet(&url, &alt),
            filename,
            url,
            alt,
        })
    }

    /// Ingest an image from a local path (the `add-image` command).
    pub fn import_file(&self, source: &Path, alt: Option<&str>) -> Result<StoredUpload, MediaError> {
        let bytes = fs::read(source)?;
        if image::guess_format(&bytes).is_err() {
            return Err(MediaError::UnrecognizedFormat);
        }
        let original_name = source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());

        // Local files skip the MIME gate — the byte check already ran.
        let filename = self.write_bytes(&bytes, extension_of(&original_name))?;
        let url = format!("/media/{filename}");
        let alt = alt
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&original_name)
            .to_string();

        Ok(StoredUpload {
            markdown: format!("![{alt}]({url})"),
            html: embed_snippet(&url, &alt),
            filename,
            url,
            alt,
        })
    }

    /// Scan the media directory, newest first. Missing directory lists empty.
    pub fn list_assets(&self) -> Result<Vec<MediaAsset>, MediaError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut assets = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if !MEDIA_EXTENSIONS.contains(&ext.as_str()) {
                continue;
            }
            let Ok(meta) = entry.metadata() else {
                continue;
            };
            let filename = entry.file_name().to_string_lossy().to_string();
            let modified_at = meta
                .modified()
                .map(|t| chrono::DateTime::<Utc>::from(t).timestamp_millis())
                .unwrap_or_default();
            assets.push(MediaAsset {
                url: format!("/media/{filename}"),
                filename,
                size_bytes: meta.len(),
                modified_at,
            });
        }

        assets.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| b.filename.cmp(&a.filename))
        });
        Ok(assets)
    }

    /// On-disk path of a stored asset, for staging into version control.
    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    fn write_bytes(&self, bytes: &[u8], ext: String) -> Result<String, MediaError> {
        fs::create_dir_all(&self.root)?;

        let now = Utc::now();
        let date = now.format("%Y%m%d").to_string();
        let mut clock = now.timestamp_micros();
        let filename = loop {
            let candidate = format!("img_{date}_{clock}{ext}");
            if !self.root.join(&candidate).exists() {
                break candidate;
            }
            clock += 1;
        };

        fs::write(self.root.join(&filename), bytes)?;
        Ok(filename)
    }
}

/// Lowercased extension of the original upload name, dot included.
/// Defaults to `.png` when the name carries none.
fn extension_of(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .filter(|e| e.chars().skip(1).all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| ".png".to_string())
}

fn embed_snippet(url: &str, alt: &str) -> String {
    format!(
        "<img src=\"{url}\" alt=\"{alt}\" style=\"max-width: 400px; cursor: pointer;\" \
         onclick=\"this.style.maxWidth = this.style.maxWidth === '400px' ? '100%' : '400px'\">"
    )
}
