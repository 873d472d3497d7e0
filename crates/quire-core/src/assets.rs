//! Image uploads
//!
//! Assets live in their own flat directory, separate from records. A stored
//! file is never overwritten: names carry a timestamp suffix and are opened
//! with `create_new`, falling back to a counter on collision.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{StoreError, StoreResult};
use crate::slug::{collapse_hyphens, is_cjk_ideograph};
use crate::storage::persistence::ensure_dir;

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Collision counter ceiling before giving up
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Result of a successful upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAsset {
    /// Public URL the rendered site serves the file from
    pub url: String,
    pub path: PathBuf,
    pub mime: String,
    pub size: usize,
}

/// Directory of uploaded images
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
    url_prefix: String,
}

impl AssetStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn open_with_config(config: &Config) -> Self {
        Self::new(&config.upload_dir, &config.upload_url_prefix)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate and store an uploaded image
    ///
    /// `declared_mime` is the type the client claimed. Sniffed content takes
    /// precedence over it, and the file extension is the last resort.
    pub fn store(
        &self,
        original_name: &str,
        bytes: &[u8],
        declared_mime: Option<&str>,
    ) -> StoreResult<StoredAsset> {
        self.store_at(original_name, bytes, declared_mime, Utc::now())
    }

    pub(crate) fn store_at(
        &self,
        original_name: &str,
        bytes: &[u8],
        declared_mime: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<StoredAsset> {
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(StoreError::PayloadTooLarge {
                size: bytes.len(),
                limit: MAX_UPLOAD_BYTES,
            });
        }

        let mime = detect_mime(original_name, bytes, declared_mime);
        if !mime.starts_with("image/") {
            return Err(StoreError::UnsupportedMediaType { mime });
        }

        let (stem, extension) = split_name(original_name);
        let extension = sanitize_extension(extension)
            .filter(|ext| is_image_extension(ext))
            .or_else(|| extension_for(bytes, &mime));
        let base = format!("{}-{}", sanitize_stem(stem, now), now.timestamp_millis());

        ensure_dir(&self.dir)?;
        let (path, mut file) = self.reserve(&base, extension.as_deref())?;

        if let Err(e) = file.write_all(bytes).and_then(|_| file.sync_all()) {
            // Leave no truncated asset behind
            let _ = fs::remove_file(&path);
            return Err(StoreError::from_io(e, path));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let url = format!("{}/{}", self.url_prefix.trim_end_matches('/'), file_name);

        info!(url = %url, size = bytes.len(), mime = %mime, "Stored asset");

        Ok(StoredAsset {
            url,
            path,
            mime,
            size: bytes.len(),
        })
    }

    /// Create a new file under the first free name
    fn reserve(&self, base: &str, extension: Option<&str>) -> StoreResult<(PathBuf, File)> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let stem = if attempt == 0 {
                base.to_string()
            } else {
                format!("{base}-{attempt}")
            };
            let name = match extension {
                Some(ext) => format!("{stem}.{ext}"),
                None => stem,
            };
            let path = self.dir.join(name);

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(path = %path.display(), "Asset name taken, trying next");
                }
                Err(e) => return Err(StoreError::from_io(e, path)),
            }
        }

        Err(StoreError::from_io(
            io::Error::new(io::ErrorKind::AlreadyExists, "no free asset name"),
            self.dir.join(base),
        ))
    }
}

/// Content sniffing first, then the declared type, then the extension
fn detect_mime(name: &str, bytes: &[u8], declared: Option<&str>) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }

    if let Some(declared) = declared.map(str::trim).filter(|m| !m.is_empty()) {
        return declared.to_ascii_lowercase();
    }

    mime_guess::from_path(name)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

/// Split a client-supplied name into stem and extension, ignoring directories
fn split_name(original: &str) -> (&str, Option<&str>) {
    let base = original
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or(original);
    match base.rfind('.') {
        Some(i) if i > 0 => (&base[..i], Some(&base[i + 1..])),
        _ => (base, None),
    }
}

fn sanitize_stem(stem: &str, now: DateTime<Utc>) -> String {
    let mut out = String::with_capacity(stem.len());
    let mut in_space = false;
    for c in stem.trim().chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' || is_cjk_ideograph(c) {
            out.push(c);
        }
    }

    let out = collapse_hyphens(&out);
    if out.is_empty() {
        now.timestamp_millis().to_string()
    } else {
        out
    }
}

fn sanitize_extension(extension: Option<&str>) -> Option<String> {
    extension
        .map(|ext| {
            ext.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .filter(|ext| !ext.is_empty())
}

/// A client extension is kept only if a static server would serve it as an image
fn is_image_extension(ext: &str) -> bool {
    mime_guess::from_ext(ext)
        .first()
        .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE)
}

fn extension_for(bytes: &[u8], mime: &str) -> Option<String> {
    if let Some(kind) = infer::get(bytes) {
        return Some(kind.extension().to_string());
    }
    mime_guess::get_mime_extensions_str(mime)
        .and_then(|exts| exts.first())
        .map(|ext| ext.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn setup() -> (TempDir, AssetStore) {
        let temp = TempDir::new().unwrap();
        let store = AssetStore::new(temp.path().join("uploads"), "/uploads");
        (temp, store)
    }

    #[test]
    fn test_store_png() {
        let (_temp, store) = setup();
        let now = fixed_now();
        let asset = store
            .store_at("My Photo (1).PNG", PNG, Some("image/png"), now)
            .unwrap();

        let expected = format!("My-Photo-1-{}.png", now.timestamp_millis());
        assert_eq!(asset.url, format!("/uploads/{expected}"));
        assert_eq!(asset.mime, "image/png");
        assert_eq!(asset.size, PNG.len());
        assert_eq!(fs::read(&asset.path).unwrap(), PNG);
    }

    #[test]
    fn test_cjk_name_kept() {
        let (_temp, store) = setup();
        let asset = store.store_at("照片.jpg", JPEG, None, fixed_now()).unwrap();
        let name = asset.path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("照片-"), "got {name}");
        assert!(name.ends_with(".jpg"));
        assert_eq!(asset.mime, "image/jpeg");
    }

    #[test]
    fn test_symbol_only_name_falls_back_to_timestamp() {
        let (_temp, store) = setup();
        let now = fixed_now();
        let asset = store.store_at("!!!.png", PNG, None, now).unwrap();
        let millis = now.timestamp_millis();
        assert_eq!(asset.url, format!("/uploads/{millis}-{millis}.png"));
    }

    #[test]
    fn test_directory_components_ignored() {
        let (_temp, store) = setup();
        let asset = store
            .store_at("../../etc/cat.png", PNG, None, fixed_now())
            .unwrap();
        assert_eq!(asset.path.parent().unwrap(), store.dir());
    }

    #[test]
    fn test_missing_extension_from_content() {
        let (_temp, store) = setup();
        let asset = store.store_at("clipboard", PNG, None, fixed_now()).unwrap();
        assert!(asset.url.ends_with(".png"), "got {}", asset.url);
    }

    #[test]
    fn test_never_overwrites() {
        let (_temp, store) = setup();
        let now = fixed_now();
        let first = store.store_at("a.png", PNG, None, now).unwrap();
        let second = store.store_at("a.png", JPEG, None, now).unwrap();

        assert_ne!(first.path, second.path);
        assert!(second.url.ends_with("-1.png"), "got {}", second.url);
        assert_eq!(fs::read(&first.path).unwrap(), PNG);
    }

    #[test]
    fn test_too_large_rejected_before_touching_disk() {
        let (_temp, store) = setup();
        let bytes = vec![0u8; MAX_UPLOAD_BYTES + 1];
        let err = store.store("big.png", &bytes, Some("image/png")).unwrap_err();
        assert!(matches!(err, StoreError::PayloadTooLarge { .. }));
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_exact_limit_accepted() {
        let (_temp, store) = setup();
        let mut bytes = PNG.to_vec();
        bytes.resize(MAX_UPLOAD_BYTES, 0);
        assert!(store.store("big.png", &bytes, None).is_ok());
    }

    #[test]
    fn test_non_image_rejected() {
        let (_temp, store) = setup();
        let err = store.store("notes.txt", b"hello", None).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedMediaType { ref mime } if mime == "text/plain"));
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_sniffed_content_beats_declared_type() {
        let (_temp, store) = setup();
        // A PDF claiming to be an image
        let err = store
            .store("fake.png", b"%PDF-1.4 fake", Some("image/png"))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedMediaType { .. }));
    }

    #[test]
    fn test_svg_by_extension() {
        let (_temp, store) = setup();
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"></svg>"#;
        let asset = store.store("diagram.svg", svg, None).unwrap();
        assert_eq!(asset.mime, "image/svg+xml");
    }

    #[test]
    fn test_trailing_slash_in_prefix() {
        let temp = TempDir::new().unwrap();
        let store = AssetStore::new(temp.path(), "https://cdn.example.com/img/");
        let asset = store.store_at("a.png", PNG, None, fixed_now()).unwrap();
        assert!(asset.url.starts_with("https://cdn.example.com/img/a-"));
    }

    #[test]
    fn test_script_extension_replaced_by_sniffed_type() {
        let (_temp, store) = setup();
        let mut bytes = PNG.to_vec();
        bytes.extend_from_slice(b"<script>alert(1)</script>");
        let asset = store.store_at("evil.html", &bytes, None, fixed_now()).unwrap();
        assert!(asset.url.ends_with(".png"), "got {}", asset.url);
        assert_eq!(asset.mime, "image/png");
    }

    #[test]
    fn test_script_extension_replaced_by_declared_type() {
        let (_temp, store) = setup();
        let asset = store
            .store_at("evil.js", b"alert(document.cookie)", Some("image/png"), fixed_now())
            .unwrap();
        assert!(!asset.url.ends_with(".js"), "got {}", asset.url);
        let served_as = mime_guess::from_path(&asset.path).first().unwrap();
        assert_eq!(served_as.type_(), mime_guess::mime::IMAGE);
    }

    #[test]
    fn test_image_extensions() {
        assert!(is_image_extension("png"));
        assert!(is_image_extension("svg"));
        assert!(!is_image_extension("html"));
        assert!(!is_image_extension("js"));
        assert!(!is_image_extension("unknownext"));
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("a.tar.gz"), ("a.tar", Some("gz")));
        assert_eq!(split_name(".hidden"), (".hidden", None));
        assert_eq!(split_name("dir\\x.PNG"), ("x", Some("PNG")));
    }
}
