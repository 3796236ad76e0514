//! Data URL to image file persistence.
//!
//! The payload is decoded only to learn its format and pixel size. The bytes
//! written to disk are the encoded bytes received from the page, unchanged.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use lyubitori_core::ScrapeError;
use thiserror::Error;

/// Extensions checked when deciding whether an identity is already saved.
pub const KNOWN_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "webp", "gif"];

/// What [`ImageCodec::persist`] did with a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// Written to disk, either new or replacing a smaller image.
    Persisted(PathBuf),
    /// An existing file at the target holds the same or more pixel data.
    Skipped(PathBuf),
}

impl PersistOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Persisted(path) | Self::Skipped(path) => path,
        }
    }
}

#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload is not a decodable image.
    #[error("Cannot decode image {identity}: {message}")]
    Decode { identity: String, message: String },

    /// Writing the target file failed.
    #[error("Cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image codec task failed: {0}")]
    Task(String),
}

impl From<CodecError> for ScrapeError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Decode { identity, message } => Self::decode(identity, message),
            CodecError::Io { source, .. } => Self::from_io_error(&source),
            CodecError::Task(message) => Self::Io {
                kind: "Other".to_string(),
                message,
            },
        }
    }
}

/// Base64 payload of a `data:<mime>;base64,<payload>` URL.
pub fn data_url_payload(data_url: &str) -> Option<&str> {
    let rest = data_url.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    header.ends_with(";base64").then_some(payload)
}

/// Canonical file extension for a decoded format.
fn extension_for(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("img")
}

/// First `{identity}.{ext}` in `dir` that exists, for any known extension.
pub fn existing_file(dir: &Path, identity: &str) -> Option<PathBuf> {
    KNOWN_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{identity}.{ext}")))
        .find(|path| path.is_file())
}

/// Decodes data URLs and writes them as image files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCodec;

impl ImageCodec {
    pub const fn new() -> Self {
        Self
    }

    /// Persist off the async runtime; decoding is CPU-bound.
    pub async fn persist(
        &self,
        identity: &str,
        data_url: String,
        output_dir: &Path,
    ) -> Result<PersistOutcome, CodecError> {
        let identity = identity.to_string();
        let output_dir = output_dir.to_path_buf();
        tokio::task::spawn_blocking(move || Self::persist_blocking(&identity, &data_url, &output_dir))
            .await
            .map_err(|e| CodecError::Task(e.to_string()))?
    }

    /// Decode `data_url` and write it to `{identity}.{ext}` in `output_dir`.
    ///
    /// An existing file is replaced only when the new decoded pixel buffer
    /// is strictly larger. An existing file that no longer decodes is
    /// replaced unconditionally.
    pub fn persist_blocking(
        identity: &str,
        data_url: &str,
        output_dir: &Path,
    ) -> Result<PersistOutcome, CodecError> {
        let decode_err = |message: String| CodecError::Decode {
            identity: identity.to_string(),
            message,
        };

        let payload = data_url_payload(data_url).ok_or_else(|| decode_err("not a base64 data URL".into()))?;
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| decode_err(e.to_string()))?;
        let format = image::guess_format(&bytes).map_err(|e| decode_err(e.to_string()))?;
        let decoded = image::load_from_memory_with_format(&bytes, format)
            .map_err(|e| decode_err(e.to_string()))?;
        let new_size = decoded.as_bytes().len();

        let target = output_dir.join(format!("{identity}.{}", extension_for(format)));
        if target.exists() {
            match std::fs::read(&target).ok().and_then(|b| image::load_from_memory(&b).ok()) {
                Some(existing) if existing.as_bytes().len() >= new_size => {
                    tracing::debug!(
                        target: "lyubitori.engine",
                        path = %target.display(),
                        "Image already exists with same or larger size"
                    );
                    return Ok(PersistOutcome::Skipped(target));
                }
                Some(_) => {}
                None => {
                    tracing::debug!(
                        target: "lyubitori.engine",
                        path = %target.display(),
                        "Existing image unreadable, overwriting"
                    );
                }
            }
        }

        std::fs::create_dir_all(output_dir).map_err(|source| CodecError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
        std::fs::write(&target, &bytes).map_err(|source| CodecError::Io {
            path: target.clone(),
            source,
        })?;
        tracing::info!(target: "lyubitori.engine", path = %target.display(), "Image saved");
        Ok(PersistOutcome::Persisted(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::tempdir;

    fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 10, 10]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, format).unwrap();
        out.into_inner()
    }

    fn data_url(bytes: &[u8], mime: &str) -> String {
        format!("data:{mime};base64,{}", STANDARD.encode(bytes))
    }

    #[test]
    fn test_payload_split() {
        assert_eq!(data_url_payload("data:image/png;base64,AAAA"), Some("AAAA"));
        assert_eq!(data_url_payload("data:text/plain,hello"), None);
        assert_eq!(data_url_payload("AAAA"), None);
    }

    #[test]
    fn test_writes_encoded_bytes_verbatim() {
        let dir = tempdir().unwrap();
        let png = encoded(4, 4, ImageFormat::Png);

        let outcome = ImageCodec::persist_blocking("a_1_img", &data_url(&png, "image/png"), dir.path()).unwrap();

        let path = dir.path().join("a_1_img.png");
        assert_eq!(outcome, PersistOutcome::Persisted(path.clone()));
        assert_eq!(std::fs::read(path).unwrap(), png);
    }

    #[test]
    fn test_jpeg_uses_jpg_extension() {
        let dir = tempdir().unwrap();
        let jpg = encoded(4, 4, ImageFormat::Jpeg);
        let outcome = ImageCodec::persist_blocking("j", &data_url(&jpg, "image/jpeg"), dir.path()).unwrap();
        assert!(outcome.path().ends_with("j.jpg"));
        assert_eq!(existing_file(dir.path(), "j"), Some(dir.path().join("j.jpg")));
    }

    #[test]
    fn test_persist_is_idempotent() {
        let dir = tempdir().unwrap();
        let url = data_url(&encoded(8, 8, ImageFormat::Png), "image/png");

        ImageCodec::persist_blocking("same", &url, dir.path()).unwrap();
        let before = std::fs::read(dir.path().join("same.png")).unwrap();
        let second = ImageCodec::persist_blocking("same", &url, dir.path()).unwrap();

        assert!(matches!(second, PersistOutcome::Skipped(_)));
        assert_eq!(std::fs::read(dir.path().join("same.png")).unwrap(), before);
    }

    #[test]
    fn test_upgrade_is_monotonic() {
        let dir = tempdir().unwrap();
        let small = encoded(8, 8, ImageFormat::Png);
        let large = encoded(16, 16, ImageFormat::Png);
        let path = dir.path().join("img.png");

        ImageCodec::persist_blocking("img", &data_url(&small, "image/png"), dir.path()).unwrap();
        let upgraded = ImageCodec::persist_blocking("img", &data_url(&large, "image/png"), dir.path()).unwrap();
        assert!(matches!(upgraded, PersistOutcome::Persisted(_)));
        assert_eq!(std::fs::read(&path).unwrap(), large);

        let downgrade = ImageCodec::persist_blocking("img", &data_url(&small, "image/png"), dir.path()).unwrap();
        assert!(matches!(downgrade, PersistOutcome::Skipped(_)));
        assert_eq!(std::fs::read(&path).unwrap(), large);
    }

    #[test]
    fn test_corrupt_existing_file_is_overwritten() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not an image").unwrap();
        let png = encoded(2, 2, ImageFormat::Png);

        let outcome = ImageCodec::persist_blocking("broken", &data_url(&png, "image/png"), dir.path()).unwrap();
        assert!(matches!(outcome, PersistOutcome::Persisted(_)));
    }

    #[test]
    fn test_garbage_payload_is_decode_error() {
        let dir = tempdir().unwrap();
        let url = data_url(b"definitely not pixels", "image/png");

        let err = ImageCodec::persist_blocking("bad", &url, dir.path()).unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
        assert!(existing_file(dir.path(), "bad").is_none());
        assert!(matches!(ScrapeError::from(err), ScrapeError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_async_persist() {
        let dir = tempdir().unwrap();
        let url = data_url(&encoded(3, 3, ImageFormat::Png), "image/png");
        let outcome = ImageCodec::new().persist("async", url, dir.path()).await.unwrap();
        assert!(outcome.path().is_file());
    }
}
