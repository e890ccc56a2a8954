//! Image acquisition and encoding.
//!
//! Every acquisition mode (file pick, drag-and-drop, camera) converges on
//! [`EncodedImage`]. The media-type check always runs before anything
//! else, so a non-image never reaches the classification service.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::ImageFormat;
use tracing::debug;

use crate::camera::{Camera, CapturedFrame};
use crate::types::{Acquisition, EncodedImage, MediaType};
use crate::{EggtetoError, Result};

/// A user-supplied file, as a browser `File` would describe it.
pub struct SourceFile {
    name: String,
    declared_type: Option<MediaType>,
    bytes: Vec<u8>,
    acquisition: Acquisition,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, acquisition: Acquisition) -> Self {
        Self {
            name: name.into(),
            declared_type: None,
            bytes,
            acquisition,
        }
    }

    /// Attach the media type declared by the delivering side.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.declared_type = Some(MediaType::new(media_type));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type, else the type implied by the file name, else a sniff
    /// of the leading bytes.
    pub fn media_type(&self) -> Option<MediaType> {
        self.declared_type
            .clone()
            .or_else(|| media_type_for_name(&self.name))
            .or_else(|| sniff_media_type(&self.bytes))
    }
}

/// Media type implied by a file name's extension, if it names a known
/// format.
pub fn media_type_for_name(name: &str) -> Option<MediaType> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    if let Some(format) = ImageFormat::from_extension(&ext) {
        return Some(MediaType::from_format(format));
    }
    match ext.as_str() {
        "heic" => Some(MediaType::new("image/heic")),
        "heif" => Some(MediaType::new("image/heif")),
        "txt" | "md" => Some(MediaType::new("text/plain")),
        "pdf" => Some(MediaType::new("application/pdf")),
        "json" => Some(MediaType::new("application/json")),
        "mp4" | "mov" => Some(MediaType::new(format!("video/{ext}"))),
        _ => Some(MediaType::new("application/octet-stream")),
    }
}

fn sniff_media_type(bytes: &[u8]) -> Option<MediaType> {
    image::guess_format(bytes).ok().map(MediaType::from_format)
}

fn reject(name: &str, media_type: Option<&MediaType>) -> EggtetoError {
    let declared = media_type.map_or("unknown", |m| m.as_str());
    debug!(name, declared, "rejected non-image input");
    EggtetoError::InvalidInputKind(format!("{name} ({declared})"))
}

/// Encode a source file.
///
/// Fails with `InvalidInputKind` when the file does not declare an image
/// media type or carries no bytes.
pub fn encode(source: SourceFile) -> Result<EncodedImage> {
    let media_type = source.media_type();
    let media_type = match media_type {
        Some(mt) if mt.is_image() => mt,
        other => return Err(reject(&source.name, other.as_ref())),
    };
    if source.bytes.is_empty() {
        return Err(EggtetoError::InvalidInputKind(format!("{} is empty", source.name)));
    }
    debug!(
        name = %source.name,
        media_type = %media_type,
        acquisition = ?source.acquisition,
        len = source.bytes.len(),
        "encoded image"
    );
    Ok(EncodedImage::new(source.bytes, media_type, source.acquisition))
}

/// Encode a drag-and-drop delivery.
///
/// Only the first file of a multi-file drop is used.
pub fn encode_dropped(files: Vec<SourceFile>) -> Result<EncodedImage> {
    let count = files.len();
    let first = files
        .into_iter()
        .next()
        .ok_or_else(|| EggtetoError::InvalidInputKind("drop carried no files".to_string()))?;
    if count > 1 {
        debug!(count, used = %first.name, "multi-file drop, using the first file");
    }
    encode(SourceFile {
        acquisition: Acquisition::Drop,
        ..first
    })
}

/// Read and encode a file from disk without blocking the runtime.
///
/// A file whose extension names a non-image type is rejected before it is
/// read. Files without an extension are sniffed.
pub async fn encode_path(path: &Path, acquisition: Acquisition) -> Result<EncodedImage> {
    let name = path.display().to_string();
    let declared = if path.extension().is_some() {
        media_type_for_name(&name)
    } else {
        None
    };
    if let Some(mt) = declared.as_ref().filter(|mt| !mt.is_image()) {
        return Err(reject(&name, Some(mt)));
    }

    let bytes = tokio::fs::read(path).await?;
    let mut source = SourceFile::new(name, bytes, acquisition);
    source.declared_type = declared;
    encode(source)
}

/// Encode a drop of one or more paths.
pub async fn encode_dropped_paths(paths: &[PathBuf]) -> Result<EncodedImage> {
    let first = paths
        .first()
        .ok_or_else(|| EggtetoError::InvalidInputKind("drop carried no files".to_string()))?;
    if paths.len() > 1 {
        debug!(count = paths.len(), used = %first.display(), "multi-file drop, using the first file");
    }
    encode_path(first, Acquisition::Drop).await
}

/// Encode a raw camera frame as JPEG.
pub fn encode_frame(frame: CapturedFrame) -> Result<EncodedImage> {
    let jpeg = frame.into_jpeg()?;
    encode(SourceFile::new("camera.jpg", jpeg, Acquisition::Camera).with_media_type(MediaType::JPEG))
}

/// Capture one frame and encode it, keeping the blocking capture off the
/// async executor.
pub async fn encode_capture(camera: Arc<dyn Camera>) -> Result<EncodedImage> {
    let name = camera.name().to_string();
    let frame = tokio::task::spawn_blocking(move || camera.capture())
        .await
        .map_err(|e| EggtetoError::Camera(format!("capture task failed: {e}")))??;
    debug!(camera = %name, ?frame, "frame captured");
    encode_frame(frame)
}

/// Drop the `data:<type>;base64,` header from a data URL.
///
/// Input without a comma is returned unchanged.
pub fn strip_data_url_prefix(payload: &str) -> &str {
    match payload.split_once(',') {
        Some((_, data)) => data,
        None => payload,
    }
}

/// Decode a browser-style `data:<type>;base64,<payload>` URL.
///
/// The declared type in the header goes through the same image check as
/// any other source.
pub fn decode_data_url(url: &str, acquisition: Acquisition) -> Result<EncodedImage> {
    let header = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(',').map(|(header, _)| header))
        .ok_or_else(|| EggtetoError::InvalidInputKind("not a data URL".to_string()))?;
    let declared = header.strip_suffix(";base64").ok_or_else(|| {
        EggtetoError::InvalidInputKind("data URL is not base64-encoded".to_string())
    })?;

    let payload = strip_data_url_prefix(url);
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| EggtetoError::InvalidInputKind(format!("invalid base64 payload: {e}")))?;
    encode(SourceFile::new("data-url", bytes, acquisition).with_media_type(declared))
}

/// Split a line of terminal input into dropped file paths.
///
/// Terminals paste dropped files as shell words: quoted (`'a b.jpg'`),
/// backslash-escaped (`a\ b.jpg`) or as `file://` URIs.
pub fn parse_dropped_paths(line: &str) -> Vec<PathBuf> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.trim().chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }

    words
        .into_iter()
        .filter(|w| !w.is_empty())
        .map(|w| match w.strip_prefix("file://") {
            Some(rest) => PathBuf::from(percent_decode(rest)),
            None => PathBuf::from(w),
        })
        .collect()
}

fn percent_decode(input: &str) -> String {
    fn hex(b: u8) -> Option<u8> {
        (b as char).to_digit(16).map(|d| d as u8)
    }

    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(high), Some(low)) = (hex(bytes[i + 1]), hex(bytes[i + 2])) {
                out.push(high << 4 | low);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
