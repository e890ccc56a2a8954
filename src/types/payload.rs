//! Transport-ready image payloads

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// How the user delivered the photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acquisition {
    /// Picked from the file system / gallery.
    Gallery,
    /// Captured from a device camera.
    Camera,
    /// Dropped onto the input (drag-and-drop).
    Drop,
}

/// A declared media type such as `image/jpeg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaType(String);

impl MediaType {
    pub const JPEG: &'static str = "image/jpeg";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_ascii_lowercase())
    }

    pub fn jpeg() -> Self {
        Self(Self::JPEG.to_string())
    }

    /// Media type for a format the `image` crate knows about.
    pub fn from_format(format: image::ImageFormat) -> Self {
        Self::new(format.to_mime_type())
    }

    /// True when the top-level type is `image`.
    pub fn is_image(&self) -> bool {
        self.0.starts_with("image/") && self.0.len() > "image/".len()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encoded image bytes plus media type, alive only between capture and the
/// classification call.
///
/// Not `Clone`: the single owner moves it into the classifier, so the bytes
/// are freed as soon as that call settles. No other copy outlives the call.
pub struct EncodedImage {
    bytes: Vec<u8>,
    media_type: MediaType,
    acquisition: Acquisition,
}

impl EncodedImage {
    pub(crate) fn new(bytes: Vec<u8>, media_type: MediaType, acquisition: Acquisition) -> Self {
        Self {
            bytes,
            media_type,
            acquisition,
        }
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn acquisition(&self) -> Acquisition {
        self.acquisition
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Base64 payload without any `data:` scheme prefix.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:<type>;base64,<payload>` form, as a browser would produce.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.to_base64())
    }
}

impl fmt::Debug for EncodedImage {
    // Never dump the payload into logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedImage")
            .field("media_type", &self.media_type)
            .field("acquisition", &self.acquisition)
            .field("len", &self.bytes.len())
            .finish()
    }
}
