//! Camera acquisition.
//!
//! A [`Camera`] hands back one raw [`CapturedFrame`]; the codec turns it
//! into the same `EncodedImage` shape a picked file produces, so nothing
//! downstream cares where the photo came from.
//!
//! Device selection prefers a user-facing (front) sensor. V4L2 does not
//! report which way a sensor points, so [`select_device`] ranks devices by
//! the hints drivers put in their card names.

#[cfg(feature = "v4l-camera")]
mod v4l2;

#[cfg(feature = "v4l-camera")]
pub use self::v4l2::V4lCamera;

use image::{ImageFormat, RgbImage};

use crate::{EggtetoError, Result};

/// Which way the sensor should point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    /// Towards the user (selfie camera).
    #[default]
    User,
    /// Away from the user.
    Environment,
}

/// Info about a discovered video capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub path: String,
    pub name: String,
    pub driver: String,
    pub bus: String,
}

const USER_FACING_HINTS: &[&str] = &["front", "user", "facetime", "integrated", "webcam", "hd camera"];
const ENVIRONMENT_FACING_HINTS: &[&str] = &["rear", "back", "world", "environment"];
// IR sensors deliver greyscale frames meant for face unlock, not photos.
const INFRARED_HINTS: &[&str] = &["infrared", "ir camera", " ir "];

fn facing_score(device: &DeviceInfo, facing: Facing) -> i32 {
    let name = format!(" {} ", device.name.to_lowercase());
    if INFRARED_HINTS.iter().any(|h| name.contains(h)) {
        return -10;
    }
    let (wanted, unwanted) = match facing {
        Facing::User => (USER_FACING_HINTS, ENVIRONMENT_FACING_HINTS),
        Facing::Environment => (ENVIRONMENT_FACING_HINTS, USER_FACING_HINTS),
    };
    let mut score = 0;
    if wanted.iter().any(|h| name.contains(h)) {
        score += 2;
    }
    if unwanted.iter().any(|h| name.contains(h)) {
        score -= 2;
    }
    score
}

/// Pick the device that best matches `facing`.
///
/// Ties keep discovery order. Infrared sensors are only chosen when nothing
/// else exists.
pub fn select_device(devices: &[DeviceInfo], facing: Facing) -> Option<&DeviceInfo> {
    devices
        .iter()
        .enumerate()
        .max_by_key(|(idx, dev)| (facing_score(dev, facing), std::cmp::Reverse(*idx)))
        .map(|(_, dev)| dev)
}

/// Pixel layout of a raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// YUYV 4:2:2 packed, 2 bytes per pixel.
    Yuyv,
    /// 8-bit grayscale.
    Grey,
    /// Packed RGB, 3 bytes per pixel.
    Rgb24,
    /// Motion-JPEG: each buffer is already a complete JPEG.
    Mjpeg,
}

/// One raw frame as delivered by a camera.
#[derive(Clone)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub layout: PixelLayout,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layout", &self.layout)
            .field("len", &self.data.len())
            .finish()
    }
}

fn expect_len(frame: &CapturedFrame, bytes_per_pixel: usize) -> Result<usize> {
    let expected = frame.width as usize * frame.height as usize * bytes_per_pixel;
    if expected == 0 || frame.data.len() < expected {
        return Err(EggtetoError::Camera(format!(
            "{:?} buffer too short: expected {expected}, got {}",
            frame.layout,
            frame.data.len()
        )));
    }
    Ok(expected)
}

fn clamp_u8(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// Convert packed YUYV (4:2:2) to RGB using BT.601 coefficients.
///
/// YUYV packs two pixels per 4 bytes: [Y0, U, Y1, V].
pub fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let expected = width as usize * height as usize * 2;
    if expected == 0 || yuyv.len() < expected {
        return Err(EggtetoError::Camera(format!(
            "YUYV buffer too short: expected {expected}, got {}",
            yuyv.len()
        )));
    }
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for chunk in yuyv[..expected].chunks_exact(4) {
        let u = chunk[1] as i32 - 128;
        let v = chunk[3] as i32 - 128;
        for y in [chunk[0], chunk[2]] {
            let c = (y as i32 - 16).max(0) * 298;
            rgb.push(clamp_u8((c + 409 * v + 128) >> 8));
            rgb.push(clamp_u8((c - 100 * u - 208 * v + 128) >> 8));
            rgb.push(clamp_u8((c + 516 * u + 128) >> 8));
        }
    }
    Ok(rgb)
}

impl CapturedFrame {
    /// Encode the frame as JPEG bytes.
    ///
    /// MJPEG buffers pass through untouched after a format sniff.
    pub fn into_jpeg(self) -> Result<Vec<u8>> {
        let rgb = match self.layout {
            PixelLayout::Mjpeg => {
                return match image::guess_format(&self.data) {
                    Ok(ImageFormat::Jpeg) => Ok(self.data),
                    _ => Err(EggtetoError::Camera("MJPEG buffer is not a JPEG".to_string())),
                };
            }
            PixelLayout::Yuyv => yuyv_to_rgb(&self.data, self.width, self.height)?,
            PixelLayout::Grey => {
                let len = expect_len(&self, 1)?;
                self.data[..len].iter().flat_map(|&g| [g, g, g]).collect()
            }
            PixelLayout::Rgb24 => {
                let len = expect_len(&self, 3)?;
                self.data[..len].to_vec()
            }
        };

        let img = RgbImage::from_raw(self.width, self.height, rgb)
            .ok_or_else(|| EggtetoError::Camera("frame dimensions do not match buffer".into()))?;

        let mut out = std::io::Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg)
            .map_err(|e| EggtetoError::Camera(format!("JPEG encoding failed: {e}")))?;
        Ok(out.into_inner())
    }
}

/// A source of single still frames.
///
/// Capture is blocking; callers on an async runtime should go through
/// [`crate::codec::encode_capture`], which moves it off the executor.
pub trait Camera: Send + Sync {
    /// Device name for logging.
    fn name(&self) -> &str;

    /// Grab one frame.
    fn capture(&self) -> Result<CapturedFrame>;
}
