//! V4L2 camera capture via the `v4l` crate.

use std::path::Path;

use tracing::{debug, info};
use v4l::FourCC;
use v4l::buffer::Type as BufType;
use v4l::capability::Flags;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

use super::{Camera, CapturedFrame, DeviceInfo, Facing, PixelLayout, select_device};
use crate::{EggtetoError, Result};

/// Frames dropped after stream start while auto-exposure settles.
const WARMUP_FRAMES: usize = 5;

/// Highest `/dev/videoN` index scanned during discovery.
const MAX_DEVICE_INDEX: usize = 16;

/// Still-photo resolution requested from the driver.
const REQUESTED_SIZE: (u32, u32) = (1280, 720);

/// A V4L2 capture device with a negotiated still format.
pub struct V4lCamera {
    device: Device,
    info: DeviceInfo,
    width: u32,
    height: u32,
    layout: PixelLayout,
}

fn camera_err(path: &str, what: &str, err: impl std::fmt::Display) -> EggtetoError {
    EggtetoError::Camera(format!("{path}: {what}: {err}"))
}

/// Open `path` and describe it, refusing nodes that cannot capture video.
fn inspect_node(path: &str) -> Result<(Device, DeviceInfo)> {
    let device = Device::with_path(path).map_err(|e| camera_err(path, "open", e))?;
    let caps = device
        .query_caps()
        .map_err(|e| camera_err(path, "query capabilities", e))?;
    if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
        return Err(EggtetoError::Camera(format!("{path}: not a capture device")));
    }
    let info = DeviceInfo {
        path: path.to_string(),
        name: caps.card,
        driver: caps.driver,
        bus: caps.bus,
    };
    Ok((device, info))
}

fn layout_for(fourcc: FourCC) -> Option<PixelLayout> {
    match &fourcc.repr {
        b"MJPG" => Some(PixelLayout::Mjpeg),
        b"YUYV" => Some(PixelLayout::Yuyv),
        b"RGB3" => Some(PixelLayout::Rgb24),
        b"GREY" => Some(PixelLayout::Grey),
        _ => None,
    }
}

/// Ask for MJPEG at the still size; keep whatever supported format the
/// driver settles on.
fn negotiate(device: &Device, path: &str) -> Result<(u32, u32, PixelLayout)> {
    let mut wanted = device.format().map_err(|e| camera_err(path, "read format", e))?;
    (wanted.width, wanted.height) = REQUESTED_SIZE;
    wanted.fourcc = FourCC::new(b"MJPG");

    let got = device
        .set_format(&wanted)
        .map_err(|e| camera_err(path, "set format", e))?;
    let layout = layout_for(got.fourcc).ok_or_else(|| {
        EggtetoError::Camera(format!(
            "{path}: driver offered {}, need MJPG, YUYV, RGB3 or GREY",
            got.fourcc
        ))
    })?;
    Ok((got.width, got.height, layout))
}

impl V4lCamera {
    /// Open a capture device by path (e.g. "/dev/video0").
    pub fn open(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Err(EggtetoError::Camera(format!("{path}: no such device")));
        }
        let (device, info) = inspect_node(path)?;
        let (width, height, layout) = negotiate(&device, path)?;
        info!(
            path,
            name = %info.name,
            width,
            height,
            ?layout,
            "camera ready"
        );
        Ok(Self {
            device,
            info,
            width,
            height,
            layout,
        })
    }

    /// Open the device best matching `facing` among those discovered.
    pub fn open_preferred(facing: Facing) -> Result<Self> {
        let devices = Self::list_devices();
        let picked = select_device(&devices, facing)
            .ok_or_else(|| EggtetoError::Camera("no video capture device found".to_string()))?;
        debug!(path = %picked.path, name = %picked.name, ?facing, "selected camera");
        Self::open(&picked.path)
    }

    /// Capture-capable `/dev/video*` nodes, in index order.
    pub fn list_devices() -> Vec<DeviceInfo> {
        (0..MAX_DEVICE_INDEX)
            .map(|i| format!("/dev/video{i}"))
            .filter(|path| Path::new(path).exists())
            .filter_map(|path| match inspect_node(&path) {
                Ok((_, info)) => Some(info),
                Err(e) => {
                    debug!(error = %e, "skipping video node");
                    None
                }
            })
            .collect()
    }
}

impl Camera for V4lCamera {
    fn name(&self) -> &str {
        &self.info.path
    }

    fn capture(&self) -> Result<CapturedFrame> {
        let path = self.info.path.as_str();
        let mut stream = MmapStream::with_buffers(&self.device, BufType::VideoCapture, 4)
            .map_err(|e| camera_err(path, "start stream", e))?;

        for _ in 0..WARMUP_FRAMES {
            stream.next().map_err(|e| camera_err(path, "dequeue", e))?;
        }
        let (buf, meta) = stream.next().map_err(|e| camera_err(path, "dequeue", e))?;

        // MJPEG buffers are variable length; bytesused marks the frame end.
        let used = (meta.bytesused as usize).min(buf.len());
        let data = if used > 0 { buf[..used].to_vec() } else { buf.to_vec() };
        debug!(seq = meta.sequence, len = data.len(), "captured frame");

        Ok(CapturedFrame {
            width: self.width,
            height: self.height,
            layout: self.layout,
            data,
        })
    }
}
