// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera device
//!
//! Synthesizes encoded frames in memory instead of talking to real hardware.
//! Used by the CLI demo and the test suite; also handy when developing the
//! rendering layer without a webcam attached.
//!
//! Every grab produces a different frame (the synthesis pattern is seeded by
//! a per-device frame counter), so retake flows can assert that a new capture
//! replaced the old one.

use super::{CameraDevice, CapturedImage, DeviceError, DeviceResult, ImageEncoding};
use crate::constants::virtual_camera;
use async_trait::async_trait;
use chrono::Utc;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// In-memory camera device
pub struct VirtualCamera {
    name: String,
    encoding: ImageEncoding,
    width: u32,
    height: u32,
    acquire_delay: Duration,
    /// When set, acquire() fails as if the user denied the permission prompt
    deny_access: bool,
    held: bool,
    frame_counter: u64,
}

impl VirtualCamera {
    /// Create a virtual camera producing frames in the given encoding
    pub fn new(encoding: ImageEncoding) -> Self {
        Self {
            name: "Virtual Camera".to_string(),
            encoding,
            width: virtual_camera::FRAME_WIDTH,
            height: virtual_camera::FRAME_HEIGHT,
            acquire_delay: virtual_camera::ACQUIRE_DELAY,
            deny_access: false,
            held: false,
            frame_counter: 0,
        }
    }

    /// Create a virtual camera that denies every acquisition attempt
    pub fn denied() -> Self {
        let mut camera = Self::new(ImageEncoding::default());
        camera.deny_access = true;
        camera
    }

    /// Override the simulated acquisition latency
    pub fn with_acquire_delay(mut self, delay: Duration) -> Self {
        self.acquire_delay = delay;
        self
    }

    /// Override the synthesized frame size
    pub fn with_frame_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Number of frames grabbed so far
    pub fn frames_grabbed(&self) -> u64 {
        self.frame_counter
    }
}

#[async_trait]
impl CameraDevice for VirtualCamera {
    async fn acquire(&mut self) -> DeviceResult<()> {
        if self.held {
            return Err(DeviceError::Busy);
        }

        // Simulate the permission prompt round trip
        tokio::time::sleep(self.acquire_delay).await;

        if self.deny_access {
            debug!(name = %self.name, "Simulated permission denial");
            return Err(DeviceError::AccessDenied(
                "camera permission denied".to_string(),
            ));
        }

        self.held = true;
        info!(name = %self.name, width = self.width, height = self.height, "Virtual camera acquired");
        Ok(())
    }

    async fn grab_frame(&mut self) -> DeviceResult<CapturedImage> {
        if !self.held {
            return Err(DeviceError::Disconnected);
        }

        let seed = self.frame_counter;
        self.frame_counter += 1;

        let width = self.width;
        let height = self.height;
        let encoding = self.encoding;

        // Encode off the async thread, same as the photo path in a real app
        let bytes = tokio::task::spawn_blocking(move || synthesize_frame(width, height, seed, encoding))
            .await
            .map_err(|e| DeviceError::FrameFailed(e.to_string()))??;

        debug!(frame = seed, bytes = bytes.len(), "Virtual frame grabbed");

        Ok(CapturedImage::new(Arc::from(bytes), encoding, Utc::now()))
    }

    fn release(&mut self) {
        if self.held {
            self.held = false;
            info!(name = %self.name, "Virtual camera released");
        }
    }

    fn is_held(&self) -> bool {
        self.held
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Render one synthetic frame and encode it
fn synthesize_frame(
    width: u32,
    height: u32,
    seed: u64,
    encoding: ImageEncoding,
) -> DeviceResult<Vec<u8>> {
    let shift = (seed % 251) as u32;
    let mut img = RgbImage::new(width, height);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        // Diagonal gradient, phase-shifted per frame so consecutive grabs differ
        let r = (x.wrapping_add(shift) & 0xff) as u8;
        let g = (y.wrapping_add(shift) & 0xff) as u8;
        let b = ((x ^ y).wrapping_add(shift) & 0xff) as u8;
        *pixel = Rgb([r, g, b]);
    }

    let format = match encoding {
        ImageEncoding::Jpeg => ImageFormat::Jpeg,
        ImageEncoding::Png => ImageFormat::Png,
    };

    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, format)
        .map_err(|e| DeviceError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesized_frames_differ_by_seed() {
        let a = synthesize_frame(32, 32, 0, ImageEncoding::Png).unwrap();
        let b = synthesize_frame(32, 32, 1, ImageEncoding::Png).unwrap();
        assert_ne!(a, b, "Consecutive frames should not be identical");
    }

    #[tokio::test]
    async fn test_grab_requires_held_handle() {
        let mut camera = VirtualCamera::new(ImageEncoding::Png);
        let result = camera.grab_frame().await;
        assert!(result.is_err(), "Grab without acquire should fail");
    }

    #[tokio::test]
    async fn test_release_is_idempotent() {
        let mut camera =
            VirtualCamera::new(ImageEncoding::Png).with_acquire_delay(Duration::from_millis(1));
        camera.acquire().await.unwrap();
        camera.release();
        camera.release();
        assert!(!camera.is_held());
    }
}
