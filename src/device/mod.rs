// SPDX-License-Identifier: GPL-3.0-only

//! Camera device abstraction
//!
//! The controller drives any camera through the [`CameraDevice`] trait:
//!
//! ```text
//! ┌──────────────────────┐
//! │ CaptureStepController│  ← Lifecycle, retake, submission handoff
//! └──────────┬───────────┘
//!            │
//!            ▼
//! ┌──────────────────────┐
//! │  CameraDevice trait  │  ← acquire / grab_frame / release
//! └──────────┬───────────┘
//!            │
//!            ▼
//!     ┌─────────────┐
//!     │VirtualCamera│  ← In-memory implementation (demo + tests)
//!     └─────────────┘
//! ```
//!
//! A device produces already-encoded still images; the controller passes the
//! encoding through unchanged.

pub mod virtual_device;

pub use virtual_device::VirtualCamera;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Result type for device operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Error types for device operations
#[derive(Debug, Clone)]
pub enum DeviceError {
    /// Permission to use the camera was denied
    AccessDenied(String),
    /// No camera device present
    NotFound,
    /// Camera is held by another consumer
    Busy,
    /// Device went away mid-operation
    Disconnected,
    /// Frame grab failed
    FrameFailed(String),
    /// Still-image encoding failed
    EncodingFailed(String),
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::AccessDenied(msg) => write!(f, "Access denied: {}", msg),
            DeviceError::NotFound => write!(f, "No camera device found"),
            DeviceError::Busy => write!(f, "Camera is busy"),
            DeviceError::Disconnected => write!(f, "Camera disconnected"),
            DeviceError::FrameFailed(msg) => write!(f, "Frame grab failed: {}", msg),
            DeviceError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
        }
    }
}

impl std::error::Error for DeviceError {}

/// Still-image encoding produced by a camera device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageEncoding {
    /// JPEG (default, what webcam capture widgets typically produce)
    #[default]
    Jpeg,
    /// PNG (lossless, larger files)
    Png,
}

impl ImageEncoding {
    /// Get all encoding variants for UI iteration
    pub const ALL: [ImageEncoding; 2] = [ImageEncoding::Jpeg, ImageEncoding::Png];

    /// Get display name for the encoding
    pub fn display_name(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "JPEG",
            ImageEncoding::Png => "PNG",
        }
    }

    /// Get the MIME type for the encoding
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "image/jpeg",
            ImageEncoding::Png => "image/png",
        }
    }

    /// Get the file extension (without dot)
    pub fn extension(&self) -> &'static str {
        match self {
            ImageEncoding::Jpeg => "jpg",
            ImageEncoding::Png => "png",
        }
    }
}

impl fmt::Display for ImageEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// One frozen still frame from a camera
///
/// The pixel data is immutable and reference-counted, so clones are cheap
/// and a discarded image cannot be mutated into a resubmittable one.
#[derive(Clone)]
pub struct CapturedImage {
    data: Arc<[u8]>,
    encoding: ImageEncoding,
    captured_at: DateTime<Utc>,
}

impl CapturedImage {
    /// Create an image from encoded bytes
    pub fn new(data: Arc<[u8]>, encoding: ImageEncoding, captured_at: DateTime<Utc>) -> Self {
        Self {
            data,
            encoding,
            captured_at,
        }
    }

    /// Encoded image bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Encoding of the byte buffer
    pub fn encoding(&self) -> ImageEncoding {
        self.encoding
    }

    /// Timestamp of the capture
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Length of the encoded data in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the image data is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CapturedImage({} bytes, {}, {})",
            self.data.len(),
            self.encoding,
            self.captured_at
        )
    }
}

/// Exclusively-owned camera device
///
/// Implementations must tolerate `release()` at any point, including before
/// `acquire()` succeeded and repeatedly after the handle is gone.
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Acquire the exclusive device handle
    ///
    /// Suspends until the platform grants or denies access. On failure the
    /// device must be left unheld.
    async fn acquire(&mut self) -> DeviceResult<()>;

    /// Freeze one still frame from the live feed
    ///
    /// Valid only while the handle is held. The returned image is already
    /// encoded in the device's native still format.
    async fn grab_frame(&mut self) -> DeviceResult<CapturedImage>;

    /// Release the device handle, idempotent
    fn release(&mut self);

    /// Check if the handle is currently held
    fn is_held(&self) -> bool;

    /// Human-readable device name for logging
    fn name(&self) -> &str;
}
