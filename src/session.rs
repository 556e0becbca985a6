// SPDX-License-Identifier: GPL-3.0-only

//! Capture session state
//!
//! One [`CaptureSession`] exists per verification step instance. The session
//! holds the state machine position and the captured image, and its mutation
//! API is narrow enough that the image-iff-Captured invariant cannot be
//! broken from outside this module.

use crate::device::CapturedImage;
use std::fmt;
use uuid::Uuid;

/// Position in the capture step state machine
///
/// ```text
/// Uninitialized → Requesting → {Ready, Error}
/// Ready → Capturing → Captured
/// Captured → Ready (retake) | Submitted (submit)
/// Error → Requesting (start retry, while attempts remain)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraState {
    /// Step entered, camera not yet requested
    #[default]
    Uninitialized,
    /// Waiting for the platform to grant camera access
    Requesting,
    /// Live preview available, no frozen frame
    Ready,
    /// Freezing a frame from the live feed
    Capturing,
    /// One frozen frame held, awaiting retake or submit
    Captured,
    /// Image handed off to the submission collaborator (terminal)
    Submitted,
    /// Camera acquisition or capture failed
    Error,
}

impl CameraState {
    /// Whether the step can never leave this state
    ///
    /// `Error` is only conditionally terminal (it depends on remaining start
    /// attempts), so it is not reported here.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CameraState::Submitted)
    }
}

impl fmt::Display for CameraState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CameraState::Uninitialized => "uninitialized",
            CameraState::Requesting => "requesting",
            CameraState::Ready => "ready",
            CameraState::Capturing => "capturing",
            CameraState::Captured => "captured",
            CameraState::Submitted => "submitted",
            CameraState::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// State and captured image of one verification step instance
///
/// Invariant: `image()` is `Some` if and only if `state()` is `Captured`.
#[derive(Debug)]
pub struct CaptureSession {
    id: Uuid,
    state: CameraState,
    image: Option<CapturedImage>,
}

impl CaptureSession {
    /// Create a fresh session for a newly entered step
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: CameraState::Uninitialized,
            image: None,
        }
    }

    /// Session identifier, stable for the lifetime of the step
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current state machine position
    pub fn state(&self) -> CameraState {
        self.state
    }

    /// The frozen frame, present only in `Captured`
    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    /// Check if a frozen frame is held
    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Enter `Requesting` (start or start retry)
    pub(crate) fn begin_request(&mut self) {
        self.state = CameraState::Requesting;
        self.image = None;
    }

    /// Acquisition succeeded, live preview is up
    pub(crate) fn mark_ready(&mut self) {
        self.state = CameraState::Ready;
        self.image = None;
    }

    /// Enter the transient `Capturing` state
    pub(crate) fn begin_capture(&mut self) {
        self.state = CameraState::Capturing;
        self.image = None;
    }

    /// Store a frozen frame, replacing any previous one
    pub(crate) fn store_image(&mut self, image: CapturedImage) {
        self.image = Some(image);
        self.state = CameraState::Captured;
    }

    /// Discard the frozen frame and return to live preview (retake)
    pub(crate) fn discard_image(&mut self) {
        self.image = None;
        self.state = CameraState::Ready;
    }

    /// Handoff complete, the step is over
    pub(crate) fn mark_submitted(&mut self) {
        self.image = None;
        self.state = CameraState::Submitted;
    }

    /// Acquisition or capture failed
    pub(crate) fn mark_error(&mut self) {
        self.image = None;
        self.state = CameraState::Error;
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::ImageEncoding;
    use chrono::Utc;
    use std::sync::Arc;

    fn test_image() -> CapturedImage {
        CapturedImage::new(Arc::from(vec![1u8, 2, 3]), ImageEncoding::Jpeg, Utc::now())
    }

    #[test]
    fn test_image_present_iff_captured() {
        let mut session = CaptureSession::new();
        assert!(!session.has_image());

        session.begin_request();
        assert!(!session.has_image());

        session.mark_ready();
        session.begin_capture();
        assert!(!session.has_image());

        session.store_image(test_image());
        assert_eq!(session.state(), CameraState::Captured);
        assert!(session.has_image());

        session.discard_image();
        assert_eq!(session.state(), CameraState::Ready);
        assert!(!session.has_image());

        session.store_image(test_image());
        session.mark_submitted();
        assert_eq!(session.state(), CameraState::Submitted);
        assert!(!session.has_image(), "Submission must drop the image");
    }

    #[test]
    fn test_error_clears_image() {
        let mut session = CaptureSession::new();
        session.mark_ready();
        session.begin_capture();
        session.store_image(test_image());
        session.mark_error();
        assert!(!session.has_image());
        assert_eq!(session.state(), CameraState::Error);
    }

    #[test]
    fn test_only_submitted_is_terminal() {
        assert!(CameraState::Submitted.is_terminal());
        assert!(!CameraState::Error.is_terminal());
        assert!(!CameraState::Captured.is_terminal());
    }
}
