// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the capture step controller

use crate::session::CameraState;
use std::fmt;

/// Result type alias using CaptureError
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Errors surfaced by the capture step controller
///
/// `CameraUnavailable` is user-recoverable by invoking `start()` again while
/// attempts remain. The sequencing variants (`AlreadyStarted`, `NotReady`,
/// `NothingToRetake`, `NoImageCaptured`) indicate a desynchronized caller,
/// typically a rendering layer showing a button for a state the session is
/// no longer in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Camera access was denied or no device is present
    CameraUnavailable(String),
    /// The configured number of start attempts has been used up
    RetriesExhausted { attempts: u32 },
    /// The device failed while grabbing a frame
    CaptureFailed(String),
    /// start() called while the camera is already acquired or the step is over
    AlreadyStarted(CameraState),
    /// capture() called outside the Ready state
    NotReady(CameraState),
    /// retake() called without a captured image
    NothingToRetake(CameraState),
    /// submit() called without a captured image
    NoImageCaptured(CameraState),
    /// The submission collaborator rejected the handoff
    SubmissionFailed(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::CameraUnavailable(msg) => write!(f, "Camera unavailable: {}", msg),
            CaptureError::RetriesExhausted { attempts } => {
                write!(f, "Camera access failed after {} attempts", attempts)
            }
            CaptureError::CaptureFailed(msg) => write!(f, "Capture failed: {}", msg),
            CaptureError::AlreadyStarted(state) => {
                write!(f, "Cannot request camera access in state {}", state)
            }
            CaptureError::NotReady(state) => {
                write!(f, "Cannot capture without a live camera (state: {})", state)
            }
            CaptureError::NothingToRetake(state) => {
                write!(f, "No captured image to retake (state: {})", state)
            }
            CaptureError::NoImageCaptured(state) => {
                write!(f, "No captured image to submit (state: {})", state)
            }
            CaptureError::SubmissionFailed(msg) => write!(f, "Submission failed: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}

impl CaptureError {
    /// Whether the user can recover by retrying the operation themselves
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            CaptureError::CameraUnavailable(_) | CaptureError::SubmissionFailed(_)
        )
    }
}
