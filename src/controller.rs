// SPDX-License-Identifier: GPL-3.0-only

//! Capture step controller
//!
//! [`CaptureStepController`] mediates between one [`CameraDevice`] and one
//! [`SubmissionTarget`] for the lifetime of a verification step. The
//! rendering layer reads [`CaptureStepController::session`] to decide which
//! widgets to show and invokes the operations in response to user actions;
//! it never touches the device directly.
//!
//! The device handle is released on every exit path: successful submission,
//! unrecoverable errors, explicit `dispose()` when the user navigates away,
//! and `Drop` as a last resort.

use crate::config::CaptureConfig;
use crate::device::{CameraDevice, DeviceError};
use crate::errors::{CaptureError, CaptureResult};
use crate::session::{CameraState, CaptureSession};
use crate::submit::{SubmissionReceipt, SubmissionTarget};
use chrono::Utc;
use tracing::{debug, error, info, warn};

/// Coordinates camera access, capture, retake, and submission handoff for
/// one verification step
pub struct CaptureStepController {
    session: CaptureSession,
    device: Box<dyn CameraDevice>,
    target: Box<dyn SubmissionTarget>,
    config: CaptureConfig,
    /// Consecutive failed start() attempts, reset on success
    failed_starts: u32,
}

impl CaptureStepController {
    /// Create a controller with default configuration
    pub fn new(device: Box<dyn CameraDevice>, target: Box<dyn SubmissionTarget>) -> Self {
        Self::with_config(device, target, CaptureConfig::default())
    }

    /// Create a controller with explicit configuration
    pub fn with_config(
        device: Box<dyn CameraDevice>,
        target: Box<dyn SubmissionTarget>,
        config: CaptureConfig,
    ) -> Self {
        let session = CaptureSession::new();
        info!(session = %session.id(), device = device.name(), "Capture step entered");
        Self {
            session,
            device,
            target,
            config,
            failed_starts: 0,
        }
    }

    /// The session this controller drives, for state inspection by the
    /// rendering layer
    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// Failed start() attempts so far
    pub fn failed_starts(&self) -> u32 {
        self.failed_starts
    }

    /// Whether start() can still be retried after a failure
    pub fn can_retry(&self) -> bool {
        self.failed_starts < self.config.max_start_attempts
    }

    /// Request camera access
    ///
    /// Valid in `Uninitialized` and `Error`. Moves through `Requesting` to
    /// `Ready`, or back to `Error` on denial, absence, or timeout. Failures
    /// are never retried automatically; the caller re-invokes `start()`
    /// until the configured attempt budget is used up.
    pub async fn start(&mut self) -> CaptureResult<()> {
        match self.session.state() {
            CameraState::Uninitialized | CameraState::Error => {}
            state => return Err(CaptureError::AlreadyStarted(state)),
        }

        if !self.can_retry() {
            debug!(session = %self.session.id(), attempts = self.failed_starts, "Start attempts exhausted");
            return Err(CaptureError::RetriesExhausted {
                attempts: self.failed_starts,
            });
        }

        self.session.begin_request();
        info!(
            session = %self.session.id(),
            device = self.device.name(),
            attempt = self.failed_starts + 1,
            "Requesting camera access"
        );

        let outcome = tokio::time::timeout(self.config.acquire_timeout(), self.device.acquire()).await;

        match outcome {
            Ok(Ok(())) => {
                self.failed_starts = 0;
                self.session.mark_ready();
                info!(session = %self.session.id(), "Camera ready");
                Ok(())
            }
            Ok(Err(e)) => self.fail_start(e.to_string()),
            Err(_) => {
                // The device may have granted the handle just after the
                // deadline; release keeps the exclusivity guarantee.
                self.device.release();
                self.fail_start(format!(
                    "acquisition timed out after {:?}",
                    self.config.acquire_timeout()
                ))
            }
        }
    }

    fn fail_start(&mut self, reason: String) -> CaptureResult<()> {
        self.failed_starts += 1;
        self.session.mark_error();
        warn!(
            session = %self.session.id(),
            attempt = self.failed_starts,
            reason = %reason,
            "Camera acquisition failed"
        );
        Err(CaptureError::CameraUnavailable(reason))
    }

    /// Freeze one still frame from the live feed
    ///
    /// Valid only in `Ready`. A device failure mid-grab is treated as loss
    /// of the camera: the handle is released and the session moves to
    /// `Error`.
    pub async fn capture(&mut self) -> CaptureResult<()> {
        if self.session.state() != CameraState::Ready {
            return Err(CaptureError::NotReady(self.session.state()));
        }

        self.session.begin_capture();
        debug!(session = %self.session.id(), "Capturing frame");

        match self.device.grab_frame().await {
            Ok(image) => {
                info!(
                    session = %self.session.id(),
                    bytes = image.len(),
                    encoding = %image.encoding(),
                    "Frame captured"
                );
                self.session.store_image(image);
                Ok(())
            }
            Err(e) => {
                error!(session = %self.session.id(), error = %e, "Frame grab failed");
                self.device.release();
                self.session.mark_error();
                Err(match e {
                    DeviceError::AccessDenied(msg) => CaptureError::CameraUnavailable(msg),
                    other => CaptureError::CaptureFailed(other.to_string()),
                })
            }
        }
    }

    /// Discard the captured image and return to live preview
    ///
    /// Valid only in `Captured`. The discarded image is dropped here and can
    /// never be submitted afterwards.
    pub fn retake(&mut self) -> CaptureResult<()> {
        if self.session.state() != CameraState::Captured {
            return Err(CaptureError::NothingToRetake(self.session.state()));
        }

        self.session.discard_image();
        info!(session = %self.session.id(), "Image discarded for retake");
        Ok(())
    }

    /// Hand the captured image to the submission collaborator
    ///
    /// Valid only in `Captured`. On success the step is over: the session
    /// becomes `Submitted` and the device is released. A collaborator
    /// failure leaves the session in `Captured` with the image intact so the
    /// user can retry.
    pub async fn submit(&mut self) -> CaptureResult<SubmissionReceipt> {
        let Some(image) = self.session.image().cloned() else {
            return Err(CaptureError::NoImageCaptured(self.session.state()));
        };

        debug!(session = %self.session.id(), bytes = image.len(), "Submitting image");

        match self.target.submit(self.session.id(), &image).await {
            Ok(submission_id) => {
                self.session.mark_submitted();
                self.device.release();
                let receipt = SubmissionReceipt {
                    submission_id,
                    session_id: self.session.id(),
                    submitted_at: Utc::now(),
                    encoding: image.encoding(),
                };
                info!(
                    session = %self.session.id(),
                    submission = %submission_id,
                    "Image submitted, step complete"
                );
                Ok(receipt)
            }
            Err(reason) => {
                warn!(session = %self.session.id(), reason = %reason, "Submission rejected");
                Err(CaptureError::SubmissionFailed(reason))
            }
        }
    }

    /// Release the camera device, idempotent
    ///
    /// Invoked when the user navigates away from the step in any state,
    /// including while a cancelled `start()` was still in `Requesting`.
    /// Also runs from `Drop`, so a forgotten call cannot leak the handle.
    pub fn dispose(&mut self) {
        if self.device.is_held() {
            self.device.release();
            info!(session = %self.session.id(), "Camera released");
        }
    }
}

impl Drop for CaptureStepController {
    fn drop(&mut self) {
        if self.device.is_held() {
            self.device.release();
            debug!(session = %self.session.id(), "Camera released on drop");
        }
    }
}
