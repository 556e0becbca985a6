// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the capture step controller
//!
//! The camera and submission fakes live here so the tests can observe the
//! device handle and the handed-off images from outside the controller.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::timeout;
use uuid::Uuid;
use verify_capture::{
    CameraDevice, CameraState, CaptureConfig, CaptureError, CaptureStepController, CapturedImage,
    DeviceError, ImageEncoding, SubmissionTarget, VirtualCamera,
};

/// Camera fake whose held flag is observable from the test after the
/// controller has taken ownership
struct TrackedCamera {
    held: Arc<AtomicBool>,
    deny_access: bool,
    fail_grab: bool,
    acquire_delay: Duration,
    counter: u64,
}

impl TrackedCamera {
    fn new() -> (Self, Arc<AtomicBool>) {
        let held = Arc::new(AtomicBool::new(false));
        let camera = Self {
            held: Arc::clone(&held),
            deny_access: false,
            fail_grab: false,
            acquire_delay: Duration::from_millis(1),
            counter: 0,
        };
        (camera, held)
    }

    fn denied() -> (Self, Arc<AtomicBool>) {
        let (mut camera, held) = Self::new();
        camera.deny_access = true;
        (camera, held)
    }

    fn with_failing_grab() -> (Self, Arc<AtomicBool>) {
        let (mut camera, held) = Self::new();
        camera.fail_grab = true;
        (camera, held)
    }

    fn with_acquire_delay(mut self, delay: Duration) -> Self {
        self.acquire_delay = delay;
        self
    }
}

#[async_trait]
impl CameraDevice for TrackedCamera {
    async fn acquire(&mut self) -> Result<(), DeviceError> {
        tokio::time::sleep(self.acquire_delay).await;
        if self.deny_access {
            return Err(DeviceError::AccessDenied("denied by test".to_string()));
        }
        self.held.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn grab_frame(&mut self) -> Result<CapturedImage, DeviceError> {
        if !self.held.load(Ordering::SeqCst) {
            return Err(DeviceError::Disconnected);
        }
        if self.fail_grab {
            return Err(DeviceError::FrameFailed("sensor fault".to_string()));
        }
        self.counter += 1;
        let bytes = vec![self.counter as u8; 16];
        Ok(CapturedImage::new(
            Arc::from(bytes),
            ImageEncoding::Jpeg,
            Utc::now(),
        ))
    }

    fn release(&mut self) {
        self.held.store(false, Ordering::SeqCst);
    }

    fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "Tracked Camera"
    }
}

/// Submission fake recording every handed-off image
struct RecordingTarget {
    submissions: Arc<Mutex<Vec<(Uuid, Vec<u8>)>>>,
    /// Number of leading submit calls to reject
    fail_first: u32,
}

impl RecordingTarget {
    fn new() -> (Self, Arc<Mutex<Vec<(Uuid, Vec<u8>)>>>) {
        let submissions = Arc::new(Mutex::new(Vec::new()));
        let target = Self {
            submissions: Arc::clone(&submissions),
            fail_first: 0,
        };
        (target, submissions)
    }

    fn failing_first(count: u32) -> (Self, Arc<Mutex<Vec<(Uuid, Vec<u8>)>>>) {
        let (mut target, submissions) = Self::new();
        target.fail_first = count;
        (target, submissions)
    }
}

#[async_trait]
impl SubmissionTarget for RecordingTarget {
    async fn submit(&mut self, session_id: Uuid, image: &CapturedImage) -> Result<Uuid, String> {
        if self.fail_first > 0 {
            self.fail_first -= 1;
            return Err("verification service unreachable".to_string());
        }
        self.submissions
            .lock()
            .unwrap()
            .push((session_id, image.data().to_vec()));
        Ok(Uuid::new_v4())
    }
}

fn controller_with(
    camera: TrackedCamera,
    target: RecordingTarget,
) -> CaptureStepController {
    CaptureStepController::new(Box::new(camera), Box::new(target))
}

/// An image is held exactly in the captured state, in every other state
/// the session must be empty
fn assert_image_matches_state(step: &CaptureStepController) {
    let captured = step.session().state() == CameraState::Captured;
    assert_eq!(
        step.session().has_image(),
        captured,
        "Image presence must track the captured state (state: {})",
        step.session().state()
    );
}

#[tokio::test]
async fn test_happy_path_start_capture_submit() {
    let (camera, held) = TrackedCamera::new();
    let (target, submissions) = RecordingTarget::new();
    let mut step = controller_with(camera, target);

    assert_eq!(step.session().state(), CameraState::Uninitialized);
    assert_image_matches_state(&step);

    step.start().await.expect("start should succeed");
    assert_eq!(step.session().state(), CameraState::Ready);
    assert!(held.load(Ordering::SeqCst), "Device should be held");
    assert_image_matches_state(&step);

    step.capture().await.expect("capture should succeed");
    assert_eq!(step.session().state(), CameraState::Captured);
    assert_image_matches_state(&step);

    let session_id = step.session().id();
    let receipt = step.submit().await.expect("submit should succeed");
    assert_eq!(step.session().state(), CameraState::Submitted);
    assert_eq!(receipt.session_id, session_id);
    assert_eq!(receipt.encoding, ImageEncoding::Jpeg);
    assert_image_matches_state(&step);

    assert!(
        !held.load(Ordering::SeqCst),
        "Device must be released after submission"
    );

    let recorded = submissions.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].0, session_id);
}

#[tokio::test]
async fn test_denied_start_then_capture_fails_not_ready() {
    let (camera, held) = TrackedCamera::denied();
    let (target, _) = RecordingTarget::new();
    let mut step = controller_with(camera, target);

    let err = step.start().await.expect_err("denied start must fail");
    assert!(matches!(err, CaptureError::CameraUnavailable(_)));
    assert_eq!(step.session().state(), CameraState::Error);
    assert!(!held.load(Ordering::SeqCst));
    assert_image_matches_state(&step);

    let err = step.capture().await.expect_err("capture in error state");
    assert!(matches!(err, CaptureError::NotReady(CameraState::Error)));
}

#[tokio::test]
async fn test_retry_budget_is_exhausted() {
    let (camera, _held) = TrackedCamera::denied();
    let (target, _) = RecordingTarget::new();
    let config = CaptureConfig {
        max_start_attempts: 2,
        ..CaptureConfig::default()
    };
    let mut step = CaptureStepController::with_config(Box::new(camera), Box::new(target), config);

    for _ in 0..2 {
        let err = step.start().await.expect_err("denied start must fail");
        assert!(matches!(err, CaptureError::CameraUnavailable(_)));
    }
    assert!(!step.can_retry());

    let err = step.start().await.expect_err("budget is used up");
    assert_eq!(err, CaptureError::RetriesExhausted { attempts: 2 });
    assert_eq!(step.session().state(), CameraState::Error);
}

#[tokio::test]
async fn test_retake_replaces_image_and_old_one_is_never_submitted() {
    let (camera, _held) = TrackedCamera::new();
    let (target, submissions) = RecordingTarget::new();
    let mut step = controller_with(camera, target);

    step.start().await.unwrap();
    step.capture().await.unwrap();
    let first = step.session().image().unwrap().data().to_vec();

    step.retake().expect("retake in captured state");
    assert_eq!(step.session().state(), CameraState::Ready);
    assert_image_matches_state(&step);

    let err = step.retake().expect_err("retake without an image");
    assert!(matches!(err, CaptureError::NothingToRetake(CameraState::Ready)));

    step.capture().await.unwrap();
    let second = step.session().image().unwrap().data().to_vec();
    assert_ne!(first, second, "Retake must yield a fresh frame");

    step.submit().await.unwrap();
    let recorded = submissions.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].1, second, "Only the latest image is submitted");
}

#[tokio::test]
async fn test_virtual_camera_retake_produces_different_frame() {
    let camera = VirtualCamera::new(ImageEncoding::Png)
        .with_acquire_delay(Duration::from_millis(1))
        .with_frame_size(48, 48);
    let (target, _) = RecordingTarget::new();
    let mut step = CaptureStepController::new(Box::new(camera), Box::new(target));

    step.start().await.unwrap();
    step.capture().await.unwrap();
    let first = step.session().image().unwrap().data().to_vec();

    step.retake().unwrap();
    step.capture().await.unwrap();
    let second = step.session().image().unwrap().data().to_vec();

    assert_ne!(first, second);
}

#[tokio::test]
async fn test_submit_without_capture_fails() {
    let (camera, _held) = TrackedCamera::new();
    let (target, submissions) = RecordingTarget::new();
    let mut step = controller_with(camera, target);

    let err = step.submit().await.expect_err("nothing captured yet");
    assert!(matches!(
        err,
        CaptureError::NoImageCaptured(CameraState::Uninitialized)
    ));

    step.start().await.unwrap();
    let err = step.submit().await.expect_err("still nothing captured");
    assert!(matches!(err, CaptureError::NoImageCaptured(CameraState::Ready)));

    assert!(submissions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_submission_failure_keeps_image_for_retry() {
    let (camera, held) = TrackedCamera::new();
    let (target, submissions) = RecordingTarget::failing_first(1);
    let mut step = controller_with(camera, target);

    step.start().await.unwrap();
    step.capture().await.unwrap();

    let err = step.submit().await.expect_err("first submit is rejected");
    assert!(matches!(err, CaptureError::SubmissionFailed(_)));
    assert_eq!(
        step.session().state(),
        CameraState::Captured,
        "Rejected submission must not consume the image"
    );
    assert_image_matches_state(&step);
    assert!(held.load(Ordering::SeqCst), "Device stays held for the retry");

    step.submit().await.expect("second submit succeeds");
    assert_eq!(step.session().state(), CameraState::Submitted);
    assert_eq!(submissions.lock().unwrap().len(), 1);
    assert!(!held.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_start_in_ready_state_is_a_sequencing_error() {
    let (camera, _held) = TrackedCamera::new();
    let (target, _) = RecordingTarget::new();
    let mut step = controller_with(camera, target);

    step.start().await.unwrap();
    let err = step.start().await.expect_err("start twice");
    assert!(matches!(err, CaptureError::AlreadyStarted(CameraState::Ready)));
}

#[tokio::test]
async fn test_grab_failure_releases_device_and_errors_session() {
    let (camera, held) = TrackedCamera::with_failing_grab();
    let (target, _) = RecordingTarget::new();
    let mut step = controller_with(camera, target);

    step.start().await.unwrap();
    let err = step.capture().await.expect_err("grab fails");
    assert!(matches!(err, CaptureError::CaptureFailed(_)));
    assert_eq!(step.session().state(), CameraState::Error);
    assert!(
        !held.load(Ordering::SeqCst),
        "A failed grab must not leave the device held"
    );
    assert_image_matches_state(&step);
}

#[tokio::test]
async fn test_acquisition_timeout_counts_as_unavailable() {
    let (camera, held) = TrackedCamera::new();
    let camera = camera.with_acquire_delay(Duration::from_secs(30));
    let (target, _) = RecordingTarget::new();
    let config = CaptureConfig {
        acquire_timeout_secs: 0,
        ..CaptureConfig::default()
    };
    let mut step = CaptureStepController::with_config(Box::new(camera), Box::new(target), config);

    let err = step.start().await.expect_err("acquisition must time out");
    assert!(matches!(err, CaptureError::CameraUnavailable(_)));
    assert_eq!(step.session().state(), CameraState::Error);
    assert!(!held.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_dispose_is_idempotent_in_every_state() {
    let (camera, held) = TrackedCamera::new();
    let (target, _) = RecordingTarget::new();
    let mut step = controller_with(camera, target);

    // Before anything happened
    step.dispose();
    step.dispose();
    assert!(!held.load(Ordering::SeqCst));

    step.start().await.unwrap();
    assert!(held.load(Ordering::SeqCst));

    step.dispose();
    step.dispose();
    assert!(!held.load(Ordering::SeqCst), "Dispose must release the device");
}

#[tokio::test]
async fn test_abandoning_start_midway_then_dispose_releases() {
    let (camera, held) = TrackedCamera::new();
    let camera = camera.with_acquire_delay(Duration::from_secs(30));
    let (target, _) = RecordingTarget::new();
    let mut step = controller_with(camera, target);

    // Navigate away while the permission prompt is still pending
    let abandoned = timeout(Duration::from_millis(10), step.start()).await;
    assert!(abandoned.is_err(), "start should still be suspended");
    assert_eq!(step.session().state(), CameraState::Requesting);

    step.dispose();
    assert!(!held.load(Ordering::SeqCst), "No outstanding acquisition");
}

#[tokio::test]
async fn test_drop_releases_device() {
    let (camera, held) = TrackedCamera::new();
    let (target, _) = RecordingTarget::new();
    let mut step = controller_with(camera, target);

    step.start().await.unwrap();
    assert!(held.load(Ordering::SeqCst));

    drop(step);
    assert!(
        !held.load(Ordering::SeqCst),
        "Dropping the controller must release the device"
    );
}
