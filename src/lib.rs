// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture step controller for an identity-verification wizard
//!
//! This library implements the coordination logic behind a "take a face
//! photo" verification step: camera lifecycle, capture and retake, and the
//! handoff of one finalized image to a submission collaborator. Rendering
//! (markup, localized copy, platform naming) stays entirely in the caller;
//! it drives the controller and inspects the session state.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`controller`]: The capture step state machine driver
//! - [`session`]: Session state and the image-iff-captured invariant
//! - [`device`]: Camera device abstraction and the virtual camera
//! - [`submit`]: Submission handoff traits and receipts
//! - [`config`]: User configuration handling
//!
//! # Example
//!
//! ```no_run
//! use verify_capture::{CaptureStepController, FileSubmission, ImageEncoding, VirtualCamera};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let camera = VirtualCamera::new(ImageEncoding::Jpeg);
//! let target = FileSubmission::new("/tmp/photos".into());
//! let mut step = CaptureStepController::new(Box::new(camera), Box::new(target));
//!
//! step.start().await?;
//! step.capture().await?;
//! let receipt = step.submit().await?;
//! println!("submitted {}", receipt.submission_id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod device;
pub mod errors;
pub mod session;
pub mod submit;

// Re-export commonly used types
pub use config::CaptureConfig;
pub use controller::CaptureStepController;
pub use device::{CameraDevice, CapturedImage, DeviceError, ImageEncoding, VirtualCamera};
pub use errors::{CaptureError, CaptureResult};
pub use session::{CameraState, CaptureSession};
pub use submit::{FileSubmission, SubmissionReceipt, SubmissionTarget};
