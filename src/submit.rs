// SPDX-License-Identifier: GPL-3.0-only

//! Submission handoff
//!
//! The controller hands the finalized image to a [`SubmissionTarget`]; what
//! happens to it afterwards (verification review, matching, retention) is the
//! collaborator's concern. [`FileSubmission`] is the reference target used by
//! the CLI: it writes the image into a directory with a timestamped name.

use crate::constants::paths;
use crate::device::{CapturedImage, ImageEncoding};
use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use std::path::PathBuf;
use tracing::{debug, info};
use uuid::Uuid;

/// Proof that the handoff to the submission collaborator occurred
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Identifier assigned by the submission target
    pub submission_id: Uuid,
    /// Session the image came from
    pub session_id: Uuid,
    /// When the handoff completed
    pub submitted_at: DateTime<Utc>,
    /// Encoding of the submitted image
    pub encoding: ImageEncoding,
}

/// Receiver of the finalized capture
///
/// Errors are plain strings: the collaborator's failure taxonomy is not this
/// crate's to define, the controller only needs something to surface for a
/// user-facing retry.
#[async_trait]
pub trait SubmissionTarget: Send + Sync {
    /// Accept one finalized image, returning the collaborator's identifier
    /// for the submission
    async fn submit(&mut self, session_id: Uuid, image: &CapturedImage) -> Result<Uuid, String>;
}

/// Submission target that writes images to a local directory
pub struct FileSubmission {
    directory: PathBuf,
    last_written: Option<PathBuf>,
}

impl FileSubmission {
    /// Create a target writing into the given directory
    pub fn new(directory: PathBuf) -> Self {
        Self {
            directory,
            last_written: None,
        }
    }

    /// Path of the most recently written file
    pub fn last_written(&self) -> Option<&PathBuf> {
        self.last_written.as_ref()
    }
}

#[async_trait]
impl SubmissionTarget for FileSubmission {
    async fn submit(&mut self, session_id: Uuid, image: &CapturedImage) -> Result<Uuid, String> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| format!("Cannot create {}: {}", self.directory.display(), e))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!(
            "{}_{}.{}",
            paths::PHOTO_FILE_PREFIX,
            timestamp,
            image.encoding().extension()
        );
        let path = self.directory.join(filename);

        debug!(session = %session_id, path = %path.display(), "Writing submitted photo");

        tokio::fs::write(&path, image.data())
            .await
            .map_err(|e| format!("Cannot write {}: {}", path.display(), e))?;

        info!(
            session = %session_id,
            path = %path.display(),
            bytes = image.len(),
            "Photo submission stored"
        );

        self.last_written = Some(path);
        Ok(Uuid::new_v4())
    }
}
