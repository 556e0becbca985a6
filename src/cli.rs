// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for exercising the capture step
//!
//! This module provides command-line functionality for:
//! - Running the full capture flow against the virtual camera
//! - Demonstrating the denial/retry path

use std::path::PathBuf;
use verify_capture::{
    CaptureConfig, CaptureError, CaptureStepController, FileSubmission, VirtualCamera,
};

/// Run the capture flow: start, capture (with optional retakes), submit
pub fn run_capture(output: Option<PathBuf>, retakes: u32) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = CaptureConfig::load();
    if let Some(dir) = output {
        config.output_dir = Some(dir);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let camera = VirtualCamera::new(config.encoding);
        let target = FileSubmission::new(config.output_directory());
        let mut step = CaptureStepController::with_config(
            Box::new(camera),
            Box::new(target),
            config.clone(),
        );

        println!("Requesting camera ({})...", config.encoding);
        step.start().await?;

        step.capture().await?;
        for round in 1..=retakes {
            println!("Retake {} of {}", round, retakes);
            step.retake()?;
            step.capture().await?;
        }

        if let Some(image) = step.session().image() {
            println!("Captured {} bytes ({})", image.len(), image.encoding());
        }

        let receipt = step.submit().await?;
        println!("Submitted: id {} at {}", receipt.submission_id, receipt.submitted_at);
        println!("Output directory: {}", config.output_directory().display());

        Ok(())
    })
}

/// Demonstrate the denial path: every attempt fails until the budget is gone
pub fn run_denied_demo() -> Result<(), Box<dyn std::error::Error>> {
    let config = CaptureConfig::load();
    let attempts = config.max_start_attempts;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let camera = VirtualCamera::denied();
        let target = FileSubmission::new(config.output_directory());
        let mut step =
            CaptureStepController::with_config(Box::new(camera), Box::new(target), config);

        for attempt in 1..=attempts {
            match step.start().await {
                Ok(()) => unreachable!("denied camera cannot become ready"),
                Err(e) => println!(
                    "Attempt {}: {} (state: {})",
                    attempt,
                    e,
                    step.session().state()
                ),
            }
        }

        match step.start().await {
            Err(CaptureError::RetriesExhausted { attempts }) => {
                println!("Step is terminal after {} attempts", attempts);
            }
            other => println!("Unexpected outcome: {:?}", other),
        }

        step.dispose();
        Ok(())
    })
}
