// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Timing constants
pub mod timing {
    use std::time::Duration;

    /// Default bound on a single camera acquisition attempt
    pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Default number of start() attempts before the step gives up
    pub const MAX_START_ATTEMPTS: u32 = 3;
}

/// Virtual camera defaults
pub mod virtual_camera {
    use std::time::Duration;

    /// Synthesized frame width in pixels
    pub const FRAME_WIDTH: u32 = 640;

    /// Synthesized frame height in pixels
    pub const FRAME_HEIGHT: u32 = 480;

    /// Simulated device acquisition latency
    pub const ACQUIRE_DELAY: Duration = Duration::from_millis(30);
}

/// On-disk paths
pub mod paths {
    /// Directory name under the platform config/pictures dirs
    pub const APP_DIR_NAME: &str = "verify-capture";

    /// Config file name inside the app config directory
    pub const CONFIG_FILE_NAME: &str = "config.json";

    /// Prefix for submitted photo files
    pub const PHOTO_FILE_PREFIX: &str = "photo";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timing_defaults_are_sane() {
        assert!(timing::MAX_START_ATTEMPTS >= 1);
        assert!(timing::ACQUIRE_TIMEOUT.as_millis() > 0);
    }
}
