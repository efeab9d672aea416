//! User-controlled transform parameters.
//!
//! [`TransformParameters`] is an immutable value supplied once per pipeline
//! run. It is built with `with_*` methods and checked by
//! [`validate`](TransformParameters::validate) before any decoding happens.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use gif_maker::TransformParameters;
//!
//! let params = TransformParameters::new()
//!     .with_scale(0.5)
//!     .with_speed(2.0)
//!     .with_trim(Duration::ZERO, Duration::from_secs(10))
//!     .with_frames_per_second(30);
//! assert!(params.validate().is_ok());
//! ```

use std::time::Duration;

use crate::error::GifMakerError;

/// Smallest accepted output frame rate.
pub const MIN_FRAMES_PER_SECOND: u32 = 10;
/// Largest accepted output frame rate.
pub const MAX_FRAMES_PER_SECOND: u32 = 60;
/// Largest accepted playback speed multiplier.
pub const MAX_SPEED: f64 = 10.0;

/// Scaling, speed, trim, and frame-rate settings for one export.
///
/// Defaults: scale `0.5`, speed `1.0`, 30 fps, whole clip.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct TransformParameters {
    /// Uniform resolution scale factor, in `(0, 1]`.
    pub scale: f64,
    /// Playback speed multiplier, in `(0, 10]`.
    pub speed: f64,
    /// Export range on the source timeline. `None` means the whole clip.
    pub trim_range: Option<(Duration, Duration)>,
    /// Output frame rate, in `[10, 60]`.
    pub frames_per_second: u32,
}

impl Default for TransformParameters {
    fn default() -> Self {
        Self {
            scale: 0.5,
            speed: 1.0,
            trim_range: None,
            frames_per_second: 30,
        }
    }
}

impl TransformParameters {
    /// Create parameters with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resolution scale factor.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set the playback speed multiplier.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Restrict the export to `[start, end]` of the source clip.
    pub fn with_trim(mut self, start: Duration, end: Duration) -> Self {
        self.trim_range = Some((start, end));
        self
    }

    /// Set the output frame rate.
    pub fn with_frames_per_second(mut self, frames_per_second: u32) -> Self {
        self.frames_per_second = frames_per_second;
        self
    }

    /// Check scale, speed, and frame rate against their bounds.
    ///
    /// The trim range needs the clip's duration and is checked by
    /// [`TransformPlan::new`](crate::TransformPlan::new).
    ///
    /// # Errors
    ///
    /// Returns [`GifMakerError::InvalidParameter`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<(), GifMakerError> {
        if !self.scale.is_finite() || self.scale <= 0.0 || self.scale > 1.0 {
            return Err(GifMakerError::InvalidParameter {
                name: "scale",
                value: self.scale.to_string(),
                reason: "must be greater than 0 and at most 1",
            });
        }

        if !self.speed.is_finite() || self.speed <= 0.0 || self.speed > MAX_SPEED {
            return Err(GifMakerError::InvalidParameter {
                name: "speed",
                value: self.speed.to_string(),
                reason: "must be greater than 0 and at most 10",
            });
        }

        if !(MIN_FRAMES_PER_SECOND..=MAX_FRAMES_PER_SECOND).contains(&self.frames_per_second) {
            return Err(GifMakerError::InvalidParameter {
                name: "fps",
                value: self.frames_per_second.to_string(),
                reason: "must be between 10 and 60",
            });
        }

        Ok(())
    }

    /// The export range, defaulting to the whole clip.
    pub(crate) fn resolved_trim(&self, clip_duration: Duration) -> (Duration, Duration) {
        self.trim_range.unwrap_or((Duration::ZERO, clip_duration))
    }
}
