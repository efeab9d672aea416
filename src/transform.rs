//! The transform stage: scale, trim, and speed.
//!
//! A [`TransformPlan`] is the transformed view of a clip. It is computed
//! from the source [`ClipMetadata`] and the user's [`TransformParameters`]
//! without touching the decoder, in this order:
//!
//! 1. spatial scale: `round(width * scale) x round(height * scale)`;
//! 2. trim to `[start, end]`, validated against the untrimmed duration;
//! 3. speed: output time `t` shows source time `start + t * speed`.
//!
//! The sampler walks the plan; [`derive_metrics`] exposes the same numbers
//! for display.

use std::time::Duration;

use crate::error::GifMakerError;
use crate::metadata::ClipMetadata;
use crate::parameters::{MIN_FRAMES_PER_SECOND, TransformParameters};

/// Container durations are rounded; allow a trim end this far past them.
const DURATION_TOLERANCE: Duration = Duration::from_millis(1);

/// Absorbs float error in `duration * fps` before flooring.
const FRAME_COUNT_EPSILON: f64 = 1e-6;

/// Scale source dimensions by a single uniform factor.
///
/// Each side is rounded to the nearest pixel and kept at least 1.
pub fn scaled_dimensions(width: u32, height: u32, scale: f64) -> (u32, u32) {
    let scale_side = |side: u32| ((side as f64 * scale).round() as u32).max(1);
    (scale_side(width), scale_side(height))
}

/// Number of whole output frames in `output_duration` at `frames_per_second`.
pub fn sample_count(output_duration: Duration, frames_per_second: u32) -> u64 {
    (output_duration.as_secs_f64() * frames_per_second as f64 + FRAME_COUNT_EPSILON).floor() as u64
}

/// The transformed view of a source clip.
///
/// Only [`TransformPlan::new`] builds a plan, so every plan has validated
/// bounds:
///
/// ```compile_fail
/// use std::time::Duration;
///
/// use gif_maker::TransformPlan;
///
/// let plan = TransformPlan {
///     width: 1,
///     height: 1,
///     start: Duration::ZERO,
///     end: Duration::from_secs(1),
///     speed: 0.0,
///     frames_per_second: 0,
/// };
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct TransformPlan {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) start: Duration,
    pub(crate) end: Duration,
    pub(crate) speed: f64,
    pub(crate) frames_per_second: u32,
}

impl TransformPlan {
    /// Apply `params` to a clip described by `metadata`.
    ///
    /// # Errors
    ///
    /// - [`GifMakerError::InvalidParameter`] if scale, speed, or fps are out
    ///   of bounds.
    /// - [`GifMakerError::InvalidRange`] if the trim start is after its end
    ///   or the end lies past the clip's duration.
    ///
    /// An empty range (`start == end`) is accepted here and produces zero
    /// frames; the encoder reports it as [`GifMakerError::EmptySequence`].
    pub fn new(
        metadata: &ClipMetadata,
        params: &TransformParameters,
    ) -> Result<Self, GifMakerError> {
        params.validate()?;

        let (start, end) = params.resolved_trim(metadata.duration);
        if start > end || end > metadata.duration + DURATION_TOLERANCE {
            return Err(GifMakerError::InvalidRange {
                start,
                end,
                duration: metadata.duration,
            });
        }
        let end = end.min(metadata.duration);

        let (width, height) = scaled_dimensions(metadata.width, metadata.height, params.scale);

        let plan = Self {
            width,
            height,
            start,
            end,
            speed: params.speed,
            frames_per_second: params.frames_per_second,
        };

        log::debug!(
            "Transform plan: {}x{} -> {}x{}, range {:.3}s..{:.3}s, speed {}, {} fps, {} frames",
            metadata.width,
            metadata.height,
            plan.width,
            plan.height,
            plan.start.as_secs_f64(),
            plan.end.as_secs_f64(),
            plan.speed,
            plan.frames_per_second,
            plan.frame_count(),
        );

        Ok(plan)
    }

    /// A one-frame plan showing the source at `timestamp`.
    pub(crate) fn single_frame(width: u32, height: u32, timestamp: Duration) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            start: timestamp,
            end: timestamp,
            speed: 1.0,
            frames_per_second: MIN_FRAMES_PER_SECOND,
        }
    }

    /// Output frame width after scaling.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output frame height after scaling.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Start of the export range on the source timeline.
    pub fn start(&self) -> Duration {
        self.start
    }

    /// End of the export range on the source timeline, never past the
    /// clip's duration.
    pub fn end(&self) -> Duration {
        self.end
    }

    /// Playback speed multiplier.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Output frame rate.
    pub fn frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    /// Duration of the output animation: `(end - start) / speed`.
    pub fn output_duration(&self) -> Duration {
        (self.end - self.start).div_f64(self.speed)
    }

    /// Number of frames the sampler will produce.
    pub fn frame_count(&self) -> u64 {
        sample_count(self.output_duration(), self.frames_per_second)
    }

    /// Source timestamp shown by output frame `index`.
    ///
    /// Output frame `i` sits at `i / fps` on the output timeline.
    pub fn source_timestamp(&self, index: u64) -> Duration {
        let output_seconds = index as f64 / self.frames_per_second as f64;
        self.start + Duration::from_secs_f64(output_seconds * self.speed)
    }

    /// Display metrics for this plan.
    pub fn metrics(&self) -> Metrics {
        Metrics {
            width: self.width,
            height: self.height,
            duration: self.output_duration(),
            frames_per_second: self.frames_per_second,
            total_frames: self.frame_count(),
        }
    }
}

/// What an export with given parameters will produce.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Metrics {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output animation length.
    pub duration: Duration,
    /// Output frame rate.
    pub frames_per_second: u32,
    /// Number of frames in the GIF.
    pub total_frames: u64,
}

/// Compute display metrics without decoding anything.
///
/// Frame totals use the target frame rate and the transformed duration,
/// so they match what [`export`](crate::export) produces.
///
/// # Errors
///
/// Same as [`TransformPlan::new`].
pub fn derive_metrics(
    metadata: &ClipMetadata,
    params: &TransformParameters,
) -> Result<Metrics, GifMakerError> {
    TransformPlan::new(metadata, params).map(|plan| plan.metrics())
}
