//! Pre-flight checks for GIF export.
//!
//! [`SourceClip::validate`](crate::SourceClip::validate) inspects a clip's
//! metadata, and [`SourceClip::validate_export`](crate::SourceClip::validate_export)
//! additionally checks a set of [`TransformParameters`] against it. Both
//! return a [`ValidationReport`] instead of failing, so callers can show
//! every problem at once.
//!
//! # Example
//!
//! ```no_run
//! use gif_maker::{SourceClip, TransformParameters};
//!
//! let clip = SourceClip::open("input.mp4")?;
//! let report = clip.validate_export(&TransformParameters::new().with_speed(2.0));
//! if !report.is_valid() {
//!     eprint!("{report}");
//! }
//! # Ok::<(), gif_maker::GifMakerError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;

use crate::metadata::ClipMetadata;
use crate::parameters::TransformParameters;
use crate::transform::TransformPlan;

/// Largest width or height a GIF can describe.
const GIF_MAX_SIDE: u32 = u16::MAX as u32;

/// Frame totals above this make large, slow GIFs.
const LARGE_FRAME_COUNT: u64 = 1_000;

/// Summary of validation.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Issues that degrade the output but do not prevent export.
    pub warnings: Vec<String>,
    /// Issues that will make export fail.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found. Warnings are ignored.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of entries (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Check clip metadata on its own.
pub(crate) fn validate_metadata(metadata: &ClipMetadata) -> ValidationReport {
    let mut report = ValidationReport::default();

    if metadata.width == 0 || metadata.height == 0 {
        report.errors.push(format!(
            "Invalid video dimensions: {}x{}",
            metadata.width, metadata.height,
        ));
    }

    if metadata.duration == Duration::ZERO {
        report
            .warnings
            .push("Clip duration is zero; every export range will be empty".to_string());
    }

    if metadata.frames_per_second <= 0.0 {
        report
            .warnings
            .push("Source frame rate is unknown; frame timing comes from timestamps only".to_string());
    } else if metadata.frames_per_second > 240.0 {
        report.warnings.push(format!(
            "Unusually high frame rate ({:.1} fps); sampling may be slow",
            metadata.frames_per_second,
        ));
    }

    if metadata.width > GIF_MAX_SIDE || metadata.height > GIF_MAX_SIDE {
        report.warnings.push(format!(
            "Source is {}x{}; scale it below {GIF_MAX_SIDE} pixels per side for GIF export",
            metadata.width, metadata.height,
        ));
    }

    report.info.push(format!(
        "Video: {} in {} {}x{} @ {:.2} fps, {:.2}s, ~{} frames",
        metadata.codec,
        metadata.format,
        metadata.width,
        metadata.height,
        metadata.frames_per_second,
        metadata.duration.as_secs_f64(),
        metadata.frame_count,
    ));

    report
}

/// Check clip metadata together with export parameters.
pub(crate) fn validate_export(
    metadata: &ClipMetadata,
    params: &TransformParameters,
) -> ValidationReport {
    let mut report = validate_metadata(metadata);

    let plan = match TransformPlan::new(metadata, params) {
        Ok(plan) => plan,
        Err(error) => {
            report.errors.push(error.to_string());
            return report;
        }
    };

    let total_frames = plan.frame_count();
    if total_frames == 0 {
        report.errors.push(
            "Export range yields no frames; widen the range or reduce speed".to_string(),
        );
    } else if total_frames > LARGE_FRAME_COUNT {
        report.warnings.push(format!(
            "{total_frames} frames will produce a large GIF; consider trimming or lowering fps",
        ));
    }

    if plan.width > GIF_MAX_SIDE || plan.height > GIF_MAX_SIDE {
        report.errors.push(format!(
            "Output {}x{} exceeds the GIF limit of {GIF_MAX_SIDE} pixels per side",
            plan.width, plan.height,
        ));
    }

    let effective_source_rate = plan.frames_per_second as f64 / plan.speed;
    if metadata.frames_per_second > 0.0 && effective_source_rate > metadata.frames_per_second {
        report.info.push(format!(
            "Output samples the source at {effective_source_rate:.1} fps, above its {:.1} fps; frames will repeat",
            metadata.frames_per_second,
        ));
    }

    report.info.push(format!(
        "Output: {}x{} @ {} fps, {:.2}s, {total_frames} frames",
        plan.width,
        plan.height,
        plan.frames_per_second,
        plan.output_duration().as_secs_f64(),
    ));

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(width: u32, height: u32, duration: Duration, fps: f64) -> ClipMetadata {
        ClipMetadata {
            width,
            height,
            duration,
            frames_per_second: fps,
            frame_count: (duration.as_secs_f64() * fps) as u64,
            codec: "h264".to_string(),
            format: "mov,mp4,m4a,3gp,3g2,mj2".to_string(),
        }
    }

    #[test]
    fn healthy_clip_has_only_info() {
        let report = validate_metadata(&clip(640, 480, Duration::from_secs(5), 30.0));
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
        assert_eq!(report.info.len(), 1);
        assert!(report.info[0].contains("640x480"));
    }

    #[test]
    fn zero_dimensions_are_errors() {
        let report = validate_metadata(&clip(0, 480, Duration::from_secs(5), 30.0));
        assert!(!report.is_valid());
    }

    #[test]
    fn zero_duration_and_rate_are_warnings() {
        let report = validate_metadata(&clip(640, 480, Duration::ZERO, 0.0));
        assert!(report.is_valid());
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn oversized_source_warns() {
        let report = validate_metadata(&clip(70_000, 480, Duration::from_secs(1), 30.0));
        assert!(report.warnings.iter().any(|w| w.contains("65535")));
    }

    #[test]
    fn export_with_bad_range_is_invalid() {
        let metadata = clip(640, 480, Duration::from_secs(5), 30.0);
        let params =
            TransformParameters::new().with_trim(Duration::from_secs(2), Duration::from_secs(9));
        let report = validate_export(&metadata, &params);
        assert!(!report.is_valid());
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn export_with_no_frames_is_invalid() {
        let metadata = clip(640, 480, Duration::from_secs(5), 30.0);
        let params =
            TransformParameters::new().with_trim(Duration::from_secs(1), Duration::from_secs(1));
        let report = validate_export(&metadata, &params);
        assert!(report.errors.iter().any(|e| e.contains("no frames")));
    }

    #[test]
    fn long_exports_warn_about_size() {
        let metadata = clip(640, 480, Duration::from_secs(60), 30.0);
        let params = TransformParameters::new().with_frames_per_second(30);
        let report = validate_export(&metadata, &params);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.contains("1800 frames")));
    }

    #[test]
    fn slow_motion_notes_repeated_frames() {
        let metadata = clip(640, 480, Duration::from_secs(5), 24.0);
        let params = TransformParameters::new()
            .with_speed(0.5)
            .with_frames_per_second(30);
        let report = validate_export(&metadata, &params);
        assert!(report.info.iter().any(|i| i.contains("frames will repeat")));
    }

    #[test]
    fn display_lists_every_entry() {
        let mut report = ValidationReport::default();
        assert_eq!(report.to_string(), "No issues found.\n");

        report.warnings.push("w".to_string());
        report.errors.push("e".to_string());
        assert_eq!(report.to_string(), "[WARN] w\n[ERROR] e\n");
        assert_eq!(report.issue_count(), 2);
    }
}
