//! Download file names that describe the export settings.

use std::path::Path;
use std::time::Duration;

use crate::parameters::TransformParameters;

/// Build the suggested file name for a GIF exported from `original_name`.
///
/// The stem is everything before the first `.` of the file name, followed
/// by the scale, frame rate, speed and source range:
///
/// ```
/// use std::time::Duration;
///
/// use gif_maker::{TransformParameters, output_file_name};
///
/// let params = TransformParameters::new()
///     .with_scale(0.5)
///     .with_speed(2.0)
///     .with_frames_per_second(30);
/// assert_eq!(
///     output_file_name("holiday.mp4", &params, Duration::from_secs(10)),
///     "holiday_scaling-0.5_fps-30_speed-2.0_duration-0-10.gif",
/// );
/// ```
///
/// Without a trim range the whole clip, `0` to `clip_duration`, is named.
pub fn output_file_name(
    original_name: &str,
    params: &TransformParameters,
    clip_duration: Duration,
) -> String {
    let file_name = Path::new(original_name)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(original_name);
    let stem = file_name.split('.').next().unwrap_or(file_name);

    let (start, end) = params.resolved_trim(clip_duration);
    let end = end.min(clip_duration);

    format!(
        "{stem}_scaling-{}_fps-{}_speed-{}_duration-{}-{}.gif",
        decimal(params.scale),
        params.frames_per_second,
        decimal(params.speed),
        seconds(start),
        seconds(end),
    )
}

/// Whole numbers keep one decimal place (`1.0`), others print as-is.
fn decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Whole seconds print without a fraction (`10`), others as decimals.
fn seconds(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{}", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_name_the_whole_clip() {
        let name = output_file_name(
            "clip.mp4",
            &TransformParameters::new(),
            Duration::from_secs(12),
        );
        assert_eq!(name, "clip_scaling-0.5_fps-30_speed-1.0_duration-0-12.gif");
    }

    #[test]
    fn stem_stops_at_first_dot() {
        let name = output_file_name(
            "my.holiday.video.mov",
            &TransformParameters::new().with_scale(1.0),
            Duration::from_secs(3),
        );
        assert!(name.starts_with("my_scaling-1.0_"), "{name}");
    }

    #[test]
    fn directories_are_dropped() {
        let name = output_file_name(
            "uploads/2024/cat.webm",
            &TransformParameters::new(),
            Duration::from_secs(1),
        );
        assert!(name.starts_with("cat_"), "{name}");
    }

    #[test]
    fn end_just_past_the_clip_names_the_clip_duration() {
        let params = TransformParameters::new()
            .with_trim(Duration::from_secs(8), Duration::from_micros(10_000_500));
        assert_eq!(
            output_file_name("clip.mp4", &params, Duration::from_secs(10)),
            "clip_scaling-0.5_fps-30_speed-1.0_duration-8-10.gif",
        );
    }

    #[test]
    fn fractional_values_are_kept() {
        let params = TransformParameters::new()
            .with_scale(0.25)
            .with_speed(1.5)
            .with_frames_per_second(12)
            .with_trim(Duration::from_millis(1_500), Duration::from_secs(4));
        assert_eq!(
            output_file_name("a.mp4", &params, Duration::from_secs(10)),
            "a_scaling-0.25_fps-12_speed-1.5_duration-1.5-4.gif",
        );
    }
}
