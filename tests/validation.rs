//! Validation integration tests.
//!
//! Tests require fixture files from `tests/fixtures/generate_fixtures.sh`.

use std::path::Path;
use std::time::Duration;

use gif_maker::{SourceClip, TransformParameters};

fn sample_video_path() -> &'static str {
    "tests/fixtures/sample_video.mp4"
}

#[test]
fn validate_normal_video() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let clip = SourceClip::open(path).expect("Failed to open fixture");
    let report = clip.validate();

    assert!(report.is_valid(), "Normal video should be valid: {report}");
    assert!(report.warnings.is_empty(), "No warnings expected: {report}");
    assert!(
        report.info.iter().any(|line| line.contains("640x480")),
        "Info should describe the video: {report}"
    );
}

#[test]
fn validate_default_export() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let clip = SourceClip::open(path).expect("Failed to open fixture");
    let report = clip.validate_export(&TransformParameters::new());

    assert!(report.is_valid(), "Default export should be valid: {report}");
    assert!(report.info.iter().any(|line| line.contains("Output: 320x240")));
}

#[test]
fn validate_export_reports_bad_range() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let clip = SourceClip::open(path).expect("Failed to open fixture");
    let params =
        TransformParameters::new().with_trim(Duration::from_secs(4), Duration::from_secs(60));
    let report = clip.validate_export(&params);

    assert!(!report.is_valid());
    assert!(report.to_string().contains("[ERROR] Invalid range"));
}

#[test]
fn validate_export_reports_bad_parameters() {
    let path = sample_video_path();
    if !Path::new(path).exists() {
        return;
    }

    let clip = SourceClip::open(path).expect("Failed to open fixture");
    let report = clip.validate_export(&TransformParameters::new().with_speed(50.0));

    assert!(!report.is_valid());
    assert!(report.errors[0].contains("speed"));
}
