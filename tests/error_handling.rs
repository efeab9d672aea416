//! Error handling integration tests.
//!
//! Fixture-based tests require files from `tests/fixtures/generate_fixtures.sh`
//! and are skipped when those files are missing.

use std::{fs, path::Path, time::Duration};

use gif_maker::{
    CancellationToken, ExportOptions, GifMakerError, SourceClip, TransformParameters,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";
const AUDIO_ONLY: &str = "tests/fixtures/sample_audio_only.m4a";

fn entries(dir: &Path) -> usize {
    fs::read_dir(dir).expect("Failed to list temp dir").count()
}

#[test]
fn open_nonexistent_file() {
    let result = SourceClip::open("this_file_does_not_exist.mp4");
    match result {
        Err(GifMakerError::UnreadableMedia { reason }) => {
            assert!(
                reason.contains("this_file_does_not_exist.mp4"),
                "Reason should name the file: {reason}"
            );
        }
        other => panic!("Expected UnreadableMedia, got {other:?}"),
    }
}

#[test]
fn garbage_bytes_are_unreadable_and_leave_no_temp_file() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let options = ExportOptions::new().with_temp_dir(temporary_directory.path());

    let result = gif_maker::run_with_options(
        b"this is not a media file",
        &TransformParameters::new(),
        &options,
    );

    assert!(
        matches!(result, Err(GifMakerError::UnreadableMedia { .. })),
        "Expected UnreadableMedia, got {result:?}"
    );
    assert_eq!(entries(temporary_directory.path()), 0, "Spooled input was not removed");
}

#[test]
fn empty_bytes_are_unreadable() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let result = SourceClip::from_bytes_in(&[], temporary_directory.path());

    assert!(matches!(result, Err(GifMakerError::UnreadableMedia { .. })));
    assert_eq!(entries(temporary_directory.path()), 0);
}

#[test]
fn invalid_parameters_are_rejected_before_spooling() {
    let temporary_directory = tempfile::tempdir().expect("Failed to create temp dir");
    let options = ExportOptions::new().with_temp_dir(temporary_directory.path());

    let result = gif_maker::run_with_options(
        b"irrelevant",
        &TransformParameters::new().with_frames_per_second(5),
        &options,
    );

    assert!(matches!(
        result,
        Err(GifMakerError::InvalidParameter { name: "fps", .. })
    ));
    assert_eq!(entries(temporary_directory.path()), 0);
}

#[test]
fn cancelled_before_start() {
    let token = CancellationToken::new();
    token.cancel();
    let options = ExportOptions::new().with_cancellation(token);

    let result = gif_maker::run_with_options(b"irrelevant", &TransformParameters::new(), &options);
    assert!(matches!(result, Err(GifMakerError::Cancelled)));
}

#[test]
fn audio_only_input_has_no_video_track() {
    if !Path::new(AUDIO_ONLY).exists() {
        return;
    }

    match SourceClip::open(AUDIO_ONLY) {
        Err(GifMakerError::UnreadableMedia { reason }) => {
            assert!(reason.contains("no video track"), "Unexpected reason: {reason}");
        }
        other => panic!("Expected UnreadableMedia, got {other:?}"),
    }
}

#[test]
fn range_past_end_is_invalid() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let mut clip = SourceClip::open(SAMPLE_VIDEO).expect("Failed to open fixture");
    let params =
        TransformParameters::new().with_trim(Duration::ZERO, Duration::from_secs(3600));
    let result = gif_maker::export(&mut clip, &params, &ExportOptions::new());

    let error_message = result.expect_err("Expected an error").to_string();
    assert!(
        error_message.contains("Invalid range"),
        "Error should mention the range: {error_message}"
    );
}

#[test]
fn reversed_range_is_invalid() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let mut clip = SourceClip::open(SAMPLE_VIDEO).expect("Failed to open fixture");
    let params =
        TransformParameters::new().with_trim(Duration::from_secs(3), Duration::from_secs(1));
    let result = gif_maker::export(&mut clip, &params, &ExportOptions::new());
    assert!(matches!(result, Err(GifMakerError::InvalidRange { .. })));
}

#[test]
fn empty_range_is_an_empty_sequence() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let mut clip = SourceClip::open(SAMPLE_VIDEO).expect("Failed to open fixture");
    let params =
        TransformParameters::new().with_trim(Duration::from_secs(2), Duration::from_secs(2));
    let result = gif_maker::export(&mut clip, &params, &ExportOptions::new());

    let error = result.expect_err("Expected EmptySequence");
    assert!(matches!(error, GifMakerError::EmptySequence));
    assert!(error.to_string().contains("widen the export range"));
}

#[test]
fn preview_past_end_is_invalid_timestamp() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let mut clip = SourceClip::open(SAMPLE_VIDEO).expect("Failed to open fixture");
    let result = clip.preview_frame(0.5, Duration::from_secs(3600));
    assert!(matches!(result, Err(GifMakerError::InvalidTimestamp(_))));
}

#[test]
fn preview_rejects_bad_scale() {
    if !Path::new(SAMPLE_VIDEO).exists() {
        return;
    }

    let mut clip = SourceClip::open(SAMPLE_VIDEO).expect("Failed to open fixture");
    let result = clip.preview_frame(1.5, Duration::ZERO);
    assert!(matches!(
        result,
        Err(GifMakerError::InvalidParameter { name: "scale", .. })
    ));
}
