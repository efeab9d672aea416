//! End-to-end export: load, transform, sample, encode.

use std::iter;

use crate::configuration::ExportOptions;
use crate::encoder::{GifArtifact, encode_gif};
use crate::error::GifMakerError;
use crate::parameters::TransformParameters;
use crate::progress::{PipelineStage, ProgressTracker};
use crate::source::SourceClip;
use crate::transform::TransformPlan;

/// Convert an uploaded video into an animated GIF.
///
/// Equivalent to [`run_with_options`] with default [`ExportOptions`].
///
/// # Example
///
/// ```no_run
/// use gif_maker::TransformParameters;
///
/// let bytes = std::fs::read("input.mp4")?;
/// let params = TransformParameters::new().with_scale(0.5).with_speed(2.0);
/// let gif = gif_maker::run(&bytes, &params)?;
/// gif.save("output.gif")?;
/// # Ok::<(), gif_maker::GifMakerError>(())
/// ```
///
/// # Errors
///
/// See [`run_with_options`].
pub fn run(
    video_bytes: &[u8],
    params: &TransformParameters,
) -> Result<GifArtifact, GifMakerError> {
    run_with_options(video_bytes, params, &ExportOptions::default())
}

/// Convert an uploaded video into an animated GIF.
///
/// The bytes are spooled to a temporary file for the duration of the call;
/// it is removed on every exit path.
///
/// # Errors
///
/// - [`GifMakerError::InvalidParameter`] for out-of-bounds parameters,
///   checked before anything is written to disk.
/// - [`GifMakerError::UnreadableMedia`] if the bytes are not a readable
///   video.
/// - [`GifMakerError::InvalidRange`] for a bad trim range.
/// - [`GifMakerError::EmptySequence`] if the range yields no frames.
/// - [`GifMakerError::Cancelled`] if the options' token was cancelled.
/// - Decode or encode failures.
pub fn run_with_options(
    video_bytes: &[u8],
    params: &TransformParameters,
    options: &ExportOptions,
) -> Result<GifArtifact, GifMakerError> {
    options.check_cancelled()?;
    params.validate()?;

    ProgressTracker::new(options.progress.clone(), PipelineStage::Loading, None, 1).report();

    let mut clip = match &options.temp_dir {
        Some(dir) => SourceClip::from_bytes_in(video_bytes, dir)?,
        None => SourceClip::from_bytes(video_bytes)?,
    };

    export(&mut clip, params, options)
}

/// Export an already opened clip.
///
/// The clip can be exported repeatedly; each call decodes from the plan's
/// start. Output is fully determined by the clip and `params`.
///
/// # Errors
///
/// Same as [`run_with_options`], minus loading failures.
pub fn export(
    clip: &mut SourceClip,
    params: &TransformParameters,
    options: &ExportOptions,
) -> Result<GifArtifact, GifMakerError> {
    options.check_cancelled()?;
    ProgressTracker::new(options.progress.clone(), PipelineStage::Transforming, None, 1).report();

    let plan = TransformPlan::new(clip.metadata(), params)?;
    let total = plan.frame_count();

    options.check_cancelled()?;

    let mut tracker = ProgressTracker::new(
        options.progress.clone(),
        PipelineStage::Rendering,
        Some(total),
        options.batch_size,
    );
    tracker.report();

    let mut sampler = clip.frames(&plan)?;
    let frames = iter::from_fn(|| {
        if let Err(error) = options.check_cancelled() {
            return Some(Err(error));
        }
        let frame = sampler.next()?;
        if frame.is_ok() {
            tracker.advance();
        }
        Some(frame)
    });

    let artifact = encode_gif(frames, plan.frames_per_second, &options.gif)?;
    tracker.report();

    log::info!(
        "Exported GIF: {}x{}, {} frames, {} bytes",
        artifact.width(),
        artifact.height(),
        artifact.frame_count(),
        artifact.size_bytes(),
    );

    Ok(artifact)
}
