//! The loader stage.
//!
//! [`SourceClip`] owns an opened FFmpeg demuxer for one video together with
//! its cached [`ClipMetadata`]. Uploaded bytes are spooled to a temporary
//! file first because the demuxer needs a path; the clip owns that file
//! and deletes it when dropped, whichever way the pipeline exits.

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use ffmpeg_next::{codec::context::Context as CodecContext, format::context::Input, media::Type};
use image::RgbImage;
use tempfile::NamedTempFile;

use crate::{
    conversion::{pts_to_seconds, rational_to_f64},
    error::GifMakerError,
    metadata::ClipMetadata,
    parameters::TransformParameters,
    sampler::FrameSampler,
    transform::{TransformPlan, scaled_dimensions},
    validation::{ValidationReport, validate_export, validate_metadata},
};

/// Temporary copy of uploaded bytes, removed on drop.
///
/// Removal failures are logged and swallowed so they never replace the
/// pipeline's own result.
struct SpooledInput {
    file: Option<NamedTempFile>,
    path: PathBuf,
}

impl SpooledInput {
    fn create(bytes: &[u8], dir: Option<&Path>) -> Result<Self, GifMakerError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("gif-maker-").suffix(".upload");

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(bytes)?;
        file.flush()?;

        let path = file.path().to_path_buf();
        log::debug!("Spooled {} bytes to {}", bytes.len(), path.display());

        Ok(Self {
            file: Some(file),
            path,
        })
    }
}

impl Drop for SpooledInput {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            match file.close() {
                Ok(()) => log::debug!("Removed spooled input {}", self.path.display()),
                Err(error) => log::warn!(
                    "Failed to remove spooled input {}: {error}",
                    self.path.display()
                ),
            }
        }
    }
}

/// A decodable video clip with cached metadata.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
///
/// use gif_maker::SourceClip;
///
/// let bytes = std::fs::read("input.mp4")?;
/// let mut clip = SourceClip::from_bytes(&bytes)?;
/// println!("{:?}", clip.metadata().duration);
///
/// let frame = clip.preview_frame(0.5, Duration::from_secs(1))?;
/// frame.save("preview.png")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SourceClip {
    /// The demuxer. Declared before `spool` so it closes before the file is
    /// removed.
    pub(crate) input_context: Input,
    pub(crate) metadata: ClipMetadata,
    pub(crate) video_stream_index: usize,
    path: PathBuf,
    spool: Option<SpooledInput>,
}

impl Debug for SourceClip {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SourceClip")
            .field("metadata", &self.metadata)
            .field("video_stream_index", &self.video_stream_index)
            .field("path", &self.path)
            .field("spooled", &self.spool.is_some())
            .finish_non_exhaustive()
    }
}

impl SourceClip {
    /// Open a video file in place.
    ///
    /// # Errors
    ///
    /// Returns [`GifMakerError::UnreadableMedia`] if the file cannot be
    /// demuxed or has no usable video track.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GifMakerError> {
        Self::open_path(path.as_ref(), None)
    }

    /// Load a clip from uploaded bytes, spooling them to the system
    /// temporary directory.
    ///
    /// # Errors
    ///
    /// - [`GifMakerError::UnreadableMedia`] if the bytes are empty, not a
    ///   supported container, or contain no video track.
    /// - [`GifMakerError::Io`] if the temporary file cannot be written.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, GifMakerError> {
        Self::spool_and_open(bytes, None)
    }

    /// Like [`from_bytes`](SourceClip::from_bytes), spooling into `dir`.
    pub fn from_bytes_in<P: AsRef<Path>>(bytes: &[u8], dir: P) -> Result<Self, GifMakerError> {
        Self::spool_and_open(bytes, Some(dir.as_ref()))
    }

    fn spool_and_open(bytes: &[u8], dir: Option<&Path>) -> Result<Self, GifMakerError> {
        if bytes.is_empty() {
            return Err(GifMakerError::UnreadableMedia {
                reason: "input is empty".to_string(),
            });
        }

        let spool = SpooledInput::create(bytes, dir)?;
        let path = spool.path.clone();
        // On failure `spool` is dropped here and the file removed.
        Self::open_path(&path, Some(spool))
    }

    fn open_path(path: &Path, spool: Option<SpooledInput>) -> Result<Self, GifMakerError> {
        log::debug!("Opening clip: {}", path.display());

        ffmpeg_next::init()?;

        let unreadable = |reason: String| GifMakerError::UnreadableMedia { reason };

        let input_context = ffmpeg_next::format::input(&path)
            .map_err(|error| unreadable(format!("{}: {error}", path.display())))?;

        let stream = input_context
            .streams()
            .best(Type::Video)
            .ok_or_else(|| unreadable("no video track found".to_string()))?;
        let video_stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters())
            .map_err(|error| unreadable(format!("unreadable video codec parameters: {error}")))?;
        let decoder = decoder_context
            .decoder()
            .video()
            .map_err(|error| unreadable(format!("no decoder for video track: {error}")))?;

        let width = decoder.width();
        let height = decoder.height();
        if width == 0 || height == 0 {
            return Err(unreadable(format!("video track has invalid size {width}x{height}")));
        }

        let frames_per_second = rational_to_f64(stream.avg_frame_rate())
            .or_else(|| rational_to_f64(stream.rate()))
            .unwrap_or(0.0);

        // Container duration first; some muxers only record it per stream.
        let container_duration = input_context.duration();
        let duration = if container_duration > 0 {
            Duration::from_micros(container_duration as u64)
        } else if stream.duration() > 0 {
            Duration::try_from_secs_f64(pts_to_seconds(stream.duration(), stream.time_base()))
                .unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        };

        let frame_count = (duration.as_secs_f64() * frames_per_second) as u64;

        let codec = decoder
            .codec()
            .map(|codec| codec.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let format = input_context.format().name().to_string();

        let metadata = ClipMetadata {
            width,
            height,
            duration,
            frames_per_second,
            frame_count,
            codec,
            format,
        };

        log::info!(
            "Opened clip: {} ({}x{}, {:.2} fps, {:.2}s, codec={}, format={})",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.frames_per_second,
            metadata.duration.as_secs_f64(),
            metadata.codec,
            metadata.format,
        );

        Ok(Self {
            input_context,
            metadata,
            video_stream_index,
            path: path.to_path_buf(),
            spool,
        })
    }

    /// Cached metadata of the untrimmed source.
    pub fn metadata(&self) -> &ClipMetadata {
        &self.metadata
    }

    /// Path the demuxer reads from (the temporary copy for uploaded bytes).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inspect the clip for problems that affect GIF export.
    pub fn validate(&self) -> ValidationReport {
        validate_metadata(&self.metadata)
    }

    /// Inspect the clip together with a set of export parameters.
    pub fn validate_export(&self, params: &TransformParameters) -> ValidationReport {
        validate_export(&self.metadata, params)
    }

    /// Lazily sample the frames described by `plan`.
    ///
    /// # Errors
    ///
    /// Returns an FFmpeg error if the decoder or scaler cannot be created.
    pub fn frames(&mut self, plan: &TransformPlan) -> Result<FrameSampler<'_>, GifMakerError> {
        let total = plan.frame_count();
        FrameSampler::new(self, plan.clone(), total)
    }

    /// Render a single frame at `timestamp`, scaled by `scale`.
    ///
    /// # Errors
    ///
    /// - [`GifMakerError::InvalidParameter`] if `scale` is not in `(0, 1]`.
    /// - [`GifMakerError::InvalidTimestamp`] if `timestamp` is past the end.
    /// - [`GifMakerError::VideoDecode`] if no frame can be decoded.
    pub fn preview_frame(
        &mut self,
        scale: f64,
        timestamp: Duration,
    ) -> Result<RgbImage, GifMakerError> {
        TransformParameters::new().with_scale(scale).validate()?;

        if timestamp > self.metadata.duration {
            return Err(GifMakerError::InvalidTimestamp(timestamp));
        }

        let (width, height) = scaled_dimensions(self.metadata.width, self.metadata.height, scale);
        let plan = TransformPlan::single_frame(width, height, timestamp);

        FrameSampler::new(self, plan, 1)?
            .next()
            .unwrap_or_else(|| {
                Err(GifMakerError::VideoDecode(format!(
                    "no frame decoded at {timestamp:?}"
                )))
            })
    }
}
