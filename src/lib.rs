//! # gif-maker
//!
//! Turn short video clips into looping animated GIFs.
//!
//! A conversion runs four stages in order:
//!
//! 1. **Load**: [`SourceClip`] opens the video with FFmpeg (uploaded bytes
//!    are spooled to a temporary file that is removed afterwards) and reads
//!    its [`ClipMetadata`].
//! 2. **Transform**: [`TransformPlan`] applies a uniform scale, a trim range
//!    and a speed multiplier, and fixes the output frame rate.
//! 3. **Sample**: [`FrameSampler`] decodes forward and picks, for every
//!    output tick, the latest source frame at or before it.
//! 4. **Encode**: [`encode_gif`] quantises each frame to its own palette
//!    and writes an infinitely looping GIF into memory.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use gif_maker::TransformParameters;
//!
//! let bytes = std::fs::read("input.mp4")?;
//! let params = TransformParameters::new()
//!     .with_scale(0.5)
//!     .with_speed(1.5)
//!     .with_trim(Duration::from_secs(2), Duration::from_secs(6))
//!     .with_frames_per_second(15);
//!
//! let gif = gif_maker::run(&bytes, &params)?;
//! println!("{} frames, {} MB", gif.frame_count(), gif.size_megabytes());
//! gif.save("output.gif")?;
//! # Ok::<(), gif_maker::GifMakerError>(())
//! ```
//!
//! ## Metrics Before Encoding
//!
//! ```no_run
//! use gif_maker::{SourceClip, TransformParameters, derive_metrics};
//!
//! let clip = SourceClip::open("input.mp4")?;
//! let metrics = derive_metrics(clip.metadata(), &TransformParameters::new())?;
//! println!("{}x{}, {} frames", metrics.width, metrics.height, metrics.total_frames);
//! # Ok::<(), gif_maker::GifMakerError>(())
//! ```
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | [`run_in_background`] runs the pipeline on Tokio's blocking pool |
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the system.

#[cfg(feature = "async")]
pub mod background;
pub mod configuration;
mod conversion;
pub mod encoder;
pub mod error;
pub mod ffmpeg;
pub mod metadata;
pub mod naming;
pub mod parameters;
pub mod pipeline;
pub mod progress;
pub mod sampler;
pub mod source;
pub mod transform;
pub mod validation;

#[cfg(feature = "async")]
pub use background::{GifFuture, run_in_background};
pub use configuration::ExportOptions;
pub use encoder::{GifArtifact, GifOptions, encode_gif, frame_delay};
pub use error::GifMakerError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use metadata::ClipMetadata;
pub use naming::output_file_name;
pub use parameters::{
    MAX_FRAMES_PER_SECOND, MAX_SPEED, MIN_FRAMES_PER_SECOND, TransformParameters,
};
pub use pipeline::{export, run, run_with_options};
pub use progress::{CancellationToken, PipelineStage, ProgressCallback, ProgressInfo};
pub use sampler::FrameSampler;
pub use source::SourceClip;
pub use transform::{Metrics, TransformPlan, derive_metrics, sample_count, scaled_dimensions};
pub use validation::ValidationReport;
