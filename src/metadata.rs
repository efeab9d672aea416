//! Clip metadata.
//!
//! [`ClipMetadata`] is read once when a [`SourceClip`](crate::SourceClip) is
//! opened and cached for the clip's lifetime. It describes the untrimmed,
//! unscaled source; the post-transform view lives in
//! [`Metrics`](crate::Metrics).

use std::time::Duration;

/// Metadata for the video track of a loaded clip.
///
/// # Example
///
/// ```no_run
/// use gif_maker::SourceClip;
///
/// let clip = SourceClip::open("input.mp4")?;
/// let metadata = clip.metadata();
/// println!("{}x{} @ {:.2} fps", metadata.width, metadata.height, metadata.frames_per_second);
/// # Ok::<(), gif_maker::GifMakerError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ClipMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Duration of the whole clip.
    pub duration: Duration,
    /// Native frame rate (approximate for variable-frame-rate sources).
    pub frames_per_second: f64,
    /// Estimated native frame count, `duration * frames_per_second`.
    pub frame_count: u64,
    /// Video codec name (e.g. `"h264"`).
    pub codec: String,
    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`).
    pub format: String,
}
