//! Error types for the `gif-maker` crate.
//!
//! [`GifMakerError`] is returned by every fallible operation. The three
//! pipeline failures a user can act on are [`UnreadableMedia`],
//! [`InvalidRange`] and [`EmptySequence`]; the remaining variants wrap
//! upstream FFmpeg, image and I/O failures.
//!
//! [`UnreadableMedia`]: GifMakerError::UnreadableMedia
//! [`InvalidRange`]: GifMakerError::InvalidRange
//! [`EmptySequence`]: GifMakerError::EmptySequence

use std::{io::Error as IoError, time::Duration};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `gif-maker` operations.
///
/// None of these conditions are transient, so nothing in the crate retries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GifMakerError {
    /// The input is not a decodable container, or it has no video track.
    #[error("Unreadable media: {reason}")]
    UnreadableMedia {
        /// Why the media could not be used.
        reason: String,
    },

    /// The trim range is reversed or extends past the clip's duration.
    #[error(
        "Invalid range: {start:?}..{end:?} must satisfy start <= end <= clip duration ({duration:?})"
    )]
    InvalidRange {
        /// Requested start of the export range.
        start: Duration,
        /// Requested end of the export range.
        end: Duration,
        /// Duration of the untrimmed source clip.
        duration: Duration,
    },

    /// The transformed clip yields no frames at the chosen frame rate.
    #[error("No frames to encode: widen the export range or reduce speed")]
    EmptySequence,

    /// A transform parameter is outside its allowed bounds.
    #[error("Invalid {name} ({value}): {reason}")]
    InvalidParameter {
        /// Parameter name as presented to the user.
        name: &'static str,
        /// The rejected value, formatted.
        value: String,
        /// The bound that was violated.
        reason: &'static str,
    },

    /// A preview timestamp lies beyond the end of the clip.
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(Duration),

    /// A video frame could not be decoded or converted.
    #[error("Failed to decode video frame: {0}")]
    VideoDecode(String),

    /// The GIF encoder rejected the frame sequence.
    #[error("GIF encoding error: {0}")]
    GifEncode(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An I/O error while spooling input or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// An error from the `image` crate.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),

    /// The run was stopped through a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,
}

impl From<FfmpegError> for GifMakerError {
    fn from(error: FfmpegError) -> Self {
        GifMakerError::Ffmpeg(error.to_string())
    }
}

impl From<gif::EncodingError> for GifMakerError {
    fn from(error: gif::EncodingError) -> Self {
        GifMakerError::GifEncode(error.to_string())
    }
}
