//! The frame sampler stage.
//!
//! [`FrameSampler`] walks a [`TransformPlan`] and yields one scaled RGB
//! frame per output tick. For output frame `i` it shows the latest decoded
//! source frame whose timestamp is at or before `start + i / fps * speed`,
//! decoding forward only as far as each sample needs. Frames are never
//! buffered beyond the one being shown and the one after it.
//!
//! Before the first decoded frame (a trim start inside the first frame's
//! interval) the first frame is used; past the last decoded frame the last
//! frame repeats.
//!
//! # Example
//!
//! ```no_run
//! use gif_maker::{SourceClip, TransformParameters, TransformPlan};
//!
//! let mut clip = SourceClip::open("input.mp4")?;
//! let plan = TransformPlan::new(clip.metadata(), &TransformParameters::new())?;
//!
//! for (index, frame) in clip.frames(&plan)?.enumerate() {
//!     frame?.save(format!("frame_{index:04}.png"))?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use image::RgbImage;

use crate::conversion::{duration_to_seek_timestamp, frame_to_rgb_buffer, pts_to_seconds};
use crate::error::GifMakerError;
use crate::source::SourceClip;
use crate::transform::TransformPlan;

/// Sample times are nudged forward by this much so a frame stamped exactly
/// on a tick is not lost to float error.
const TIMESTAMP_EPSILON: f64 = 1e-6;

/// Consecutive unreadable packets tolerated before treating the input as
/// ended.
const MAX_READ_ERRORS: u32 = 64;

/// Nearest-previous frame selection over a forward-only frame source.
///
/// `held` is the frame currently shown; `ahead` is the next decoded frame,
/// not yet due.
#[derive(Debug)]
struct FrameCursor<T> {
    held: Option<(f64, T)>,
    ahead: Option<(f64, T)>,
    exhausted: bool,
}

impl<T: Clone> FrameCursor<T> {
    fn new() -> Self {
        Self {
            held: None,
            ahead: None,
            exhausted: false,
        }
    }

    /// Move forward to `target` seconds and return the frame to show.
    ///
    /// Returns `Ok(None)` only if the source never produced a frame.
    fn advance_to<F>(&mut self, target: f64, mut fetch: F) -> Result<Option<T>, GifMakerError>
    where
        F: FnMut() -> Result<Option<(f64, T)>, GifMakerError>,
    {
        loop {
            match self.ahead.as_ref().map(|(seconds, _)| *seconds <= target) {
                Some(true) => self.held = self.ahead.take(),
                Some(false) => break,
                None if self.exhausted => break,
                None => {
                    self.ahead = fetch()?;
                    if self.ahead.is_none() {
                        self.exhausted = true;
                    }
                }
            }
        }

        Ok(self
            .held
            .as_ref()
            .or(self.ahead.as_ref())
            .map(|(_, frame)| frame.clone()))
    }
}

/// A lazy iterator over the output frames of a [`TransformPlan`].
///
/// Yields exactly [`TransformPlan::frame_count`] frames of the plan's
/// dimensions unless an error occurs; after an error it yields nothing.
/// Borrows the [`SourceClip`] mutably for its lifetime.
///
/// Created via [`SourceClip::frames`].
pub struct FrameSampler<'a> {
    clip: &'a mut SourceClip,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    plan: TransformPlan,
    total: u64,
    next_index: u64,
    time_base: Rational,
    start_offset: i64,
    cursor: FrameCursor<RgbImage>,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    last_seconds: f64,
    eof_sent: bool,
    done: bool,
}

impl<'a> FrameSampler<'a> {
    /// Create a sampler yielding `total` frames of `plan`.
    ///
    /// Seeks to the nearest keyframe at or before `plan.start` and decodes
    /// forward from there.
    pub(crate) fn new(
        clip: &'a mut SourceClip,
        plan: TransformPlan,
        total: u64,
    ) -> Result<Self, GifMakerError> {
        let stream = clip
            .input_context
            .stream(clip.video_stream_index)
            .ok_or_else(|| GifMakerError::UnreadableMedia {
                reason: "video track disappeared".to_string(),
            })?;
        let time_base = stream.time_base();
        let start_offset = match stream.start_time() {
            // AV_NOPTS_VALUE
            i64::MIN => 0,
            offset => offset,
        };
        let decoder_context = CodecContext::from_parameters(stream.parameters())?;
        let decoder = decoder_context.decoder().video()?;

        let scaler = ScalingContext::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            Pixel::RGB24,
            plan.width,
            plan.height,
            ScalingFlags::BILINEAR,
        )?;

        let seek_timestamp = duration_to_seek_timestamp(plan.start);
        if let Err(error) = clip.input_context.seek(seek_timestamp, ..seek_timestamp) {
            log::debug!("Seek to {:?} failed, decoding from current position: {error}", plan.start);
        }

        log::debug!(
            "Sampling {total} frames at {}x{} from {:.3}s",
            plan.width,
            plan.height,
            plan.start.as_secs_f64(),
        );

        Ok(Self {
            clip,
            decoder,
            scaler,
            plan,
            total,
            next_index: 0,
            time_base,
            start_offset,
            cursor: FrameCursor::new(),
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            last_seconds: 0.0,
            eof_sent: false,
            done: false,
        })
    }

    /// Decode the next source frame, scaled to the plan's dimensions.
    ///
    /// Returns `Ok(None)` once the decoder is drained.
    fn decode_next(&mut self) -> Result<Option<(f64, RgbImage)>, GifMakerError> {
        let mut read_errors = 0;

        loop {
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                let seconds = match self.decoded_frame.timestamp() {
                    Some(pts) => pts_to_seconds(pts - self.start_offset, self.time_base),
                    None => self.last_seconds,
                };
                self.last_seconds = seconds;

                self.scaler.run(&self.decoded_frame, &mut self.scaled_frame)?;
                let buffer =
                    frame_to_rgb_buffer(&self.scaled_frame, self.plan.width, self.plan.height);
                let image = RgbImage::from_raw(self.plan.width, self.plan.height, buffer)
                    .ok_or_else(|| {
                        GifMakerError::VideoDecode(
                            "Failed to construct RGB image from decoded frame data".to_string(),
                        )
                    })?;

                return Ok(Some((seconds, image)));
            }

            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = Packet::empty();
            match packet.read(&mut self.clip.input_context) {
                Ok(()) => {
                    read_errors = 0;
                    if packet.stream() == self.clip.video_stream_index {
                        if let Err(error) = self.decoder.send_packet(&packet) {
                            log::warn!("Skipping undecodable video packet: {error}");
                        }
                    }
                }
                Err(FfmpegError::Eof) => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
                Err(error) => {
                    read_errors += 1;
                    log::debug!("Packet read failed: {error}");
                    if read_errors >= MAX_READ_ERRORS {
                        log::warn!("Too many read errors, treating input as ended");
                        self.decoder.send_eof()?;
                        self.eof_sent = true;
                    }
                }
            }
        }
    }

    fn sample(&mut self, index: u64) -> Result<RgbImage, GifMakerError> {
        let target = self.plan.source_timestamp(index).as_secs_f64() + TIMESTAMP_EPSILON;

        // The cursor is moved out so `decode_next` can borrow `self`.
        let mut cursor = std::mem::replace(&mut self.cursor, FrameCursor::new());
        let frame = cursor.advance_to(target, || self.decode_next());
        self.cursor = cursor;

        frame?.ok_or_else(|| {
            GifMakerError::VideoDecode("no frames could be decoded from the video track".to_string())
        })
    }
}

impl Iterator for FrameSampler<'_> {
    type Item = Result<RgbImage, GifMakerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.next_index >= self.total {
            return None;
        }

        match self.sample(self.next_index) {
            Ok(image) => {
                self.next_index += 1;
                Some(Ok(image))
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let remaining = self.total.saturating_sub(self.next_index) as usize;
        (0, Some(remaining))
    }
}
