//! The GIF encoder stage.
//!
//! [`encode_gif`] turns an ordered sequence of RGB frames into a single
//! infinitely looping animated GIF held in memory. Frames are written in
//! input order, each as a full raster quantised to its own local palette:
//! no deduplication, no delta frames.
//!
//! # Example
//!
//! ```
//! use gif_maker::{GifOptions, encode_gif};
//! use image::{Rgb, RgbImage};
//!
//! let frames = (0..3u8).map(|shade| Ok(RgbImage::from_pixel(8, 8, Rgb([shade * 80, 0, 0]))));
//! let gif = encode_gif(frames, 10, &GifOptions::default())?;
//! assert_eq!(gif.frame_count(), 3);
//! # Ok::<(), gif_maker::GifMakerError>(())
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;

use gif::{Encoder, Frame, Repeat};
use image::RgbImage;

use crate::error::GifMakerError;

/// Encoder tuning that does not affect the frame contract.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct GifOptions {
    /// NeuQuant sampling speed, 1 (best quality) to 30 (fastest).
    pub quantizer_speed: i32,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self {
            quantizer_speed: 10,
        }
    }
}

impl GifOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the quantiser speed, clamped to `1..=30`.
    pub fn with_quantizer_speed(mut self, speed: i32) -> Self {
        self.quantizer_speed = speed.clamp(1, 30);
        self
    }
}

/// An encoded animated GIF.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct GifArtifact {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    frame_count: u64,
    frame_delay: u16,
}

impl GifArtifact {
    /// The encoded GIF file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the artifact, returning the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Encoded size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    /// Encoded size in MiB, rounded to one decimal place.
    pub fn size_megabytes(&self) -> f64 {
        (self.bytes.len() as f64 / (1024.0 * 1024.0) * 10.0).round() / 10.0
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of frames in the animation.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Delay between frames in hundredths of a second.
    pub fn frame_delay(&self) -> u16 {
        self.frame_delay
    }

    /// Write the GIF to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GifMakerError::Io`] if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), GifMakerError> {
        fs::write(path.as_ref(), &self.bytes)?;
        log::debug!("Saved {} byte GIF to {}", self.bytes.len(), path.as_ref().display());
        Ok(())
    }
}

/// Per-frame delay in hundredths of a second for `frames_per_second`.
///
/// GIF delays are whole centiseconds, so 30 fps plays back at 3/100 s.
pub fn frame_delay(frames_per_second: u32) -> u16 {
    ((100.0 / frames_per_second.max(1) as f64).round() as u16).max(1)
}

/// Encode frames into an infinitely looping animated GIF.
///
/// The first frame fixes the canvas size; every later frame must match it.
/// Frame errors from the input are returned as-is, so a failed or cancelled
/// sampler never yields a partial artifact.
///
/// # Errors
///
/// - [`GifMakerError::EmptySequence`] if `frames` yields nothing.
/// - [`GifMakerError::GifEncode`] if a dimension exceeds 65535, frame sizes
///   differ, or the encoder fails.
/// - Any error yielded by `frames`.
pub fn encode_gif<I>(
    frames: I,
    frames_per_second: u32,
    options: &GifOptions,
) -> Result<GifArtifact, GifMakerError>
where
    I: IntoIterator<Item = Result<RgbImage, GifMakerError>>,
{
    let mut frames = frames.into_iter();
    let first = frames.next().ok_or(GifMakerError::EmptySequence)??;

    let (width, height) = first.dimensions();
    let (canvas_width, canvas_height) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(GifMakerError::GifEncode(format!(
                "{width}x{height} exceeds the GIF limit of 65535 pixels per side"
            )));
        }
    };

    let delay = frame_delay(frames_per_second);
    let speed = options.quantizer_speed.clamp(1, 30);

    log::debug!(
        "Encoding GIF {width}x{height}, delay {delay}cs, quantizer speed {speed}"
    );

    let mut buffer = Vec::new();
    let mut frame_count = 0_u64;

    {
        let mut encoder = Encoder::new(&mut buffer, canvas_width, canvas_height, &[])?;
        encoder.set_repeat(Repeat::Infinite)?;

        write_frame(&mut encoder, &first, delay, speed)?;
        frame_count += 1;

        for image in frames {
            let image = image?;
            if image.dimensions() != (width, height) {
                return Err(GifMakerError::GifEncode(format!(
                    "frame {frame_count} is {}x{}, expected {width}x{height}",
                    image.width(),
                    image.height(),
                )));
            }
            write_frame(&mut encoder, &image, delay, speed)?;
            frame_count += 1;
        }
    }

    log::debug!("Encoded {frame_count} frames into {} bytes", buffer.len());

    Ok(GifArtifact {
        bytes: buffer,
        width,
        height,
        frame_count,
        frame_delay: delay,
    })
}

fn write_frame<W: Write>(
    encoder: &mut Encoder<W>,
    image: &RgbImage,
    delay: u16,
    speed: i32,
) -> Result<(), GifMakerError> {
    let mut frame = Frame::from_rgb_speed(
        image.width() as u16,
        image.height() as u16,
        image.as_raw(),
        speed,
    );
    frame.delay = delay;
    encoder.write_frame(&frame)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::Rgb;

    use super::*;

    fn solid(width: u32, height: u32, colour: [u8; 3]) -> Result<RgbImage, GifMakerError> {
        Ok(RgbImage::from_pixel(width, height, Rgb(colour)))
    }

    fn decoded_frames(bytes: &[u8]) -> (u16, u16, Vec<(u16, Vec<u8>)>) {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let mut decoder = options.read_info(Cursor::new(bytes)).unwrap();
        let (width, height) = (decoder.width(), decoder.height());

        let mut frames = Vec::new();
        while let Some(frame) = decoder.read_next_frame().unwrap() {
            frames.push((frame.delay, frame.buffer.to_vec()));
        }
        (width, height, frames)
    }

    #[test]
    fn empty_input_is_an_error() {
        let frames: Vec<Result<RgbImage, GifMakerError>> = Vec::new();
        assert!(matches!(
            encode_gif(frames, 30, &GifOptions::default()),
            Err(GifMakerError::EmptySequence)
        ));
    }

    #[test]
    fn frames_are_written_in_order_with_fps_delay() {
        let frames = vec![
            solid(6, 4, [255, 0, 0]),
            solid(6, 4, [0, 255, 0]),
            solid(6, 4, [0, 0, 255]),
        ];
        let artifact = encode_gif(frames, 20, &GifOptions::default()).unwrap();

        assert_eq!(artifact.frame_count(), 3);
        assert_eq!((artifact.width(), artifact.height()), (6, 4));
        assert_eq!(artifact.frame_delay(), 5);
        assert_eq!(artifact.size_bytes(), artifact.bytes().len());

        let (width, height, decoded) = decoded_frames(artifact.bytes());
        assert_eq!((width, height), (6, 4));
        assert_eq!(decoded.len(), 3);

        // Each frame is a full raster; check the dominant channel of its
        // first pixel.
        let dominant: Vec<usize> = decoded
            .iter()
            .map(|(delay, pixels)| {
                assert_eq!(*delay, 5);
                assert_eq!(pixels.len(), 6 * 4 * 4);
                (0..3).max_by_key(|&c| pixels[c]).unwrap()
            })
            .collect();
        assert_eq!(dominant, vec![0, 1, 2]);
    }

    #[test]
    fn identical_frames_are_not_deduplicated() {
        let frames = (0..4).map(|_| solid(3, 3, [10, 20, 30]));
        let artifact = encode_gif(frames, 10, &GifOptions::default()).unwrap();

        let (_, _, decoded) = decoded_frames(artifact.bytes());
        assert_eq!(decoded.len(), 4);
    }

    #[test]
    fn loops_forever() {
        let artifact = encode_gif(vec![solid(2, 2, [0, 0, 0])], 10, &GifOptions::default()).unwrap();
        let netscape_infinite: &[u8] = b"NETSCAPE2.0\x03\x01\x00\x00";
        assert!(
            artifact
                .bytes()
                .windows(netscape_infinite.len())
                .any(|window| window == netscape_infinite),
            "expected a NETSCAPE2.0 block with loop count 0"
        );
    }

    #[test]
    fn mismatched_frame_size_is_rejected() {
        let frames = vec![solid(4, 4, [0, 0, 0]), solid(5, 4, [0, 0, 0])];
        assert!(matches!(
            encode_gif(frames, 30, &GifOptions::default()),
            Err(GifMakerError::GifEncode(_))
        ));
    }

    #[test]
    fn input_errors_abort_without_artifact() {
        let frames = vec![solid(4, 4, [0, 0, 0]), Err(GifMakerError::Cancelled)];
        assert!(matches!(
            encode_gif(frames, 30, &GifOptions::default()),
            Err(GifMakerError::Cancelled)
        ));
    }

    #[test]
    fn encoding_is_deterministic() {
        let make = || (0..3u8).map(|i| solid(8, 8, [i * 60, 255 - i * 60, 7]));
        let first = encode_gif(make(), 15, &GifOptions::default()).unwrap();
        let second = encode_gif(make(), 15, &GifOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn delay_rounds_to_whole_centiseconds() {
        assert_eq!(frame_delay(10), 10);
        assert_eq!(frame_delay(30), 3);
        assert_eq!(frame_delay(60), 2);
        assert_eq!(frame_delay(0), 100);
    }

    #[test]
    fn quantizer_speed_is_clamped() {
        assert_eq!(GifOptions::new().with_quantizer_speed(0).quantizer_speed, 1);
        assert_eq!(GifOptions::new().with_quantizer_speed(99).quantizer_speed, 30);
    }
}
