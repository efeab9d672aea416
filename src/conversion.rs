//! Timestamp and pixel-buffer helpers shared by the loader and sampler.

use std::time::Duration;

use ffmpeg_next::{Rational, frame::Video as VideoFrame};

/// Copy an RGB24 frame into a tightly packed `width * height * 3` buffer.
///
/// FFmpeg pads rows to its alignment, so the stride can exceed `width * 3`.
pub(crate) fn frame_to_rgb_buffer(video_frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = video_frame.data(0);

    if stride == row_bytes {
        return data[..row_bytes * (height as usize)].to_vec();
    }

    let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
    for row in 0..(height as usize) {
        let row_start = row * stride;
        buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
    }
    buffer
}

/// Convert a rational (frame rate or time base) to `f64`, or `None` when
/// the denominator is zero.
pub(crate) fn rational_to_f64(value: Rational) -> Option<f64> {
    if value.denominator() == 0 || value.numerator() == 0 {
        None
    } else {
        Some(value.numerator() as f64 / value.denominator() as f64)
    }
}

/// Rescale a PTS value from the stream time base to seconds.
///
/// A time base with a zero denominator maps every PTS to `0.0`.
pub(crate) fn pts_to_seconds(pts: i64, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    pts as f64 * time_base.numerator() as f64 / time_base.denominator() as f64
}

/// Container-level seek target in AV_TIME_BASE units (microseconds).
pub(crate) fn duration_to_seek_timestamp(duration: Duration) -> i64 {
    duration.as_micros() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pts_rescales_through_time_base() {
        let time_base = Rational::new(1, 90_000);
        assert!((pts_to_seconds(45_000, time_base) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn zero_denominator_time_base_is_finite() {
        let seconds = pts_to_seconds(150_000, Rational::new(1, 0));
        assert_eq!(seconds, 0.0);
        assert_eq!(Duration::try_from_secs_f64(seconds), Ok(Duration::ZERO));
    }

    #[test]
    fn zero_denominator_has_no_rate() {
        assert_eq!(rational_to_f64(Rational::new(30, 0)), None);
        assert_eq!(rational_to_f64(Rational::new(0, 1)), None);
        assert_eq!(rational_to_f64(Rational::new(30_000, 1_001)).map(|v| v.round()), Some(30.0));
    }

    #[test]
    fn seek_timestamp_is_microseconds() {
        assert_eq!(duration_to_seek_timestamp(Duration::from_millis(1_500)), 1_500_000);
    }
}
