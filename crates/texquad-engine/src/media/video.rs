use std::io::Cursor;
use std::time::Duration;

use image::codecs::gif::GifDecoder;
use image::codecs::png::PngDecoder;
use image::codecs::webp::WebPDecoder;
use image::{AnimationDecoder, Frame, ImageFormat, RgbaImage};

use super::PixelSource;

/// Delay used for frames that declare none; browsers do the same.
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

/// A decoded animated image treated as a video clip.
///
/// Frames are fully composited canvases with their start time on the clip's
/// timeline.
#[derive(Debug, Clone)]
pub struct VideoClip {
    frames: Vec<TimedFrame>,
    duration: Duration,
}

#[derive(Debug, Clone)]
struct TimedFrame {
    start: Duration,
    pixels: RgbaImage,
}

/// One frame extracted from a [`VideoClip`].
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Start of the frame on the clip timeline.
    pub timestamp: Duration,
    pixels: RgbaImage,
}

impl VideoClip {
    /// Decodes GIF, APNG or animated WebP. Any other image decodes as a
    /// single-frame clip.
    pub fn decode(bytes: &[u8]) -> image::ImageResult<Self> {
        let format = image::guess_format(bytes)?;
        let frames = match format {
            ImageFormat::Gif => GifDecoder::new(Cursor::new(bytes))?
                .into_frames()
                .collect_frames()?,
            ImageFormat::Png => {
                let decoder = PngDecoder::new(Cursor::new(bytes))?;
                if !decoder.is_apng()? {
                    return Self::decode_still(bytes, format);
                }
                decoder.apng()?.into_frames().collect_frames()?
            }
            ImageFormat::WebP => {
                let decoder = WebPDecoder::new(Cursor::new(bytes))?;
                if !decoder.has_animation() {
                    return Self::decode_still(bytes, format);
                }
                decoder.into_frames().collect_frames()?
            }
            _ => return Self::decode_still(bytes, format),
        };
        Ok(Self::from_frames(frames))
    }

    fn decode_still(bytes: &[u8], format: ImageFormat) -> image::ImageResult<Self> {
        let decoded = image::load_from_memory_with_format(bytes, format)?;
        Ok(Self::single(decoded.to_rgba8()))
    }

    /// A clip holding one frame forever.
    pub fn single(pixels: RgbaImage) -> Self {
        Self {
            frames: vec![TimedFrame {
                start: Duration::ZERO,
                pixels,
            }],
            duration: DEFAULT_FRAME_DELAY,
        }
    }

    /// Lays `frames` out back to back using their delays.
    pub fn from_frames(frames: Vec<Frame>) -> Self {
        let mut start = Duration::ZERO;
        let frames: Vec<TimedFrame> = frames
            .into_iter()
            .map(|frame| {
                let delay = Duration::from(frame.delay());
                let delay = if delay.is_zero() { DEFAULT_FRAME_DELAY } else { delay };
                let timed = TimedFrame {
                    start,
                    pixels: frame.into_buffer(),
                };
                start += delay;
                timed
            })
            .collect();

        Self {
            frames,
            duration: start,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Index of the frame showing at playback time `t`.
    ///
    /// Times past the end hold the last frame; no looping.
    pub fn frame_index_at(&self, t: Duration) -> Option<usize> {
        if self.frames.is_empty() {
            return None;
        }
        let after = self.frames.partition_point(|frame| frame.start <= t);
        Some(after.saturating_sub(1))
    }

    /// Extracts the frame showing at `t`, consuming the clip.
    pub fn into_frame_at(mut self, t: Duration) -> Option<VideoFrame> {
        let index = self.frame_index_at(t)?;
        let frame = self.frames.swap_remove(index);
        Some(VideoFrame {
            timestamp: frame.start,
            pixels: frame.pixels,
        })
    }
}

impl PixelSource for VideoFrame {
    fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn rgba8(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}

#[cfg(test)]
mod tests {
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Rgba};

    use super::*;

    fn frame(shade: u8, delay_ms: u32) -> Frame {
        let pixels = RgbaImage::from_pixel(8, 6, Rgba([shade, shade, shade, 255]));
        Frame::from_parts(pixels, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1))
    }

    fn clip() -> VideoClip {
        VideoClip::from_frames(vec![frame(0, 100), frame(100, 200), frame(200, 100)])
    }

    #[test]
    fn frames_are_laid_out_by_delay() {
        let clip = clip();
        assert_eq!(clip.frame_count(), 3);
        assert_eq!(clip.duration(), Duration::from_millis(400));
        assert_eq!(clip.frame_index_at(Duration::ZERO), Some(0));
        assert_eq!(clip.frame_index_at(Duration::from_millis(99)), Some(0));
        assert_eq!(clip.frame_index_at(Duration::from_millis(100)), Some(1));
        assert_eq!(clip.frame_index_at(Duration::from_millis(299)), Some(1));
        assert_eq!(clip.frame_index_at(Duration::from_millis(300)), Some(2));
    }

    #[test]
    fn seeking_past_the_end_holds_the_last_frame() {
        let frame = clip().into_frame_at(Duration::from_secs(3)).unwrap();
        assert_eq!(frame.timestamp, Duration::from_millis(300));
        assert_eq!(frame.dimensions(), (8, 6));
        assert_eq!(&frame.rgba8()[0..4], &[200, 200, 200, 255]);
    }

    #[test]
    fn zero_delay_uses_default() {
        let clip = VideoClip::from_frames(vec![frame(0, 0), frame(1, 0)]);
        assert_eq!(clip.duration(), DEFAULT_FRAME_DELAY * 2);
        assert_eq!(clip.frame_index_at(DEFAULT_FRAME_DELAY), Some(1));
    }

    #[test]
    fn empty_clip_has_no_frame() {
        let clip = VideoClip::from_frames(Vec::new());
        assert!(clip.is_empty());
        assert!(clip.into_frame_at(Duration::ZERO).is_none());
    }

    #[test]
    fn decodes_animated_gif() {
        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(&mut bytes);
            encoder
                .encode_frames(vec![frame(0, 100), frame(255, 100)])
                .unwrap();
        }

        let clip = VideoClip::decode(&bytes).unwrap();
        assert_eq!(clip.frame_count(), 2);
        assert_eq!(clip.duration(), Duration::from_millis(200));

        let frame = clip.into_frame_at(Duration::from_millis(150)).unwrap();
        assert_eq!(frame.timestamp, Duration::from_millis(100));
        assert_eq!(frame.dimensions(), (8, 6));
    }

    #[test]
    fn still_png_is_a_single_frame_clip() {
        let mut bytes = Vec::new();
        RgbaImage::new(3, 2)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let clip = VideoClip::decode(&bytes).unwrap();
        assert_eq!(clip.frame_count(), 1);
        let frame = clip.into_frame_at(Duration::from_secs(3)).unwrap();
        assert_eq!(frame.timestamp, Duration::ZERO);
        assert_eq!(frame.dimensions(), (3, 2));
    }
}
