use image::RgbaImage;

use super::PixelSource;

/// A decoded still image.
#[derive(Debug, Clone)]
pub struct StillImage {
    pixels: RgbaImage,
}

impl StillImage {
    /// Decodes any enabled image format, guessing it from the bytes.
    pub fn decode(bytes: &[u8]) -> image::ImageResult<Self> {
        let decoded = image::load_from_memory(bytes)?;
        Ok(Self::from_rgba(decoded.to_rgba8()))
    }

    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }
}

impl PixelSource for StillImage {
    fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn rgba8(&self) -> &[u8] {
        self.pixels.as_raw()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba};

    use super::*;

    #[test]
    fn decodes_png_to_rgba8() {
        let mut img = RgbaImage::new(4, 3);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(3, 2, Rgba([0, 0, 255, 128]));

        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();

        let still = StillImage::decode(&bytes).unwrap();
        assert_eq!(still.dimensions(), (4, 3));
        assert_eq!(still.rgba8().len(), 4 * 3 * 4);
        assert_eq!(&still.rgba8()[0..4], &[255, 0, 0, 255]);
        let last = still.rgba8().len() - 4;
        assert_eq!(&still.rgba8()[last..], &[0, 0, 255, 128]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(StillImage::decode(b"definitely not an image").is_err());
    }
}
