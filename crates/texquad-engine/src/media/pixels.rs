use image::RgbaImage;

/// Tightly packed RGBA8 pixels, row-major, top row first.
pub trait PixelSource {
    /// `(width, height)` in pixels.
    fn dimensions(&self) -> (u32, u32);

    /// Exactly `width * height * 4` bytes.
    fn rgba8(&self) -> &[u8];
}

impl PixelSource for RgbaImage {
    fn dimensions(&self) -> (u32, u32) {
        RgbaImage::dimensions(self)
    }

    fn rgba8(&self) -> &[u8] {
        self.as_raw()
    }
}
