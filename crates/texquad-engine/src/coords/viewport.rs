/// Logical (client) size of a drawable surface, in whole logical pixels.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ClientSize {
    pub width: u32,
    pub height: u32,
}

impl ClientSize {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Backing-store size in physical pixels.
///
/// Renderers set this as the pass viewport and upload it as the
/// `uResolution` uniform.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Resolution uniform value.
    #[inline]
    pub fn resolution(self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

/// Computes the backing-store size for a client size at a device pixel ratio.
///
/// Each axis is `floor(client * dpr)`. Negative or non-finite ratios produce
/// an empty viewport.
pub fn backing_store_size(client: ClientSize, device_pixel_ratio: f64) -> Viewport {
    if !device_pixel_ratio.is_finite() || device_pixel_ratio <= 0.0 {
        return Viewport::default();
    }
    let scale = |v: u32| (v as f64 * device_pixel_ratio).floor() as u32;
    Viewport::new(scale(client.width), scale(client.height))
}
