use std::ops::Range;

use super::geometry::QUAD_VERTEX_COUNT;
use crate::coords::Viewport;
use crate::paint::Color;

/// Everything one quad draw does, as data.
///
/// Built fresh for every draw from the backing store size of that draw.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadPass {
    /// Pass viewport, always `(0, 0, width, height)` of the backing store.
    pub viewport: Viewport,
    pub clear: Color,
    /// Value written to `uResolution`.
    pub resolution: [f32; 2],
    pub vertices: Range<u32>,
    pub instances: Range<u32>,
}

impl QuadPass {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            clear: Color::TRANSPARENT,
            resolution: viewport.resolution(),
            vertices: 0..QUAD_VERTEX_COUNT,
            instances: 0..1,
        }
    }

    /// Sets the full backing-store viewport on `rpass`.
    pub(crate) fn apply_viewport(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_viewport(
            0.0,
            0.0,
            self.viewport.width as f32,
            self.viewport.height as f32,
            0.0,
            1.0,
        );
    }
}
