//! Textured-quad renderer.
//!
//! One rectangle anchored at the surface origin, two triangles, no index
//! buffer. The full source image is stretched over it.

mod geometry;
mod pass;
mod renderer;
mod texture;

pub use geometry::{
    quad_positions, scaled_quad_size, GeometryBuffers, POSITION_SLOT, QUAD_TEX_COORDS,
    QUAD_VERTEX_COUNT, TEX_COORD_SLOT,
};
pub use pass::QuadPass;
pub use renderer::QuadRenderer;
pub use texture::{sampler_descriptor, texture_format_for, QuadTexture};

pub(crate) use geometry::{vertex_attribute, vertex_buffer_layout};

/// Built-in vertex stage honoring the `aPosition` / `aTexCoord` / `uResolution` contract.
pub const DEFAULT_VERTEX_SHADER: &str = include_str!("shaders/quad.vert");

/// Built-in fragment stage sampling `uImage` through `uSampler`.
pub const DEFAULT_FRAGMENT_SHADER: &str = include_str!("shaders/quad.frag");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Viewport;
    use crate::media::{PixelSource, StillImage};

    #[test]
    fn still_image_maps_to_scaled_stretched_quad() {
        let image = StillImage::from_rgba(image::RgbaImage::new(400, 300));
        let size = scaled_quad_size(image.dimensions(), 4.0);
        assert_eq!(size, [100.0, 75.0]);

        let positions = quad_positions(size[0], size[1]);
        let max_x = positions.iter().map(|p| p[0]).fold(f32::MIN, f32::max);
        let max_y = positions.iter().map(|p| p[1]).fold(f32::MIN, f32::max);
        assert_eq!((max_x, max_y), (100.0, 75.0));

        // Full texture over the full rectangle, whatever the aspect ratio.
        for (pos, uv) in positions.iter().zip(QUAD_TEX_COORDS.iter()) {
            assert_eq!(pos[0] / 100.0, uv[0]);
            assert_eq!(pos[1] / 75.0, uv[1]);
        }

        let sampler = sampler_descriptor();
        assert_eq!(sampler.mag_filter, wgpu::FilterMode::Nearest);
        assert_eq!(sampler.min_filter, wgpu::FilterMode::Nearest);
        assert_eq!(sampler.address_mode_u, wgpu::AddressMode::ClampToEdge);
        assert_eq!(sampler.address_mode_v, wgpu::AddressMode::ClampToEdge);

        let pass = QuadPass::new(Viewport::new(200, 150));
        assert_eq!(pass.vertices, 0..QUAD_VERTEX_COUNT);
    }
}
