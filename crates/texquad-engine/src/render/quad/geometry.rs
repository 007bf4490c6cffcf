use wgpu::util::DeviceExt;

/// Vertices per quad: two triangles, no index buffer.
pub const QUAD_VERTEX_COUNT: u32 = 6;

/// Vertex buffer slot of the position buffer.
pub const POSITION_SLOT: u32 = 0;
/// Vertex buffer slot of the texcoord buffer.
pub const TEX_COORD_SLOT: u32 = 1;

/// Fixed unit-square mapping, matching the vertex order of [`quad_positions`].
pub const QUAD_TEX_COORDS: [[f32; 2]; 6] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [0.0, 1.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [1.0, 1.0],
];

/// Rectangle `[0, width] x [0, height]` as an upper-left and a lower-right
/// triangle sharing the diagonal.
pub fn quad_positions(width: f32, height: f32) -> [[f32; 2]; 6] {
    [
        [0.0, 0.0],
        [width, 0.0],
        [0.0, height],
        [0.0, height],
        [width, 0.0],
        [width, height],
    ]
}

/// Quad size for an image of `dimensions` pixels shrunk by `divisor`.
///
/// Non-positive or non-finite divisors are treated as 1.
pub fn scaled_quad_size(dimensions: (u32, u32), divisor: f32) -> [f32; 2] {
    let divisor = if divisor.is_finite() && divisor > 0.0 { divisor } else { 1.0 };
    [dimensions.0 as f32 / divisor, dimensions.1 as f32 / divisor]
}

pub(crate) fn vertex_attribute(location: Option<u32>) -> Option<wgpu::VertexAttribute> {
    location.map(|shader_location| wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 0,
        shader_location,
    })
}

/// Tightly packed `[f32; 2]` per vertex.
pub(crate) fn vertex_buffer_layout(
    attributes: &[wgpu::VertexAttribute],
) -> wgpu::VertexBufferLayout<'_> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<[f32; 2]>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

/// Position + texcoord buffers for one quad.
pub struct GeometryBuffers {
    pub position: wgpu::Buffer,
    pub tex_coord: wgpu::Buffer,
}

impl GeometryBuffers {
    /// Allocates fresh buffers for a `width x height` quad.
    pub fn allocate(device: &wgpu::Device, width: f32, height: f32) -> Self {
        let positions = quad_positions(width, height);

        let position = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("texquad position vbo"),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let tex_coord = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("texquad texcoord vbo"),
            contents: bytemuck::cast_slice(&QUAD_TEX_COORDS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self { position, tex_coord }
    }

    /// Frees the GPU memory now instead of waiting for the last handle to drop.
    pub fn release(self) {
        self.position.destroy();
        self.tex_coord.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(points: &[[f32; 2]]) -> ([f32; 2], [f32; 2]) {
        points.iter().fold(
            ([f32::MAX, f32::MAX], [f32::MIN, f32::MIN]),
            |(lo, hi), p| {
                (
                    [lo[0].min(p[0]), lo[1].min(p[1])],
                    [hi[0].max(p[0]), hi[1].max(p[1])],
                )
            },
        )
    }

    #[test]
    fn positions_cover_exact_rectangle() {
        for (w, h) in [(1.0, 1.0), (100.0, 75.0), (0.5, 300.25), (1920.0, 1080.0)] {
            let positions = quad_positions(w, h);
            assert_eq!(positions.len() as u32, QUAD_VERTEX_COUNT);
            assert_eq!(bounds(&positions), ([0.0, 0.0], [w, h]));
        }
    }

    #[test]
    fn triangles_share_the_diagonal() {
        let p = quad_positions(10.0, 20.0);
        assert_eq!(&p[0..3], &[[0.0, 0.0], [10.0, 0.0], [0.0, 20.0]]);
        assert_eq!(&p[3..6], &[[0.0, 20.0], [10.0, 0.0], [10.0, 20.0]]);
    }

    #[test]
    fn tex_coords_are_the_unit_square() {
        assert_eq!(QUAD_TEX_COORDS, quad_positions(1.0, 1.0));
        assert_eq!(bounds(&QUAD_TEX_COORDS), ([0.0, 0.0], [1.0, 1.0]));
    }

    #[test]
    fn scaled_size_divides_both_axes() {
        assert_eq!(scaled_quad_size((1280, 720), 4.0), [320.0, 180.0]);
        assert_eq!(scaled_quad_size((401, 301), 4.0), [100.25, 75.25]);
        assert_eq!(scaled_quad_size((64, 32), 0.0), [64.0, 32.0]);
    }

    #[test]
    fn layout_is_tightly_packed_float2() {
        let attr = vertex_attribute(Some(3)).unwrap();
        assert_eq!(attr.format, wgpu::VertexFormat::Float32x2);
        assert_eq!(attr.shader_location, 3);
        assert!(vertex_attribute(None).is_none());

        let attrs = [attr];
        let layout = vertex_buffer_layout(&attrs);
        assert_eq!(layout.array_stride, 8);
        assert_eq!(layout.step_mode, wgpu::VertexStepMode::Vertex);
    }
}
