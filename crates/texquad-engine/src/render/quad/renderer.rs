use crate::media::PixelSource;
use crate::render::{RenderCtx, RenderTarget};
use crate::shader::{ResourceKind, ShaderProgram};
use crate::RenderError;

use super::geometry::{GeometryBuffers, POSITION_SLOT, TEX_COORD_SLOT};
use super::pass::QuadPass;
use super::texture::{sampler_descriptor, texture_format_for, QuadTexture};

/// Draws one textured quad with a linked [`ShaderProgram`].
///
/// Owns at most one geometry pair and one texture at a time. Replacing either
/// destroys the previous GPU objects first.
pub struct QuadRenderer {
    program: ShaderProgram,
    sampler: wgpu::Sampler,
    /// One zero-initialized buffer per uniform block, keyed by binding.
    uniform_buffers: Vec<(u32, wgpu::Buffer)>,

    geometry: Option<GeometryBuffers>,
    texture: Option<QuadTexture>,
    bind_group: Option<wgpu::BindGroup>,
}

impl QuadRenderer {
    pub fn new(device: &wgpu::Device, program: ShaderProgram) -> Self {
        let sampler = device.create_sampler(&sampler_descriptor());

        let uniform_buffers = program
            .info()
            .uniform_blocks()
            .map(|(binding, size)| {
                let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("texquad uniform block"),
                    size: size as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (binding, buffer)
            })
            .collect();

        let mut renderer = Self {
            program,
            sampler,
            uniform_buffers,
            geometry: None,
            texture: None,
            bind_group: None,
        };
        renderer.rebuild_bind_group(device);
        renderer
    }

    /// Returns `true` once geometry and every binding the program needs exist.
    pub fn is_ready(&self) -> bool {
        self.geometry.is_some() && self.bind_group.is_some()
    }

    /// Replaces the quad geometry with a fresh `width x height` pair.
    pub fn allocate_geometry(&mut self, device: &wgpu::Device, width: f32, height: f32) {
        if let Some(previous) = self.geometry.take() {
            previous.release();
        }
        self.geometry = Some(GeometryBuffers::allocate(device, width, height));
        log::debug!("quad geometry allocated ({width}x{height})");
    }

    /// Replaces the texture with `source` and rebinds it.
    ///
    /// The previous texture is released before the new one is created, so a
    /// failed upload leaves the renderer without a texture.
    pub fn upload_texture(
        &mut self,
        ctx: &RenderCtx<'_>,
        source: &dyn PixelSource,
        name: &str,
    ) -> Result<(), RenderError> {
        self.bind_group = None;
        if let Some(previous) = self.texture.take() {
            previous.release();
        }

        let format = texture_format_for(self.program.surface_format());
        let texture = QuadTexture::upload(ctx.device, ctx.queue, format, source, name)?;
        let (w, h) = texture.dimensions();
        log::debug!("texture uploaded for `{name}` ({w}x{h})");

        self.texture = Some(texture);
        self.rebuild_bind_group(ctx.device);
        Ok(())
    }

    /// Releases the current asset's resources and builds new ones for `source`,
    /// drawn as a `quad_size` rectangle.
    pub fn replace_asset(
        &mut self,
        ctx: &RenderCtx<'_>,
        source: &dyn PixelSource,
        quad_size: [f32; 2],
        name: &str,
    ) -> Result<(), RenderError> {
        self.release_asset();
        self.allocate_geometry(ctx.device, quad_size[0], quad_size[1]);
        self.upload_texture(ctx, source, name)
    }

    /// Drops the geometry and texture, destroying their GPU objects.
    pub fn release_asset(&mut self) {
        self.bind_group = None;
        if let Some(geometry) = self.geometry.take() {
            geometry.release();
        }
        if let Some(texture) = self.texture.take() {
            texture.release();
        }
    }

    /// Records one quad draw into `target`.
    ///
    /// Returns `false` without recording anything if the renderer is not
    /// ready, the viewport is empty, or the target format is not the one the
    /// program was linked for.
    pub fn draw(&self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) -> bool {
        let pass = QuadPass::new(ctx.viewport);
        if pass.viewport.is_empty() || ctx.surface_format != self.program.surface_format() {
            return false;
        }
        let (Some(geometry), Some(bind_group)) = (self.geometry.as_ref(), self.bind_group.as_ref())
        else {
            return false;
        };

        if let Some(loc) = self.program.info().resolution {
            if let Some(buffer) = self.uniform_buffer(loc.binding) {
                let bytes = bytemuck::cast_slice(&pass.resolution);
                ctx.queue.write_buffer(buffer, loc.offset as u64, bytes);
            }
        }

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("texquad quad pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(pass.clear.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.apply_viewport(&mut rpass);
        rpass.set_pipeline(self.program.pipeline());
        rpass.set_bind_group(0, bind_group, &[]);
        rpass.set_vertex_buffer(POSITION_SLOT, geometry.position.slice(..));
        rpass.set_vertex_buffer(TEX_COORD_SLOT, geometry.tex_coord.slice(..));
        rpass.draw(pass.vertices.clone(), pass.instances.clone());

        true
    }

    fn uniform_buffer(&self, binding: u32) -> Option<&wgpu::Buffer> {
        self.uniform_buffers
            .iter()
            .find(|(b, _)| *b == binding)
            .map(|(_, buffer)| buffer)
    }

    /// Builds the bind group from the program's slots.
    ///
    /// Leaves it unset while a required texture is missing.
    fn rebuild_bind_group(&mut self, device: &wgpu::Device) {
        self.bind_group = None;

        let mut entries = Vec::with_capacity(self.program.info().resources.len());
        for slot in &self.program.info().resources {
            let resource = match slot.kind {
                ResourceKind::UniformBlock { .. } => {
                    let Some(buffer) = self.uniform_buffer(slot.binding) else { return };
                    buffer.as_entire_binding()
                }
                ResourceKind::Texture2d => {
                    let Some(texture) = self.texture.as_ref() else { return };
                    wgpu::BindingResource::TextureView(texture.view())
                }
                ResourceKind::Sampler => wgpu::BindingResource::Sampler(&self.sampler),
            };
            entries.push(wgpu::BindGroupEntry {
                binding: slot.binding,
                resource,
            });
        }

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texquad bind group"),
            layout: self.program.bind_group_layout(),
            entries: &entries,
        });
        self.bind_group = Some(bind_group);
    }
}

impl Drop for QuadRenderer {
    fn drop(&mut self) {
        self.release_asset();
    }
}
