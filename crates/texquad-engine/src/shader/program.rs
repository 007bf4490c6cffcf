use std::borrow::Cow;

use super::reflect::{link_interface, ProgramInfo, ResourceKind};
use super::CompiledStage;
use crate::render::quad::{vertex_attribute, vertex_buffer_layout};
use crate::RenderError;

/// A linked GPU program: render pipeline, its bind group 0 layout, and the
/// reflected interface.
///
/// The two stage modules stay alive with the program.
pub struct ShaderProgram {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    info: ProgramInfo,
    surface_format: wgpu::TextureFormat,
    _stages: [wgpu::ShaderModule; 2],
}

impl ShaderProgram {
    pub fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn info(&self) -> &ProgramInfo {
        &self.info
    }

    /// Color target format the pipeline was built for.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }
}

/// Links `vertex` and `fragment` into a render pipeline targeting `surface_format`.
///
/// The interface is checked on the naga IR first. Whatever the device still
/// rejects while building the pipeline is caught in a validation error scope
/// and returned as [`RenderError::ShaderLink`]; the partial objects are dropped.
pub fn link(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
    vertex: CompiledStage,
    fragment: CompiledStage,
) -> Result<ShaderProgram, RenderError> {
    let info = link_interface(&vertex, &fragment)?;

    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

    let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("texquad vertex stage"),
        source: wgpu::ShaderSource::Naga(Cow::Owned(vertex.module().clone())),
    });
    let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("texquad fragment stage"),
        source: wgpu::ShaderSource::Naga(Cow::Owned(fragment.module().clone())),
    });

    let layout_entries: Vec<wgpu::BindGroupLayoutEntry> = info
        .resources
        .iter()
        .map(|slot| wgpu::BindGroupLayoutEntry {
            binding: slot.binding,
            visibility: slot.visibility,
            ty: match slot.kind {
                ResourceKind::UniformBlock { size } => wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(size as u64),
                },
                ResourceKind::Texture2d => wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                ResourceKind::Sampler => {
                    wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
                }
            },
            count: None,
        })
        .collect();

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("texquad program bgl"),
        entries: &layout_entries,
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("texquad program pipeline layout"),
        bind_group_layouts: &[&bind_group_layout],
        immediate_size: 0,
    });

    // Unresolved attributes keep their buffer slot with no attribute.
    let position_attrs: Vec<_> = vertex_attribute(info.attrs.position).into_iter().collect();
    let tex_coord_attrs: Vec<_> = vertex_attribute(info.attrs.tex_coord).into_iter().collect();
    let buffers = [
        vertex_buffer_layout(&position_attrs),
        vertex_buffer_layout(&tex_coord_attrs),
    ];

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("texquad program pipeline"),
        layout: Some(&pipeline_layout),

        vertex: wgpu::VertexState {
            module: &vs_module,
            entry_point: Some(vertex.entry_point()),
            compilation_options: Default::default(),
            buffers: &buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module: &fs_module,
            entry_point: Some(fragment.entry_point()),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    if let Some(err) = pollster::block_on(scope.pop()) {
        log::error!("device rejected shader program: {err}");
        return Err(RenderError::link(err.to_string()));
    }

    log::info!(
        "linked shader program (aPosition={:?}, aTexCoord={:?}, uResolution={:?})",
        info.attrs.position,
        info.attrs.tex_coord,
        info.resolution
    );

    Ok(ShaderProgram {
        pipeline,
        bind_group_layout,
        info,
        surface_format,
        _stages: [vs_module, fs_module],
    })
}

#[cfg(test)]
mod tests {
    use crate::device::noop_device;
    use crate::render::quad::{DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER};
    use crate::shader::ShaderCompiler;
    use crate::RenderError;

    const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Bgra8UnormSrgb;

    #[test]
    fn default_pair_links_into_a_pipeline() {
        let (device, _queue) = noop_device();
        let program = ShaderCompiler::new()
            .compile_program(&device, FORMAT, DEFAULT_VERTEX_SHADER, DEFAULT_FRAGMENT_SHADER)
            .unwrap();

        assert_eq!(program.surface_format(), FORMAT);
        assert_eq!(program.info().attrs.position, Some(0));
        assert_eq!(program.info().attrs.tex_coord, Some(1));
        assert!(program.info().resolution.is_some());
    }

    #[test]
    fn pipeline_rejected_by_device_is_link_error() {
        // Passes the interface check; an integer output cannot target a float surface.
        let fs = "#version 450
layout(location = 0) in vec2 vTexCoord;
layout(location = 0) out ivec4 outColor;
void main() { outColor = ivec4(1, 2, 3, 4); }
";
        let (device, _queue) = noop_device();
        let result =
            ShaderCompiler::new().compile_program(&device, FORMAT, DEFAULT_VERTEX_SHADER, fs);

        match result {
            Err(RenderError::ShaderLink { log }) => assert!(!log.is_empty()),
            Err(other) => panic!("expected a link error, got {other}"),
            Ok(_) => panic!("expected a link error, got a program"),
        }
    }
}
