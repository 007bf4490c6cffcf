use std::collections::BTreeMap;

use wgpu::naga;

use super::{CompiledStage, StageKind};
use crate::RenderError;

/// Vertex attribute fed by the geometry position buffer.
pub const POSITION_ATTRIBUTE: &str = "aPosition";
/// Vertex attribute fed by the geometry texcoord buffer.
pub const TEX_COORD_ATTRIBUTE: &str = "aTexCoord";
/// `vec2` uniform receiving the backing-store size in pixels.
pub const RESOLUTION_UNIFORM: &str = "uResolution";

/// Shader locations of the two quad attributes.
///
/// `None` means the vertex stage does not declare the attribute; its buffer is
/// still bound but feeds nothing.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct AttributeLocations {
    pub position: Option<u32>,
    pub tex_coord: Option<u32>,
}

/// Where a uniform value lives: a uniform block binding and a byte offset in it.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformLocation {
    pub binding: u32,
    pub offset: u32,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceKind {
    /// Uniform block of `size` bytes (rounded up to 16).
    UniformBlock { size: u32 },
    /// Sampled, filterable float 2D texture.
    Texture2d,
    /// Filtering sampler.
    Sampler,
}

/// One bind group 0 entry required by the program.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ResourceSlot {
    pub binding: u32,
    pub kind: ResourceKind,
    pub visibility: wgpu::ShaderStages,
}

/// Reflected interface of a linked program. Immutable after linking.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramInfo {
    pub attrs: AttributeLocations,
    pub resolution: Option<UniformLocation>,
    /// Sorted by binding.
    pub resources: Vec<ResourceSlot>,
}

impl ProgramInfo {
    pub fn uniform_blocks(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.resources.iter().filter_map(|slot| match slot.kind {
            ResourceKind::UniformBlock { size } => Some((slot.binding, size)),
            _ => None,
        })
    }
}

/// Checks that `vertex` and `fragment` form a valid program and reflects it.
///
/// This is the CPU half of linking: every problem found is collected into the
/// returned link log rather than stopping at the first one.
///
/// `aPosition` and `aTexCoord` that are not declared resolve to `None` and
/// their buffers feed nothing. A vertex input under any other name is a link
/// error: a wgpu pipeline cannot be built with an input no vertex buffer
/// supplies, so a renamed attribute cannot be silently disabled.
pub fn link_interface(
    vertex: &CompiledStage,
    fragment: &CompiledStage,
) -> Result<ProgramInfo, RenderError> {
    let mut log = Vec::new();

    if vertex.kind() != StageKind::Vertex {
        log.push(format!("expected a vertex stage, got a {} stage", vertex.kind()));
    }
    if fragment.kind() != StageKind::Fragment {
        log.push(format!("expected a fragment stage, got a {} stage", fragment.kind()));
    }
    if !log.is_empty() {
        return Err(RenderError::link(log.join("\n")));
    }

    let (Some(vs_entry), Some(fs_entry)) = (vertex.entry(), fragment.entry()) else {
        return Err(RenderError::link("stage entry point missing"));
    };

    // Vertex inputs: only the two quad attributes can be fed.
    let mut attrs = AttributeLocations::default();
    let mut inputs = Vec::new();
    for arg in &vs_entry.function.arguments {
        collect_varyings(
            vertex.module(),
            arg.ty,
            arg.binding.as_ref(),
            arg.name.as_deref(),
            &mut inputs,
        );
    }
    for input in &inputs {
        let slot = match input.name.as_deref() {
            Some(POSITION_ATTRIBUTE) => &mut attrs.position,
            Some(TEX_COORD_ATTRIBUTE) => &mut attrs.tex_coord,
            other => {
                log.push(format!(
                    "vertex input `{}` at location {} has no vertex buffer",
                    other.unwrap_or("<unnamed>"),
                    input.location
                ));
                continue;
            }
        };
        if !is_f32_varying(&input.inner) {
            log.push(format!(
                "vertex input `{}` must be a 32-bit float scalar or vector",
                input.name.as_deref().unwrap_or_default()
            ));
        }
        *slot = Some(input.location);
    }

    // Fragment inputs must be written by the vertex stage.
    let mut outputs = Vec::new();
    if let Some(result) = vs_entry.function.result.as_ref() {
        collect_varyings(vertex.module(), result.ty, result.binding.as_ref(), None, &mut outputs);
    }
    let mut fs_inputs = Vec::new();
    for arg in &fs_entry.function.arguments {
        collect_varyings(
            fragment.module(),
            arg.ty,
            arg.binding.as_ref(),
            arg.name.as_deref(),
            &mut fs_inputs,
        );
    }
    for input in &fs_inputs {
        match outputs.iter().find(|out| out.location == input.location) {
            None => log.push(format!(
                "fragment input `{}` at location {} is not written by the vertex stage",
                input.name.as_deref().unwrap_or("<unnamed>"),
                input.location
            )),
            Some(out) if out.inner != input.inner => log.push(format!(
                "type mismatch at location {} between vertex output and fragment input",
                input.location
            )),
            Some(_) => {}
        }
    }

    // Resources across both stages.
    let mut slots: BTreeMap<u32, ResourceSlot> = BTreeMap::new();
    let mut resolution = None;
    for stage in [vertex, fragment] {
        for found in stage_resources(stage, &mut log) {
            if let Some(loc) = found.resolution {
                resolution = Some(loc);
            }
            let slot = found.slot;
            match slots.get_mut(&slot.binding) {
                None => {
                    slots.insert(slot.binding, slot);
                }
                Some(existing) if existing.kind == slot.kind => {
                    existing.visibility |= slot.visibility;
                }
                Some(_) => log.push(format!(
                    "binding {} is declared with different types in the two stages",
                    slot.binding
                )),
            }
        }
    }

    if !log.is_empty() {
        return Err(RenderError::link(log.join("\n")));
    }

    if attrs.position.is_none() {
        log::warn!("vertex stage does not declare `{POSITION_ATTRIBUTE}`");
    }
    if attrs.tex_coord.is_none() {
        log::warn!("vertex stage does not declare `{TEX_COORD_ATTRIBUTE}`");
    }
    if resolution.is_none() {
        log::warn!("program does not declare `{RESOLUTION_UNIFORM}`");
    }

    Ok(ProgramInfo {
        attrs,
        resolution,
        resources: slots.into_values().collect(),
    })
}

struct Varying {
    name: Option<String>,
    location: u32,
    inner: naga::TypeInner,
}

fn collect_varyings(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    name: Option<&str>,
    out: &mut Vec<Varying>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(Varying {
            name: name.map(str::to_owned),
            location: *location,
            inner: module.types[ty].inner.clone(),
        }),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_varyings(
                        module,
                        member.ty,
                        member.binding.as_ref(),
                        member.name.as_deref(),
                        out,
                    );
                }
            }
        }
    }
}

fn is_f32_varying(inner: &naga::TypeInner) -> bool {
    let scalar = match inner {
        naga::TypeInner::Scalar(scalar) => scalar,
        naga::TypeInner::Vector { scalar, .. } => scalar,
        _ => return false,
    };
    scalar.kind == naga::ScalarKind::Float && scalar.width == 4
}

fn is_vec2_f32(inner: &naga::TypeInner) -> bool {
    matches!(
        inner,
        naga::TypeInner::Vector { size: naga::VectorSize::Bi, scalar }
            if scalar.kind == naga::ScalarKind::Float && scalar.width == 4
    )
}

struct FoundResource {
    slot: ResourceSlot,
    resolution: Option<UniformLocation>,
}

fn stage_resources(stage: &CompiledStage, log: &mut Vec<String>) -> Vec<FoundResource> {
    let module = stage.module();
    let visibility = stage.kind().wgpu_stage();
    let mut found = Vec::new();

    for (handle, var) in module.global_variables.iter() {
        let Some(binding) = var.binding.as_ref() else { continue };
        if !stage.uses_global(handle) {
            continue;
        }

        let label = var.name.as_deref().unwrap_or("<unnamed>");
        if binding.group != 0 {
            log.push(format!(
                "`{label}` is in bind group {}, only group 0 is supported",
                binding.group
            ));
            continue;
        }

        let inner = &module.types[var.ty].inner;
        let (kind, resolution) = match (var.space, inner) {
            (naga::AddressSpace::Uniform, _) => {
                let size = inner.size(module.to_ctx()).next_multiple_of(16);
                let resolution = resolution_in(module, var, binding.binding, log);
                (ResourceKind::UniformBlock { size }, resolution)
            }
            (
                naga::AddressSpace::Handle,
                naga::TypeInner::Image {
                    dim: naga::ImageDimension::D2,
                    arrayed: false,
                    class: naga::ImageClass::Sampled {
                        kind: naga::ScalarKind::Float,
                        multi: false,
                    },
                },
            ) => (ResourceKind::Texture2d, None),
            (naga::AddressSpace::Handle, naga::TypeInner::Sampler { comparison: false }) => {
                (ResourceKind::Sampler, None)
            }
            _ => {
                log.push(format!(
                    "`{label}` at binding {} is not a uniform block, 2D float texture or sampler",
                    binding.binding
                ));
                continue;
            }
        };

        found.push(FoundResource {
            slot: ResourceSlot { binding: binding.binding, kind, visibility },
            resolution,
        });
    }

    found
}

fn resolution_in(
    module: &naga::Module,
    var: &naga::GlobalVariable,
    binding: u32,
    log: &mut Vec<String>,
) -> Option<UniformLocation> {
    let inner = &module.types[var.ty].inner;

    let (offset, ty_inner) = if var.name.as_deref() == Some(RESOLUTION_UNIFORM) {
        (0, inner)
    } else if let naga::TypeInner::Struct { members, .. } = inner {
        let member = members
            .iter()
            .find(|m| m.name.as_deref() == Some(RESOLUTION_UNIFORM))?;
        (member.offset, &module.types[member.ty].inner)
    } else {
        return None;
    };

    if !is_vec2_f32(ty_inner) {
        log.push(format!("`{RESOLUTION_UNIFORM}` must be a vec2"));
        return None;
    }
    Some(UniformLocation { binding, offset })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::quad::{DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER};
    use crate::shader::ShaderCompiler;

    fn stages(vs: &str, fs: &str) -> (CompiledStage, CompiledStage) {
        let mut compiler = ShaderCompiler::new();
        (
            compiler.compile_stage(StageKind::Vertex, vs).unwrap(),
            compiler.compile_stage(StageKind::Fragment, fs).unwrap(),
        )
    }

    fn link_log(vs: &CompiledStage, fs: &CompiledStage) -> String {
        match link_interface(vs, fs) {
            Err(RenderError::ShaderLink { log }) => log,
            other => panic!("expected link failure, got {other:?}"),
        }
    }

    const PLAIN_FS: &str = "#version 450
layout(location = 0) in vec2 vTexCoord;
layout(location = 0) out vec4 outColor;
void main() { outColor = vec4(vTexCoord, 0.0, 1.0); }
";

    #[test]
    fn default_program_resolves_names() {
        let (vs, fs) = stages(DEFAULT_VERTEX_SHADER, DEFAULT_FRAGMENT_SHADER);
        let info = link_interface(&vs, &fs).unwrap();

        assert_eq!(info.attrs.position, Some(0));
        assert_eq!(info.attrs.tex_coord, Some(1));
        assert_eq!(info.resolution, Some(UniformLocation { binding: 0, offset: 0 }));
        assert_eq!(info.uniform_blocks().collect::<Vec<_>>(), vec![(0, 16)]);

        let kinds: Vec<_> = info.resources.iter().map(|s| (s.binding, s.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (0, ResourceKind::UniformBlock { size: 16 }),
                (1, ResourceKind::Texture2d),
                (2, ResourceKind::Sampler),
            ]
        );
        assert_eq!(info.resources[0].visibility, wgpu::ShaderStages::VERTEX);
        assert_eq!(info.resources[1].visibility, wgpu::ShaderStages::FRAGMENT);
    }

    #[test]
    fn resolution_found_after_other_members() {
        let vs = "#version 450
layout(location = 0) in vec2 aPosition;
layout(location = 1) in vec2 aTexCoord;
layout(set = 0, binding = 0) uniform Globals { vec2 uOffset; vec2 uResolution; };
layout(location = 0) out vec2 vTexCoord;
void main() {
    gl_Position = vec4((aPosition + uOffset) / uResolution, 0.0, 1.0);
    vTexCoord = aTexCoord;
}
";
        let (vs, fs) = stages(vs, PLAIN_FS);
        let info = link_interface(&vs, &fs).unwrap();
        assert_eq!(info.resolution, Some(UniformLocation { binding: 0, offset: 8 }));
        assert!(info.resources.iter().all(|s| s.kind != ResourceKind::Texture2d));
    }

    #[test]
    fn renamed_attribute_is_unresolved_input() {
        let vs = "#version 450
layout(location = 0) in vec2 aPos;
layout(location = 0) out vec2 vTexCoord;
void main() { gl_Position = vec4(aPos, 0.0, 1.0); vTexCoord = aPos; }
";
        let (vs, fs) = stages(vs, PLAIN_FS);
        let log = link_log(&vs, &fs);
        assert!(log.contains("aPos"), "{log}");
    }

    #[test]
    fn missing_attributes_and_uniform_resolve_to_none() {
        let vs = "#version 450
layout(location = 1) in vec2 aTexCoord;
layout(location = 0) out vec2 vTexCoord;
void main() { gl_Position = vec4(0.0, 0.0, 0.0, 1.0); vTexCoord = aTexCoord; }
";
        let (vs, fs) = stages(vs, PLAIN_FS);
        let info = link_interface(&vs, &fs).unwrap();
        assert_eq!(info.attrs.position, None);
        assert_eq!(info.attrs.tex_coord, Some(1));
        assert_eq!(info.resolution, None);
        assert!(info.resources.is_empty());
    }

    #[test]
    fn unwritten_fragment_input_fails_link() {
        let vs = "#version 450
layout(location = 0) in vec2 aPosition;
void main() { gl_Position = vec4(aPosition, 0.0, 1.0); }
";
        let (vs, fs) = stages(vs, PLAIN_FS);
        let log = link_log(&vs, &fs);
        assert!(log.contains("location 0"), "{log}");
    }

    #[test]
    fn varying_type_mismatch_fails_link() {
        let fs = "#version 450
layout(location = 0) in vec4 vTexCoord;
layout(location = 0) out vec4 outColor;
void main() { outColor = vTexCoord; }
";
        let (vs, fs) = stages(DEFAULT_VERTEX_SHADER, fs);
        let log = link_log(&vs, &fs);
        assert!(log.contains("type mismatch"), "{log}");
    }

    #[test]
    fn swapped_stages_fail_link() {
        let (vs, fs) = stages(DEFAULT_VERTEX_SHADER, DEFAULT_FRAGMENT_SHADER);
        let log = link_log(&fs, &vs);
        assert!(log.contains("expected a vertex stage"), "{log}");
    }

    #[test]
    fn non_zero_bind_group_fails_link() {
        let fs = "#version 450
layout(location = 0) in vec2 vTexCoord;
layout(set = 1, binding = 0) uniform texture2D uImage;
layout(set = 1, binding = 1) uniform sampler uSampler;
layout(location = 0) out vec4 outColor;
void main() { outColor = texture(sampler2D(uImage, uSampler), vTexCoord); }
";
        let (vs, fs) = stages(DEFAULT_VERTEX_SHADER, fs);
        let log = link_log(&vs, &fs);
        assert!(log.contains("bind group 1"), "{log}");
    }
}
