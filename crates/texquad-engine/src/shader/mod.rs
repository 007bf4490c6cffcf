//! Shader compilation and linking.
//!
//! Stages are GLSL (450, Vulkan-style resource layout) compiled through the
//! naga front-end. Linking checks the stage interface on the naga IR, reflects
//! the names the quad renderer needs, then builds the wgpu render pipeline.

mod program;
mod reflect;
mod stage;

pub use program::{link, ShaderProgram};
pub use reflect::{
    link_interface, AttributeLocations, ProgramInfo, ResourceKind, ResourceSlot, UniformLocation,
    POSITION_ATTRIBUTE, RESOLUTION_UNIFORM, TEX_COORD_ATTRIBUTE,
};
pub use stage::{CompiledStage, ShaderCompiler, StageKind};
