use std::fmt;

use wgpu::naga;
use wgpu::naga::front::glsl;
use wgpu::naga::valid::{Capabilities, ModuleInfo, ValidationFlags, Validator};

use super::program::{self, ShaderProgram};
use crate::RenderError;

/// Pipeline stage a shader source is compiled for.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    pub(crate) fn naga_stage(self) -> naga::ShaderStage {
        match self {
            StageKind::Vertex => naga::ShaderStage::Vertex,
            StageKind::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub(crate) fn wgpu_stage(self) -> wgpu::ShaderStages {
        match self {
            StageKind::Vertex => wgpu::ShaderStages::VERTEX,
            StageKind::Fragment => wgpu::ShaderStages::FRAGMENT,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Vertex => f.write_str("vertex"),
            StageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// A single validated shader stage, ready for linking.
#[derive(Debug)]
pub struct CompiledStage {
    kind: StageKind,
    module: naga::Module,
    info: ModuleInfo,
    entry_point: String,
}

impl CompiledStage {
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub(crate) fn module(&self) -> &naga::Module {
        &self.module
    }

    pub(crate) fn entry(&self) -> Option<&naga::EntryPoint> {
        self.module
            .entry_points
            .iter()
            .find(|ep| ep.name == self.entry_point)
    }

    /// Returns `true` if the stage's entry point touches `global`.
    pub(crate) fn uses_global(&self, global: naga::Handle<naga::GlobalVariable>) -> bool {
        self.module
            .entry_points
            .iter()
            .position(|ep| ep.name == self.entry_point)
            .is_some_and(|index| !self.info.get_entry_point(index)[global].is_empty())
    }
}

/// Compiles GLSL stages and links them into programs.
///
/// The compiler is reusable; it keeps the GLSL front-end between calls.
#[derive(Default)]
pub struct ShaderCompiler {
    frontend: glsl::Frontend,
}

impl ShaderCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles one stage from raw GLSL source.
    ///
    /// On failure the error carries the front-end or validator diagnostic
    /// rendered against `source`.
    pub fn compile_stage(
        &mut self,
        kind: StageKind,
        source: &str,
    ) -> Result<CompiledStage, RenderError> {
        let fail = |log: String| RenderError::ShaderCompile { stage: kind, log };

        let options = glsl::Options::from(kind.naga_stage());
        let module = self
            .frontend
            .parse(&options, source)
            .map_err(|errors| fail(errors.emit_to_string(source)))?;

        let info = Validator::new(ValidationFlags::all(), Capabilities::empty())
            .validate(&module)
            .map_err(|err| fail(err.emit_to_string(source)))?;

        let mut entries = module
            .entry_points
            .iter()
            .filter(|ep| ep.stage == kind.naga_stage());
        let entry_point = match (entries.next(), entries.next()) {
            (Some(ep), None) => ep.name.clone(),
            (None, _) => return Err(fail(format!("no {kind} entry point"))),
            (Some(_), Some(_)) => return Err(fail(format!("more than one {kind} entry point"))),
        };

        log::debug!("compiled {kind} stage (entry point `{entry_point}`)");

        Ok(CompiledStage {
            kind,
            module,
            info,
            entry_point,
        })
    }

    /// Links a vertex and a fragment stage into a GPU program for `surface_format`.
    ///
    /// Consumes both stages; on failure they are dropped with the error.
    pub fn link(
        &self,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        vertex: CompiledStage,
        fragment: CompiledStage,
    ) -> Result<ShaderProgram, RenderError> {
        program::link(device, surface_format, vertex, fragment)
    }

    /// Compiles both sources and links them.
    pub fn compile_program(
        &mut self,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderProgram, RenderError> {
        let vertex = self.compile_stage(StageKind::Vertex, vertex_source)?;
        let fragment = self.compile_stage(StageKind::Fragment, fragment_source)?;
        self.link(device, surface_format, vertex, fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::quad::{DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER};

    #[test]
    fn default_stages_compile() {
        let mut compiler = ShaderCompiler::new();
        let vs = compiler
            .compile_stage(StageKind::Vertex, DEFAULT_VERTEX_SHADER)
            .unwrap();
        let fs = compiler
            .compile_stage(StageKind::Fragment, DEFAULT_FRAGMENT_SHADER)
            .unwrap();
        assert_eq!(vs.kind(), StageKind::Vertex);
        assert_eq!(fs.kind(), StageKind::Fragment);
        assert_eq!(vs.entry_point(), "main");
        assert!(vs.entry().is_some());
    }

    #[test]
    fn syntax_error_reports_compile_failure() {
        let mut compiler = ShaderCompiler::new();
        let err = compiler
            .compile_stage(StageKind::Vertex, "#version 450\nvoid main() { gl_Position = ; }")
            .unwrap_err();
        match err {
            RenderError::ShaderCompile { stage, log } => {
                assert_eq!(stage, StageKind::Vertex);
                assert!(!log.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn type_error_reports_compile_failure() {
        let mut compiler = ShaderCompiler::new();
        let src = "#version 450\nlayout(location = 0) out vec4 c;\nvoid main() { c = vec3(1.0); }";
        let err = compiler.compile_stage(StageKind::Fragment, src).unwrap_err();
        assert!(matches!(err, RenderError::ShaderCompile { stage: StageKind::Fragment, .. }));
    }

    #[test]
    fn compiler_is_reusable_after_failure() {
        let mut compiler = ShaderCompiler::new();
        assert!(compiler.compile_stage(StageKind::Vertex, "not glsl").is_err());
        assert!(compiler
            .compile_stage(StageKind::Vertex, DEFAULT_VERTEX_SHADER)
            .is_ok());
    }

    #[test]
    fn stage_kind_display() {
        assert_eq!(StageKind::Vertex.to_string(), "vertex");
        assert_eq!(StageKind::Fragment.to_string(), "fragment");
    }
}
