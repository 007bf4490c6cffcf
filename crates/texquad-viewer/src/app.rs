use texquad_engine::core::{App, AppControl, FrameCtx, TargetId};
use texquad_engine::media::{spawn_load, AssetEvent, AssetRequest, PixelSource};
use texquad_engine::paint::Color;
use texquad_engine::render::quad::{scaled_quad_size, QuadRenderer};
use texquad_engine::shader::ShaderCompiler;
use texquad_engine::window::EventSender;
use texquad_engine::RenderError;

use crate::config::ShaderSources;

/// One render target: its window title, the asset it shows, and its renderer.
pub struct Target {
    title: String,
    request: Option<AssetRequest>,
    renderer: Option<QuadRenderer>,
    failed: bool,
}

impl Target {
    pub fn new(title: impl Into<String>, request: AssetRequest) -> Self {
        Self {
            title: title.into(),
            request: Some(request),
            renderer: None,
            failed: false,
        }
    }

    /// Halts the target: resources dropped, title marked, error color shown.
    fn fail(&mut self, ctx: Option<&mut FrameCtx<'_, '_>>, error: &RenderError) {
        log::error!("{}: {error}", self.title);
        self.failed = true;
        self.request = None;
        self.renderer = None;

        if let Some(ctx) = ctx {
            ctx.window.set_title(&format!("{} [failed]", self.title));
            ctx.clear(Color::ERROR);
        }
    }

    fn draw(&self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.failed {
            return ctx.clear(Color::ERROR);
        }
        match self.renderer.as_ref() {
            Some(renderer) if renderer.is_ready() => ctx.render(|rctx, target| {
                renderer.draw(rctx, target);
            }),
            _ => AppControl::Continue,
        }
    }
}

/// Two-target viewer: each window compiles the program, loads its asset in the
/// background and draws it once it arrives.
pub struct Viewer {
    compiler: ShaderCompiler,
    shaders: ShaderSources,
    scale_divisor: f32,
    targets: Vec<Target>,
}

impl Viewer {
    /// `targets[i]` is driven as `TargetId(i)`.
    pub fn new(shaders: ShaderSources, scale_divisor: f32, targets: Vec<Target>) -> Self {
        Self {
            compiler: ShaderCompiler::new(),
            shaders,
            scale_divisor,
            targets,
        }
    }

    fn target_mut(&mut self, id: TargetId) -> Option<&mut Target> {
        self.targets.get_mut(id.0)
    }
}

impl App for Viewer {
    type Event = AssetEvent;

    fn on_window_ready(
        &mut self,
        ctx: &mut FrameCtx<'_, '_>,
        events: &EventSender<AssetEvent>,
    ) -> AppControl {
        let id = ctx.window.target;
        let program = self.compiler.compile_program(
            ctx.gpu.device(),
            ctx.gpu.surface_format(),
            &self.shaders.vertex,
            &self.shaders.fragment,
        );

        let Some(target) = self.targets.get_mut(id.0) else {
            log::warn!("no target configured for window {}", id.0);
            return AppControl::Continue;
        };

        match program {
            Ok(program) => {
                target.renderer = Some(QuadRenderer::new(ctx.gpu.device(), program));
                if let Some(request) = target.request.take() {
                    log::info!("{}: loading `{}`", target.title, request.source);
                    spawn_load(request, events.clone());
                }
            }
            Err(e) => target.fail(Some(ctx), &e),
        }

        AppControl::Continue
    }

    fn on_event(&mut self, ctx: &mut FrameCtx<'_, '_>, event: AssetEvent) -> AppControl {
        let divisor = self.scale_divisor;
        let Some(target) = self.target_mut(event.target) else {
            return AppControl::Continue;
        };
        if target.failed {
            return AppControl::Continue;
        }

        let name = event.source.to_string();
        let asset = match event.result {
            Ok(asset) => asset,
            Err(e) => {
                target.fail(Some(ctx), &e);
                return AppControl::Continue;
            }
        };

        let Some(renderer) = target.renderer.as_mut() else {
            return AppControl::Continue;
        };
        let quad_size = scaled_quad_size(asset.dimensions(), divisor);
        let replaced = renderer.replace_asset(&ctx.render_ctx(), &asset, quad_size, &name);

        match replaced {
            Ok(()) => {
                let (w, h) = asset.dimensions();
                log::info!(
                    "{}: `{name}` loaded ({w}x{h}, quad {}x{})",
                    target.title,
                    quad_size[0],
                    quad_size[1]
                );
                target.draw(ctx)
            }
            Err(e) => {
                target.fail(Some(ctx), &e);
                AppControl::Continue
            }
        }
    }

    fn on_redraw(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        match self.target_mut(ctx.window.target) {
            Some(target) => target.draw(ctx),
            None => AppControl::Continue,
        }
    }

    fn on_window_failed(&mut self, id: TargetId, error: &RenderError) {
        if let Some(target) = self.target_mut(id) {
            target.fail(None, error);
        }
    }
}
