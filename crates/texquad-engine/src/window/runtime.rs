use anyhow::{Context, Result};
use ouroboros::self_referencing;
use std::collections::HashMap;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::window::{Window, WindowId};

use crate::core::{App as CoreApp, AppControl, FrameCtx, TargetEvent, TargetId, WindowCtx};
use crate::device::{Gpu, GpuInit};
use crate::RenderError;

/// Per-target window configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "texquad".to_string(),
            initial_size: LogicalSize::new(800.0, 600.0),
        }
    }
}

/// Posts user events to the event-loop thread from any thread.
pub struct EventSender<E: 'static> {
    proxy: EventLoopProxy<E>,
}

impl<E: 'static> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self {
            proxy: self.proxy.clone(),
        }
    }
}

impl<E: 'static> EventSender<E> {
    /// Returns `false` if the loop has already exited; the event is dropped.
    pub fn send(&self, event: E) -> bool {
        match self.proxy.send_event(event) {
            Ok(()) => true,
            Err(_) => {
                log::debug!("event loop closed; dropping user event");
                false
            }
        }
    }
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window per entry in `targets` and drives `app` until every
    /// window is closed or a callback returns [`AppControl::Exit`].
    ///
    /// Target `i` is addressed as `TargetId(i)`.
    pub fn run<A>(targets: Vec<RuntimeConfig>, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + CoreApp,
    {
        anyhow::ensure!(!targets.is_empty(), "no render targets configured");

        let event_loop = EventLoop::<A::Event>::with_user_event()
            .build()
            .context("failed to create winit EventLoop")?;
        let events = EventSender {
            proxy: event_loop.create_proxy(),
        };
        let mut state = AppState::new(targets, gpu_init, app, events);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    target: TargetId,

    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    targets: Vec<RuntimeConfig>,
    gpu_init: GpuInit,
    app: A,
    events: EventSender<A::Event>,

    windows: HashMap<WindowId, WindowEntry>,
    by_target: HashMap<TargetId, WindowId>,
    started: bool,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(
        targets: Vec<RuntimeConfig>,
        gpu_init: GpuInit,
        app: A,
        events: EventSender<A::Event>,
    ) -> Self {
        Self {
            targets,
            gpu_init,
            app,
            events,
            windows: HashMap::new(),
            by_target: HashMap::new(),
            started: false,
            exit_requested: false,
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn create_window_entry(
        &mut self,
        event_loop: &ActiveEventLoop,
        target: TargetId,
        config: RuntimeConfig,
    ) -> std::result::Result<WindowId, RenderError> {
        let attrs = Window::default_attributes()
            .with_title(config.title)
            .with_inner_size(config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| RenderError::ContextUnavailable(format!("failed to create window: {e}")))?;

        let id = window.id();
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryTryBuilder {
            target,
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .map_err(|e| RenderError::ContextUnavailable(format!("{e:#}")))?;

        entry.with_gpu(|gpu| {
            let info = gpu.adapter_info();
            log::info!(
                "target {} on {} ({:?}), surface format {:?}",
                target.0,
                info.name,
                info.backend,
                gpu.surface_format()
            );
        });

        self.windows.insert(id, entry);
        self.by_target.insert(target, id);
        Ok(id)
    }

    fn destroy_window_entry(&mut self, id: WindowId) {
        if let Some(entry) = self.windows.remove(&id) {
            let target = entry.with_target(|t| *t);
            self.by_target.remove(&target);
        }
    }

    /// Runs `f` with the frame context of window `id`.
    fn with_frame_ctx<F>(&mut self, id: WindowId, f: F) -> AppControl
    where
        F: FnOnce(&mut A, &mut FrameCtx<'_, '_>, &EventSender<A::Event>) -> AppControl,
    {
        // Split borrows to avoid `self` capture inside `ouroboros` closures.
        let (app, windows, events) = (&mut self.app, &mut self.windows, &self.events);

        let Some(entry) = windows.get_mut(&id) else {
            return AppControl::Continue;
        };

        entry.with_mut(|fields| {
            let mut ctx = FrameCtx {
                window: WindowCtx {
                    id,
                    target: *fields.target,
                    window: fields.window,
                },
                gpu: fields.gpu,
            };
            f(app, &mut ctx, events)
        })
    }

    fn apply_control(&mut self, event_loop: &ActiveEventLoop, control: AppControl) {
        if control == AppControl::Exit {
            self.request_exit();
        }
        if self.exit_requested {
            event_loop.exit();
        }
    }
}

impl<A> ApplicationHandler<A::Event> for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.started {
            return;
        }
        self.started = true;

        let targets = std::mem::take(&mut self.targets);
        for (index, config) in targets.into_iter().enumerate() {
            let target = TargetId(index);
            match self.create_window_entry(event_loop, target, config) {
                Ok(id) => {
                    let control = self.with_frame_ctx(id, |app, ctx, events| {
                        app.on_window_ready(ctx, events)
                    });
                    if control == AppControl::Exit {
                        self.request_exit();
                    }
                }
                Err(e) => {
                    // Failure is per target; the others keep running.
                    log::error!("target {index}: {e}");
                    self.app.on_window_failed(target, &e);
                }
            }
        }

        if self.windows.is_empty() {
            log::error!("no render target could be created");
            self.request_exit();
        }

        self.apply_control(event_loop, AppControl::Continue);
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: A::Event) {
        let target = event.target();
        let Some(&id) = self.by_target.get(&target) else {
            log::debug!("dropping event for closed target {}", target.0);
            return;
        };

        let control = self.with_frame_ctx(id, |app, ctx, _| app.on_event(ctx, event));
        self.apply_control(event_loop, control);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Draws are event-driven: asset arrivals and OS repaint requests.
        event_loop.set_control_flow(ControlFlow::Wait);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.destroy_window_entry(window_id);
                if self.windows.is_empty() {
                    self.request_exit();
                }
                self.apply_control(event_loop, AppControl::Continue);
            }

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                // The backing store is re-synced at the start of the next draw.
                if let Some(entry) = self.windows.get(&window_id) {
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => {
                let control = self.with_frame_ctx(window_id, |app, ctx, _| app.on_redraw(ctx));
                self.apply_control(event_loop, control);
            }

            _ => {}
        }
    }
}
