use winit::dpi::LogicalSize;
use winit::window::{Window, WindowId};

use crate::coords::ClientSize;
use crate::device::{Gpu, SurfaceErrorAction};
use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget};

use super::app::{AppControl, TargetId};

/// Per-window handles and immutable window metadata.
pub struct WindowCtx<'a> {
    pub id: WindowId,
    pub target: TargetId,
    pub window: &'a Window,
}

impl<'a> WindowCtx<'a> {
    /// Returns the client size in whole logical pixels.
    pub fn client_size(&self) -> ClientSize {
        let logical: LogicalSize<u32> =
            self.window.inner_size().to_logical(self.device_pixel_ratio());
        ClientSize::new(logical.width, logical.height)
    }

    /// Physical pixels per logical pixel.
    pub fn device_pixel_ratio(&self) -> f64 {
        self.window.scale_factor()
    }

    pub fn set_title(&self, title: &str) {
        self.window.set_title(title);
    }
}

/// Per-callback context passed to `core::App`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Renderer context for work outside a frame (uploads, buffer writes).
    ///
    /// The viewport is the backing store as last synced.
    pub fn render_ctx(&self) -> RenderCtx<'_> {
        RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            self.gpu.size(),
        )
    }

    /// Syncs the backing store to the current client size and pixel ratio,
    /// acquires a frame, calls `draw` with a ready [`RenderCtx`] and
    /// [`RenderTarget`], then presents it.
    ///
    /// `draw` owns the whole pass, including its clear. Does nothing once the
    /// GPU context is halted.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        if self.gpu.is_halted() {
            return AppControl::Continue;
        }

        let viewport = self
            .gpu
            .sync_backing_store(self.window.client_size(), self.window.device_pixel_ratio());
        if viewport.is_empty() {
            return AppControl::Continue;
        }

        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::warn!("failed to acquire frame: {err}");
                match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Reconfigured => self.window.window.request_redraw(),
                    SurfaceErrorAction::SkipFrame => {}
                    SurfaceErrorAction::Fatal => log::error!(
                        "target {}: surface unusable, drawing halted",
                        self.window.target.0
                    ),
                }
                return AppControl::Continue;
            }
        };

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
            frame.viewport,
        );

        // RenderTarget borrows frame.encoder; dropped before submit() takes frame.
        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            draw(&rctx, &mut target);
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);

        AppControl::Continue
    }

    /// Presents a frame cleared to `color` and nothing else.
    pub fn clear(&mut self, color: Color) -> AppControl {
        self.render(|_, target| {
            let _rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("texquad clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(color.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        })
    }
}
