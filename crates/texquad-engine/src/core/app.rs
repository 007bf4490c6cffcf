use crate::window::EventSender;
use crate::RenderError;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Index of a render target in the runtime's target list.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TargetId(pub usize);

/// User event addressed to one render target.
pub trait TargetEvent: Send + 'static {
    fn target(&self) -> TargetId;
}

/// Application contract implemented by higher layers.
///
/// All callbacks run on the event-loop thread, which owns every GPU context.
pub trait App {
    type Event: TargetEvent;

    /// Called once when a target's window and GPU context exist.
    fn on_window_ready(
        &mut self,
        ctx: &mut FrameCtx<'_, '_>,
        events: &EventSender<Self::Event>,
    ) -> AppControl;

    /// Called for each user event, with the addressed target's context.
    fn on_event(&mut self, ctx: &mut FrameCtx<'_, '_>, event: Self::Event) -> AppControl;

    /// Called when the platform asks a window to repaint.
    fn on_redraw(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let _ = ctx;
        AppControl::Continue
    }

    /// Called when a target could not get a window or GPU context.
    fn on_window_failed(&mut self, target: TargetId, error: &RenderError) {
        let _ = (target, error);
    }
}
