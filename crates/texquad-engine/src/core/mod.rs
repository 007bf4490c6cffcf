//! Core engine-facing contracts.
//!
//! This module defines the stable interface between the runtime (platform loop)
//! and the application driving the render targets.

mod app;
mod ctx;

pub use app::{App, AppControl, TargetEvent, TargetId};
pub use ctx::{FrameCtx, WindowCtx};
