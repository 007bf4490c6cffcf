//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and one Window per render target, and wires them
//! to the GPU layer.

mod runtime;

pub use runtime::{EventSender, Runtime, RuntimeConfig};
pub use winit::dpi::LogicalSize;
