//! GPU rendering subsystem.
//!
//! Convention:
//! - CPU geometry is in pixels (top-left origin, +Y down), anchored at the
//!   surface origin.
//! - The vertex shader converts to clip space using the `uResolution` uniform,
//!   which always holds the backing-store size.

mod ctx;
pub mod quad;

pub use ctx::{RenderCtx, RenderTarget};
