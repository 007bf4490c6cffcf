//! Coordinate and size primitives.
//!
//! - client sizes are in logical pixels (what the window manager reports
//!   before scaling)
//! - `Viewport` is in physical backing-store pixels

mod viewport;

pub use viewport::{backing_store_size, ClientSize, Viewport};
