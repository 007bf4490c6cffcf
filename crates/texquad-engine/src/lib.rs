//! texquad engine crate.
//!
//! Owns the GPU context, the shader compiler, the textured-quad renderer and
//! the media sources it draws, plus the window runtime that hosts them.

pub mod device;
pub mod window;
pub mod core;

pub mod logging;
pub mod coords;
pub mod paint;
pub mod shader;
pub mod render;
pub mod media;

mod error;

pub use error::RenderError;
