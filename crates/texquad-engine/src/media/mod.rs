//! Media sources for quad textures.
//!
//! Stills and single frames of animated clips both reach the renderer through
//! [`PixelSource`]. Retrieval and decode run off the event-loop thread; see
//! [`spawn_load`].

mod loader;
mod pixels;
mod source;
mod still;
mod video;

pub use loader::{load, spawn_load, AssetEvent, AssetKind, AssetRequest, LoadedAsset};
pub use pixels::PixelSource;
pub use source::AssetSource;
pub use still::StillImage;
pub use video::{VideoClip, VideoFrame, DEFAULT_FRAME_DELAY};
