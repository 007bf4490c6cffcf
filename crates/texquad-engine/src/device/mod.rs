//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue for one window
//! - creating & configuring the Surface (the window's backing store)
//! - keeping the backing store in sync with the device pixel ratio
//! - acquiring frames and providing encoders/views for rendering

mod context;
mod error;
mod frame;
mod init;
mod surface;

pub use context::Gpu;
pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use init::GpuInit;

/// Device and queue on wgpu's no-op backend, for tests that need real
/// device objects but no adapter.
#[cfg(test)]
pub(crate) fn noop_device() -> (wgpu::Device, wgpu::Queue) {
    wgpu::Device::noop(&wgpu::DeviceDescriptor::default())
}
