use std::time::Duration;

use super::{AssetSource, PixelSource, StillImage, VideoClip, VideoFrame};
use crate::core::{TargetEvent, TargetId};
use crate::window::EventSender;
use crate::RenderError;

/// How the fetched bytes are interpreted.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum AssetKind {
    Still,
    /// Animated clip; the frame showing at `seek` is extracted.
    Video { seek: Duration },
}

/// One asset to load for one render target.
#[derive(Debug, Clone)]
pub struct AssetRequest {
    pub target: TargetId,
    pub source: AssetSource,
    pub kind: AssetKind,
}

/// Decoded pixels ready for upload.
#[derive(Debug, Clone)]
pub enum LoadedAsset {
    Still(StillImage),
    Frame(VideoFrame),
}

impl PixelSource for LoadedAsset {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            LoadedAsset::Still(still) => still.dimensions(),
            LoadedAsset::Frame(frame) => frame.dimensions(),
        }
    }

    fn rgba8(&self) -> &[u8] {
        match self {
            LoadedAsset::Still(still) => still.rgba8(),
            LoadedAsset::Frame(frame) => frame.rgba8(),
        }
    }
}

/// Completion notification for one [`AssetRequest`]. Delivered exactly once.
#[derive(Debug)]
pub struct AssetEvent {
    pub target: TargetId,
    pub source: AssetSource,
    pub result: Result<LoadedAsset, RenderError>,
}

impl TargetEvent for AssetEvent {
    fn target(&self) -> TargetId {
        self.target
    }
}

/// Fetches and decodes `request` on the calling thread.
pub fn load(request: &AssetRequest) -> Result<LoadedAsset, RenderError> {
    let name = request.source.to_string();
    let bytes = request.source.fetch()?;

    match request.kind {
        AssetKind::Still => StillImage::decode(&bytes)
            .map(LoadedAsset::Still)
            .map_err(|e| RenderError::asset(name, e)),
        AssetKind::Video { seek } => {
            let clip = VideoClip::decode(&bytes).map_err(|e| RenderError::asset(&name, e))?;
            log::debug!(
                "`{name}`: {} frames, {:?}; seeking to {seek:?}",
                clip.frame_count(),
                clip.duration()
            );
            clip.into_frame_at(seek)
                .map(LoadedAsset::Frame)
                .ok_or_else(|| RenderError::asset(name, "clip has no frames"))
        }
    }
}

/// Loads `request` on a worker thread and posts one [`AssetEvent`] to `events`.
///
/// There is no cancellation and no timeout.
pub fn spawn_load(request: AssetRequest, events: EventSender<AssetEvent>) {
    let worker_events = events.clone();
    let worker_request = request.clone();

    let spawned = std::thread::Builder::new()
        .name(format!("texquad-load-{}", request.target.0))
        .spawn(move || {
            let result = load(&worker_request);
            worker_events.send(AssetEvent {
                target: worker_request.target,
                source: worker_request.source,
                result,
            });
        });

    if let Err(e) = spawned {
        let name = request.source.to_string();
        events.send(AssetEvent {
            target: request.target,
            source: request.source,
            result: Err(RenderError::asset(name, format!("failed to start loader: {e}"))),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, RgbaImage};

    use super::*;

    fn write_png(name: &str, w: u32, h: u32) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("texquad-{}-{name}", std::process::id()));
        let mut bytes = Vec::new();
        RgbaImage::new(w, h)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn loads_still_from_file() {
        let path = write_png("still.png", 400, 300);
        let request = AssetRequest {
            target: TargetId(1),
            source: AssetSource::File(path.clone()),
            kind: AssetKind::Still,
        };
        let asset = load(&request).unwrap();
        std::fs::remove_file(path).ok();

        assert!(matches!(asset, LoadedAsset::Still(_)));
        assert_eq!(asset.dimensions(), (400, 300));
    }

    #[test]
    fn loads_video_frame_from_still_file() {
        let path = write_png("frame.png", 16, 9);
        let request = AssetRequest {
            target: TargetId(0),
            source: AssetSource::File(path.clone()),
            kind: AssetKind::Video { seek: Duration::from_secs(3) },
        };
        let asset = load(&request).unwrap();
        std::fs::remove_file(path).ok();

        assert!(matches!(asset, LoadedAsset::Frame(_)));
        assert_eq!(asset.dimensions(), (16, 9));
    }

    #[test]
    fn undecodable_file_is_an_asset_error() {
        let path = std::env::temp_dir().join(format!("texquad-{}-junk.bin", std::process::id()));
        std::fs::write(&path, b"junk").unwrap();
        let request = AssetRequest {
            target: TargetId(0),
            source: AssetSource::File(path.clone()),
            kind: AssetKind::Still,
        };
        let err = load(&request).unwrap_err();
        std::fs::remove_file(path).ok();

        assert!(matches!(err, RenderError::AssetLoad { .. }));
    }
}
