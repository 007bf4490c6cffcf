mod app;
mod config;

use anyhow::Result;
use clap::Parser;

use texquad_engine::core::TargetId;
use texquad_engine::device::GpuInit;
use texquad_engine::logging::{init_logging, LoggingConfig};
use texquad_engine::media::{AssetKind, AssetRequest};
use texquad_engine::window::{LogicalSize, Runtime, RuntimeConfig};

use app::{Target, Viewer};
use config::Args;

const VIDEO_TARGET: TargetId = TargetId(0);
const IMAGE_TARGET: TargetId = TargetId(1);

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(LoggingConfig {
        env_filter: args.log.clone(),
        ..Default::default()
    });

    let shaders = args.shader_sources()?;

    let plan = [
        (
            "texquad: video",
            AssetRequest {
                target: VIDEO_TARGET,
                source: args.video.clone(),
                kind: AssetKind::Video {
                    seek: args.video_time,
                },
            },
        ),
        (
            "texquad: image",
            AssetRequest {
                target: IMAGE_TARGET,
                source: args.image.clone(),
                kind: AssetKind::Still,
            },
        ),
    ];

    let windows = plan
        .iter()
        .map(|(title, _)| RuntimeConfig {
            title: title.to_string(),
            initial_size: LogicalSize::new(args.width, args.height),
        })
        .collect();
    let targets = plan
        .into_iter()
        .map(|(title, request)| Target::new(title, request))
        .collect();

    let viewer = Viewer::new(shaders, args.scale_divisor, targets);
    Runtime::run(windows, GpuInit::default(), viewer)
}
