use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use texquad_engine::media::AssetSource;
use texquad_engine::render::quad::{DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER};

/// Draws one frame of a video and one still image as textured quads.
#[derive(Debug, Clone, Parser)]
#[command(name = "texquad-viewer", version)]
pub struct Args {
    /// Animated image (GIF, APNG, WebP) to take the video frame from; path or http(s) URL.
    #[arg(long, default_value = "http://127.0.0.1:8887/rotated180.gif")]
    pub video: AssetSource,

    /// Still image to draw; path or http(s) URL.
    #[arg(long, default_value = "http://127.0.0.1:8887/shula.jpg")]
    pub image: AssetSource,

    /// Playback time of the video frame, in seconds.
    #[arg(long, default_value = "3", value_parser = parse_seconds)]
    pub video_time: Duration,

    /// Quad size is the asset size divided by this.
    #[arg(long, default_value_t = 4.0, value_parser = parse_divisor)]
    pub scale_divisor: f32,

    /// GLSL vertex shader replacing the built-in one.
    #[arg(long)]
    pub vertex_shader: Option<PathBuf>,

    /// GLSL fragment shader replacing the built-in one.
    #[arg(long)]
    pub fragment_shader: Option<PathBuf>,

    /// Initial logical window width.
    #[arg(long, default_value_t = 640.0)]
    pub width: f64,

    /// Initial logical window height.
    #[arg(long, default_value_t = 480.0)]
    pub height: f64,

    /// Log filter (env_logger syntax); overrides RUST_LOG.
    #[arg(long)]
    pub log: Option<String>,
}

impl Args {
    /// Reads the shader sources, falling back to the built-in pair.
    pub fn shader_sources(&self) -> Result<ShaderSources> {
        Ok(ShaderSources {
            vertex: read_or(self.vertex_shader.as_ref(), DEFAULT_VERTEX_SHADER)?,
            fragment: read_or(self.fragment_shader.as_ref(), DEFAULT_FRAGMENT_SHADER)?,
        })
    }
}

/// GLSL source text for both stages.
#[derive(Debug, Clone)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

fn read_or(path: Option<&PathBuf>, builtin: &str) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read shader `{}`", path.display())),
        None => Ok(builtin.to_string()),
    }
}

fn parse_seconds(s: &str) -> Result<Duration, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    Duration::try_from_secs_f64(v)
        .map_err(|_| "must be a finite, non-negative number of seconds in range".into())
}

fn parse_divisor(s: &str) -> Result<f32, String> {
    let v: f32 = s.parse().map_err(|e| format!("{e}"))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err("must be a positive number".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_scene() {
        let args = Args::try_parse_from(["texquad-viewer"]).unwrap();
        assert_eq!(args.video_time, Duration::from_secs(3));
        assert_eq!(args.scale_divisor, 4.0);
        assert!(matches!(args.video, AssetSource::Http(_)));
        assert!(matches!(args.image, AssetSource::Http(_)));
        assert!(args.log.is_none());
    }

    #[test]
    fn local_paths_become_file_sources() {
        let args = Args::try_parse_from([
            "texquad-viewer",
            "--image",
            "assets/shula.jpg",
            "--video",
            "HTTPS://example.com/clip.gif",
            "--video-time",
            "1.5",
        ])
        .unwrap();
        assert_eq!(args.image, AssetSource::File(PathBuf::from("assets/shula.jpg")));
        assert!(matches!(args.video, AssetSource::Http(_)));
        assert_eq!(args.video_time, Duration::from_millis(1500));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(Args::try_parse_from(["texquad-viewer", "--scale-divisor", "0"]).is_err());
        assert!(Args::try_parse_from(["texquad-viewer", "--video-time", "-1"]).is_err());
        assert!(Args::try_parse_from(["texquad-viewer", "--video-time", "nan"]).is_err());
        assert!(Args::try_parse_from(["texquad-viewer", "--video-time", "1e20"]).is_err());
    }

    #[test]
    fn large_but_valid_video_time_is_kept() {
        let args = Args::try_parse_from(["texquad-viewer", "--video-time", "86400"]).unwrap();
        assert_eq!(args.video_time, Duration::from_secs(86400));
    }

    #[test]
    fn builtin_shaders_without_overrides() {
        let args = Args::try_parse_from(["texquad-viewer"]).unwrap();
        let sources = args.shader_sources().unwrap();
        assert_eq!(sources.vertex, DEFAULT_VERTEX_SHADER);
        assert_eq!(sources.fragment, DEFAULT_FRAGMENT_SHADER);
    }

    #[test]
    fn missing_shader_file_is_an_error() {
        let args = Args::try_parse_from([
            "texquad-viewer",
            "--vertex-shader",
            "/nonexistent/texquad/quad.vert",
        ])
        .unwrap();
        assert!(args.shader_sources().is_err());
    }
}
