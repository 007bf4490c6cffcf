use super::SurfaceErrorAction;
use crate::coords::Viewport;

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    if prefer_srgb {
        let preferred = [
            wgpu::TextureFormat::Bgra8UnormSrgb,
            wgpu::TextureFormat::Rgba8UnormSrgb,
        ];
        for f in preferred {
            if caps.formats.contains(&f) {
                return Some(f);
            }
        }
    }

    Some(caps.formats[0])
}

/// Picks the requested alpha mode if supported, otherwise a premultiplied
/// mode so the transparent clear shows through, otherwise the first one.
pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| {
            caps.alpha_modes
                .iter()
                .copied()
                .find(|m| *m == wgpu::CompositeAlphaMode::PreMultiplied)
        })
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Reallocates the backing store if `target` differs from the configured size.
///
/// Returns `true` if the surface was reconfigured. wgpu cannot configure a
/// zero-sized surface; such sizes are recorded and configuration is deferred.
pub(crate) fn apply_backing_size(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut Viewport,
    target: Viewport,
) -> bool {
    if *size == target {
        return false;
    }

    *size = target;
    if target.is_empty() {
        return false;
    }

    config.width = target.width;
    config.height = target.height;
    surface.configure(device, config);
    true
}

pub(crate) fn surface_error_action(err: &wgpu::SurfaceError) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => SurfaceErrorAction::Reconfigured,
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: Viewport,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    let action = surface_error_action(&err);
    if action == SurfaceErrorAction::Reconfigured && !size.is_empty() {
        surface.configure(device, config);
    }
    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_out_of_memory_is_fatal() {
        use wgpu::SurfaceError as E;
        assert_eq!(surface_error_action(&E::Lost), SurfaceErrorAction::Reconfigured);
        assert_eq!(surface_error_action(&E::Outdated), SurfaceErrorAction::Reconfigured);
        assert_eq!(surface_error_action(&E::Timeout), SurfaceErrorAction::SkipFrame);
        assert_eq!(surface_error_action(&E::Other), SurfaceErrorAction::SkipFrame);
        assert_eq!(surface_error_action(&E::OutOfMemory), SurfaceErrorAction::Fatal);
    }
}
