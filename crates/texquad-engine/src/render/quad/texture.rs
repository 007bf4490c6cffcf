use crate::media::PixelSource;
use crate::RenderError;

/// Sampling policy for quad textures: clamp-to-edge, nearest, no mipmaps.
pub fn sampler_descriptor() -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("texquad nearest sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    }
}

/// Texture format that passes image bytes through unchanged to `surface_format`.
pub fn texture_format_for(surface_format: wgpu::TextureFormat) -> wgpu::TextureFormat {
    if surface_format.is_srgb() {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    }
}

/// An uploaded RGBA8 image.
pub struct QuadTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
}

impl QuadTexture {
    /// Creates a texture sized to `source` and uploads its pixels.
    ///
    /// `name` identifies the asset in errors.
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        source: &dyn PixelSource,
        name: &str,
    ) -> Result<Self, RenderError> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(RenderError::asset(name, "image has zero size"));
        }

        let max = device.limits().max_texture_dimension_2d;
        if width > max || height > max {
            return Err(RenderError::asset(
                name,
                format!("{width}x{height} exceeds the device texture limit of {max}"),
            ));
        }

        let pixels = source.rgba8();
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RenderError::asset(
                name,
                format!("expected {expected} bytes of RGBA8, got {}", pixels.len()),
            ));
        }

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("texquad image texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Ok(Self {
            texture,
            view,
            width,
            height,
        })
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Frees the GPU memory now instead of waiting for the last handle to drop.
    pub fn release(self) {
        self.texture.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampler_has_no_mipmaps_or_linear_filtering() {
        let desc = sampler_descriptor();
        assert_eq!(desc.address_mode_w, wgpu::AddressMode::ClampToEdge);
        assert_eq!(desc.min_filter, wgpu::FilterMode::Nearest);
        assert_eq!(desc.mag_filter, wgpu::FilterMode::Nearest);
        assert_eq!(desc.compare, None);
        assert_eq!(desc.anisotropy_clamp, 1);
    }

    #[test]
    fn texture_format_follows_surface_encoding() {
        assert_eq!(
            texture_format_for(wgpu::TextureFormat::Bgra8UnormSrgb),
            wgpu::TextureFormat::Rgba8UnormSrgb
        );
        assert_eq!(
            texture_format_for(wgpu::TextureFormat::Bgra8Unorm),
            wgpu::TextureFormat::Rgba8Unorm
        );
    }
}
