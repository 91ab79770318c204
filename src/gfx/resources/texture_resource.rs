//! Texture resource management for wgpu
//!
//! Depth targets, the shadow map and sampled color textures all share the
//! same texture/view/sampler bundle.

use std::path::Path;

use log::info;

use crate::error::{Error, Result};

/// Largest texture edge the render device is asked to support.
pub const MAX_TEXTURE_DIMENSION: u32 = 4096;

/// Fails with [`Error::TextureTooLarge`] when either edge exceeds `max`.
pub fn check_texture_size(path: &Path, width: u32, height: u32, max: u32) -> Result<()> {
    if width > max || height > max {
        return Err(Error::TextureTooLarge {
            path: path.to_path_buf(),
            width,
            height,
            max,
        });
    }
    Ok(())
}

/// GPU texture resource containing texture, view, and sampler
#[derive(Clone)]
pub struct TextureResource {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl TextureResource {
    /// Depth format used for both the main depth buffer and the shadow map
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Creates a depth buffer matching the surface dimensions.
    pub fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        label: &str,
    ) -> Self {
        Self::create_depth(device, config.width.max(1), config.height.max(1), label)
    }

    /// Creates the square depth texture the shadow pass renders into.
    ///
    /// The sampler compares with `LessEqual`, so a fragment whose light-space
    /// depth is at or in front of the stored depth samples as lit.
    pub fn create_shadow_map(device: &wgpu::Device, size: u32) -> Self {
        Self::create_depth(device, size.max(1), size.max(1), "Shadow Map")
    }

    fn create_depth(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }

    /// Decodes an image file and uploads it as an RGBA8 texture. Texel values
    /// are used as stored, without sRGB decoding. Images larger than the
    /// device's 2D texture limit are refused before anything is created.
    pub fn load(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path) -> Result<Self> {
        let (width, height) = image::image_dimensions(path).map_err(|source| Error::Texture {
            path: path.to_path_buf(),
            source,
        })?;
        check_texture_size(path, width, height, device.limits().max_texture_dimension_2d)?;

        let image = image::open(path)
            .map_err(|source| Error::Texture {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (width, height) = image.dimensions();
        info!("Loaded texture {} ({}x{})", path.display(), width, height);

        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Texture".to_string());
        Ok(Self::create_from_rgba_data(
            device, queue, &image, width, height, &label,
        ))
    }

    /// 1x1 white texture bound for draws that have no texture of their own.
    pub fn create_white(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self::create_from_rgba_data(device, queue, &[255; 4], 1, 1, "White Texture")
    }

    /// Creates a 2D texture from raw RGBA8 data with repeat addressing and
    /// linear filtering.
    pub fn create_from_rgba_data(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        data: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
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
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Torus s coordinates run to 2.0, so wrap instead of clamping.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_size_limit() {
        let path = Path::new("earthmap1k.jpg");
        assert!(check_texture_size(path, 1024, 512, MAX_TEXTURE_DIMENSION).is_ok());
        assert!(check_texture_size(path, 4096, 4096, MAX_TEXTURE_DIMENSION).is_ok());

        match check_texture_size(path, 8192, 4096, MAX_TEXTURE_DIMENSION) {
            Err(Error::TextureTooLarge { width, max, .. }) => {
                assert_eq!(width, 8192);
                assert_eq!(max, 4096);
            }
            other => panic!("expected an oversized texture error, got {:?}", other),
        }
        assert!(check_texture_size(path, 16, 4097, MAX_TEXTURE_DIMENSION).is_err());
    }
}
