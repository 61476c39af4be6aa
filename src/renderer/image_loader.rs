//! Image decoding and GPU upload.
//!
//! Float and 16-bit sources become `Rgba16Float` textures. 8-bit sources stay
//! 8-bit and let the texture format carry the sRGB interpretation, so the
//! sampler hands linear values to the passthrough shader either way.

use std::path::{Path, PathBuf};

use half::f16;
use image::{ColorType, DynamicImage};
use tracing::info;

use crate::color::srgb_to_linear_channel;
use crate::error::{PlaygroundError, Result};

/// CPU-side pixels ready for `write_texture`.
#[derive(Clone, Debug)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    pub fn size(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            wgpu::TextureFormat::Rgba16Float => 8,
            _ => 4,
        }
    }
}

pub fn decode_image(path: &Path, srgb: bool) -> Result<DecodedImage> {
    if path.as_os_str().is_empty() {
        return Err(PlaygroundError::EmptyPath);
    }
    let image = image::open(path).map_err(|source| PlaygroundError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decode_dynamic(&image, srgb))
}

/// Rejects images the device cannot hold as a single 2D texture.
pub fn check_dimensions(path: &Path, size: [u32; 2], max: u32) -> Result<()> {
    if size[0] > max || size[1] > max {
        return Err(PlaygroundError::ImageTooLarge {
            path: path.to_path_buf(),
            size,
            max,
        });
    }
    Ok(())
}

pub fn decode_dynamic(image: &DynamicImage, srgb: bool) -> DecodedImage {
    let (width, height) = (image.width(), image.height());
    match image.color() {
        ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8 => DecodedImage {
            width,
            height,
            format: if srgb {
                wgpu::TextureFormat::Rgba8UnormSrgb
            } else {
                wgpu::TextureFormat::Rgba8Unorm
            },
            bytes: image.to_rgba8().into_raw(),
        },
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16 => {
            let mut pixels = image.to_rgba32f().into_raw();
            if srgb {
                for px in pixels.chunks_exact_mut(4) {
                    for c in &mut px[..3] {
                        *c = srgb_to_linear_channel(*c);
                    }
                }
            }
            half_float_image(width, height, &pixels)
        }
        // 32-bit float sources are scene-referred already; the sRGB flag
        // has nothing to decode there.
        _ => half_float_image(width, height, &image.to_rgba32f().into_raw()),
    }
}

fn half_float_image(width: u32, height: u32, pixels: &[f32]) -> DecodedImage {
    let max = f16::MAX.to_f32();
    let bytes = pixels
        .iter()
        .flat_map(|&v| {
            let v = if v.is_finite() { v.clamp(-max, max) } else { 0.0 };
            f16::from_f32(v).to_le_bytes()
        })
        .collect();
    DecodedImage {
        width,
        height,
        format: wgpu::TextureFormat::Rgba16Float,
        bytes,
    }
}

/// The currently loaded input image. Dropping it releases the texture.
pub struct HdrImage {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub path: PathBuf,
    pub srgb: bool,
    size: [u32; 2],
}

impl HdrImage {
    pub fn load(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        path: &Path,
        srgb: bool,
    ) -> Result<Self> {
        let decoded = decode_image(path, srgb)?;
        check_dimensions(path, decoded.size(), device.limits().max_texture_dimension_2d)?;
        let image = Self::upload(device, queue, &decoded, path, srgb);
        info!(
            path = %path.display(),
            width = decoded.width,
            height = decoded.height,
            format = ?decoded.format,
            srgb,
            "loaded image"
        );
        Ok(image)
    }

    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        decoded: &DecodedImage,
        path: &Path,
        srgb: bool,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: decoded.width,
            height: decoded.height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("playground.hdr_image"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: decoded.format,
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
            &decoded.bytes,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(decoded.width * decoded.bytes_per_pixel()),
                rows_per_image: Some(decoded.height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            path: path.to_path_buf(),
            srgb,
            size: decoded.size(),
        }
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, Rgb32FImage, Rgba, RgbaImage};

    #[test]
    fn eight_bit_format_follows_srgb_flag() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 2, Rgba([128, 64, 32, 255])));

        let linear = decode_dynamic(&image, false);
        let srgb = decode_dynamic(&image, true);

        assert_eq!(linear.size(), [3, 2]);
        assert_eq!(srgb.size(), [3, 2]);
        assert_eq!(linear.format, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(srgb.format, wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(linear.bytes, srgb.bytes);
        assert_eq!(linear.bytes.len(), 3 * 2 * 4);
    }

    #[test]
    fn float_sources_become_half_float_and_ignore_srgb() {
        let image = DynamicImage::ImageRgb32F(Rgb32FImage::from_pixel(2, 2, Rgb([4.0, 1.0, 0.25])));

        let a = decode_dynamic(&image, false);
        let b = decode_dynamic(&image, true);

        assert_eq!(a.format, wgpu::TextureFormat::Rgba16Float);
        assert_eq!(a.bytes, b.bytes);
        assert_eq!(a.bytes.len(), 2 * 2 * 8);

        let r = f16::from_le_bytes([a.bytes[0], a.bytes[1]]).to_f32();
        let alpha = f16::from_le_bytes([a.bytes[6], a.bytes[7]]).to_f32();
        assert_eq!(r, 4.0);
        assert_eq!(alpha, 1.0);
    }

    #[test]
    fn out_of_range_floats_are_clamped_to_half_range() {
        let image = DynamicImage::ImageRgb32F(Rgb32FImage::from_pixel(
            1,
            1,
            Rgb([1.0e6, f32::NAN, 0.5]),
        ));
        let decoded = decode_dynamic(&image, false);
        let r = f16::from_le_bytes([decoded.bytes[0], decoded.bytes[1]]);
        let g = f16::from_le_bytes([decoded.bytes[2], decoded.bytes[3]]);
        assert_eq!(r, f16::MAX);
        assert_eq!(g.to_f32(), 0.0);
    }

    #[test]
    fn sixteen_bit_sources_decode_srgb_on_cpu() {
        let image = DynamicImage::ImageRgba16(image::ImageBuffer::from_pixel(
            1,
            1,
            Rgba([32768u16, 32768, 32768, 65535]),
        ));
        let linear = decode_dynamic(&image, false);
        let srgb = decode_dynamic(&image, true);
        let lin_r = f16::from_le_bytes([linear.bytes[0], linear.bytes[1]]).to_f32();
        let srgb_r = f16::from_le_bytes([srgb.bytes[0], srgb.bytes[1]]).to_f32();
        assert!((lin_r - 0.5).abs() < 1e-3);
        assert!(srgb_r < lin_r, "sRGB decode should darken mid-gray: {srgb_r}");
    }

    #[test]
    fn empty_path_is_rejected_before_decoding() {
        let err = decode_image(Path::new(""), false).unwrap_err();
        assert!(matches!(err, PlaygroundError::EmptyPath));
    }

    #[test]
    fn missing_file_is_an_image_load_error() {
        let err = decode_image(Path::new("/no/such/image.exr"), false).unwrap_err();
        match err {
            PlaygroundError::ImageLoad { path, .. } => {
                assert_eq!(path, PathBuf::from("/no/such/image.exr"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn images_wider_than_the_texture_limit_are_rejected() {
        let max = wgpu::Limits::default().max_texture_dimension_2d;
        let path = Path::new("panorama.exr");

        assert!(check_dimensions(path, [max, 1], max).is_ok());
        assert!(check_dimensions(path, [1, max], max).is_ok());

        let err = check_dimensions(path, [max + 1, 1], max).unwrap_err();
        match err {
            PlaygroundError::ImageTooLarge { size, max: limit, .. } => {
                assert_eq!(size, [max + 1, 1]);
                assert_eq!(limit, max);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(check_dimensions(path, [4, max + 1], max).is_err());
    }
}
