//! JPEG output and resizing.

use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, GrayImage, RgbImage};
use tracing::debug;

use crate::array::RenderedImage;
use crate::atomic::write_atomic;
use crate::error::{RenderError, RenderResult};

pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Resize to `width`, keeping the aspect ratio (`height = floor(width * h / w)`).
pub fn resize_to_width(image: &RenderedImage, width: usize) -> RenderResult<RenderedImage> {
    if width == 0 {
        return Err(RenderError::InvalidShape("target width must be at least 1".to_string()));
    }
    if width == image.width {
        return Ok(image.clone());
    }
    let height = ((width * image.height) / image.width).max(1);
    let (w, h) = (width as u32, height as u32);

    let data = match image.channels {
        1 => {
            let src = GrayImage::from_raw(image.width as u32, image.height as u32, image.data.clone())
                .ok_or_else(|| RenderError::InvalidShape("grayscale buffer size mismatch".to_string()))?;
            imageops::resize(&src, w, h, FilterType::Triangle).into_raw()
        }
        3 => {
            let src = RgbImage::from_raw(image.width as u32, image.height as u32, image.data.clone())
                .ok_or_else(|| RenderError::InvalidShape("RGB buffer size mismatch".to_string()))?;
            imageops::resize(&src, w, h, FilterType::Triangle).into_raw()
        }
        n => return Err(RenderError::InvalidShape(format!("cannot resize {n}-channel image"))),
    };

    debug!(from_width = image.width, from_height = image.height, width, height, "Resized image");
    RenderedImage::new(height, width, image.channels, data)
}

/// Encode as grayscale or RGB JPEG and move into place at `path`.
pub fn write_jpeg(image: &RenderedImage, path: &Path, quality: u8) -> RenderResult<()> {
    let color = match image.channels {
        1 => ColorType::L8,
        3 => ColorType::Rgb8,
        n => return Err(RenderError::InvalidShape(format!("cannot encode {n}-channel JPEG"))),
    };

    write_atomic(path, |writer| {
        let mut encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
        encoder.encode(&image.data, image.width as u32, image.height as u32, color)?;
        Ok(())
    })
}
