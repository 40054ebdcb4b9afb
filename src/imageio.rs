use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::path::Path;

use crate::error::{Error, Result};
use crate::render::PixelBuffer;

/// decode any format `image` understands into a premultiplied buffer
pub fn read(path: impl AsRef<Path>) -> Result<PixelBuffer> {
    profiling::scope!("imageio::read");
    let rgba = image::open(path.as_ref())?.to_rgba8();
    let (w, h) = rgba.dimensions();
    PixelBuffer::from_straight(w, h, rgba.as_raw())
}

/// encode `buffer` to `path`; the format follows the file extension
pub fn save(path: impl AsRef<Path>, buffer: &PixelBuffer) -> Result<()> {
    profiling::scope!("imageio::save");
    image::save_buffer(
        path.as_ref(),
        &buffer.to_straight(),
        buffer.width(),
        buffer.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(())
}

/// size that fits `width`×`height` into a `max_dim` square, keeping the aspect ratio
pub fn fit_within(width: u32, height: u32, max_dim: u32) -> (u32, u32) {
    let max_dim = max_dim.max(1);
    if width <= max_dim && height <= max_dim {
        return (width, height);
    }
    let scale = |side: u32, larger: u32| ((side as u64 * max_dim as u64) / larger as u64).max(1) as u32;
    if width >= height {
        (max_dim, scale(height, width))
    } else {
        (scale(width, height), max_dim)
    }
}

/// bilinear downscale so the larger side is at most `max_dim`; a copy when it already fits
pub fn resize(buffer: &PixelBuffer, max_dim: u32) -> Result<PixelBuffer> {
    profiling::scope!("imageio::resize");
    let (w, h) = (buffer.width(), buffer.height());
    let (nw, nh) = fit_within(w, h, max_dim);
    if (nw, nh) == (w, h) {
        return Ok(buffer.clone());
    }

    // premultiplied input keeps transparent edges from bleeding colour
    let src = RgbaImage::from_raw(w, h, buffer.data().to_vec()).ok_or(Error::BufferSize {
        expected: buffer.area() * 4,
        actual: buffer.data().len(),
    })?;
    let out = imageops::resize(&src, nw, nh, FilterType::Triangle);

    tracing::info!(from = ?(w, h), to = ?(nw, nh), "resized target");
    PixelBuffer::from_premul(nw, nh, out.into_raw())
}
