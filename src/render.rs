use tiny_skia as sk;

use crate::dna::Polygon;
use crate::error::{Error, Result};

/// fixed-size RGBA raster. bytes are kept PREMULTIPLIED (tiny-skia's native
/// format) so polygons can be rasterised straight into the buffer without a
/// conversion pass; targets loaded from disk are premultiplied once on the way in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// transparent-black canvas
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize) * 4;
        Self { width, height, data: vec![0u8; len] }
    }

    /// wrap premultiplied bytes. the length must be exactly width*height*4
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(Error::BufferSize { expected, actual: data.len() });
        }
        Ok(Self { width, height, data })
    }

    /// wrap straight (un-premultiplied) RGBA, e.g. straight from an image decoder
    pub fn from_straight(width: u32, height: u32, data: &[u8]) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(Error::BufferSize { expected, actual: data.len() });
        }
        Ok(Self { width, height, data: premultiply(data) })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// number of pixels (the "image area" used by the mutation heuristics)
    #[inline]
    pub fn area(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// bytes per row
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    #[inline]
    pub fn same_dimensions(&self, other: &PixelBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// premultiplied RGBA of a single pixel
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [self.data[idx], self.data[idx + 1], self.data[idx + 2], self.data[idx + 3]]
    }

    /// overwrite every pixel with one straight RGBA colour (source copy, no blending)
    pub fn fill(&mut self, rgba: [u8; 4]) {
        profiling::scope!("PixelBuffer::fill");
        let premul = premultiply(&rgba);
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&premul);
        }
    }

    /// un-premultiplied copy of the pixels, for encoders
    pub fn to_straight(&self) -> Vec<u8> {
        demultiply(&self.data)
    }

    /// rasterise one filled, anti-aliased polygon over the current contents (source-over)
    pub fn draw_polygon(&mut self, poly: &Polygon) {
        profiling::scope!("draw_polygon");
        if poly.points.len() < 3 {
            return;
        }

        let Some(mut pix) = sk::PixmapMut::from_bytes(&mut self.data, self.width, self.height) else {
            debug_assert!(false, "pixel buffer has invalid dimensions");
            return;
        };

        let mut pb = sk::PathBuilder::new();
        let (x0, y0) = poly.points[0];
        pb.move_to(x0 as f32, y0 as f32);
        for &(x, y) in &poly.points[1..] {
            pb.line_to(x as f32, y as f32);
        }
        pb.close();
        // collinear or single-point polygons have no area; nothing to draw
        let Some(path) = pb.finish() else {
            return;
        };

        let [r, g, b, a] = poly.rgba;
        let mut paint = sk::Paint::default();
        paint.anti_alias = true;
        paint.shader = sk::Shader::SolidColor(sk::Color::from_rgba8(r, g, b, a));

        pix.fill_path(&path, &paint, sk::FillRule::Winding, sk::Transform::identity(), None);
    }
}

/// premultiply RGBA - scalar loop the compiler auto-vectorizes
#[inline(always)]
pub fn premultiply(p: &[u8]) -> Vec<u8> {
    profiling::scope!("premultiply");

    let mut out = vec![0u8; p.len()];
    for (src, dst) in p.chunks_exact(4).zip(out.chunks_exact_mut(4)) {
        let a = src[3] as u16;
        // (x * a + 127) / 255 is a fast rounded divide-by-255
        dst[0] = ((src[0] as u16 * a + 127) / 255) as u8;
        dst[1] = ((src[1] as u16 * a + 127) / 255) as u8;
        dst[2] = ((src[2] as u16 * a + 127) / 255) as u8;
        dst[3] = a as u8;
    }
    out
}

/// inverse of `premultiply`. fully transparent pixels come back as transparent black.
/// crossover can leave colour channels above alpha, so results are clamped.
pub fn demultiply(p: &[u8]) -> Vec<u8> {
    profiling::scope!("demultiply");

    let mut out = vec![0u8; p.len()];
    for (src, dst) in p.chunks_exact(4).zip(out.chunks_exact_mut(4)) {
        let a = src[3] as u32;
        if a == 0 {
            continue;
        }
        for c in 0..3 {
            dst[c] = ((src[c] as u32 * 255 + a / 2) / a).min(255) as u8;
        }
        dst[3] = a as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_premul_rejects_wrong_length() {
        let err = PixelBuffer::from_premul(4, 4, vec![0u8; 10]).unwrap_err();
        assert!(matches!(err, Error::BufferSize { expected: 64, actual: 10 }));
    }

    #[test]
    fn opaque_pixels_survive_premultiply() {
        let straight = [10u8, 20, 30, 255, 200, 100, 0, 255];
        let buf = PixelBuffer::from_straight(2, 1, &straight).unwrap();
        assert_eq!(buf.data(), &straight);
        assert_eq!(buf.to_straight(), straight.to_vec());
    }

    #[test]
    fn premultiply_scales_by_alpha() {
        let out = premultiply(&[255, 128, 0, 128]);
        assert_eq!(out, vec![128, 64, 0, 128]);
    }

    #[test]
    fn fill_sets_every_pixel() {
        let mut buf = PixelBuffer::new(3, 2);
        buf.fill([1, 2, 3, 255]);
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(buf.pixel(x, y), [1, 2, 3, 255]);
            }
        }
    }

    #[test]
    fn opaque_polygon_covers_its_interior_only() {
        let mut buf = PixelBuffer::new(20, 20);
        buf.fill([255, 255, 255, 255]);
        let square = Polygon {
            points: vec![(2, 2), (10, 2), (10, 10), (2, 10)],
            rgba: [255, 0, 0, 255],
        };
        buf.draw_polygon(&square);

        assert_eq!(buf.pixel(5, 5), [255, 0, 0, 255]);
        assert_eq!(buf.pixel(15, 15), [255, 255, 255, 255]);
    }

    #[test]
    fn polygon_with_two_points_draws_nothing() {
        let mut buf = PixelBuffer::new(8, 8);
        buf.fill([9, 9, 9, 255]);
        let before = buf.clone();
        let line = Polygon { points: vec![(1, 1), (6, 6)], rgba: [0, 0, 0, 255] };
        buf.draw_polygon(&line);
        assert_eq!(buf, before);
    }
}
