/// Euclidean colour distance in (R,G,B,A) space, summed over every pixel.
/// note: alpha is included because buffers are premultiplied, where alpha affects blending.
use rayon::prelude::*;

use crate::render::PixelBuffer;

/// distance summed over one band of whole rows. both slices cover the same rows.
#[inline]
fn band_distance(candidate: &[u8], target: &[u8]) -> f64 {
    debug_assert_eq!(candidate.len(), target.len());
    debug_assert_eq!(candidate.len() % 4, 0);

    candidate
        .chunks_exact(4)
        .zip(target.chunks_exact(4))
        .map(|(c, t)| {
            let dr = c[0] as i32 - t[0] as i32;
            let dg = c[1] as i32 - t[1] as i32;
            let db = c[2] as i32 - t[2] as i32;
            let da = c[3] as i32 - t[3] as i32;
            ((dr * dr + dg * dg + db * db + da * da) as f64).sqrt()
        })
        .sum()
}

/// mean per-pixel colour distance between `candidate` and `target`.
/// 0.0 means identical, lower is better.
///
/// the image is cut into one contiguous band of rows per rayon worker; bands are
/// scored in parallel and the partial sums are added in band order once all of
/// them are done, so the result does not depend on scheduling.
///
/// panics if the two buffers differ in size: every buffer in a run shares the
/// target's dimensions, so a mismatch is a bug in the caller.
pub fn color_distance(candidate: &PixelBuffer, target: &PixelBuffer) -> f64 {
    profiling::scope!("color_distance");
    assert!(
        candidate.same_dimensions(target),
        "fitness buffers differ in size: {}x{} vs {}x{}",
        candidate.width(),
        candidate.height(),
        target.width(),
        target.height()
    );

    let area = candidate.area();
    if area == 0 {
        return 0.0;
    }

    let height = candidate.height() as usize;
    let bands = rayon::current_num_threads().clamp(1, height);
    let band_bytes = height.div_ceil(bands) * candidate.stride();

    let partials: Vec<f64> = candidate
        .data()
        .par_chunks(band_bytes)
        .zip(target.data().par_chunks(band_bytes))
        .map(|(c, t)| band_distance(c, t))
        .collect();

    partials.iter().sum::<f64>() / area as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: u32, h: u32, rgba: [u8; 4]) -> PixelBuffer {
        let mut buf = PixelBuffer::new(w, h);
        buf.fill(rgba);
        buf
    }

    fn checker(w: u32, h: u32) -> PixelBuffer {
        let mut data = Vec::with_capacity((w * h * 4) as usize);
        for y in 0..h {
            for x in 0..w {
                if (x / 2 + y / 2) % 2 == 0 {
                    data.extend_from_slice(&[180, 50, 90, 255]);
                } else {
                    data.extend_from_slice(&[60, 200, 180, 255]);
                }
            }
        }
        PixelBuffer::from_straight(w, h, &data).unwrap()
    }

    #[test]
    fn identical_images_score_zero() {
        let a = checker(50, 50);
        let b = checker(50, 50);
        assert_eq!(color_distance(&a, &b), 0.0);
    }

    #[test]
    fn black_vs_white_is_full_rgb_diagonal() {
        let black = solid(7, 5, [0, 0, 0, 255]);
        let white = solid(7, 5, [255, 255, 255, 255]);
        let expected = (3.0f64 * 255.0 * 255.0).sqrt();
        assert!((color_distance(&black, &white) - expected).abs() < 1e-9);
    }

    #[test]
    fn single_row_image_is_scored() {
        // fewer rows than workers: every row still lands in exactly one band
        let a = solid(9, 1, [0, 0, 0, 255]);
        let b = solid(9, 1, [3, 4, 0, 255]);
        assert!((color_distance(&a, &b) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn odd_height_counts_every_row() {
        let a = solid(4, 13, [0, 0, 0, 0]);
        let mut b = a.clone();
        // one differing pixel in the very last row
        let last = b.data().len() - 4;
        b.data_mut()[last + 3] = 200;
        let expected = 200.0 / (4.0 * 13.0);
        assert!((color_distance(&b, &a) - expected).abs() < 1e-9);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = checker(11, 7);
        let b = solid(11, 7, [10, 20, 30, 255]);
        assert_eq!(color_distance(&a, &b), color_distance(&b, &a));
    }

    #[test]
    #[should_panic(expected = "differ in size")]
    fn mismatched_sizes_are_fatal() {
        color_distance(&PixelBuffer::new(4, 4), &PixelBuffer::new(4, 5));
    }
}
