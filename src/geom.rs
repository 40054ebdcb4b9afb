use rand::Rng;

/// scatter a point around `anchor` by up to `radius` px on each axis, clamped to the canvas.
/// a radius below 1 is treated as 1.
#[inline]
pub fn jitter_point<R: Rng>(
    rng: &mut R,
    anchor: (i32, i32),
    radius: i32,
    width: u32,
    height: u32,
) -> (i32, i32) {
    let r = radius.max(1);
    let x = anchor.0 + rng.random_range(-r..r);
    let y = anchor.1 + rng.random_range(-r..r);
    (
        x.clamp(0, width as i32 - 1),
        y.clamp(0, height as i32 - 1),
    )
}

/// half-open pixel rectangle [x0, x1) × [y0, y1)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileRect {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl TileRect {
    #[inline]
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }

    /// byte range of row `y` inside a buffer whose rows are `stride` bytes long
    #[inline]
    pub fn row_bytes(&self, y: u32, stride: usize) -> std::ops::Range<usize> {
        let start = y as usize * stride + self.x0 as usize * 4;
        start..start + self.width() as usize * 4
    }
}

/// non-overlapping `size`×`size` tiles covering the canvas in row-major order.
/// tiles on the right/bottom edge are clipped to what is left.
pub fn tiles(width: u32, height: u32, size: u32) -> impl Iterator<Item = TileRect> {
    let size = size.max(1);
    (0..height).step_by(size as usize).flat_map(move |y0| {
        (0..width).step_by(size as usize).map(move |x0| TileRect {
            x0,
            y0,
            x1: (x0 + size).min(width),
            y1: (y0 + size).min(height),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn tiles_cover_canvas_exactly_once() {
        let (w, h) = (19u32, 10u32);
        let mut hits = vec![0u32; (w * h) as usize];
        for t in tiles(w, h, 8) {
            for y in t.y0..t.y1 {
                for x in t.x0..t.x1 {
                    hits[(y * w + x) as usize] += 1;
                }
            }
        }
        assert!(hits.iter().all(|&n| n == 1));
    }

    #[test]
    fn edge_tiles_are_clipped() {
        let all: Vec<TileRect> = tiles(10, 9, 8).collect();
        assert_eq!(all.len(), 4);
        assert_eq!(all[1], TileRect { x0: 8, y0: 0, x1: 10, y1: 8 });
        assert_eq!(all[3].height(), 1);
    }

    #[test]
    fn row_bytes_respects_stride() {
        let t = TileRect { x0: 2, y0: 0, x1: 5, y1: 3 };
        assert_eq!(t.row_bytes(1, 40), 48..60);
    }

    #[test]
    fn jitter_never_leaves_canvas() {
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..1000 {
            let (x, y) = jitter_point(&mut rng, (1, 1), 30, 4, 3);
            assert!((0..4).contains(&x));
            assert!((0..3).contains(&y));
        }
    }
}
