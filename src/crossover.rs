//─────────────────────────────────────────────────────────────────────────────
// raster-level recombination: four strategies over premultiplied pixel buffers
//─────────────────────────────────────────────────────────────────────────────

use rand::Rng;
use rand_distr::StandardNormal;
use rayon::prelude::*;

use crate::geom::tiles;
use crate::render::PixelBuffer;

/// categorical weights for strategy choice (sum to 1.0)
pub const BLEND_WEIGHT: f64 = 0.3;
pub const POINT_SPLIT_WEIGHT: f64 = 0.4;
pub const GAUSSIAN_WEIGHT: f64 = 0.2;
pub const PATCH_SWAP_WEIGHT: f64 = 0.1;

/// std-dev of the per-row perturbation, in channel units
pub const GAUSSIAN_NOISE_SCALE: f64 = 0.1;
/// patch-swap tile edge in pixels
pub const PATCH_SIZE: u32 = 8;
/// chance that any one tile is swapped
pub const PATCH_SWAP_PROBABILITY: f64 = 0.3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrossoverStrategy {
    /// per-strip linear interpolation with one random factor per strip
    Blend,
    /// single horizontal or vertical cut
    PointSplit,
    /// parent mean plus/minus a small normal sample
    GaussianPerturbation,
    /// random 8×8 tiles exchanged between copies of the parents
    PatchSwap,
}

impl CrossoverStrategy {
    pub const WEIGHTED: [(CrossoverStrategy, f64); 4] = [
        (CrossoverStrategy::Blend, BLEND_WEIGHT),
        (CrossoverStrategy::PointSplit, POINT_SPLIT_WEIGHT),
        (CrossoverStrategy::GaussianPerturbation, GAUSSIAN_WEIGHT),
        (CrossoverStrategy::PatchSwap, PATCH_SWAP_WEIGHT),
    ];

    /// map a uniform draw in [0,1) onto the weighted bands
    pub fn from_unit(r: f64) -> Self {
        let mut cumulative = 0.0;
        for (strategy, weight) in Self::WEIGHTED {
            cumulative += weight;
            if r < cumulative {
                return strategy;
            }
        }
        CrossoverStrategy::PatchSwap
    }

    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        Self::from_unit(rng.random::<f64>())
    }

    pub fn apply<R: Rng>(self, p1: &PixelBuffer, p2: &PixelBuffer, rng: &mut R) -> (PixelBuffer, PixelBuffer) {
        match self {
            CrossoverStrategy::Blend => blend(p1, p2, rng),
            CrossoverStrategy::PointSplit => point_split(p1, p2, rng),
            CrossoverStrategy::GaussianPerturbation => gaussian_perturbation(p1, p2, rng),
            CrossoverStrategy::PatchSwap => patch_swap(p1, p2, rng),
        }
    }
}

/// recombine two equally sized parents into two children using a randomly chosen strategy
pub fn crossover<R: Rng>(p1: &PixelBuffer, p2: &PixelBuffer, rng: &mut R) -> (PixelBuffer, PixelBuffer) {
    profiling::scope!("crossover");
    CrossoverStrategy::sample(rng).apply(p1, p2, rng)
}

#[inline]
fn assert_same_size(p1: &PixelBuffer, p2: &PixelBuffer) {
    assert!(
        p1.same_dimensions(p2),
        "crossover parents differ in size: {}x{} vs {}x{}",
        p1.width(),
        p1.height(),
        p2.width(),
        p2.height()
    );
}

/// rows per strip when the image is split across the rayon pool
#[inline]
fn rows_per_strip(height: u32) -> usize {
    let strips = rayon::current_num_threads().clamp(1, height.max(1) as usize);
    (height as usize).div_ceil(strips).max(1)
}

/// blend crossover: strips of rows are processed in parallel, each with its own
/// factor α. child1 = p1·(1-α) + p2·α, child2 the complementary mix, truncated.
pub fn blend<R: Rng>(p1: &PixelBuffer, p2: &PixelBuffer, rng: &mut R) -> (PixelBuffer, PixelBuffer) {
    profiling::scope!("blend");
    assert_same_size(p1, p2);

    let (w, h) = (p1.width(), p1.height());
    let mut c1 = PixelBuffer::new(w, h);
    let mut c2 = PixelBuffer::new(w, h);
    if p1.area() == 0 {
        return (c1, c2);
    }

    let strip_bytes = rows_per_strip(h) * p1.stride();
    let strips = p1.data().len().div_ceil(strip_bytes);
    let alphas: Vec<f64> = (0..strips).map(|_| rng.random::<f64>()).collect();

    c1.data_mut()
        .par_chunks_mut(strip_bytes)
        .zip(c2.data_mut().par_chunks_mut(strip_bytes))
        .zip(p1.data().par_chunks(strip_bytes).zip(p2.data().par_chunks(strip_bytes)))
        .zip(alphas.par_iter())
        .for_each(|(((o1, o2), (a, b)), &alpha)| {
            for i in 0..o1.len() {
                let x = a[i] as f64;
                let y = b[i] as f64;
                o1[i] = (x * (1.0 - alpha) + y * alpha) as u8;
                o2[i] = (x * alpha + y * (1.0 - alpha)) as u8;
            }
        });

    (c1, c2)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitOrientation {
    /// cut between rows: top part / bottom part
    Horizontal,
    /// cut between columns: left part / right part
    Vertical,
}

/// single-point crossover with a random orientation and a cut uniformly in (0, dimension).
/// an axis with fewer than two pixels cannot be cut, so the other one is used; a 1×1
/// image yields copies of the parents.
pub fn point_split<R: Rng>(p1: &PixelBuffer, p2: &PixelBuffer, rng: &mut R) -> (PixelBuffer, PixelBuffer) {
    assert_same_size(p1, p2);
    let (w, h) = (p1.width(), p1.height());

    let orientation = match (h >= 2, w >= 2) {
        (true, true) => {
            if rng.random_bool(0.5) {
                SplitOrientation::Horizontal
            } else {
                SplitOrientation::Vertical
            }
        }
        (true, false) => SplitOrientation::Horizontal,
        (false, true) => SplitOrientation::Vertical,
        (false, false) => return (p1.clone(), p2.clone()),
    };

    let dimension = match orientation {
        SplitOrientation::Horizontal => h,
        SplitOrientation::Vertical => w,
    };
    let split = rng.random_range(1..dimension);
    split_at(p1, p2, orientation, split)
}

/// deterministic half of `point_split`. child1 takes p1 before the cut and p2 after it,
/// child2 the mirror. `split` counts rows (horizontal) or columns (vertical).
pub fn split_at(
    p1: &PixelBuffer,
    p2: &PixelBuffer,
    orientation: SplitOrientation,
    split: u32,
) -> (PixelBuffer, PixelBuffer) {
    profiling::scope!("split_at");
    assert_same_size(p1, p2);

    let mut c1 = p2.clone();
    let mut c2 = p1.clone();
    let stride = p1.stride();

    match orientation {
        SplitOrientation::Horizontal => {
            assert!(split <= p1.height(), "split row {split} outside image");
            // contiguous region copy: everything above the cut
            let cut = split as usize * stride;
            c1.data_mut()[..cut].copy_from_slice(&p1.data()[..cut]);
            c2.data_mut()[..cut].copy_from_slice(&p2.data()[..cut]);
        }
        SplitOrientation::Vertical => {
            assert!(split <= p1.width(), "split column {split} outside image");
            // per-row segment copy: the left part of every row
            let cut = split as usize * 4;
            for row in 0..p1.height() as usize {
                let seg = row * stride..row * stride + cut;
                c1.data_mut()[seg.clone()].copy_from_slice(&p1.data()[seg.clone()]);
                c2.data_mut()[seg.clone()].copy_from_slice(&p2.data()[seg]);
            }
        }
    }

    (c1, c2)
}

/// children are the parents' per-channel mean shifted up (child1) or down (child2)
/// by one normal sample of scale 0.1. one sample is drawn per ROW so bands differ.
pub fn gaussian_perturbation<R: Rng>(
    p1: &PixelBuffer,
    p2: &PixelBuffer,
    rng: &mut R,
) -> (PixelBuffer, PixelBuffer) {
    profiling::scope!("gaussian_perturbation");
    assert_same_size(p1, p2);

    let (w, h) = (p1.width(), p1.height());
    let mut c1 = PixelBuffer::new(w, h);
    let mut c2 = PixelBuffer::new(w, h);
    if p1.area() == 0 {
        return (c1, c2);
    }

    let stride = p1.stride();
    let noise: Vec<f64> = (0..h)
        .map(|_| rng.sample::<f64, _>(StandardNormal) * GAUSSIAN_NOISE_SCALE)
        .collect();

    c1.data_mut()
        .par_chunks_mut(stride)
        .zip(c2.data_mut().par_chunks_mut(stride))
        .zip(p1.data().par_chunks(stride).zip(p2.data().par_chunks(stride)))
        .zip(noise.par_iter())
        .for_each(|(((o1, o2), (a, b)), &n)| {
            for i in 0..o1.len() {
                let mean = (a[i] as f64 + b[i] as f64) / 2.0;
                o1[i] = (mean + n).clamp(0.0, 255.0) as u8;
                o2[i] = (mean - n).clamp(0.0, 255.0) as u8;
            }
        });

    (c1, c2)
}

/// start from copies of the parents, then for every 8×8 tile (clipped at the edges)
/// swap its pixels between the two children with probability 0.3
pub fn patch_swap<R: Rng>(p1: &PixelBuffer, p2: &PixelBuffer, rng: &mut R) -> (PixelBuffer, PixelBuffer) {
    profiling::scope!("patch_swap");
    assert_same_size(p1, p2);

    let mut c1 = p1.clone();
    let mut c2 = p2.clone();
    let stride = p1.stride();

    for tile in tiles(p1.width(), p1.height(), PATCH_SIZE) {
        if rng.random::<f64>() >= PATCH_SWAP_PROBABILITY {
            continue;
        }
        for y in tile.y0..tile.y1 {
            let row = tile.row_bytes(y, stride);
            c1.data_mut()[row.clone()].copy_from_slice(&p2.data()[row.clone()]);
            c2.data_mut()[row.clone()].copy_from_slice(&p1.data()[row]);
        }
    }

    (c1, c2)
}
