use dashmap::DashMap;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::prelude::*;

use crate::dna::{Individual, Polygon};

/// rates above this switch the mutator into its exploratory mode
/// (extra iterations and more vertices per polygon)
pub const AGGRESSIVE_RATE: f64 = 0.1;
/// lower bound of the random divisor scale
const DIVISOR_FLOOR: usize = 50;
/// multiplier applied to the log size to get the upper bound of the scale factor
const SCALE_FACTOR_SPAN: usize = 5;

/// largest power of ten that is <= n (1 for n < 10, including 0)
pub fn floor_power_of_ten(n: usize) -> usize {
    if n < 10 {
        return 1;
    }
    10usize.pow(n.ilog10())
}

/// uniform integer in the closed range spanned by `a` and `b` (order does not matter)
#[inline]
pub fn random_between<R: Rng>(rng: &mut R, a: usize, b: usize) -> usize {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    rng.random_range(lo..=hi)
}

/// per-area constants behind the polygon jitter radius. they only depend on
/// the canvas size, which is fixed for a run, so they are computed once per area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RadiusHeuristics {
    pub log_size: usize,    // decimal digits of the area
    pub floor_power: usize, // largest power of ten <= area
    pub max_limit: usize,   // 1/16 of the area, at least one pixel
}

impl RadiusHeuristics {
    pub fn for_area(area: usize) -> Self {
        Self {
            log_size: area.max(1).ilog10() as usize + 1,
            floor_power: floor_power_of_ten(area),
            max_limit: (area >> 4).max(1),
        }
    }
}

/// concurrent memo of `RadiusHeuristics` keyed by image area.
/// mutation tasks on different workers may miss on the same key at once; both
/// compute the same value and the first insert wins, which is harmless.
#[derive(Debug, Default)]
pub struct RadiusCache {
    entries: DashMap<usize, RadiusHeuristics>,
}

impl RadiusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, area: usize) -> RadiusHeuristics {
        if let Some(hit) = self.entries.get(&area) {
            return *hit;
        }
        let computed = RadiusHeuristics::for_area(area);
        *self.entries.entry(area).or_insert(computed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// polygon-injection mutation. owns the radius cache, so its lifetime is the engine's.
#[derive(Debug, Default)]
pub struct Mutator {
    cache: RadiusCache,
}

impl Mutator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &RadiusCache {
        &self.cache
    }

    /// with probability `1 - rate` hand `individual` back untouched: its pixel
    /// handle is returned as-is, so a shared buffer stays shared. otherwise paint
    /// 1-3 random translucent polygons onto it (up to 2 more when the rate is high).
    /// painting is copy-on-write: a buffer still shared with someone else is
    /// cloned first, one the caller owns outright is painted in place.
    pub fn mutate<R: Rng>(&self, individual: Individual, rate: f64, rng: &mut R) -> Individual {
        profiling::scope!("mutate");
        if rng.random::<f64>() >= rate {
            return individual;
        }

        let mut iterations = rng.random_range(1..=3);
        if rate > AGGRESSIVE_RATE && rng.random::<f64>() < rate * 2.0 {
            iterations += rng.random_range(0..=2);
        }

        let (width, height) = (individual.pixels.width(), individual.pixels.height());
        let heuristics = self.cache.get(individual.pixels.area());

        // sampling runs in parallel; committing to the one buffer has to be sequential
        let seeds: Vec<u64> = (0..iterations).map(|_| rng.random()).collect();
        let polys: Vec<Polygon> = seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = Pcg32::seed_from_u64(seed);
                random_polygon(&mut rng, rate, &heuristics, width, height)
            })
            .collect();

        let mut child = individual;
        child.paint(&polys);
        child
    }
}

/// jitter radius for one polygon:
/// clamp((area / max(1, rate·U[50, 10^⌊log area⌋])) / U[1, 5·log size], 1, area/16)
pub fn region_limit<R: Rng>(rng: &mut R, area: usize, rate: f64, heuristics: &RadiusHeuristics) -> usize {
    let scale_factor = random_between(rng, 1, heuristics.log_size * SCALE_FACTOR_SPAN);
    let divisor = rate * random_between(rng, DIVISOR_FLOOR, heuristics.floor_power) as f64;
    let limit = (area / divisor.max(1.0) as usize) / scale_factor;
    limit.clamp(1, heuristics.max_limit)
}

/// vertex count in 3..=6; in exploratory mode the larger of two draws, which favours more vertices
fn vertex_count<R: Rng>(rng: &mut R, rate: f64) -> usize {
    let n = rng.random_range(3..=6);
    if rate > AGGRESSIVE_RATE {
        n.max(rng.random_range(3..=6))
    } else {
        n
    }
}

fn random_polygon<R: Rng>(
    rng: &mut R,
    rate: f64,
    heuristics: &RadiusHeuristics,
    width: u32,
    height: u32,
) -> Polygon {
    let area = width as usize * height as usize;
    let limit = region_limit(rng, area, rate, heuristics).min(i32::MAX as usize) as i32;
    let num_points = vertex_count(rng, rate);
    let anchor = (
        rng.random_range(0..width) as i32,
        rng.random_range(0..height) as i32,
    );
    Polygon::random_around(rng, anchor, limit, num_points, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::PixelBuffer;
    use std::sync::Arc;

    fn blank(w: u32, h: u32) -> Individual {
        let mut pixels = PixelBuffer::new(w, h);
        pixels.fill([0, 0, 0, 255]);
        let mut ind = Individual::new(pixels);
        ind.fitness = 1.0;
        ind
    }

    #[test]
    fn floor_power_of_ten_table() {
        let cases = [
            (0, 1),
            (5, 1),
            (23, 10),
            (150, 100),
            (999, 100),
            (1001, 1000),
            (45_678, 10_000),
            (987_654, 100_000),
            (987_654_321, 100_000_000),
        ];
        for (n, want) in cases {
            assert_eq!(floor_power_of_ten(n), want, "n = {n}");
        }
    }

    #[test]
    fn random_between_accepts_either_order() {
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..200 {
            let v = random_between(&mut rng, 20, 10);
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn heuristics_for_small_canvas() {
        let h = RadiusHeuristics::for_area(400);
        assert_eq!(h, RadiusHeuristics { log_size: 3, floor_power: 100, max_limit: 25 });
        // tiny canvases still allow a one pixel radius
        assert_eq!(RadiusHeuristics::for_area(4).max_limit, 1);
    }

    #[test]
    fn cache_memoizes_per_area() {
        let cache = RadiusCache::new();
        assert!(cache.is_empty());
        let a = cache.get(400);
        let b = cache.get(400);
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
        cache.get(1600);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_survives_concurrent_misses() {
        let cache = RadiusCache::new();
        (0..64).into_par_iter().for_each(|i| {
            let area = 100 + (i % 4);
            assert_eq!(cache.get(area), RadiusHeuristics::for_area(area));
        });
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn region_limit_stays_in_bounds() {
        let mut rng = Pcg32::seed_from_u64(17);
        for &(area, rate) in &[(400usize, 0.05), (400, 0.4), (291_600, 0.01), (291_600, 1.0), (9, 0.2)] {
            let h = RadiusHeuristics::for_area(area);
            for _ in 0..200 {
                let limit = region_limit(&mut rng, area, rate, &h);
                assert!(limit >= 1 && limit <= h.max_limit, "area {area} rate {rate}: {limit}");
            }
        }
    }

    #[test]
    fn zero_rate_passes_through_without_copy() {
        let mutator = Mutator::new();
        let mut rng = Pcg32::seed_from_u64(1);
        let original = blank(10, 10);
        for _ in 0..50 {
            let out = mutator.mutate(original.clone(), 0.0, &mut rng);
            assert!(Arc::ptr_eq(&out.pixels, &original.pixels));
            assert_eq!(out.fitness, 1.0);
        }
        assert!(mutator.cache().is_empty());
    }

    #[test]
    fn full_rate_paints_a_fresh_buffer() {
        let mutator = Mutator::new();
        let mut rng = Pcg32::seed_from_u64(2);
        let original = blank(16, 16);
        let snapshot = (*original.pixels).clone();

        let out = mutator.mutate(original.clone(), 1.0, &mut rng);

        assert!(!Arc::ptr_eq(&out.pixels, &original.pixels));
        assert_eq!(*original.pixels, snapshot, "shared parent buffer must not change");
        assert!(!out.is_evaluated());
        assert!(out.pixels.same_dimensions(&original.pixels));
        assert_eq!(mutator.cache().len(), 1);
    }

    #[test]
    fn vertex_count_range() {
        let mut rng = Pcg32::seed_from_u64(5);
        for rate in [0.05, 0.3] {
            for _ in 0..300 {
                assert!((3..=6).contains(&vertex_count(&mut rng, rate)));
            }
        }
    }
}
