use rand::Rng;
use std::sync::Arc;

use crate::geom::jitter_point;
use crate::render::PixelBuffer;

/// lowest alpha handed out for random fills; keeps every shape at least faintly visible
pub const MIN_FILL_ALPHA: u8 = 50;

/// a polygon with integer vertices and a straight (un-premultiplied) fill colour.
/// only a drawing primitive: once rendered the individual keeps the pixels, not the shape.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Polygon {
    pub points: Vec<(i32, i32)>, // 3+ vertex coordinates
    pub rgba: [u8; 4],
}

impl Polygon {
    /// random polygon whose vertices scatter around `anchor` by at most `radius` px,
    /// clamped onto a `width`×`height` canvas
    pub fn random_around<R: Rng>(
        rng: &mut R,
        anchor: (i32, i32),
        radius: i32,
        num_points: usize,
        width: u32,
        height: u32,
    ) -> Self {
        let points = (0..num_points)
            .map(|_| jitter_point(rng, anchor, radius, width, height))
            .collect();
        Self { points, rgba: random_rgba(rng) }
    }
}

/// random colour with alpha in 50..=255 for translucent layering
pub fn random_rgba<R: Rng>(rng: &mut R) -> [u8; 4] {
    [
        rng.random(),
        rng.random(),
        rng.random(),
        rng.random_range(MIN_FILL_ALPHA..=u8::MAX),
    ]
}

/// one genome: a rendered canvas plus its score.
///
/// the pixels sit behind an `Arc` so an individual that passes through mutation
/// untouched is shared rather than copied. a buffer is never written once it has
/// been wrapped here; producing a variant always starts from `pixels_mut` on an
/// owned copy (copy-on-write).
#[derive(Clone, Debug)]
pub struct Individual {
    pub fitness: f64, // lower is better, INFINITY = not yet evaluated
    pub pixels: Arc<PixelBuffer>,
}

impl Individual {
    /// unevaluated individual owning `pixels`
    pub fn new(pixels: PixelBuffer) -> Self {
        Self { fitness: f64::INFINITY, pixels: Arc::new(pixels) }
    }

    /// random background plus 3-7 random polygons of 3-6 vertices
    pub fn random<R: Rng>(rng: &mut R, width: u32, height: u32) -> Self {
        profiling::scope!("Individual::random");
        let mut pixels = PixelBuffer::new(width, height);
        pixels.fill(random_rgba(rng));

        let num_polys = rng.random_range(3..=7);
        let radius = ((width + height) / 8).max(1) as i32;
        for _ in 0..num_polys {
            let anchor = (
                rng.random_range(0..width) as i32,
                rng.random_range(0..height) as i32,
            );
            let num_points = rng.random_range(3..=6);
            let poly = Polygon::random_around(rng, anchor, radius, num_points, width, height);
            pixels.draw_polygon(&poly);
        }

        Self::new(pixels)
    }

    /// independent copy with its own pixel storage
    pub fn deep_copy(&self) -> Self {
        Self {
            fitness: self.fitness,
            pixels: Arc::new((*self.pixels).clone()),
        }
    }

    /// mutable access to the pixels; clones the buffer first if it is shared
    pub fn pixels_mut(&mut self) -> &mut PixelBuffer {
        Arc::make_mut(&mut self.pixels)
    }

    /// re-render in place from freshly added shapes. the score is stale afterwards.
    pub fn paint(&mut self, polys: &[Polygon]) {
        let pixels = self.pixels_mut();
        for poly in polys {
            pixels.draw_polygon(poly);
        }
        self.fitness = f64::INFINITY;
    }

    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_finite()
    }
}

/// ascending by fitness; stable so equal scores keep their order
pub fn sort_by_fitness(population: &mut [Individual]) {
    population.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));
}
