// Fitness module organization
// the distance metric lives in its own submodule; this file adapts it to individuals

pub mod distance;

pub use distance::color_distance;

use crate::dna::Individual;
use crate::render::PixelBuffer;

/// score `individual` against the read-only target and store the result
#[inline]
pub fn evaluate(individual: &mut Individual, target: &PixelBuffer) {
    individual.fitness = color_distance(&individual.pixels, target);
}

/// mean fitness of a non-empty population
pub fn average_fitness(population: &[Individual]) -> f64 {
    if population.is_empty() {
        return 0.0;
    }
    population.iter().map(|i| i.fitness).sum::<f64>() / population.len() as f64
}
