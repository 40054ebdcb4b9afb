use crate::fitness::average_fitness;

use super::Engine;

/// fitness spread of one population, for logging and progress display
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PopulationStats {
    pub best: f64,
    pub average: f64,
    pub worst: f64,
}

/// how far `current` has come from `initial`, as a percentage (0-100, higher is better).
/// an initial error of 0 counts as nothing left to improve.
#[inline]
pub fn improvement_percent(initial: f64, current: f64) -> f64 {
    if initial <= 0.0 {
        return 0.0;
    }
    ((1.0 - current / initial) * 100.0).clamp(0.0, 100.0)
}

impl Engine {
    /// summary of the current (sorted) population
    pub fn stats(&self) -> PopulationStats {
        profiling::scope!("stats");
        PopulationStats {
            best: self.population[0].fitness,
            average: average_fitness(&self.population),
            worst: self.population[self.population.len() - 1].fitness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation_config::EvolutionConfig;
    use crate::render::PixelBuffer;

    #[test]
    fn improvement_is_clamped() {
        assert_eq!(improvement_percent(10.0, 10.0), 0.0);
        assert_eq!(improvement_percent(10.0, 2.5), 75.0);
        assert_eq!(improvement_percent(10.0, 12.0), 0.0);
        assert_eq!(improvement_percent(0.0, 0.0), 0.0);
    }

    #[test]
    fn stats_bracket_the_average() {
        let mut target = PixelBuffer::new(6, 6);
        target.fill([10, 200, 30, 255]);
        let cfg = EvolutionConfig { population_size: 10, generations: 1, seed: Some(3), ..Default::default() };
        let engine = Engine::new(target, cfg).unwrap();
        let s = engine.stats();
        assert!(s.best <= s.average && s.average <= s.worst);
        assert_eq!(s.best, engine.best().fitness);
    }
}
