use crate::error::{Error, Result};

/// run parameters checked once, before any individual is created
#[derive(Clone, Debug, PartialEq)]
pub struct EvolutionConfig {
    pub population_size: usize, // individuals per generation, > 0
    pub generations: usize,     // generations to run, > 0
    pub mutation_rate: f64,     // base rate for the adaptive controller, in [0, 1]
    pub tournament_size: usize, // draws per mini-tournament, 1..=population_size
    pub seed: Option<u64>,      // fixed seed for reproducible runs, None = entropy
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 500,
            generations: 10_000,
            mutation_rate: 0.05,
            tournament_size: 6,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(Error::InvalidConfiguration("population size must be greater than 0".into()));
        }
        if self.generations == 0 {
            return Err(Error::InvalidConfiguration("generation count must be greater than 0".into()));
        }
        if !self.mutation_rate.is_finite() || !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(Error::InvalidConfiguration(format!(
                "mutation rate must be within [0, 1], got {}",
                self.mutation_rate
            )));
        }
        if self.tournament_size == 0 || self.tournament_size > self.population_size {
            return Err(Error::InvalidConfiguration(format!(
                "tournament size must be within 1..={}, got {}",
                self.population_size, self.tournament_size
            )));
        }
        Ok(())
    }
}
