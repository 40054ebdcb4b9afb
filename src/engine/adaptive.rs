use rand::Rng;

use crate::dna::Individual;
use crate::fitness::average_fitness;

/// samples kept in the rolling average-fitness window
pub const HISTORY_LEN: usize = 10;
/// best-fitness moves smaller than this count as a plateau generation
pub const PLATEAU_EPSILON: f64 = 0.01;
/// mean relative improvement below this marks the run as stagnating
pub const STAGNATION_THRESHOLD: f64 = 0.001;
pub const DIVERSITY_WEIGHT: f64 = 0.5;
/// plateau generations needed before the plateau boost kicks in
pub const PLATEAU_TRIGGER: u32 = 5;
/// +-5% random wobble on every rate
pub const JITTER: f64 = 0.05;

const EPS: f64 = 1e-12;

/// fixed-length ring of per-generation average fitness values
#[derive(Clone, Debug)]
pub struct FitnessHistory {
    samples: [f64; HISTORY_LEN],
    next: usize, // slot the next push overwrites
    len: usize,
}

impl Default for FitnessHistory {
    fn default() -> Self {
        Self { samples: [0.0; HISTORY_LEN], next: 0, len: 0 }
    }
}

impl FitnessHistory {
    pub fn push(&mut self, value: f64) {
        self.samples[self.next] = value;
        self.next = (self.next + 1) % HISTORY_LEN;
        self.len = (self.len + 1).min(HISTORY_LEN);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == HISTORY_LEN
    }

    /// samples oldest first
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        let start = if self.is_full() { self.next } else { 0 };
        (0..self.len).map(move |i| self.samples[(start + i) % HISTORY_LEN])
    }

    /// mean of `(older - newer) / older` over consecutive samples, positive when
    /// fitness is falling. pairs whose older sample is ~0 (or that produce a
    /// non-finite ratio) contribute nothing.
    pub fn mean_relative_improvement(&self) -> f64 {
        if self.len < 2 {
            return 0.0;
        }
        let values: Vec<f64> = self.iter().collect();
        let total: f64 = values
            .windows(2)
            .map(|w| {
                let (prev, cur) = (w[0], w[1]);
                if prev.abs() <= EPS {
                    return 0.0;
                }
                let rel = (prev - cur) / prev;
                if rel.is_finite() {
                    rel
                } else {
                    0.0
                }
            })
            .sum();
        total / (values.len() - 1) as f64
    }
}

/// the scores behind one rate decision, kept for logging
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RateFactors {
    pub stagnation: f64,
    pub diversity: f64,
    pub progress: f64,
    pub plateau_count: u32,
}

/// derives the next generation's mutation rate from how the run is going:
/// stagnation, a converged population or a long plateau push the rate up,
/// progress through the run pulls it down.
#[derive(Clone, Debug)]
pub struct AdaptiveMutationController {
    base_rate: f64,
    min_rate: f64,
    max_rate: f64,
    history: FitnessHistory,
    last_best: Option<f64>,
    plateau_count: u32,
    last_factors: RateFactors,
}

impl AdaptiveMutationController {
    pub fn new(base_rate: f64) -> Self {
        let min_rate = (0.2 * base_rate).max(0.01);
        // a tiny base rate would otherwise give max < min
        let max_rate = (5.0 * base_rate).min(0.4).max(min_rate);
        Self {
            base_rate,
            min_rate,
            max_rate,
            history: FitnessHistory::default(),
            last_best: None,
            plateau_count: 0,
            last_factors: RateFactors::default(),
        }
    }

    pub fn base_rate(&self) -> f64 {
        self.base_rate
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.min_rate, self.max_rate)
    }

    pub fn plateau_count(&self) -> u32 {
        self.plateau_count
    }

    pub fn history(&self) -> &FitnessHistory {
        &self.history
    }

    pub fn last_factors(&self) -> RateFactors {
        self.last_factors
    }

    /// fold in the (sorted) population of `generation` out of `total` and return
    /// the mutation rate to use next
    pub fn update<R: Rng>(
        &mut self,
        population: &[Individual],
        generation: usize,
        total: usize,
        rng: &mut R,
    ) -> f64 {
        profiling::scope!("AdaptiveMutationController::update");
        let avg = average_fitness(population);
        let best = population.first().map_or(avg, |i| i.fitness);

        self.history.push(avg);

        if let Some(last) = self.last_best {
            if (best - last).abs() < PLATEAU_EPSILON {
                self.plateau_count += 1;
            } else {
                self.plateau_count = 0;
            }
        }
        self.last_best = Some(best);

        self.compute_rate(best, avg, generation, total, rng)
    }

    fn compute_rate<R: Rng>(
        &mut self,
        best: f64,
        avg: f64,
        generation: usize,
        total: usize,
        rng: &mut R,
    ) -> f64 {
        let mut stagnation = 0.0;
        if generation >= HISTORY_LEN && self.history.is_full() {
            let improvement = self.history.mean_relative_improvement();
            if improvement < STAGNATION_THRESHOLD {
                stagnation = 1.0 - improvement * 1000.0;
            }
        }

        let diversity = if best.abs() > EPS { ((best - avg) / best).abs() } else { 0.0 };
        let progress = if total > 0 { (generation as f64 / total as f64).min(1.0) } else { 0.0 };

        let plateau_factor = if self.plateau_count > PLATEAU_TRIGGER {
            1.0 + (self.plateau_count as f64 / 10.0).min(2.0)
        } else {
            1.0
        };
        let jitter = 1.0 + rng.random_range(-JITTER..=JITTER);

        let rate = self.base_rate
            * (1.0 + 2.0 * stagnation)
            * (1.0 + DIVERSITY_WEIGHT * (1.0 - diversity))
            * (1.0 - 0.7 * progress)
            * plateau_factor
            * jitter;

        self.last_factors = RateFactors { stagnation, diversity, progress, plateau_count: self.plateau_count };

        if rate.is_finite() {
            rate.clamp(self.min_rate, self.max_rate)
        } else {
            self.min_rate
        }
    }
}
