// Engine module organization
// Each submodule handles one aspect of the evolution engine

pub mod adaptive;
pub mod batch;
pub mod generation;
pub mod metrics;
pub mod mutations;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use std::sync::{mpsc, Arc};

use crate::app_types::EngineUpdate;
use crate::dna::{sort_by_fitness, Individual};
use crate::error::{Error, Result};
use crate::fitness::evaluate;
use crate::mutation_config::EvolutionConfig;
use crate::render::PixelBuffer;

use adaptive::AdaptiveMutationController;
use batch::fork_join;
use mutations::Mutator;

/// the generational loop: owns the population, the read-only target and the
/// per-run state (controller, radius cache, master rng).
/// the population is always `population_size` long and sorted best first.
pub struct Engine {
    pub(self) target: PixelBuffer, // premultiplied, shared read-only by every evaluation
    pub(self) config: EvolutionConfig,
    pub(self) population: Vec<Individual>,
    pub(self) controller: AdaptiveMutationController,
    pub(self) mutator: Mutator,
    pub(self) rng: Pcg32, // master generator; per-task generators are seeded from it
    pub mutation_rate: f64,
    pub generation: usize, // generations completed so far
}

impl Engine {
    /// validate `config`, then build, score and sort the initial population
    pub fn new(target: PixelBuffer, config: EvolutionConfig) -> Result<Self> {
        profiling::scope!("Engine::new");
        config.validate()?;
        if target.area() == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "target image must not be empty, got {}x{}",
                target.width(),
                target.height()
            )));
        }

        let mut rng = match config.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_os_rng(),
        };

        let (width, height) = (target.width(), target.height());
        let seeds: Vec<u64> = (0..config.population_size).map(|_| rng.random()).collect();
        let mut population = fork_join(&seeds, |seed| {
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut individual = Individual::random(&mut rng, width, height);
            evaluate(&mut individual, &target);
            individual
        });
        sort_by_fitness(&mut population);

        tracing::info!(
            width,
            height,
            population = config.population_size,
            generations = config.generations,
            tournament = config.tournament_size,
            best = population[0].fitness,
            "initialised population"
        );

        Ok(Self {
            controller: AdaptiveMutationController::new(config.mutation_rate),
            mutation_rate: config.mutation_rate,
            target,
            config,
            population,
            mutator: Mutator::new(),
            rng,
            generation: 0,
        })
    }

    pub fn target(&self) -> &PixelBuffer {
        &self.target
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// current best; the population is never empty
    #[inline]
    pub fn best(&self) -> &Individual {
        &self.population[0]
    }

    pub fn controller(&self) -> &AdaptiveMutationController {
        &self.controller
    }

    pub fn mutator(&self) -> &Mutator {
        &self.mutator
    }

    /// one generation: pick the rate from the current population, breed the next
    /// population and advance the counter. returns the rate that was used.
    pub fn step(&mut self) -> f64 {
        profiling::scope!("Engine::step");
        let rate = self.controller.update(
            &self.population,
            self.generation,
            self.config.generations,
            &mut self.rng,
        );
        self.mutation_rate = rate;
        self.evolve_population(rate);
        self.generation += 1;

        let f = self.controller.last_factors();
        tracing::debug!(
            generation = self.generation - 1,
            best = self.best().fitness,
            average = self.stats().average,
            rate,
            plateau = f.plateau_count,
            stagnation = f.stagnation,
            diversity = f.diversity,
            "generation done"
        );
        rate
    }

    /// run the configured number of generations.
    ///
    /// a record goes to `sink` every `report_interval` generations (0 is taken as 1)
    /// and always for the last one. the sink is dropped before returning, which
    /// closes the channel for the receiver. a receiver that hangs up early does
    /// not stop the run. the sink is bounded, so a slow consumer holds the engine
    /// back instead of letting records pile up. returns a copy of the best individual seen.
    pub fn run(&mut self, sink: mpsc::SyncSender<EngineUpdate>, report_interval: usize) -> Individual {
        profiling::scope!("Engine::run");
        let interval = report_interval.max(1);
        let total = self.config.generations;
        let initial = self.best().fitness;
        let mut best_ever = self.best().deep_copy();
        let mut sink_open = true;

        tracing::info!(generations = total, report_interval = interval, initial, "starting run");

        for i in 0..total {
            let generation = self.generation;
            let rate = self.step();

            let best = &self.population[0];
            if best.fitness < best_ever.fitness {
                best_ever = best.deep_copy();
            }

            if generation % interval == 0 || i + 1 == total {
                tracing::debug!(generation, fitness = best.fitness, mutation_rate = rate, "publishing progress");
                let update = EngineUpdate {
                    generation,
                    image: Arc::clone(&best.pixels),
                    fitness: best.fitness,
                    mutation_rate: rate,
                };
                if sink_open && sink.send(update).is_err() {
                    tracing::warn!(generation, "progress receiver hung up, no further updates");
                    sink_open = false;
                }
            }
        }
        drop(sink);

        tracing::info!(
            fitness = best_ever.fitness,
            improvement_pct = metrics::improvement_percent(initial, best_ever.fitness),
            "run finished"
        );
        best_ever
    }
}
