use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::crossover::crossover;
use crate::dna::{sort_by_fitness, Individual};
use crate::fitness::evaluate;
use crate::selection::tournament_select;

use super::batch::{fork_join, BatchPlan};
use super::Engine;

impl Engine {
    /// replace the population with the next generation.
    ///
    /// output slots are filled two at a time by independent pair tasks, one batch
    /// after another; each task returns its pair and the batch result lands in slot
    /// order, so scheduling never changes the outcome. an odd population gets the
    /// previous best in its leftover slot.
    pub(super) fn evolve_population(&mut self, rate: f64) {
        profiling::scope!("evolve_population");
        let size = self.population.len();
        let plan = BatchPlan::for_current_pool(size);
        let previous_best = self.population[0].clone();

        tracing::debug!(?plan, size, "batch plan");

        let mut next: Vec<Individual> = Vec::with_capacity(size);
        for range in plan.batches() {
            let seeds: Vec<u64> = (0..range.len() / 2).map(|_| self.rng.random()).collect();
            let pairs = fork_join(&seeds, |seed| self.breed_pair(seed, rate));
            for (a, b) in pairs {
                next.push(a);
                next.push(b);
            }
        }
        if plan.has_orphan(size) {
            next.push(previous_best.clone());
        }
        debug_assert_eq!(next.len(), size);

        sort_by_fitness(&mut next);
        restore_previous_best(&mut next, previous_best);

        self.population = next;
    }

    /// one pair task: two tournament parents, crossover, mutate and score both
    /// children, keep the best two of {child1, child2, parent1, parent2}.
    /// parents are drawn independently, so both may be the same individual.
    pub(super) fn breed_pair(&self, seed: u64, rate: f64) -> (Individual, Individual) {
        profiling::scope!("breed_pair");
        let mut rng = Pcg32::seed_from_u64(seed);
        let tournament = self.config.tournament_size;

        let p1 = tournament_select(&self.population, tournament, &mut rng);
        let p2 = tournament_select(&self.population, tournament, &mut rng);

        let (c1, c2) = crossover(&p1.pixels, &p2.pixels, &mut rng);
        let mut c1 = self.mutator.mutate(Individual::new(c1), rate, &mut rng);
        let mut c2 = self.mutator.mutate(Individual::new(c2), rate, &mut rng);
        evaluate(&mut c1, &self.target);
        evaluate(&mut c2, &self.target);

        // parents go in by handle; their buffers are never written again
        let mut candidates = [c1, c2, p1.clone(), p2.clone()];
        sort_by_fitness(&mut candidates);
        let [first, second, _, _] = candidates;
        (first, second)
    }
}

/// `next` is sorted. if its best is worse than `previous_best` (nobody bred from the
/// old best), the old best takes the place of the worst so the front never regresses.
pub(super) fn restore_previous_best(next: &mut Vec<Individual>, previous_best: Individual) {
    if next.first().is_some_and(|best| best.fitness > previous_best.fitness) {
        next.pop();
        next.insert(0, previous_best);
    }
}
