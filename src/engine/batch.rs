use std::ops::Range;

use rayon::prelude::*;

/// how one generation's output slots are cut into batches.
/// only the even prefix `0..paired_len` is bred in pairs; an odd population
/// leaves its last slot for the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchPlan {
    pub paired_len: usize,
    pub batch_len: usize, // even, in 2..=paired_len (0 only when nothing is paired)
}

impl BatchPlan {
    /// roughly 1.5 slots per worker, rounded down to even, never under one pair
    /// and never over the paired length
    pub fn new(population_size: usize, workers: usize) -> Self {
        let paired_len = population_size & !1;
        let batch_len = ((workers.max(1) * 3) / 2 & !1).max(2).min(paired_len);
        Self { paired_len, batch_len }
    }

    pub fn for_current_pool(population_size: usize) -> Self {
        Self::new(population_size, rayon::current_num_threads())
    }

    pub fn has_orphan(&self, population_size: usize) -> bool {
        population_size > self.paired_len
    }

    /// slot ranges, in order, each an even length
    pub fn batches(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        let step = self.batch_len.max(1);
        (0..self.paired_len)
            .step_by(step)
            .map(move |start| start..(start + step).min(self.paired_len))
    }
}

/// run `task` once per seed in parallel and return the results in seed order.
/// returns only after every task is done, so callers get a barrier per call.
pub fn fork_join<T, F>(seeds: &[u64], task: F) -> Vec<T>
where
    T: Send,
    F: Fn(u64) -> T + Sync + Send,
{
    seeds.par_iter().map(|&seed| task(seed)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_rounds_to_even_batches() {
        let plan = BatchPlan::new(100, 8);
        assert_eq!(plan, BatchPlan { paired_len: 100, batch_len: 12 });

        let plan = BatchPlan::new(49, 4);
        assert_eq!(plan.paired_len, 48);
        assert_eq!(plan.batch_len, 6);
        assert!(plan.has_orphan(49));
    }

    #[test]
    fn single_worker_still_breeds_a_pair() {
        assert_eq!(BatchPlan::new(10, 1).batch_len, 2);
    }

    #[test]
    fn batch_is_capped_by_population() {
        let plan = BatchPlan::new(5, 64);
        assert_eq!(plan, BatchPlan { paired_len: 4, batch_len: 4 });
    }

    #[test]
    fn batches_cover_paired_slots_once() {
        for (pop, workers) in [(49, 4), (40, 3), (2, 16), (101, 7)] {
            let plan = BatchPlan::new(pop, workers);
            let mut covered = Vec::new();
            for range in plan.batches() {
                assert_eq!(range.len() % 2, 0);
                covered.extend(range);
            }
            assert_eq!(covered, (0..plan.paired_len).collect::<Vec<_>>());
        }
    }

    #[test]
    fn population_of_one_has_no_batches() {
        let plan = BatchPlan::new(1, 8);
        assert_eq!(plan.paired_len, 0);
        assert_eq!(plan.batches().count(), 0);
        assert!(plan.has_orphan(1));
    }

    #[test]
    fn fork_join_keeps_seed_order() {
        let seeds: Vec<u64> = (0..100).collect();
        let out = fork_join(&seeds, |s| s * 2);
        assert_eq!(out, seeds.iter().map(|s| s * 2).collect::<Vec<_>>());
    }
}
