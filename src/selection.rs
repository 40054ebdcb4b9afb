use rand::Rng;

use crate::dna::Individual;

/// number of independent mini-tournaments behind one selection
pub const NUM_TOURNAMENTS: usize = 4;

/// pick a parent: run `NUM_TOURNAMENTS` mini-tournaments of `tournament_size`
/// uniform draws (with replacement) and return the best winner overall.
/// several small tournaments keep selection pressure below one big tournament,
/// which holds off premature convergence.
///
/// `tournament_size` is validated when the engine is built (1..=population len);
/// the population must not be empty.
pub fn tournament_select<'a, R: Rng>(
    population: &'a [Individual],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Individual {
    profiling::scope!("tournament_select");
    debug_assert!(!population.is_empty());
    debug_assert!(tournament_size >= 1);

    let mut best: Option<&Individual> = None;
    for _ in 0..NUM_TOURNAMENTS {
        let mut winner = &population[rng.random_range(0..population.len())];
        for _ in 1..tournament_size {
            let challenger = &population[rng.random_range(0..population.len())];
            if challenger.fitness < winner.fitness {
                winner = challenger;
            }
        }
        if best.map_or(true, |b| winner.fitness < b.fitness) {
            best = Some(winner);
        }
    }

    best.unwrap_or(&population[0])
}
