//! Ranking of a population by fitness.

use std::cmp::Ordering;

/// Orders fitness values from best to worst; NaN sorts last.
fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a)
        .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}

/// Sorts `agents` and `fitnesses` in lockstep by descending fitness.
///
/// The sort is stable: individuals with equal fitness keep their relative
/// order. After ranking, index 0 holds the best individual.
///
/// # Panics
///
/// Panics if the two vectors have different lengths.
pub fn rank<A>(agents: &mut Vec<A>, fitnesses: &mut Vec<f64>) {
    assert_eq!(
        agents.len(),
        fitnesses.len(),
        "agents and fitnesses must be index-aligned"
    );
    let mut pairs = agents
        .drain(..)
        .zip(fitnesses.drain(..))
        .collect::<Vec<_>>();
    pairs.sort_by(|(_, a), (_, b)| descending(*a, *b));
    let (ranked_agents, ranked_fitnesses): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
    *agents = ranked_agents;
    *fitnesses = ranked_fitnesses;
}

/// Returns `true` if `fitnesses` is in non-increasing order.
#[must_use]
pub fn is_ranked(fitnesses: &[f64]) -> bool {
    fitnesses.is_sorted_by(|a, b| descending(*a, *b).is_le())
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_rank_orders_descending() {
        let mut agents = vec!['a', 'b', 'c', 'd', 'e'];
        let mut fitnesses = vec![0.1, 0.9, -2.0, 0.5, 0.9];
        rank(&mut agents, &mut fitnesses);
        assert_eq!(agents, vec!['b', 'e', 'd', 'a', 'c']);
        assert_eq!(fitnesses, vec![0.9, 0.9, 0.5, 0.1, -2.0]);
        assert!(is_ranked(&fitnesses));
    }

    #[test]
    fn test_rank_is_permutation() {
        let mut rng = Pcg32::seed_from_u64(8);
        for len in [0, 1, 2, 17, 100] {
            let fitnesses = (0..len)
                .map(|_| f64::from(rng.random_range(0..10_u8)))
                .collect::<Vec<_>>();
            let agents = (0..len).collect::<Vec<usize>>();

            let mut ranked_agents = agents.clone();
            let mut ranked_fitnesses = fitnesses.clone();
            rank(&mut ranked_agents, &mut ranked_fitnesses);

            assert!(is_ranked(&ranked_fitnesses));
            for i in 0..len {
                for j in i + 1..len {
                    assert!(ranked_fitnesses[i] >= ranked_fitnesses[j]);
                }
            }
            // Pairing survives and every agent appears exactly once.
            let mut seen = vec![false; len];
            for (agent, fitness) in ranked_agents.iter().zip(&ranked_fitnesses) {
                assert_eq!(fitnesses[*agent], *fitness);
                assert!(!seen[*agent]);
                seen[*agent] = true;
            }
            // Ties keep input order.
            for w in ranked_agents.windows(2) {
                if fitnesses[w[0]] == fitnesses[w[1]] {
                    assert!(w[0] < w[1]);
                }
            }
        }
    }

    #[test]
    fn test_nan_sorts_last() {
        let mut agents = vec![0, 1, 2];
        let mut fitnesses = vec![f64::NAN, 1.0, f64::NEG_INFINITY];
        rank(&mut agents, &mut fitnesses);
        assert_eq!(agents, vec![1, 2, 0]);
        assert!(fitnesses[2].is_nan());
    }

    #[test]
    #[should_panic(expected = "index-aligned")]
    fn test_length_mismatch_panics() {
        let mut agents = vec![1, 2];
        let mut fitnesses = vec![1.0];
        rank(&mut agents, &mut fitnesses);
    }
}
