//! Population of agents and their fitness values.
//!
//! Agents and fitnesses are kept in two index-aligned vectors: after
//! [`Population::rank`], `agents()[i]` is the `i`-th best individual and
//! `fitnesses()[i]` its fitness.

use std::thread;

use rand::{Rng, SeedableRng as _};
use rand_pcg::Pcg32;
use steerevo_evaluator::{agent::Agent, fitness_evaluator::FitnessEvaluator};

use crate::{ranking, stats::FitnessStats};

/// A fixed-size population.
#[derive(Debug, Clone)]
pub struct Population<A> {
    agents: Vec<A>,
    fitnesses: Vec<f64>,
}

impl<A> Population<A> {
    /// Fills a population with `size` copies of `ancestor`.
    #[must_use]
    pub fn from_ancestor(ancestor: &A, size: usize) -> Self
    where
        A: Clone,
    {
        Self::from_agents(vec![ancestor.clone(); size])
    }

    /// Wraps `agents`; every fitness starts at negative infinity.
    #[must_use]
    pub fn from_agents(agents: Vec<A>) -> Self {
        let fitnesses = vec![f64::NEG_INFINITY; agents.len()];
        Self { agents, fitnesses }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[must_use]
    pub fn agents(&self) -> &[A] {
        &self.agents
    }

    #[must_use]
    pub fn fitnesses(&self) -> &[f64] {
        &self.fitnesses
    }

    /// Evaluates every agent in parallel.
    ///
    /// One seed per individual is drawn from `rng` before any thread is
    /// spawned, so the result is identical for identical `rng` states.
    pub fn evaluate_fitness<R>(&mut self, evaluator: &FitnessEvaluator, rng: &mut R)
    where
        A: Agent,
        R: Rng + ?Sized,
    {
        let seeds = (0..self.agents.len())
            .map(|_| rng.random::<u64>())
            .collect::<Vec<_>>();

        thread::scope(|s| {
            for ((agent, fitness), seed) in self.agents.iter().zip(&mut self.fitnesses).zip(seeds) {
                s.spawn(move || {
                    let mut rng = Pcg32::seed_from_u64(seed);
                    *fitness = evaluator.fitness(agent, &mut rng);
                });
            }
        });
    }

    /// Sorts the population by descending fitness (stable).
    pub fn rank(&mut self) {
        ranking::rank(&mut self.agents, &mut self.fitnesses);
    }

    #[must_use]
    pub fn is_ranked(&self) -> bool {
        ranking::is_ranked(&self.fitnesses)
    }

    /// The agent at index 0 and its fitness. Meaningful after ranking.
    #[must_use]
    pub fn best(&self) -> Option<(&A, f64)> {
        Some((self.agents.first()?, *self.fitnesses.first()?))
    }

    #[must_use]
    pub fn fitness_stats(&self) -> Option<FitnessStats> {
        FitnessStats::new(self.fitnesses.iter().copied())
    }

    /// Replaces every agent with the next generation and clears fitnesses.
    ///
    /// # Panics
    ///
    /// Panics if `offspring` has a different size than the population.
    pub fn replace(&mut self, offspring: Vec<A>) {
        assert_eq!(
            offspring.len(),
            self.agents.len(),
            "population size must stay constant"
        );
        self.agents = offspring;
        self.fitnesses.fill(f64::NEG_INFINITY);
    }
}
