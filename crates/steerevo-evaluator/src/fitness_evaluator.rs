//! Fitness of an agent: mean terminal score over repeated episodes, minus a
//! penalty for structural size.
//!
//! # Formula
//!
//! ```text
//! fitness = mean(score(episode_1), ..., score(episode_R))
//!         - coefficient * max(0, structural_size - free_size)
//! ```
//!
//! Each episode starts from a freshly randomized task and a policy whose
//! recurrent memory has been cleared, then runs for exactly `episode_steps`
//! timesteps. Only the score of the final state counts.
//!
//! The penalty is non-negative and non-decreasing in the structural size, so
//! two equally capable agents are ranked in favour of the smaller one and no
//! agent can gain fitness by growing alone.
//!
//! # Usage
//!
//! ```
//! use steerevo_evaluator::fitness_evaluator::FitnessEvaluator;
//! use steerevo_sim::TaskKind;
//!
//! let evaluator = FitnessEvaluator::with_defaults(TaskKind::Target);
//! assert_eq!(evaluator.episode_steps(), 600);
//! assert_eq!(evaluator.repeats(), 5);
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use steerevo_sim::TaskKind;

use crate::agent::{Agent, Policy};

/// Deduction applied for structural size beyond a free allowance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityPenalty {
    /// Fitness lost per unit of size above `free_size`. Must be non-negative.
    pub coefficient: f64,
    /// Size that is not penalized.
    pub free_size: usize,
}

impl Default for ComplexityPenalty {
    fn default() -> Self {
        Self {
            coefficient: 0.03,
            free_size: 4,
        }
    }
}

impl ComplexityPenalty {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn penalty(&self, structural_size: usize) -> f64 {
        let excess = structural_size.saturating_sub(self.free_size);
        self.coefficient.max(0.0) * excess as f64
    }
}

/// Breakdown of a single fitness evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    /// Mean terminal score over all episodes.
    pub mean_score: f64,
    /// Complexity penalty subtracted from the mean score.
    pub penalty: f64,
    /// `mean_score - penalty`
    pub fitness: f64,
}

/// Plays repeated episodes of a task to compute fitness.
#[derive(Debug, Clone)]
pub struct FitnessEvaluator {
    task: TaskKind,
    episode_steps: usize,
    repeats: usize,
    penalty: ComplexityPenalty,
}

impl FitnessEvaluator {
    pub const DEFAULT_EPISODE_STEPS: usize = 60 * 10;
    pub const DEFAULT_REPEATS: usize = 5;

    /// Creates a new fitness evaluator.
    ///
    /// # Arguments
    ///
    /// * `task` - Task variant every episode is played on
    /// * `episode_steps` - Number of timesteps per episode
    /// * `repeats` - Number of independent episodes averaged per evaluation
    /// * `penalty` - Structural-complexity penalty
    ///
    /// # Panics
    ///
    /// Panics if `repeats` is zero.
    #[must_use]
    pub fn new(
        task: TaskKind,
        episode_steps: usize,
        repeats: usize,
        penalty: ComplexityPenalty,
    ) -> Self {
        assert!(repeats > 0, "at least one episode per evaluation is required");
        Self {
            task,
            episode_steps,
            repeats,
            penalty,
        }
    }

    #[must_use]
    pub fn with_defaults(task: TaskKind) -> Self {
        Self::new(
            task,
            Self::DEFAULT_EPISODE_STEPS,
            Self::DEFAULT_REPEATS,
            ComplexityPenalty::default(),
        )
    }

    #[must_use]
    pub fn task(&self) -> TaskKind {
        self.task
    }

    #[must_use]
    pub fn episode_steps(&self) -> usize {
        self.episode_steps
    }

    #[must_use]
    pub fn repeats(&self) -> usize {
        self.repeats
    }

    #[must_use]
    pub fn penalty(&self) -> &ComplexityPenalty {
        &self.penalty
    }

    /// Plays a single randomized episode and returns its terminal score.
    ///
    /// The policy's memory is cleared before the first step.
    pub fn play_episode<P, R>(&self, policy: &mut P, rng: &mut R) -> f64
    where
        P: Policy + ?Sized,
        R: Rng,
    {
        policy.reset_memory();
        let mut task = self.task.build();
        task.reset(Some(rng));
        for _ in 0..self.episode_steps {
            let action = policy.forward(&task.observe());
            task.step(action);
        }
        task.score()
    }

    /// Evaluates an agent and returns the full breakdown.
    #[expect(clippy::cast_precision_loss)]
    pub fn evaluate<A, R>(&self, agent: &A, rng: &mut R) -> Evaluation
    where
        A: Agent + ?Sized,
        R: Rng,
    {
        let mut policy = agent.policy();
        let mut total_score = 0.0;
        for _ in 0..self.repeats {
            total_score += self.play_episode(&mut policy, rng);
        }
        let mean_score = total_score / self.repeats as f64;
        let penalty = self.penalty.penalty(agent.structural_size());
        Evaluation {
            mean_score,
            penalty,
            fitness: mean_score - penalty,
        }
    }

    /// Evaluates an agent and returns only its fitness.
    pub fn fitness<A, R>(&self, agent: &A, rng: &mut R) -> f64
    where
        A: Agent + ?Sized,
        R: Rng,
    {
        self.evaluate(agent, rng).fitness
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;
    use steerevo_sim::{
        Vec2,
        shaping::dropoff,
        task::{DROPOFF_SCALE, PLACEMENT_RADIUS},
    };

    use super::*;

    #[derive(Debug, Default)]
    struct Counters {
        forwards: AtomicUsize,
        resets: AtomicUsize,
    }

    #[derive(Debug)]
    struct IdleAgent {
        size: usize,
        counters: Arc<Counters>,
    }

    impl IdleAgent {
        fn new(size: usize) -> Self {
            Self {
                size,
                counters: Arc::default(),
            }
        }
    }

    struct IdlePolicy(Arc<Counters>);

    impl Policy for IdlePolicy {
        fn forward(&mut self, _observation: &[f64]) -> Vec2 {
            self.0.forwards.fetch_add(1, Ordering::Relaxed);
            Vec2::ZERO
        }

        fn reset_memory(&mut self) {
            self.0.resets.fetch_add(1, Ordering::Relaxed);
        }
    }

    impl Agent for IdleAgent {
        type Policy = IdlePolicy;

        fn policy(&self) -> Self::Policy {
            IdlePolicy(Arc::clone(&self.counters))
        }

        fn structural_size(&self) -> usize {
            self.size
        }
    }

    #[test]
    fn test_idle_agent_scores_initial_layout() {
        let evaluator = FitnessEvaluator::with_defaults(TaskKind::Target);
        let mut rng = Pcg32::seed_from_u64(11);
        let evaluation = evaluator.evaluate(&IdleAgent::new(0), &mut rng);

        // Both the agent and the target sit on placement circles, so an idle
        // agent always sees the same distances.
        let expected = dropoff(PLACEMENT_RADIUS, DROPOFF_SCALE);
        assert!((evaluation.mean_score - expected).abs() < 1e-9);
        assert_eq!(evaluation.penalty, 0.0);
        assert_eq!(evaluation.fitness, evaluation.mean_score);
    }

    #[test]
    fn test_memory_reset_before_every_episode() {
        let evaluator = FitnessEvaluator::new(TaskKind::Ball, 17, 3, ComplexityPenalty::default());
        let agent = IdleAgent::new(0);
        let mut rng = Pcg32::seed_from_u64(5);
        evaluator.fitness(&agent, &mut rng);
        assert_eq!(agent.counters.resets.load(Ordering::Relaxed), 3);
        assert_eq!(agent.counters.forwards.load(Ordering::Relaxed), 3 * 17);
    }

    #[test]
    fn test_penalty_applied_above_free_size() {
        let evaluator = FitnessEvaluator::with_defaults(TaskKind::Target);
        let small = evaluator.evaluate(&IdleAgent::new(4), &mut Pcg32::seed_from_u64(1));
        let large = evaluator.evaluate(&IdleAgent::new(10), &mut Pcg32::seed_from_u64(1));
        assert_eq!(small.penalty, 0.0);
        assert!((large.penalty - 0.18).abs() < 1e-12);
        assert!((small.fitness - large.fitness - 0.18).abs() < 1e-12);
    }

    #[test]
    fn test_penalty_never_rewards_growth() {
        let penalty = ComplexityPenalty::default();
        let mut prev = penalty.penalty(0);
        assert_eq!(prev, 0.0);
        for size in 1..50 {
            let value = penalty.penalty(size);
            assert!(value >= prev);
            prev = value;
        }

        let negative = ComplexityPenalty {
            coefficient: -1.0,
            free_size: 0,
        };
        assert_eq!(negative.penalty(10), 0.0);
    }

    #[test]
    fn test_same_seed_same_fitness() {
        let evaluator = FitnessEvaluator::new(TaskKind::Ball, 100, 4, ComplexityPenalty::default());
        let agent = IdleAgent::new(6);
        let a = evaluator.fitness(&agent, &mut Pcg32::seed_from_u64(99));
        let b = evaluator.fitness(&agent, &mut Pcg32::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic(expected = "at least one episode")]
    fn test_zero_repeats_rejected() {
        let _ = FitnessEvaluator::new(TaskKind::Target, 10, 0, ComplexityPenalty::default());
    }
}
