use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use steerevo_evaluator::fitness_evaluator::{ComplexityPenalty, FitnessEvaluator};
use steerevo_sim::TaskKind;
use steerevo_training::{
    reproduction::{MutationGates, Reproducer},
    sampling::PercentileSampler,
    trainer::TrainerParams,
};

/// Training settings read from a JSON file. Missing fields take their
/// default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub task: TaskKind,
    pub population_size: usize,
    pub max_generations: usize,
    pub checkpoint_interval: usize,
    pub episode_steps: usize,
    pub repeats: usize,
    pub penalty: ComplexityPenalty,
    pub max_percentile: f64,
    pub fitness_bias: f64,
    pub mutation: MutationGates,
    pub crossover_rate: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let sampler = PercentileSampler::default();
        Self {
            task: TaskKind::default(),
            population_size: TrainerParams::DEFAULT_POPULATION_SIZE,
            max_generations: TrainerParams::DEFAULT_MAX_GENERATIONS,
            checkpoint_interval: TrainerParams::DEFAULT_CHECKPOINT_INTERVAL,
            episode_steps: FitnessEvaluator::DEFAULT_EPISODE_STEPS,
            repeats: FitnessEvaluator::DEFAULT_REPEATS,
            penalty: ComplexityPenalty::default(),
            max_percentile: sampler.max_percentile(),
            fitness_bias: sampler.fitness_bias(),
            mutation: MutationGates::default(),
            crossover_rate: 0.0,
        }
    }
}

impl TrainingConfig {
    pub fn trainer_params(&self) -> anyhow::Result<TrainerParams> {
        anyhow::ensure!(self.repeats > 0, "repeats must be at least 1");
        anyhow::ensure!(
            self.penalty.coefficient >= 0.0,
            "penalty coefficient must not be negative, got {}",
            self.penalty.coefficient
        );
        let sampler = PercentileSampler::new(self.max_percentile, self.fitness_bias)
            .context("Invalid sampler configuration")?;
        let evaluator =
            FitnessEvaluator::new(self.task, self.episode_steps, self.repeats, self.penalty);
        let params = TrainerParams {
            population_size: self.population_size,
            max_generations: self.max_generations,
            checkpoint_interval: self.checkpoint_interval,
            sampler,
            reproducer: Reproducer {
                gates: self.mutation,
                crossover_rate: self.crossover_rate,
            },
            evaluator,
        };
        params.validate().context("Invalid trainer configuration")?;
        Ok(params)
    }
}
