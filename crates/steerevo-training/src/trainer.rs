//! The generation loop.
//!
//! ```text
//! Initializing ─▶ Evaluating ─▶ Ranking ─▶ Sampling ─▶ Reproducing ─▶ Checkpointing ─┐
//!                     ▲                                                              │
//!                     └──────────────── next generation ◀────────────────────────────┤
//!                                                                                    ▼
//!                                                     Finished (budget spent or stop flag)
//! ```
//!
//! Each generation replaces the whole population with offspring of sampled
//! parents; there is no elitism beyond what the sampler's bias produces.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use steerevo_evaluator::{agent::Agent, fitness_evaluator::FitnessEvaluator};

use crate::{
    checkpoint::{Checkpoint, CheckpointSink},
    population::Population,
    reproduction::{Evolvable, Reproducer},
    sampling::PercentileSampler,
    stats::FitnessStats,
};

/// Where the trainer currently is within a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum Phase {
    Initializing,
    Evaluating,
    Ranking,
    Sampling,
    Reproducing,
    Checkpointing,
    Finished,
}

/// Invalid trainer parameters.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum TrainerParamError {
    #[display("population size must be at least 1")]
    EmptyPopulation,
    #[display("checkpoint interval must be at least 1")]
    ZeroCheckpointInterval,
    #[display("{name} probability must be in [0, 1], got {value}")]
    Probability {
        name: &'static str,
        value: f64,
    },
}

/// Everything that shapes a training run.
#[derive(Debug, Clone)]
pub struct TrainerParams {
    pub population_size: usize,
    /// Number of generations [`Trainer::run`] plays before finishing.
    pub max_generations: usize,
    /// Checkpoint every `checkpoint_interval`-th generation.
    pub checkpoint_interval: usize,
    pub sampler: PercentileSampler,
    pub reproducer: Reproducer,
    pub evaluator: FitnessEvaluator,
}

impl TrainerParams {
    pub const DEFAULT_POPULATION_SIZE: usize = 100;
    pub const DEFAULT_MAX_GENERATIONS: usize = 50_000;
    pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 100;

    /// Default parameters for training on `evaluator`.
    #[must_use]
    pub fn new(evaluator: FitnessEvaluator) -> Self {
        Self {
            population_size: Self::DEFAULT_POPULATION_SIZE,
            max_generations: Self::DEFAULT_MAX_GENERATIONS,
            checkpoint_interval: Self::DEFAULT_CHECKPOINT_INTERVAL,
            sampler: PercentileSampler::default(),
            reproducer: Reproducer::default(),
            evaluator,
        }
    }

    pub fn validate(&self) -> Result<(), TrainerParamError> {
        if self.population_size == 0 {
            return Err(TrainerParamError::EmptyPopulation);
        }
        if self.checkpoint_interval == 0 {
            return Err(TrainerParamError::ZeroCheckpointInterval);
        }
        let probabilities = self
            .reproducer
            .gates
            .probabilities()
            .into_iter()
            .chain([("crossover", self.reproducer.crossover_rate)]);
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(TrainerParamError::Probability { name, value });
            }
        }
        Ok(())
    }
}

/// Outcome of one generation.
#[derive(Debug, Clone)]
pub struct GenerationReport<A> {
    pub generation: usize,
    pub best_fitness: f64,
    /// `None` only if every fitness was NaN.
    pub stats: Option<FitnessStats>,
    /// Best individual of the evaluated population, before reproduction.
    pub best: A,
    pub checkpointed: bool,
}

/// Drives the population through generations.
#[derive(Debug)]
pub struct Trainer<A> {
    params: TrainerParams,
    population: Population<A>,
    generation: usize,
    phase: Phase,
    rng: Pcg32,
}

impl<A> Trainer<A>
where
    A: Agent + Evolvable,
{
    /// Creates a trainer whose population is `population_size` copies of
    /// `ancestor`.
    ///
    /// All randomness of the run derives from `seed`.
    pub fn new(ancestor: &A, params: TrainerParams, seed: u64) -> Result<Self, TrainerParamError> {
        params.validate()?;
        let population = Population::from_ancestor(ancestor, params.population_size);
        Ok(Self {
            params,
            population,
            generation: 1,
            phase: Phase::Initializing,
            rng: Pcg32::seed_from_u64(seed),
        })
    }

    #[must_use]
    pub fn params(&self) -> &TrainerParams {
        &self.params
    }

    #[must_use]
    pub fn population(&self) -> &Population<A> {
        &self.population
    }

    /// Number of the generation the next call to [`Self::run_generation`]
    /// plays. Starts at 1.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Plays one full generation.
    ///
    /// If the sink fails, the error is returned unchanged, the population
    /// keeps the evaluated (parent) generation, and the generation counter
    /// does not advance.
    pub fn run_generation<S>(&mut self, mut sink: S) -> Result<GenerationReport<A>, S::Error>
    where
        S: CheckpointSink<A>,
    {
        let generation = self.generation;

        self.phase = Phase::Evaluating;
        self.population
            .evaluate_fitness(&self.params.evaluator, &mut self.rng);

        self.phase = Phase::Ranking;
        self.population.rank();
        debug_assert!(self.population.is_ranked());

        self.phase = Phase::Sampling;
        let size = self.population.len();
        let parent_indices = self.params.sampler.sample(size, size, &mut self.rng);

        self.phase = Phase::Reproducing;
        let offspring = self.params.reproducer.reproduce(
            self.population.agents(),
            &parent_indices,
            &self.params.sampler,
            &mut self.rng,
        );

        let best_agent = &self.population.agents()[0];
        let best_fitness = self.population.fitnesses()[0];
        let checkpointed = generation.is_multiple_of(self.params.checkpoint_interval);
        if checkpointed {
            self.phase = Phase::Checkpointing;
            sink.save(Checkpoint {
                generation,
                fitness: best_fitness,
                agent: best_agent,
            })?;
        }

        let report = GenerationReport {
            generation,
            best_fitness,
            stats: self.population.fitness_stats(),
            best: best_agent.clone(),
            checkpointed,
        };
        self.population.replace(offspring);
        self.generation += 1;
        Ok(report)
    }

    /// Plays generations until `max_generations` have been played in total or
    /// `stop` is set.
    ///
    /// `stop` is checked between generations only; a generation in progress
    /// always completes. Returns the number of generations played by this
    /// call.
    pub fn run<S, F>(
        &mut self,
        mut sink: S,
        stop: &AtomicBool,
        mut on_report: F,
    ) -> Result<usize, S::Error>
    where
        S: CheckpointSink<A>,
        F: FnMut(&GenerationReport<A>),
    {
        let mut played = 0;
        while self.generation <= self.params.max_generations && !stop.load(Ordering::Relaxed) {
            let report = self.run_generation(&mut sink)?;
            on_report(&report);
            played += 1;
        }
        self.phase = Phase::Finished;
        Ok(played)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use rand::Rng;
    use steerevo_evaluator::{agent::Policy, fitness_evaluator::ComplexityPenalty};
    use steerevo_sim::{TaskKind, Vec2};

    use super::*;
    use crate::{checkpoint::NoCheckpoint, reproduction::MutationGates};

    /// Walks along a heading; weight mutation turns it.
    #[derive(Debug, Clone, PartialEq)]
    struct Walker {
        angle: f64,
        size: usize,
    }

    impl Policy for Walker {
        fn forward(&mut self, _observation: &[f64]) -> Vec2 {
            Vec2::from_angle(self.angle)
        }

        fn reset_memory(&mut self) {}
    }

    impl Agent for Walker {
        type Policy = Self;

        fn policy(&self) -> Self::Policy {
            self.clone()
        }

        fn structural_size(&self) -> usize {
            self.size
        }
    }

    impl Evolvable for Walker {
        fn mutate_weight<R: Rng + ?Sized>(&mut self, rng: &mut R) {
            self.angle += rng.random_range(-0.5..0.5);
        }

        fn add_synapse<R: Rng + ?Sized>(&mut self, _recurrent: bool, _rng: &mut R) {}

        fn add_neuron<R: Rng + ?Sized>(&mut self, _rng: &mut R) {
            self.size += 1;
        }

        fn prune_synapse<R: Rng + ?Sized>(&mut self, _rng: &mut R) {}

        fn crossover<R: Rng + ?Sized>(&self, _other: &Self, _rng: &mut R) -> Self {
            self.clone()
        }
    }

    fn params(population_size: usize, max_generations: usize) -> TrainerParams {
        TrainerParams {
            population_size,
            max_generations,
            checkpoint_interval: 3,
            ..TrainerParams::new(FitnessEvaluator::new(
                TaskKind::Target,
                40,
                2,
                ComplexityPenalty::default(),
            ))
        }
    }

    fn ancestor() -> Walker {
        Walker {
            angle: 0.0,
            size: 0,
        }
    }

    #[derive(Debug, Default)]
    struct Recorder(Vec<(usize, f64)>);

    impl CheckpointSink<Walker> for Recorder {
        type Error = Infallible;

        fn save(&mut self, checkpoint: Checkpoint<'_, Walker>) -> Result<(), Self::Error> {
            self.0.push((checkpoint.generation, checkpoint.fitness));
            Ok(())
        }
    }

    #[derive(Debug, PartialEq)]
    struct DiskFull;

    struct Failing;

    impl CheckpointSink<Walker> for Failing {
        type Error = DiskFull;

        fn save(&mut self, _checkpoint: Checkpoint<'_, Walker>) -> Result<(), Self::Error> {
            Err(DiskFull)
        }
    }

    #[test]
    fn test_invalid_params() {
        let err = Trainer::new(&ancestor(), params(0, 1), 0).unwrap_err();
        assert_eq!(err, TrainerParamError::EmptyPopulation);

        let mut p = params(4, 1);
        p.checkpoint_interval = 0;
        assert_eq!(
            Trainer::new(&ancestor(), p, 0).unwrap_err(),
            TrainerParamError::ZeroCheckpointInterval
        );

        let mut p = params(4, 1);
        p.reproducer.gates = MutationGates {
            neuron: 1.5,
            ..MutationGates::default()
        };
        let err = Trainer::new(&ancestor(), p, 0).unwrap_err();
        assert_eq!(err.to_string(), "neuron probability must be in [0, 1], got 1.5");
    }

    #[test]
    fn test_initial_state() {
        let trainer = Trainer::new(&ancestor(), params(6, 1), 0).unwrap();
        assert!(trainer.phase().is_initializing());
        assert_eq!(trainer.generation(), 1);
        assert_eq!(trainer.population().len(), 6);
        assert!(trainer.population().agents().iter().all(|a| *a == ancestor()));
    }

    #[test]
    fn test_deterministic_for_seed() {
        let run = |seed| {
            let mut trainer = Trainer::new(&ancestor(), params(8, 4), seed).unwrap();
            let mut bests = vec![];
            trainer
                .run(NoCheckpoint, &AtomicBool::new(false), |report| {
                    bests.push(report.best_fitness);
                })
                .unwrap();
            (bests, trainer.population().agents().to_vec())
        };
        assert_eq!(run(42), run(42));
        assert_ne!(run(42).1, run(43).1);
    }

    #[test]
    fn test_checkpoint_cadence() {
        let mut trainer = Trainer::new(&ancestor(), params(5, 10), 1).unwrap();
        let mut recorder = Recorder::default();
        let mut reports = vec![];
        let played = trainer
            .run(&mut recorder, &AtomicBool::new(false), |report| {
                reports.push((report.generation, report.best_fitness, report.checkpointed));
            })
            .unwrap();

        assert_eq!(played, 10);
        assert!(trainer.phase().is_finished());
        assert_eq!(
            recorder.0.iter().map(|(g, _)| *g).collect::<Vec<_>>(),
            vec![3, 6, 9]
        );
        for (generation, fitness) in &recorder.0 {
            let (_, best, checkpointed) = reports[generation - 1];
            assert!(checkpointed);
            assert_eq!(*fitness, best);
        }
    }

    #[test]
    fn test_report_best_is_maximum() {
        let mut trainer = Trainer::new(&ancestor(), params(10, 1), 2).unwrap();
        let report = trainer.run_generation(NoCheckpoint).unwrap();
        let stats = report.stats.unwrap();
        assert_eq!(report.generation, 1);
        assert_eq!(report.best_fitness, stats.max);
        assert!(stats.min <= stats.mean && stats.mean <= stats.max);
        assert_eq!(trainer.generation(), 2);
        assert_eq!(trainer.population().len(), 10);
    }

    #[test]
    fn test_checkpoint_failure_stops_training() {
        let mut trainer = Trainer::new(&ancestor(), params(4, 10), 3).unwrap();
        let mut generations = vec![];
        let err = trainer
            .run(Failing, &AtomicBool::new(false), |report| {
                generations.push(report.generation);
            })
            .unwrap_err();
        assert_eq!(err, DiskFull);
        assert_eq!(generations, vec![1, 2]);
        assert_eq!(trainer.generation(), 3);
        assert!(trainer.phase().is_checkpointing());
    }

    #[test]
    fn test_stop_flag_checked_between_generations() {
        let stop = AtomicBool::new(false);
        let mut trainer = Trainer::new(&ancestor(), params(4, 100), 4).unwrap();
        let played = trainer
            .run(NoCheckpoint, &stop, |report| {
                if report.generation == 2 {
                    stop.store(true, Ordering::Relaxed);
                }
            })
            .unwrap();
        assert_eq!(played, 2);
        assert_eq!(trainer.generation(), 3);

        let played = trainer
            .run(NoCheckpoint, &AtomicBool::new(true), |_| {})
            .unwrap();
        assert_eq!(played, 0);
    }

    #[test]
    fn test_population_size_is_constant() {
        let mut p = params(7, 5);
        p.reproducer.crossover_rate = 0.5;
        p.reproducer.gates.neuron = 0.5;
        let mut trainer = Trainer::new(&ancestor(), p, 5).unwrap();
        for _ in 0..5 {
            trainer.run_generation(NoCheckpoint).unwrap();
            assert_eq!(trainer.population().len(), 7);
            assert_eq!(trainer.population().fitnesses().len(), 7);
        }
    }
}
