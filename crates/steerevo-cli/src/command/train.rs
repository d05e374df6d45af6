use std::{fs, path::PathBuf, sync::atomic::AtomicBool};

use anyhow::Context as _;
use rand::Rng as _;
use steerevo_evaluator::agent::Agent as _;
use steerevo_genome::{Activation, Genotype};
use steerevo_sim::TaskKind;
use steerevo_training::trainer::{GenerationReport, Trainer};

use crate::{
    checkpoint::FileCheckpointSink,
    config::TrainingConfig,
    schema::checkpoint::CheckpointDocument,
    util,
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Training configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Task to train on (overrides the config file)
    #[arg(long)]
    task: Option<TaskKind>,
    /// Run name, used as checkpoint file prefix
    #[arg(long, default_value = "net")]
    name: String,
    /// Directory checkpoints are written to
    #[arg(long, default_value = "nets")]
    nets_dir: PathBuf,
    /// Random seed; drawn at random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Number of generations (overrides the config file)
    #[arg(long)]
    generations: Option<usize>,
    /// Checkpoint file whose network seeds the population
    #[arg(long)]
    ancestor: Option<PathBuf>,
}

fn load_config(arg: &TrainArg) -> anyhow::Result<TrainingConfig> {
    let mut config = match &arg.config {
        Some(path) => util::read_json_file("training config", path)?,
        None => TrainingConfig::default(),
    };
    if let Some(task) = arg.task {
        config.task = task;
    }
    if let Some(generations) = arg.generations {
        config.max_generations = generations;
    }
    Ok(config)
}

fn load_ancestor(arg: &TrainArg, task: TaskKind) -> anyhow::Result<Genotype> {
    let Some(path) = &arg.ancestor else {
        return Ok(Genotype::new(
            task.observation_len(),
            2,
            Activation::Linear,
            Activation::Tanh,
        ));
    };
    let document: CheckpointDocument = util::read_json_file("checkpoint", path)?;
    document
        .ensure_fits(task)
        .with_context(|| format!("Ancestor {} does not fit the task", path.display()))?;
    eprintln!(
        "Starting from {} generation {} (fitness {:.4})",
        document.name, document.generation, document.fitness
    );
    Ok(document.genotype)
}

fn print_report(report: &GenerationReport<Genotype>) {
    let (_, hidden, _) = report.best.topology();
    let synapses = report.best.synapses().len();
    match &report.stats {
        Some(stats) => eprintln!(
            "Generation #{}: best {:.4}, mean {:.4}, min {:.4} ({hidden} hidden, {synapses} synapses)",
            report.generation, report.best_fitness, stats.mean, stats.min,
        ),
        None => eprintln!(
            "Generation #{}: best {:.4} ({hidden} hidden, {synapses} synapses)",
            report.generation, report.best_fitness,
        ),
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let config = load_config(arg)?;
    let params = config.trainer_params()?;
    let ancestor = load_ancestor(arg, config.task)?;

    let seed = arg.seed.unwrap_or_else(|| rand::rng().random());
    eprintln!(
        "Training {:?} on the {} task: population {}, {} generations, seed {seed}",
        arg.name, config.task, config.population_size, config.max_generations
    );

    fs::create_dir_all(&arg.nets_dir).with_context(|| {
        format!(
            "Failed to create checkpoint directory: {}",
            arg.nets_dir.display()
        )
    })?;
    let mut sink = FileCheckpointSink::new(arg.nets_dir.clone(), arg.name.clone(), config.task);
    sink.ensure_fresh()?;

    let mut trainer =
        Trainer::new(&ancestor, params, seed).context("Invalid training parameters")?;
    let stop = AtomicBool::new(false);
    let mut last = None;
    let played = trainer.run(&mut sink, &stop, |report| {
        print_report(report);
        last = Some((
            report.generation,
            report.best_fitness,
            report.best.structural_size(),
        ));
    })?;

    eprintln!();
    eprintln!("Training completed after {played} generations");
    if let Some((generation, fitness, hidden)) = last {
        eprintln!("  Last generation: #{generation}");
        eprintln!("  Best fitness: {fitness:.4}");
        eprintln!("  Hidden neurons: {hidden}");
    }
    Ok(())
}
