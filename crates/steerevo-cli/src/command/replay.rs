use std::path::PathBuf;

use anyhow::Context as _;
use rand::{Rng as _, SeedableRng as _};
use rand_pcg::Pcg32;
use steerevo_evaluator::{
    agent::{Agent as _, Policy},
    fitness_evaluator::FitnessEvaluator,
};
use steerevo_sim::{Task, TaskKind};

use crate::{
    checkpoint::{self, GenerationSelector},
    schema::checkpoint::CheckpointDocument,
    util,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ReplayArg {
    /// Run name the checkpoint was saved under
    #[arg(long)]
    name: String,
    /// Generation number, or `latest`
    #[arg(long, default_value = "latest")]
    generation: GenerationSelector,
    /// Directory checkpoints are read from
    #[arg(long, default_value = "nets")]
    nets_dir: PathBuf,
    /// Task to play (defaults to the task the network was trained on)
    #[arg(long)]
    task: Option<TaskKind>,
    /// Seed of the randomized starting layout; drawn at random when omitted
    #[arg(long)]
    seed: Option<u64>,
    /// Start from the fixed layout instead of a randomized one
    #[arg(long, conflicts_with = "seed")]
    fixed_layout: bool,
    /// Number of timesteps to play
    #[arg(long, default_value_t = FitnessEvaluator::DEFAULT_EPISODE_STEPS)]
    steps: usize,
    /// Print positions every N steps (0 disables the trace)
    #[arg(long, default_value_t = 60)]
    trace_every: usize,
}

fn trace(task: &dyn Task) {
    let milestones = task.milestones();
    eprintln!(
        "  step {:4}: agent {} object {} target {} touched {} centered {} score {:.4}",
        task.steps(),
        task.agent(),
        task.object(),
        task.target(),
        milestones.touched,
        milestones.centered,
        task.score(),
    );
}

/// Plays `steps` timesteps of `task` with `policy`, tracing every
/// `trace_every` steps, and returns the terminal score.
fn play<P>(task: &mut dyn Task, policy: &mut P, steps: usize, trace_every: usize) -> f64
where
    P: Policy + ?Sized,
{
    policy.reset_memory();
    for step in 0..steps {
        if trace_every > 0 && step % trace_every == 0 {
            trace(task);
        }
        let action = policy.forward(&task.observe());
        task.step(action);
    }
    if trace_every > 0 {
        trace(task);
    }
    task.score()
}

pub(crate) fn run(arg: &ReplayArg) -> anyhow::Result<()> {
    let path = checkpoint::checkpoint_path(&arg.nets_dir, &arg.name, arg.generation, "json");
    let document: CheckpointDocument = util::read_json_file("checkpoint", &path)?;
    let kind = arg.task.unwrap_or(document.task);
    document
        .ensure_fits(kind)
        .with_context(|| format!("Checkpoint {} cannot play the task", path.display()))?;

    eprintln!(
        "Replaying {} generation {} (fitness {:.4}, saved at {}) on the {kind} task",
        document.name, document.generation, document.fitness, document.saved_at
    );

    let mut task = kind.build();
    if arg.fixed_layout {
        task.reset(None);
    } else {
        let seed = arg.seed.unwrap_or_else(|| rand::rng().random());
        eprintln!("  Layout seed: {seed}");
        task.reset(Some(&mut Pcg32::seed_from_u64(seed)));
    }

    let mut policy = document.genotype.policy();
    let score = play(task.as_mut(), &mut policy, arg.steps, arg.trace_every);
    println!("{score:.6}");
    Ok(())
}
