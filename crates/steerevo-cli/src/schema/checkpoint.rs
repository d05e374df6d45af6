use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use steerevo_genome::Genotype;
use steerevo_sim::TaskKind;

/// On-disk form of a checkpointed network.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheckpointDocument {
    pub name: String,
    pub task: TaskKind,
    pub generation: usize,
    pub fitness: f64,
    pub saved_at: DateTime<Utc>,
    pub genotype: Genotype,
}

impl CheckpointDocument {
    /// Fails unless the network's input and output counts fit `task`.
    pub fn ensure_fits(&self, task: TaskKind) -> anyhow::Result<()> {
        ensure_fits(&self.genotype, task)
    }
}

pub fn ensure_fits(genotype: &Genotype, task: TaskKind) -> anyhow::Result<()> {
    let (inputs, _, outputs) = genotype.topology();
    anyhow::ensure!(
        inputs == task.observation_len(),
        "network has {inputs} inputs but the {task} task observes {} values",
        task.observation_len()
    );
    anyhow::ensure!(
        outputs == 2,
        "network has {outputs} outputs but a velocity needs 2"
    );
    Ok(())
}
