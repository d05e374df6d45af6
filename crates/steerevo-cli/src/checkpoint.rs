use std::{
    fmt, fs,
    io::{BufWriter, Write as _},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::Context as _;
use chrono::Utc;
use steerevo_genome::{Genotype, render};
use steerevo_sim::TaskKind;
use steerevo_training::checkpoint::{Checkpoint, CheckpointSink};

use crate::{
    schema::checkpoint::CheckpointDocument,
    util::{self, Output},
};

/// Which checkpoint of a run to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSelector {
    Latest,
    Number(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("expected a generation number or `latest`, got {input:?}")]
pub struct ParseGenerationError {
    input: String,
}

impl FromStr for GenerationSelector {
    type Err = ParseGenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        s.parse().map(Self::Number).map_err(|_| ParseGenerationError {
            input: s.to_owned(),
        })
    }
}

impl fmt::Display for GenerationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// `<dir>/<name>_<generation>.<extension>`
pub fn checkpoint_path(
    dir: &Path,
    name: &str,
    generation: GenerationSelector,
    extension: &str,
) -> PathBuf {
    dir.join(format!("{name}_{generation}.{extension}"))
}

/// Writes checkpoints as JSON documents with a PNG drawing of the network.
///
/// Numbered files are never overwritten; the `latest` pair is replaced on
/// every save.
#[derive(Debug)]
pub struct FileCheckpointSink {
    dir: PathBuf,
    name: String,
    task: TaskKind,
}

impl FileCheckpointSink {
    pub fn new(dir: PathBuf, name: String, task: TaskKind) -> Self {
        Self { dir, name, task }
    }

    fn path(&self, generation: GenerationSelector, extension: &str) -> PathBuf {
        checkpoint_path(&self.dir, &self.name, generation, extension)
    }

    /// Numbered checkpoint files of this run already present in the directory.
    pub fn existing_numbered(&self) -> anyhow::Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir).with_context(|| {
            format!(
                "Failed to read checkpoint directory: {}",
                self.dir.display()
            )
        })?;
        let mut found = vec![];
        for entry in entries {
            let entry = entry.with_context(|| {
                format!(
                    "Failed to read checkpoint directory: {}",
                    self.dir.display()
                )
            })?;
            let file_name = entry.file_name();
            if file_name
                .to_str()
                .is_some_and(|file_name| is_numbered_checkpoint(file_name, &self.name))
            {
                found.push(entry.path());
            }
        }
        found.sort();
        Ok(found)
    }

    /// Fails if an earlier run left numbered checkpoints under the same name.
    pub fn ensure_fresh(&self) -> anyhow::Result<()> {
        let existing = self.existing_numbered()?;
        if let Some(first) = existing.first() {
            anyhow::bail!(
                "{} checkpoint file(s) of run {:?} already exist (first: {}); choose another --name or --nets-dir",
                existing.len(),
                self.name,
                first.display()
            );
        }
        Ok(())
    }
}

/// Matches `<name>_<digits>.json` and `<name>_<digits>.png`.
fn is_numbered_checkpoint(file_name: &str, name: &str) -> bool {
    let Some((stem, extension)) = file_name.rsplit_once('.') else {
        return false;
    };
    let Some(suffix) = stem
        .strip_prefix(name)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };
    matches!(extension, "json" | "png")
        && !suffix.is_empty()
        && suffix.bytes().all(|b| b.is_ascii_digit())
}

fn write_new_png(genotype: &Genotype, path: &Path) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(util::create_new_file(path)?);
    render::write_png(genotype, &mut writer)
        .with_context(|| format!("Failed to render network to {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush {}", path.display()))?;
    Ok(())
}

impl CheckpointSink<Genotype> for FileCheckpointSink {
    type Error = anyhow::Error;

    fn save(&mut self, checkpoint: Checkpoint<'_, Genotype>) -> anyhow::Result<()> {
        let document = CheckpointDocument {
            name: self.name.clone(),
            task: self.task,
            generation: checkpoint.generation,
            fitness: checkpoint.fitness,
            saved_at: Utc::now(),
            genotype: checkpoint.agent.clone(),
        };

        let numbered = GenerationSelector::Number(checkpoint.generation);
        let json_path = self.path(numbered, "json");
        Output::create_new(json_path.clone())?.write_json(&document)?;
        write_new_png(checkpoint.agent, &self.path(numbered, "png"))?;

        let latest = GenerationSelector::Latest;
        Output::create(self.path(latest, "json"))?.write_json(&document)?;
        let latest_png = self.path(latest, "png");
        render::save_png(checkpoint.agent, &latest_png)
            .with_context(|| format!("Failed to render network to {}", latest_png.display()))?;

        eprintln!("  Saved checkpoint: {}", json_path.display());
        Ok(())
    }
}
