use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;

use crate::{algo::QTable, persistence::Snapshot};

use super::{Session, TrainOptions, Trainer};

#[derive(Debug, Clone)]
pub struct CheckpointOptions {
    /// Episode counts to save at, e.g. 1, 10 and 100
    pub at: Vec<u32>,
    pub dir: PathBuf,
    /// Hyperparameters of the run; `episodes`, `save`, `load` and `stats` are ignored
    pub train: TrainOptions,
}

/// File a checkpoint taken after `episodes` episodes is saved to
pub fn checkpoint_path(dir: &Path, episodes: u32) -> PathBuf {
    dir.join(format!("{episodes}sess.bin"))
}

/// Train once for the largest listed count, saving a model at every listed count
pub fn run(session: &Session, opts: &CheckpointOptions) -> Result<Vec<PathBuf>> {
    let mut at = opts.at.clone();
    at.sort_unstable();
    at.dedup();
    if at.first() == Some(&0) {
        bail!("checkpoint episode counts must be positive");
    }
    let Some(&last) = at.last() else {
        bail!("no checkpoint episode counts given");
    };

    let train = TrainOptions {
        episodes: last,
        load: None,
        stats: None,
        dashboard: false,
        ..opts.train.clone()
    };
    let mut trainer = Trainer::new(session, &train, Snapshot::new(QTable::new(), 0))?;
    info!("Training {last} episodes with checkpoints at {at:?}");

    let mut saved = Vec::with_capacity(at.len());
    for target in at {
        while trainer.completed() < target {
            trainer.run_episode()?;
        }
        let path = checkpoint_path(&opts.dir, target);
        trainer
            .snapshot()
            .save(&path)
            .with_context(|| format!("failed to save checkpoint {}", path.display()))?;
        saved.push(path);
    }

    Ok(saved)
}
