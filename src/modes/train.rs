use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::{info, warn};

use crate::{
    algo::{QTable, QTableAgent, QTableAgentConfig},
    decay::Linear,
    env::Report,
    error::SlitherError,
    exploration::EpsilonGreedy,
    gym::{Slither, VisionState},
    persistence::Snapshot,
    viz,
};

use super::{stream, Session};

/// Episodes between progress lines
const PROGRESS_EVERY: u32 = 100;

#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub episodes: u32,
    pub save: PathBuf,
    /// Continue from this model; its episode count carries over into the saved one
    pub load: Option<PathBuf>,
    /// Write one CSV row of metrics per episode here
    pub stats: Option<PathBuf>,
    /// Show the live dashboard while training
    pub dashboard: bool,
    pub alpha: f32,
    pub gamma: f32,
    pub epsilon_start: f32,
    pub epsilon_end: f32,
    /// Share of the run over which epsilon falls from start to end
    pub decay_fraction: f32,
    pub danger_filter: bool,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            episodes: 2000,
            save: PathBuf::from("models/model.bin"),
            load: None,
            stats: None,
            dashboard: false,
            alpha: 0.2,
            gamma: 0.95,
            epsilon_start: 0.4,
            epsilon_end: 0.05,
            decay_fraction: 0.7,
            danger_filter: false,
        }
    }
}

impl TrainOptions {
    fn agent_config(&self) -> Result<QTableAgentConfig> {
        for (name, epsilon) in [("start", self.epsilon_start), ("end", self.epsilon_end)] {
            if !(0.0..=1.0).contains(&epsilon) {
                bail!("epsilon {name} must be within [0, 1], got {epsilon}");
            }
        }
        let schedule = Linear::over_fraction(
            self.epsilon_start,
            self.epsilon_end,
            self.episodes,
            self.decay_fraction,
        )
        .context("invalid epsilon schedule")?;

        Ok(QTableAgentConfig {
            exploration: EpsilonGreedy::new(schedule),
            alpha: self.alpha,
            gamma: self.gamma,
            danger_filter: self.danger_filter,
        })
    }
}

/// A training run: one environment, one learning agent and the running records
///
/// The epsilon schedule always starts over with the run, while the episode count of the
/// saved model adds up across resumed runs.
pub struct Trainer {
    env: Slither,
    agent: QTableAgent<Slither>,
    prior_episodes: u64,
    episodes: u32,
    best_length: usize,
}

impl Trainer {
    pub fn new(session: &Session, opts: &TrainOptions, start: Snapshot) -> Result<Self> {
        let env = session.env(stream::ENV)?;
        let agent = QTableAgent::with_table(opts.agent_config()?, start.q_table, 0)
            .with_rng(session.rng(stream::AGENT));

        Ok(Self {
            env,
            agent,
            prior_episodes: start.episodes,
            episodes: opts.episodes,
            best_length: 0,
        })
    }

    /// Episodes finished in this run
    pub fn completed(&self) -> u32 {
        self.agent.episode()
    }

    pub fn best_length(&self) -> usize {
        self.best_length
    }

    pub fn report_keys(&self) -> &[&'static str] {
        self.env.report.keys()
    }

    /// Play and learn from one episode, returning its metrics
    pub fn run_episode(&mut self) -> Result<Report, SlitherError> {
        let epsilon = self.agent.epsilon();
        self.agent.go(&mut self.env)?;

        let report = self.env.report.take();
        let length = self.env.length();
        self.best_length = self.best_length.max(length);

        let done = self.completed();
        if done % PROGRESS_EVERY == 0 || done == self.episodes {
            info!(
                "Episode {done:>5}/{} | length {length:>2} | best {:>2} | steps {:>4} | epsilon {epsilon:.3}",
                self.episodes, self.best_length, report["steps"],
            );
        }

        Ok(report)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(
            self.agent.get_q_table().clone(),
            self.prior_episodes + self.completed() as u64,
        )
    }

    pub fn q_table(&self) -> &QTable<VisionState> {
        self.agent.get_q_table()
    }
}

/// Starting point of a run: a saved model, or an empty table
pub(crate) fn starting_snapshot(load: Option<&PathBuf>) -> Result<Snapshot> {
    match load {
        Some(path) => Snapshot::load(path)
            .with_context(|| format!("failed to resume from {}", path.display())),
        None => Ok(Snapshot::new(QTable::new(), 0)),
    }
}

/// Train a model and save it, returning the saved snapshot
pub fn run(session: &Session, opts: &TrainOptions) -> Result<Snapshot> {
    let start = starting_snapshot(opts.load.as_ref())?;
    if start.episodes > 0 || !start.q_table.is_empty() {
        info!(
            "Resuming with {} states after {} episodes",
            start.q_table.len(),
            start.episodes
        );
    }

    let mut trainer = Trainer::new(session, opts, start)?;
    info!(
        "Training for {} episodes (alpha {}, gamma {}, epsilon {} -> {} over {:.0}% of the run)",
        opts.episodes,
        opts.alpha,
        opts.gamma,
        opts.epsilon_start,
        opts.epsilon_end,
        opts.decay_fraction * 100.0
    );

    let mut stats = match &opts.stats {
        Some(path) => {
            let mut wtr = csv::Writer::from_path(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let header = ["episode"].iter().chain(trainer.report_keys());
            wtr.write_record(header)?;
            Some(wtr)
        }
        None => None,
    };

    let dashboard = opts
        .dashboard
        .then(|| viz::init(trainer.report_keys(), opts.episodes));

    for i in 0..opts.episodes {
        let report = trainer.run_episode()?;

        if let Some(wtr) = stats.as_mut() {
            wtr.write_record(stats_row(i, &report))?;
        }

        if let Some((_, tx)) = &dashboard {
            let update = viz::Update {
                episode: i,
                data: report.values(),
            };
            if tx.send(update).is_err() {
                warn!("Dashboard closed, stopping after {} episodes", i + 1);
                break;
            }
        }
    }

    if let Some(mut wtr) = stats {
        wtr.flush()?;
    }

    let snapshot = trainer.snapshot();
    snapshot
        .save(&opts.save)
        .with_context(|| format!("failed to save model to {}", opts.save.display()))?;
    info!(
        "Training done: {} states, best length {}",
        snapshot.q_table.len(),
        trainer.best_length()
    );

    if let Some((handle, tx)) = dashboard {
        drop(tx);
        match handle.join() {
            Ok(result) => result.context("dashboard failed")?,
            Err(_) => warn!("Dashboard thread panicked"),
        }
    }

    Ok(snapshot)
}

/// One CSV record: the episode index followed by the report values in key order
fn stats_row(episode: u32, report: &Report) -> Vec<String> {
    let values = report.values();
    std::iter::once(episode.to_string())
        .chain(values.iter().map(f64::to_string))
        .collect()
}
