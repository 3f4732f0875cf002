use std::{fmt, path::PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    algo::{QTableAgent, QTableAgentConfig},
    decay::Constant,
    gym::Slither,
    persistence::Snapshot,
};

use super::{stream, Session};

#[derive(Debug, Clone)]
pub struct EvaluateOptions {
    pub load: PathBuf,
    pub games: u32,
    pub danger_filter: bool,
}

/// Final snake lengths over a batch of games
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSummary {
    pub lengths: Vec<usize>,
}

impl EvaluationSummary {
    pub fn games(&self) -> usize {
        self.lengths.len()
    }

    pub fn mean(&self) -> f64 {
        if self.lengths.is_empty() {
            return 0.0;
        }
        self.lengths.iter().sum::<usize>() as f64 / self.games() as f64
    }

    pub fn max(&self) -> usize {
        self.lengths.iter().copied().max().unwrap_or(0)
    }

    pub fn min(&self) -> usize {
        self.lengths.iter().copied().min().unwrap_or(0)
    }

    /// Games that ended with at least `length` segments
    pub fn at_least(&self, length: usize) -> usize {
        self.lengths.iter().filter(|&&l| l >= length).count()
    }

    fn share(&self, count: usize) -> f64 {
        if self.lengths.is_empty() {
            return 0.0;
        }
        100.0 * count as f64 / self.games() as f64
    }
}

impl fmt::Display for EvaluationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Games played:  {}", self.games())?;
        writeln!(f, "Mean length:   {:.2}", self.mean())?;
        writeln!(f, "Max length:    {}", self.max())?;
        writeln!(f, "Min length:    {}", self.min())?;
        for threshold in [5, 10] {
            let count = self.at_least(threshold);
            writeln!(
                f,
                "Length >= {threshold:<2}:  {count}/{} ({:.1}%)",
                self.games(),
                self.share(count)
            )?;
        }
        Ok(())
    }
}

/// Play `games` greedy games with a trained table, learning nothing
pub fn evaluate(session: &Session, snapshot: Snapshot, games: u32, danger_filter: bool) -> Result<EvaluationSummary> {
    let mut env = session.env(stream::ENV)?;
    let mut agent: QTableAgent<Slither, Constant> =
        QTableAgent::with_table(QTableAgentConfig::greedy(danger_filter), snapshot.q_table, 0)
            .with_rng(session.rng(stream::AGENT));

    let mut lengths = Vec::with_capacity(games as usize);
    for game in 1..=games {
        agent.play(&mut env)?;
        let length = env.length();
        debug!("Game {game} ended after {} steps with length {length}", env.steps());
        if game % 10 == 0 || game == games {
            info!("Game {game:>4}/{games} | length {length:>2} | steps {:>4}", env.steps());
        }
        lengths.push(length);
    }

    Ok(EvaluationSummary { lengths })
}

/// Load a model, evaluate it and print the statistics
pub fn run(session: &Session, opts: &EvaluateOptions) -> Result<EvaluationSummary> {
    let snapshot = Snapshot::load_trained(&opts.load)
        .with_context(|| format!("cannot evaluate {}", opts.load.display()))?;

    println!("Model:          {}", opts.load.display());
    println!("Trained for:    {} episodes", snapshot.episodes);
    println!("Known states:   {}", snapshot.q_table.len());
    println!("Danger filter:  {}", if opts.danger_filter { "on" } else { "off" });

    let summary = evaluate(session, snapshot, opts.games, opts.danger_filter)?;
    println!("\n{summary}");
    Ok(summary)
}
