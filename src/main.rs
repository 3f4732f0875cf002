use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use slither::{
    gym::{SlitherConfig, HEIGHT, WIDTH},
    modes::{
        self, CheckpointOptions, EvaluateOptions, PlayOptions, Session, TrainOptions,
        VisualizeOptions,
    },
    viz,
};

#[derive(Parser)]
#[command(name = "slither")]
#[command(version, about = "Snake with a tabular Q-learning agent")]
struct Cli {
    #[command(subcommand)]
    mode: Mode,

    /// Board width
    #[arg(long, global = true, default_value_t = WIDTH)]
    width: i32,

    /// Board height
    #[arg(long, global = true, default_value_t = HEIGHT)]
    height: i32,

    /// Moves allowed in a row without eating
    #[arg(long, global = true, default_value_t = 100)]
    step_limit: u32,

    /// Seed every random draw for a reproducible run
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Mode {
    /// Train a model and save it
    Train(TrainArgs),
    /// Play greedy games with a model and report lengths
    Evaluate(EvaluateArgs),
    /// Watch a model play in the terminal
    Visualize(VisualizeArgs),
    /// Play with the keyboard
    Play(PlayArgs),
    /// Save models at several points of one training run
    Checkpoints(CheckpointArgs),
}

#[derive(Args)]
struct HyperArgs {
    /// Learning rate
    #[arg(long, default_value_t = 0.2)]
    alpha: f32,

    /// Discount factor
    #[arg(long, default_value_t = 0.95)]
    gamma: f32,

    #[arg(long, default_value_t = 0.4)]
    epsilon_start: f32,

    #[arg(long, default_value_t = 0.05)]
    epsilon_end: f32,

    /// Share of the episodes over which epsilon decays
    #[arg(long, default_value_t = 0.7)]
    decay_fraction: f32,

    /// Avoid immediately fatal moves while training
    #[arg(long)]
    danger_filter: bool,
}

#[derive(Args)]
struct TrainArgs {
    #[arg(short, long, default_value_t = 2000)]
    episodes: u32,

    /// Where to save the trained model
    #[arg(short, long)]
    save: PathBuf,

    /// Resume from a saved model
    #[arg(short, long)]
    load: Option<PathBuf>,

    /// Write per-episode metrics to a CSV file
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Show the live training dashboard
    #[arg(long)]
    dashboard: bool,

    #[command(flatten)]
    hyper: HyperArgs,
}

#[derive(Args)]
struct EvaluateArgs {
    #[arg(short, long)]
    load: PathBuf,

    /// Number of games to play
    #[arg(short, long, default_value_t = 100)]
    games: u32,

    /// Let the agent walk into walls and itself
    #[arg(long)]
    no_danger_filter: bool,
}

#[derive(Args)]
struct VisualizeArgs {
    #[arg(short, long)]
    load: PathBuf,

    /// Moves per second
    #[arg(long, default_value_t = 10)]
    fps: u32,

    /// Start paused and advance one move per key press
    #[arg(long)]
    step: bool,

    /// Let the agent walk into walls and itself
    #[arg(long)]
    no_danger_filter: bool,
}

#[derive(Args)]
struct PlayArgs {
    /// Log the encoded vision after every move
    #[arg(long)]
    show_state: bool,
}

#[derive(Args)]
struct CheckpointArgs {
    /// Episode counts to save at
    #[arg(long, value_delimiter = ',', default_value = "1,10,100")]
    at: Vec<u32>,

    /// Directory the checkpoints are saved to
    #[arg(long, default_value = "models")]
    dir: PathBuf,

    #[command(flatten)]
    hyper: HyperArgs,
}

impl HyperArgs {
    fn into_options(self, base: TrainOptions) -> TrainOptions {
        TrainOptions {
            alpha: self.alpha,
            gamma: self.gamma,
            epsilon_start: self.epsilon_start,
            epsilon_end: self.epsilon_end,
            decay_fraction: self.decay_fraction,
            danger_filter: self.danger_filter,
            ..base
        }
    }
}

fn init_logging(tui: bool) -> Result<()> {
    if tui {
        viz::init_logger(LevelFilter::Debug)?;
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let session = Session {
        env: SlitherConfig {
            width: cli.width,
            height: cli.height,
            step_limit: cli.step_limit,
            ..Default::default()
        },
        seed: cli.seed,
    };
    session.env.validate()?;

    match cli.mode {
        Mode::Train(args) => {
            init_logging(args.dashboard)?;
            let opts = args.hyper.into_options(TrainOptions {
                episodes: args.episodes,
                save: args.save,
                load: args.load,
                stats: args.stats,
                dashboard: args.dashboard,
                ..Default::default()
            });
            let snapshot = modes::train::run(&session, &opts)?;
            println!(
                "Saved {} states after {} episodes to {}",
                snapshot.q_table.len(),
                snapshot.episodes,
                opts.save.display()
            );
        }
        Mode::Evaluate(args) => {
            init_logging(false)?;
            let opts = EvaluateOptions {
                load: args.load,
                games: args.games,
                danger_filter: !args.no_danger_filter,
            };
            modes::evaluate::run(&session, &opts)?;
        }
        Mode::Visualize(args) => {
            init_logging(true)?;
            let opts = VisualizeOptions {
                load: args.load,
                fps: args.fps,
                step: args.step,
                danger_filter: !args.no_danger_filter,
            };
            modes::visualize::run(&session, &opts)?;
        }
        Mode::Play(args) => {
            init_logging(true)?;
            modes::play::run(&session, &PlayOptions { show_state: args.show_state })?;
        }
        Mode::Checkpoints(args) => {
            init_logging(false)?;
            let opts = CheckpointOptions {
                at: args.at,
                dir: args.dir,
                train: args.hyper.into_options(TrainOptions::default()),
            };
            for path in modes::checkpoints::run(&session, &opts)? {
                println!("Saved {}", path.display());
            }
        }
    }

    Ok(())
}
