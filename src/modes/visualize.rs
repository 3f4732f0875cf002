use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use crossterm::event::KeyCode;
use log::info;

use crate::{
    algo::{QTableAgent, QTableAgentConfig},
    decay::Constant,
    env::{DiscreteActionSpace, Environment},
    gym::{Dir, Slither},
    persistence::Snapshot,
    viz::{self, Binding, GameScreen, Tui},
};

use super::{stream, Session};

/// Redraw interval while paused or after game over
const IDLE: Duration = Duration::from_millis(250);

static KEYS: [Binding; 5] = [
    ("  q  ", "Quit"),
    ("Space", "Pause or resume"),
    ("Enter", "Advance one move while paused"),
    ("  r  ", "New game once the snake is dead"),
    ("  h  ", "Toggle this popup"),
];

#[derive(Debug, Clone)]
pub struct VisualizeOptions {
    pub load: PathBuf,
    /// Moves per second while running
    pub fps: u32,
    /// Start paused and advance one move per key press
    pub step: bool,
    pub danger_filter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quit,
    TogglePause,
    Step,
    Restart,
    Help,
}

fn command(key: KeyCode) -> Option<Command> {
    match key {
        KeyCode::Char('q') | KeyCode::Esc => Some(Command::Quit),
        KeyCode::Char(' ') | KeyCode::Char('p') => Some(Command::TogglePause),
        KeyCode::Enter | KeyCode::Char('n') => Some(Command::Step),
        KeyCode::Char('r') => Some(Command::Restart),
        KeyCode::Char('h') => Some(Command::Help),
        _ => None,
    }
}

/// Milliseconds between moves, at least one
fn frame(fps: u32) -> Duration {
    Duration::from_millis((1000 / fps.max(1) as u64).max(1))
}

/// Watch a trained table play in the terminal
pub fn run(session: &Session, opts: &VisualizeOptions) -> Result<()> {
    let snapshot = Snapshot::load_trained(&opts.load)
        .with_context(|| format!("cannot visualize {}", opts.load.display()))?;
    let (episodes, states) = (snapshot.episodes, snapshot.q_table.len());

    let mut env = session.env(stream::ENV)?;
    let mut agent: QTableAgent<Slither, Constant> =
        QTableAgent::with_table(QTableAgentConfig::greedy(opts.danger_filter), snapshot.q_table, 0)
            .with_rng(session.rng(stream::AGENT));

    let frame = frame(opts.fps);
    let mut paused = opts.step;
    let mut show_help = false;
    let mut game = 1;
    let mut pending: Option<Dir> = None;
    let mut last_reward = 0.0;
    let mut finished = Vec::new();

    let mut tui = Tui::init()?;
    loop {
        if pending.is_none() && env.is_active() {
            pending = env.state().map(|state| agent.act(&state, &env.actions()));
        }

        tui.draw(|f| {
            let mode = if paused {
                String::from("paused (Enter steps)")
            } else {
                format!("running at {} fps", opts.fps.max(1))
            };
            let screen = GameScreen::new(&env, format!("Game {game}"))
                .action(pending)
                .stat("Model", format!("{episodes} episodes, {states} states"))
                .stat("Length", env.length())
                .stat("Steps", env.steps())
                .stat("Since food", env.steps_since_food())
                .stat("Last reward", format!("{last_reward:.2}"))
                .stat("Mode", mode)
                .hint("q quit | space pause | enter step | r restart | h help")
                .help(show_help.then_some(KEYS.as_slice()));
            f.render_widget(screen, f.size());
        })?;

        let timeout = if paused || !env.is_active() { IDLE } else { frame };
        let mut advance = false;
        match viz::poll_key(timeout)?.and_then(command) {
            Some(Command::Quit) => break,
            Some(Command::TogglePause) => paused = !paused,
            Some(Command::Step) => advance = paused,
            Some(Command::Restart) if !env.is_active() => {
                finished.push(env.length());
                env.reset()?;
                game += 1;
                last_reward = 0.0;
            }
            Some(Command::Help) => show_help = !show_help,
            Some(_) => {}
            None => advance = !paused,
        }

        if advance && env.is_active() {
            if let Some(dir) = pending.take() {
                let (reward, done) = env.advance(dir)?;
                last_reward = reward;
                if done {
                    info!("Game {game} over with length {} after {} steps", env.length(), env.steps());
                }
            }
        }
    }
    drop(tui);

    finished.push(env.length());
    println!("Model:          {} ({episodes} episodes, {states} states)", opts.load.display());
    println!("Games watched:  {game}");
    println!("Final lengths:  {finished:?}");
    Ok(())
}
