use std::time::Duration;

use anyhow::Result;
use crossterm::event::KeyCode;
use log::info;

use crate::{
    env::Environment,
    gym::Dir,
    viz::{self, Binding, GameScreen, Tui},
};

use super::{stream, Session};

static KEYS: [Binding; 4] = [
    ("Arrows / WASD", "Move"),
    ("      r      ", "Restart"),
    ("      h      ", "Toggle this popup"),
    ("    q / Esc  ", "Quit"),
];

#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    /// Write the encoded vision to the log pane after every move
    pub show_state: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyAction {
    Move(Dir),
    Restart,
    Help,
    Quit,
}

pub(crate) fn key_action(key: KeyCode) -> Option<KeyAction> {
    let action = match key {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => KeyAction::Move(Dir::Up),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => KeyAction::Move(Dir::Right),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => KeyAction::Move(Dir::Down),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => KeyAction::Move(Dir::Left),
        KeyCode::Char('r') | KeyCode::Char('R') => KeyAction::Restart,
        KeyCode::Char('h') => KeyAction::Help,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        _ => return None,
    };
    Some(action)
}

/// Drive the snake from the keyboard, one move per key press
pub fn run(session: &Session, opts: &PlayOptions) -> Result<()> {
    let mut env = session.env(stream::ENV)?;
    let mut show_help = false;
    let mut score = 0.0;
    let mut best = env.length();

    let mut tui = Tui::init()?;
    loop {
        tui.draw(|f| {
            let screen = GameScreen::new(&env, "Slither")
                .stat("Length", env.length())
                .stat("Best", best)
                .stat("Steps", env.steps())
                .stat("Since food", env.steps_since_food())
                .stat("Score", format!("{score:.1}"))
                .hint("arrows/wasd move | r restart | h help | q quit")
                .help(show_help.then_some(KEYS.as_slice()));
            f.render_widget(screen, f.size());
        })?;

        let Some(action) = viz::poll_key(Duration::from_millis(250))?.and_then(key_action) else {
            continue;
        };

        match action {
            KeyAction::Quit => break,
            KeyAction::Help => show_help = !show_help,
            KeyAction::Restart => {
                env.reset()?;
                score = 0.0;
            }
            KeyAction::Move(dir) if env.is_active() => {
                let (reward, done) = env.advance(dir)?;
                score += reward;
                best = best.max(env.length());
                if opts.show_state {
                    if let Some(state) = env.state() {
                        info!("{state}");
                    }
                }
                if done {
                    info!("Game over with length {} after {} steps", env.length(), env.steps());
                }
            }
            KeyAction::Move(_) => {}
        }
    }
    drop(tui);

    println!("Best length: {best}");
    Ok(())
}
