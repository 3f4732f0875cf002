//! Terminal views: the training dashboard and the live game screen

use std::{
    io,
    sync::mpsc::{self, Sender},
    thread::{self, JoinHandle},
};

use log::LevelFilter;

mod app;
mod components;
mod game;
mod tui;
mod util;

pub use app::{App, Update};
pub use components::help::Binding;
pub use game::GameScreen;
pub use tui::Tui;
pub(crate) use util::poll_key;

/// Spawn the training dashboard on its own thread
///
/// Send one [`Update`] per finished episode; dropping the sender marks training as done. The
/// dashboard keeps running until the user quits it, so join the handle before exiting.
pub fn init(plots: &[&'static str], episodes: u32) -> (JoinHandle<io::Result<()>>, Sender<Update>) {
    let (tx, rx) = mpsc::channel();
    let mut app = App::new(plots, episodes);
    let handle = thread::spawn(move || app.run(rx));
    (handle, tx)
}

/// Route `log` records into the dashboard's log tab
pub fn init_logger(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    tui_logger::init_logger(level)?;
    tui_logger::set_default_level(level);
    Ok(())
}
