use std::{
    io::{self, stdout, Stdout},
    ops::{Deref, DerefMut},
    panic,
    sync::Once,
};

use crossterm as ct;
use ct::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::{backend::CrosstermBackend, Terminal};

type Backend = CrosstermBackend<Stdout>;

static PANIC_HOOK: Once = Once::new();

/// The terminal in raw mode on the alternate screen
///
/// The original screen comes back when this is dropped or when the program panics.
pub struct Tui {
    terminal: Terminal<Backend>,
}

impl Tui {
    pub fn init() -> io::Result<Self> {
        PANIC_HOOK.call_once(init_panic_hook);
        ct::execute!(stdout(), EnterAlternateScreen)?;
        enable_raw_mode()?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        terminal.clear()?;
        Ok(Self { terminal })
    }
}

impl Deref for Tui {
    type Target = Terminal<Backend>;

    fn deref(&self) -> &Self::Target {
        &self.terminal
    }
}

impl DerefMut for Tui {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.terminal
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = restore();
    }
}

/// Restore the terminal to its original state
pub fn restore() -> io::Result<()> {
    ct::execute!(stdout(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}
