pub mod board;
pub mod help;
pub mod log;
pub mod plot;
pub mod vision;

use crossterm::event::Event;
pub use board::BoardView;
pub use log::Logs;
pub use plot::Plots;
use ratatui::widgets::WidgetRef;
pub use vision::VisionPanel;

pub trait Component: WidgetRef {
    fn handle_ui_event(&mut self, event: &Event) -> bool;
}
