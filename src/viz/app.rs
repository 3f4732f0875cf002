use std::{
    io,
    sync::mpsc::{Receiver, TryRecvError},
    time::Duration,
};

use crossterm::event::{self, KeyCode};
use ratatui::{prelude::*, widgets::*};

use super::{
    components::{help::render_help, Component, Logs, Plots},
    tui::Tui,
    util::event_keycode,
};

const TABS: [&str; 2] = ["Plots", "Logs"];

#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub enum State {
    #[default]
    Train,
    /// Training finished and the sender hung up; the dashboard stays up until dismissed
    Done,
    Quit,
}

/// Metrics of one finished episode, in the key order the dashboard was built with
pub struct Update {
    pub episode: u32,
    pub data: Vec<f64>,
}

/// The training dashboard, holding the plot data and running the render loop
pub struct App {
    state: State,
    episode: u32,
    total_episodes: u32,
    selected_tab: usize,
    show_help: bool,
    plots: Plots,
    logs: Logs,
}

impl App {
    pub fn new(plots: &[&'static str], episodes: u32) -> Self {
        Self {
            state: Default::default(),
            episode: 0,
            total_episodes: episodes,
            selected_tab: 0,
            show_help: false,
            plots: Plots::new(plots.to_vec(), episodes),
            logs: Logs::new(),
        }
    }

    /// Initialize the terminal and run the main loop until the user quits
    ///
    /// Restores the terminal on exit
    pub fn run(&mut self, rx: Receiver<Update>) -> io::Result<()> {
        let mut terminal = Tui::init()?;

        while self.state != State::Quit {
            if self.state == State::Train {
                self.drain(&rx);
            }

            terminal.draw(|frame| frame.render_widget(&*self, frame.size()))?;

            if event::poll(Duration::from_millis(16))? {
                let event = event::read()?;
                match event_keycode(&event) {
                    Some(KeyCode::Char('q')) => self.state = State::Quit,
                    Some(KeyCode::Char('h')) => self.show_help = !self.show_help,
                    Some(KeyCode::Tab) => {
                        self.selected_tab = (self.selected_tab + 1) % TABS.len();
                    }
                    Some(KeyCode::Left) if self.selected_tab == 0 => self.plots.prev_plot(),
                    Some(KeyCode::Right) if self.selected_tab == 0 => self.plots.next_plot(),
                    _ if self.selected_tab == 1 => {
                        self.logs.handle_ui_event(&event);
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }

    fn drain(&mut self, rx: &Receiver<Update>) {
        loop {
            match rx.try_recv() {
                Ok(update) => {
                    self.episode = update.episode + 1;
                    self.plots.update(update);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.state = State::Done;
                    break;
                }
            }
        }
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [menu_area, main_area, progress_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(3),
        ])
        .areas(area);

        Tabs::new(TABS)
            .block(Block::default().padding(Padding::uniform(1)))
            .white()
            .bold()
            .highlight_style(Style::default().light_green())
            .select(self.selected_tab)
            .render(menu_area, buf);

        match self.selected_tab {
            0 => self.plots.render(main_area, buf),
            1 => self.logs.render_ref(main_area, buf),
            _ => {}
        }

        let title = match self.state {
            State::Done => "Progress (done, press q to exit)",
            _ => "Progress",
        };
        let ratio = if self.total_episodes == 0 {
            1.0
        } else {
            (self.episode as f64 / self.total_episodes as f64).min(1.0)
        };
        Gauge::default()
            .block(Block::bordered().border_type(BorderType::Rounded).title(title))
            .gauge_style(Color::Cyan)
            .label(format!("{} / {}", self.episode, self.total_episodes))
            .ratio(ratio)
            .render(progress_area, buf);

        if self.show_help {
            render_help(area, buf, self.selected_tab);
        }
    }
}
