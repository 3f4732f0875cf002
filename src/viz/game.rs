use ratatui::{prelude::*, widgets::*};
use tui_logger::TuiLoggerWidget;

use crate::gym::{Dir, Slither, Status};

use super::components::{help::render_bindings, help::Binding, BoardView, VisionPanel};

/// One frame of a running game: the board, what the snake sees, a few stats and the log
pub struct GameScreen<'a> {
    env: &'a Slither,
    title: String,
    action: Option<Dir>,
    stats: Vec<(&'static str, String)>,
    hint: &'static str,
    help: Option<&'a [Binding]>,
}

impl<'a> GameScreen<'a> {
    pub fn new(env: &'a Slither, title: impl Into<String>) -> Self {
        Self {
            env,
            title: title.into(),
            action: None,
            stats: Vec::new(),
            hint: "",
            help: None,
        }
    }

    /// The direction chosen for the next move
    pub fn action(mut self, action: Option<Dir>) -> Self {
        self.action = action;
        self
    }

    pub fn stat(mut self, label: &'static str, value: impl ToString) -> Self {
        self.stats.push((label, value.to_string()));
        self
    }

    /// One-line key summary shown under the stats
    pub fn hint(mut self, hint: &'static str) -> Self {
        self.hint = hint;
        self
    }

    /// Show the full key bindings as a popup
    pub fn help(mut self, bindings: Option<&'a [Binding]>) -> Self {
        self.help = bindings;
        self
    }

    fn status_line(&self) -> Line<'static> {
        match self.env.status() {
            Status::Active => Line::from("playing".light_green()),
            Status::Terminated(cause) => Line::from(format!("game over: {cause}").light_red().bold()),
        }
    }
}

impl Widget for GameScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let board = BoardView::new(self.env.board()).title(self.title.clone());
        let (board_width, board_height) = board.size();

        let [board_area, side_area] =
            Layout::horizontal([Constraint::Length(board_width), Constraint::Fill(1)]).areas(area);
        let [board_area, _] =
            Layout::vertical([Constraint::Length(board_height), Constraint::Fill(1)]).areas(board_area);
        let [vision_area, stats_area, log_area] = Layout::vertical([
            Constraint::Length(6),
            Constraint::Length(self.stats.len() as u16 + 5),
            Constraint::Fill(1),
        ])
        .areas(side_area);

        board.render(board_area, buf);
        VisionPanel::new(self.env)
            .action(self.action)
            .render(vision_area, buf);

        let mut lines = vec![self.status_line()];
        lines.extend(self.stats.iter().map(|(label, value)| {
            Line::from(vec![
                Span::from(format!("{label:<12}")).bold(),
                Span::raw(value.clone()),
            ])
        }));
        lines.push(Line::default());
        lines.push(Line::from(self.hint.dark_gray()));

        Paragraph::new(lines)
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .title("Stats"),
            )
            .render(stats_area, buf);

        TuiLoggerWidget::default()
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .title("Log"),
            )
            .style(Style::default().white())
            .style_warn(Style::default().light_yellow())
            .style_info(Style::default().cyan())
            .output_separator(' ')
            .output_target(false)
            .output_file(false)
            .output_line(false)
            .render(log_area, buf);

        if let Some(bindings) = self.help {
            render_bindings(area, buf, "Keys", bindings);
        }
    }
}
