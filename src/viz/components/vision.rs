use ratatui::{prelude::*, widgets::*};
use strum::IntoEnumIterator;

use crate::gym::{Dir, Slither};

/// The four rays from the head next to their encoded sights
pub struct VisionPanel<'a> {
    env: &'a Slither,
    action: Option<Dir>,
}

impl<'a> VisionPanel<'a> {
    pub fn new(env: &'a Slither) -> Self {
        Self { env, action: None }
    }

    /// Highlight the direction about to be taken
    pub fn action(mut self, action: Option<Dir>) -> Self {
        self.action = action;
        self
    }
}

fn symbol_span(symbol: char) -> Span<'static> {
    let span = Span::from(symbol.to_string());
    match symbol {
        'H' => span.light_green().bold(),
        'S' => span.green(),
        'G' => span.light_green(),
        'R' => span.light_red(),
        'W' => span.white().bold(),
        _ => span.dark_gray(),
    }
}

impl Widget for VisionPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.env.state();

        let lines = Dir::iter()
            .map(|dir| {
                let marker = if self.action == Some(dir) { "▶ " } else { "  " };
                let mut spans = vec![
                    Span::from(marker).light_yellow().bold(),
                    Span::from(format!("{:<6}", dir.to_string())).bold(),
                ];
                if let Some(sight) = state.map(|s| s[dir]) {
                    spans.push(Span::from(format!("{sight} ")).cyan());
                }
                spans.extend(
                    self.env
                        .look(dir)
                        .unwrap_or_default()
                        .into_iter()
                        .map(symbol_span),
                );
                Line::from(spans)
            })
            .collect::<Vec<_>>();

        Paragraph::new(lines)
            .block(
                Block::bordered()
                    .border_type(BorderType::Rounded)
                    .title("Vision"),
            )
            .render(area, buf);
    }
}
