use ratatui::{prelude::*, widgets::*};

use crate::gym::{Board, Cell};

/// The grid drawn two terminal columns per cell, walls as the border
pub struct BoardView<'a> {
    board: &'a Board,
    title: String,
}

impl<'a> BoardView<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self {
            board,
            title: String::from("Board"),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Terminal size needed to draw the board with its border
    pub fn size(&self) -> (u16, u16) {
        (self.board.width() as u16 * 2 + 2, self.board.height() as u16 + 2)
    }
}

fn cell_span(cell: Cell, is_head: bool) -> Span<'static> {
    match cell {
        Cell::Snake if is_head => Span::from("██").light_green().bold(),
        Cell::Snake => Span::from("▓▓").green(),
        Cell::Growth => Span::from("()").light_green().bold(),
        Cell::Shrink => Span::from("()").light_red().bold(),
        Cell::Empty => Span::from(" ·").dark_gray(),
    }
}

impl Widget for BoardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let head = self.board.snake().segments().next().copied();
        let lines = self
            .board
            .grid()
            .into_iter()
            .enumerate()
            .map(|(y, row)| {
                row.into_iter()
                    .enumerate()
                    .map(|(x, cell)| cell_span(cell, Some((x as i32, y as i32)) == head))
                    .collect::<Vec<_>>()
            })
            .map(Line::from)
            .collect::<Vec<_>>();

        Paragraph::new(lines)
            .block(
                Block::bordered()
                    .border_type(BorderType::Thick)
                    .title(self.title),
            )
            .render(area, buf);
    }
}
