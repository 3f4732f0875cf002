use std::collections::VecDeque;

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, FromRepr, VariantArray};

use crate::error::SlitherError;

/// Cell coordinates `(x, y)`, with `(0, 0)` in the top left corner
pub type Pos = (i32, i32);

#[derive(
    EnumIter,
    VariantArray,
    FromRepr,
    Display,
    Clone,
    Copy,
    Debug,
    Hash,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub enum Dir {
    #[strum(to_string = "UP")]
    Up = 0,
    #[strum(to_string = "RIGHT")]
    Right = 1,
    #[strum(to_string = "DOWN")]
    Down = 2,
    #[strum(to_string = "LEFT")]
    Left = 3,
}

impl Dir {
    /// Unit step `(dx, dy)` for this direction
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, -1),
            Dir::Right => (1, 0),
            Dir::Down => (0, 1),
            Dir::Left => (-1, 0),
        }
    }

    pub fn step(self, pos: Pos) -> Pos {
        let (dx, dy) = self.offset();
        (pos.0 + dx, pos.1 + dy)
    }
}

impl TryFrom<(i32, i32)> for Dir {
    type Error = SlitherError;

    fn try_from(offset: (i32, i32)) -> Result<Self, Self::Error> {
        match offset {
            (0, -1) => Ok(Dir::Up),
            (1, 0) => Ok(Dir::Right),
            (0, 1) => Ok(Dir::Down),
            (-1, 0) => Ok(Dir::Left),
            (dx, dy) => Err(SlitherError::InvalidDirection(dx, dy)),
        }
    }
}

impl TryFrom<usize> for Dir {
    type Error = SlitherError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Dir::from_repr(index).ok_or(SlitherError::InvalidAction(index))
    }
}

impl From<Dir> for usize {
    fn from(dir: Dir) -> Self {
        dir as usize
    }
}

/// Cell codes of the projected grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Empty = 0,
    Snake = 1,
    Growth = 2,
    Shrink = 3,
}

impl Cell {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Snake body, head first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    pub(crate) body: VecDeque<Pos>,
}

impl Snake {
    /// A straight snake of `len` segments with its head at `head`, trailing off to the left
    fn horizontal(head: Pos, len: usize) -> Self {
        Self {
            body: (0..len as i32).map(|i| (head.0 - i, head.1)).collect(),
        }
    }

    /// **Panics** if the snake has no segments left
    pub fn head(&self) -> Pos {
        *self.body.front().expect("body is not empty")
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn contains(&self, pos: &Pos) -> bool {
        self.body.contains(pos)
    }

    pub fn segments(&self) -> impl Iterator<Item = &Pos> {
        self.body.iter()
    }
}

/// The canonical board: snake, growth apples and the shrink apple
///
/// The cell grid is only ever derived from these, see [`Board::grid`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: i32,
    height: i32,
    pub(crate) snake: Snake,
    pub(crate) green: Vec<Pos>,
    pub(crate) red: Pos,
}

impl Board {
    /// Place a horizontal snake of `snake_len` segments and `green_apples` + 1 apples at random,
    /// without overlap
    pub fn spawn<R: Rng>(
        width: i32,
        height: i32,
        snake_len: usize,
        green_apples: usize,
        rng: &mut R,
    ) -> Result<Self, SlitherError> {
        let len = snake_len as i32;
        if len < 1 || len > width || height < 1 {
            return Err(SlitherError::NoSpace);
        }

        let head = (rng.gen_range(len - 1..width), rng.gen_range(0..height));
        let mut board = Self {
            width,
            height,
            snake: Snake::horizontal(head, snake_len),
            green: Vec::with_capacity(green_apples),
            red: (-1, -1),
        };

        for _ in 0..green_apples {
            let pos = board.sample_empty(rng)?;
            board.green.push(pos);
        }
        board.red = board.sample_empty(rng)?;

        Ok(board)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    pub fn green_apples(&self) -> &[Pos] {
        &self.green
    }

    pub fn red_apple(&self) -> Pos {
        self.red
    }

    pub fn is_in_bounds(&self, pos: Pos) -> bool {
        pos.0 >= 0 && pos.1 >= 0 && pos.0 < self.width && pos.1 < self.height
    }

    fn is_occupied(&self, pos: &Pos) -> bool {
        self.snake.contains(pos) || self.green.contains(pos) || self.red == *pos
    }

    /// All cells free of snake and apples, row by row
    pub fn empty_cells(&self) -> Vec<Pos> {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .filter(|pos| !self.is_occupied(pos))
            .collect()
    }

    /// Draw a uniformly random empty cell
    pub fn sample_empty<R: Rng>(&self, rng: &mut R) -> Result<Pos, SlitherError> {
        self.empty_cells()
            .choose(rng)
            .copied()
            .ok_or(SlitherError::NoSpace)
    }

    /// Content of an in-bounds cell, `None` outside the board
    pub fn cell(&self, pos: Pos) -> Option<Cell> {
        if !self.is_in_bounds(pos) {
            return None;
        }

        let cell = if self.green.contains(&pos) {
            Cell::Growth
        } else if self.red == pos {
            Cell::Shrink
        } else if self.snake.contains(&pos) {
            Cell::Snake
        } else {
            Cell::Empty
        };
        Some(cell)
    }

    /// Project the board onto a `height` x `width` grid of cells, indexed `[y][x]`
    pub fn grid(&self) -> Vec<Vec<Cell>> {
        let mut grid = vec![vec![Cell::Empty; self.width as usize]; self.height as usize];
        for &(x, y) in self.snake.segments() {
            grid[y as usize][x as usize] = Cell::Snake;
        }
        for &(x, y) in &self.green {
            grid[y as usize][x as usize] = Cell::Growth;
        }
        if self.is_in_bounds(self.red) {
            grid[self.red.1 as usize][self.red.0 as usize] = Cell::Shrink;
        }

        grid
    }

    /// Manhattan distance from `pos` to the closest growth apple
    pub fn nearest_green(&self, pos: Pos) -> Option<i32> {
        self.green.iter().map(|&apple| manhattan(pos, apple)).min()
    }

    pub fn red_distance(&self, pos: Pos) -> i32 {
        manhattan(pos, self.red)
    }

    #[cfg(test)]
    pub(crate) fn fixture(width: i32, height: i32, snake: &[Pos], green: &[Pos], red: Pos) -> Self {
        Self {
            width,
            height,
            snake: Snake {
                body: snake.iter().copied().collect(),
            },
            green: green.to_vec(),
            red,
        }
    }
}

fn manhattan(a: Pos, b: Pos) -> i32 {
    (a.0 - b.0).abs() + (a.1 - b.1).abs()
}
