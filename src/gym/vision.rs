use std::{fmt, ops::Index};

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::env::Hazards;

use super::board::{Board, Cell, Dir, Pos};

/// The first thing a ray from the head runs into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Object {
    Wall,
    Growth,
    Shrink,
    Body,
}

impl Object {
    pub const fn symbol(self) -> char {
        match self {
            Object::Wall => 'W',
            Object::Growth => 'G',
            Object::Shrink => 'R',
            Object::Body => 'S',
        }
    }
}

/// Distance band of a sighted object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Distance {
    Near = 1,
    Mid = 2,
    Far = 3,
}

/// Inclusive upper bounds of the distance bands
///
/// Changing these after training invalidates the learned table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisionConfig {
    pub near: u32,
    pub mid: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self { near: 2, mid: 4 }
    }
}

impl VisionConfig {
    pub fn bucket(&self, distance: u32) -> Distance {
        if distance <= self.near {
            Distance::Near
        } else if distance <= self.mid {
            Distance::Mid
        } else {
            Distance::Far
        }
    }
}

/// What the snake sees along one direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Sight {
    pub object: Object,
    pub distance: Distance,
}

impl fmt::Display for Sight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.object.symbol(), self.distance as u8)
    }
}

/// Sights in the fixed order up, right, down, left
///
/// This is the key of the learned Q-table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisionState(pub [Sight; 4]);

impl VisionState {
    pub fn sights(&self) -> impl Iterator<Item = (Dir, Sight)> + '_ {
        Dir::iter().zip(self.0.iter().copied())
    }
}

impl Index<Dir> for VisionState {
    type Output = Sight;

    fn index(&self, dir: Dir) -> &Self::Output {
        &self.0[dir as usize]
    }
}

impl Hazards<Dir> for VisionState {
    /// A wall or body segment in the nearest band
    fn is_hazard(&self, dir: Dir) -> bool {
        let sight = self[dir];
        sight.distance == Distance::Near && matches!(sight.object, Object::Wall | Object::Body)
    }
}

impl fmt::Display for VisionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .sights()
            .map(|(dir, sight)| format!("{}:{}", dir, sight))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

/// Walk from the head along `dir` until something other than an empty cell shows up
///
/// Apples are checked before body segments; the two never share a cell. The walk always ends
/// because the board is finite.
pub fn scan(board: &Board, head: Pos, dir: Dir, config: &VisionConfig) -> Sight {
    let mut pos = head;
    let mut distance = 0;
    let object = loop {
        pos = dir.step(pos);
        distance += 1;
        match board.cell(pos) {
            None => break Object::Wall,
            Some(Cell::Growth) => break Object::Growth,
            Some(Cell::Shrink) => break Object::Shrink,
            Some(Cell::Snake) => break Object::Body,
            Some(Cell::Empty) => {}
        }
    };

    Sight {
        object,
        distance: config.bucket(distance),
    }
}

/// Encode the view from `head` in all four directions
pub fn observe(board: &Board, head: Pos, config: &VisionConfig) -> VisionState {
    let sights = [Dir::Up, Dir::Right, Dir::Down, Dir::Left].map(|dir| scan(board, head, dir, config));
    VisionState(sights)
}

/// The raw ray of cell symbols from the head to the wall, for display
///
/// `H` head, `S` body, `G` growth apple, `R` shrink apple, `0` empty, `W` wall
pub fn ray(board: &Board, head: Pos, dir: Dir) -> Vec<char> {
    let mut symbols = vec!['H'];
    let mut pos = head;
    loop {
        pos = dir.step(pos);
        let symbol = match board.cell(pos) {
            None => Object::Wall.symbol(),
            Some(Cell::Growth) => Object::Growth.symbol(),
            Some(Cell::Shrink) => Object::Shrink.symbol(),
            Some(Cell::Snake) => Object::Body.symbol(),
            Some(Cell::Empty) => '0',
        };
        symbols.push(symbol);
        if symbol == 'W' {
            return symbols;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sight(object: Object, distance: Distance) -> Sight {
        Sight { object, distance }
    }

    #[test]
    fn bucketing() {
        let config = VisionConfig::default();
        assert_eq!(config.bucket(1), Distance::Near);
        assert_eq!(config.bucket(2), Distance::Near);
        assert_eq!(config.bucket(3), Distance::Mid);
        assert_eq!(config.bucket(4), Distance::Mid);
        assert_eq!(config.bucket(5), Distance::Far);
        assert_eq!(config.bucket(9), Distance::Far);
    }

    #[test]
    fn observe_all_directions() {
        // Head at (5,5), body trailing left, growth apple straight up, shrink apple below
        let board = Board::fixture(
            10,
            10,
            &[(5, 5), (4, 5), (3, 5)],
            &[(5, 2), (0, 0)],
            (5, 9),
        );
        let state = observe(&board, (5, 5), &VisionConfig::default());

        assert_eq!(state[Dir::Up], sight(Object::Growth, Distance::Mid), "Apple three cells up");
        assert_eq!(state[Dir::Right], sight(Object::Wall, Distance::Far), "Wall five cells right");
        assert_eq!(state[Dir::Down], sight(Object::Shrink, Distance::Mid), "Shrink apple four cells down");
        assert_eq!(state[Dir::Left], sight(Object::Body, Distance::Near), "Own neck to the left");
    }

    #[test]
    fn scan_reports_wall_when_nothing_else_is_in_sight() {
        let board = Board::fixture(10, 10, &[(0, 0)], &[], (-1, -1));
        let config = VisionConfig::default();

        for dir in Dir::iter() {
            assert_eq!(scan(&board, (0, 0), dir, &config).object, Object::Wall);
        }
        assert_eq!(scan(&board, (0, 0), Dir::Up, &config).distance, Distance::Near);
        assert_eq!(scan(&board, (0, 0), Dir::Right, &config).distance, Distance::Far);
    }

    #[test]
    fn hazards() {
        let board = Board::fixture(10, 10, &[(9, 5), (8, 5), (7, 5)], &[(9, 0), (0, 0)], (9, 9));
        let state = observe(&board, (9, 5), &VisionConfig::default());

        assert!(state.is_hazard(Dir::Right), "Wall right next to the head");
        assert!(state.is_hazard(Dir::Left), "Body right next to the head");
        assert!(!state.is_hazard(Dir::Up), "Apple is not a hazard");
        assert!(!state.is_hazard(Dir::Down));
    }

    #[test]
    fn equal_views_make_equal_keys() {
        let a = Board::fixture(10, 10, &[(5, 5)], &[(5, 0)], (0, 5));
        let b = Board::fixture(10, 10, &[(5, 5)], &[(5, 0), (9, 9)], (0, 5));
        let config = VisionConfig::default();
        assert_eq!(observe(&a, (5, 5), &config), observe(&b, (5, 5), &config));
    }

    #[test]
    fn ray_symbols() {
        let board = Board::fixture(6, 6, &[(2, 3), (1, 3)], &[(4, 3)], (2, 0));
        assert_eq!(ray(&board, (2, 3), Dir::Right), ['H', '0', 'G', '0', 'W']);
        assert_eq!(ray(&board, (2, 3), Dir::Left), ['H', 'S', '0', 'W']);
        assert_eq!(ray(&board, (2, 3), Dir::Up), ['H', '0', '0', 'R', 'W']);
    }

    #[test]
    fn display() {
        let board = Board::fixture(10, 10, &[(0, 0)], &[], (-1, -1));
        let state = observe(&board, (0, 0), &VisionConfig::default());
        assert_eq!(state.to_string(), "UP:W1 RIGHT:W3 DOWN:W3 LEFT:W1");
    }
}
