// Core value types shared by the board, heuristics and search

use serde::{Deserialize, Serialize};
use std::fmt;

/// Heuristic and search score. Higher favours the evaluated player.
pub type Score = f64;

/// Sentinel for a position the evaluated player has certainly won
pub const SCORE_WIN: Score = f64::INFINITY;

/// Sentinel for a position the evaluated player has certainly lost
pub const SCORE_LOSS: Score = f64::NEG_INFINITY;

/// Knight-style move offsets as (dx, dy), in the order legal moves are enumerated.
/// Search tie-breaks depend on this order.
pub const KNIGHT_OFFSETS: [(i32, i32); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

/// 2D coordinate on the board (`x` is the column, `y` the row)
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub const fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    /// Returns the coordinate shifted by the given offset
    pub fn offset(&self, (dx, dy): (i32, i32)) -> Coord {
        Coord {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Manhattan distance between two coordinates
    pub fn manhattan(&self, other: Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One of the two sides of a game
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// Returns the other player
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Index into per-player arrays
    pub fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Player::One => "one",
            Player::Two => "two",
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
