// Isolation board model
//
// Immutable game state: every move produces a new Board, so each search
// branch owns its own copy and nothing is mutated in place.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::simple_profiler;
use crate::types::{Coord, Player, KNIGHT_OFFSETS};

/// Complete Isolation game state
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: i32,
    height: i32,
    /// Row-major occupancy; a cell stays blocked once a player has visited it
    blocked: Vec<bool>,
    positions: [Option<Coord>; 2],
    active: Player,
    move_count: u32,
}

impl Board {
    /// Creates an empty board with both players unplaced and player one to move
    ///
    /// # Panics
    /// Panics if either dimension is not positive.
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width > 0 && height > 0, "board dimensions must be positive");
        Board {
            width,
            height,
            blocked: vec![false; (width * height) as usize],
            positions: [None, None],
            active: Player::One,
            move_count: 0,
        }
    }

    /// Builds a board from explicit parts, for scenarios and tests.
    /// Player positions are always marked blocked.
    pub fn from_parts(
        width: i32,
        height: i32,
        blocked: &[Coord],
        positions: [Option<Coord>; 2],
        active: Player,
        move_count: u32,
    ) -> Self {
        let mut board = Board::new(width, height);
        for &cell in blocked.iter().chain(positions.iter().flatten()) {
            if let Some(idx) = board.index(cell) {
                board.blocked[idx] = true;
            }
        }
        board.positions = positions;
        board.active = active;
        board.move_count = move_count;
        board
    }

    fn index(&self, coord: Coord) -> Option<usize> {
        if self.in_bounds(coord) {
            Some((coord.y * self.width + coord.x) as usize)
        } else {
            None
        }
    }

    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.x < self.width && coord.y >= 0 && coord.y < self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Returns (width, height)
    pub fn dimensions(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn active_player(&self) -> Player {
        self.active
    }

    pub fn inactive_player(&self) -> Player {
        self.active.opponent()
    }

    pub fn player_position(&self, player: Player) -> Option<Coord> {
        self.positions[player.index()]
    }

    /// Centre cell (integer division, so the lower-right of the four centre
    /// cells on even dimensions)
    pub fn centre(&self) -> Coord {
        Coord::new(self.width / 2, self.height / 2)
    }

    pub fn is_blocked(&self, coord: Coord) -> bool {
        self.index(coord).map_or(true, |idx| self.blocked[idx])
    }

    /// True if the coordinate is on the board and not yet visited
    pub fn move_is_legal(&self, coord: Coord) -> bool {
        self.index(coord).map_or(false, |idx| !self.blocked[idx])
    }

    /// Blocked cells in row-major order
    pub fn blocked_cells(&self) -> Vec<Coord> {
        self.cells().filter(|c| self.is_blocked(*c)).collect()
    }

    /// Open cells in row-major order
    pub fn open_cells(&self) -> Vec<Coord> {
        self.cells().filter(|c| self.move_is_legal(*c)).collect()
    }

    fn cells(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Coord::new(x, y)))
    }

    /// Legal moves for the player to move
    pub fn legal_moves(&self) -> Vec<Coord> {
        self.legal_moves_for(self.active)
    }

    /// Legal moves for either player.
    ///
    /// An unplaced player may move to any open cell (row-major order);
    /// a placed player moves along `KNIGHT_OFFSETS` in that fixed order.
    pub fn legal_moves_for(&self, player: Player) -> Vec<Coord> {
        let _guard = simple_profiler::ProfileGuard::new("move_gen");
        match self.player_position(player) {
            None => self.open_cells(),
            Some(from) => KNIGHT_OFFSETS
                .iter()
                .map(|&offset| from.offset(offset))
                .filter(|&to| self.move_is_legal(to))
                .collect(),
        }
    }

    /// Number of legal moves for a player without allocating the move list
    pub fn mobility(&self, player: Player) -> usize {
        match self.player_position(player) {
            None => self.blocked.iter().filter(|b| !**b).count(),
            Some(from) => KNIGHT_OFFSETS
                .iter()
                .filter(|&&offset| self.move_is_legal(from.offset(offset)))
                .count(),
        }
    }

    /// Returns the state after the active player moves to `to`.
    /// The receiver is left untouched. Legality is the caller's responsibility.
    pub fn apply_move(&self, to: Coord) -> Board {
        let _guard = simple_profiler::ProfileGuard::new("apply_move");
        let mut next = self.clone();
        if let Some(idx) = next.index(to) {
            next.blocked[idx] = true;
        }
        next.positions[self.active.index()] = Some(to);
        next.active = self.active.opponent();
        next.move_count += 1;
        next
    }

    /// The active player loses when they have no legal moves
    pub fn is_loser(&self, player: Player) -> bool {
        player == self.active && self.mobility(player) == 0
    }

    pub fn is_winner(&self, player: Player) -> bool {
        player != self.active && self.mobility(self.active) == 0
    }

    /// True once the player to move is stuck
    pub fn is_terminal(&self) -> bool {
        self.mobility(self.active) == 0
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = Coord::new(x, y);
                let glyph = if self.positions[0] == Some(cell) {
                    '1'
                } else if self.positions[1] == Some(cell) {
                    '2'
                } else if self.is_blocked(cell) {
                    '-'
                } else {
                    '.'
                };
                write!(f, "{}", glyph)?;
                if x + 1 < self.width {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board_offers_every_cell() {
        let board = Board::new(3, 2);
        let moves = board.legal_moves();
        assert_eq!(moves.len(), 6);
        assert_eq!(moves[0], Coord::new(0, 0));
        assert_eq!(moves[1], Coord::new(1, 0));
        assert_eq!(moves[5], Coord::new(2, 1));
    }

    #[test]
    fn test_apply_move_is_pure() {
        let board = Board::new(4, 4);
        let next = board.apply_move(Coord::new(1, 1));

        assert_eq!(board.move_count(), 0);
        assert!(board.move_is_legal(Coord::new(1, 1)));
        assert_eq!(next.move_count(), 1);
        assert_eq!(next.active_player(), Player::Two);
        assert_eq!(next.player_position(Player::One), Some(Coord::new(1, 1)));
        assert!(!next.move_is_legal(Coord::new(1, 1)));
    }

    #[test]
    fn test_knight_moves_follow_offset_order() {
        let board = Board::from_parts(
            5,
            5,
            &[],
            [Some(Coord::new(2, 2)), Some(Coord::new(0, 0))],
            Player::One,
            2,
        );
        let moves = board.legal_moves();
        let expected: Vec<Coord> = KNIGHT_OFFSETS
            .iter()
            .map(|&o| Coord::new(2, 2).offset(o))
            .collect();
        assert_eq!(moves, expected);
    }

    #[test]
    fn test_corner_on_4x4_has_two_moves() {
        let board = Board::from_parts(
            4,
            4,
            &[],
            [Some(Coord::new(0, 0)), Some(Coord::new(3, 3))],
            Player::One,
            2,
        );
        assert_eq!(board.legal_moves(), vec![Coord::new(1, 2), Coord::new(2, 1)]);
        assert_eq!(board.mobility(Player::Two), 2);
    }

    #[test]
    fn test_stuck_active_player_loses() {
        // 3x3 centre has no knight moves at all
        let board = Board::from_parts(
            3,
            3,
            &[],
            [Some(Coord::new(1, 1)), Some(Coord::new(0, 0))],
            Player::One,
            2,
        );
        assert!(board.is_loser(Player::One));
        assert!(board.is_winner(Player::Two));
        assert_eq!(board.inactive_player(), Player::Two);
        assert!(!board.is_winner(Player::One));
        assert!(board.is_terminal());
    }

    #[test]
    fn test_out_of_bounds_is_blocked() {
        let board = Board::new(2, 2);
        assert!(board.is_blocked(Coord::new(-1, 0)));
        assert!(!board.move_is_legal(Coord::new(0, 2)));
    }

    #[test]
    fn test_display_marks_players() {
        let board = Board::new(3, 1).apply_move(Coord::new(0, 0)).apply_move(Coord::new(2, 0));
        assert_eq!(board.to_string(), "1 . 2\n");
    }
}
