//! Symmetry-aware evaluation cache
//!
//! Rotations and reflections of a board have the same heuristic value for any
//! heuristic that only looks at knight-move geometry, so a score computed once
//! is stored under the canonical key of every valid symmetry of the board.
//!
//! Each cache is owned by exactly one agent. Nothing here is global.

use std::collections::HashMap;

use crate::board::Board;
use crate::heuristics::Heuristic;
use crate::simple_profiler;
use crate::types::{Coord, Player, Score};

/// Geometric symmetries of a rectangular grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transform {
    Identity,
    Rotate180,
    /// Mirror across the vertical axis
    FlipHorizontal,
    /// Mirror across the horizontal axis
    FlipVertical,
    /// Mirror across the main diagonal (square boards only)
    Transpose,
    /// Mirror across the anti-diagonal (square boards only)
    AntiTranspose,
    /// Quarter turn (square boards only)
    Rotate90,
    /// Three-quarter turn (square boards only)
    Rotate270,
}

impl Transform {
    /// Probe order: non-diagonal transforms first
    pub const ALL: [Transform; 8] = [
        Transform::Identity,
        Transform::Rotate180,
        Transform::FlipHorizontal,
        Transform::FlipVertical,
        Transform::Transpose,
        Transform::AntiTranspose,
        Transform::Rotate90,
        Transform::Rotate270,
    ];

    /// True for transforms that swap the axes
    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Transform::Transpose | Transform::AntiTranspose | Transform::Rotate90 | Transform::Rotate270
        )
    }

    /// Transforms that map a `width` x `height` board onto itself.
    /// Axis-swapping transforms are only symmetries of square boards.
    pub fn valid_for(width: i32, height: i32) -> &'static [Transform] {
        if width == height {
            &Self::ALL
        } else {
            &Self::ALL[..4]
        }
    }

    /// Maps a coordinate on a `width` x `height` board
    pub fn apply(self, c: Coord, width: i32, height: i32) -> Coord {
        let (w, h) = (width, height);
        match self {
            Transform::Identity => c,
            Transform::Rotate180 => Coord::new(w - 1 - c.x, h - 1 - c.y),
            Transform::FlipHorizontal => Coord::new(w - 1 - c.x, c.y),
            Transform::FlipVertical => Coord::new(c.x, h - 1 - c.y),
            Transform::Transpose => Coord::new(c.y, c.x),
            Transform::AntiTranspose => Coord::new(h - 1 - c.y, w - 1 - c.x),
            Transform::Rotate90 => Coord::new(h - 1 - c.y, c.x),
            Transform::Rotate270 => Coord::new(c.y, w - 1 - c.x),
        }
    }

    /// Dimensions of the image of a `width` x `height` board
    pub fn dimensions(self, width: i32, height: i32) -> (i32, i32) {
        if self.is_diagonal() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Returns the transformed board. Active player and move count are kept.
    pub fn apply_board(self, board: &Board) -> Board {
        let (w, h) = board.dimensions();
        let (tw, th) = self.dimensions(w, h);
        let blocked: Vec<Coord> = board
            .blocked_cells()
            .into_iter()
            .map(|c| self.apply(c, w, h))
            .collect();
        let positions = [Player::One, Player::Two]
            .map(|p| board.player_position(p).map(|c| self.apply(c, w, h)));
        Board::from_parts(tw, th, &blocked, positions, board.active_player(), board.move_count())
    }
}

/// Board encoding under one transform, with a fixed field order.
/// Blocked cells are sorted so the key does not depend on traversal order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalKey {
    width: i32,
    height: i32,
    active: Player,
    perspective: Player,
    positions: [Option<Coord>; 2],
    blocked: Vec<Coord>,
}

impl CanonicalKey {
    pub fn new(board: &Board, perspective: Player, transform: Transform) -> Self {
        let (w, h) = board.dimensions();
        let (width, height) = transform.dimensions(w, h);
        let mut blocked: Vec<Coord> = board
            .blocked_cells()
            .into_iter()
            .map(|c| transform.apply(c, w, h))
            .collect();
        blocked.sort_unstable();
        CanonicalKey {
            width,
            height,
            active: board.active_player(),
            perspective,
            positions: [Player::One, Player::Two]
                .map(|p| board.player_position(p).map(|c| transform.apply(c, w, h))),
            blocked,
        }
    }
}

/// Bounded memo of heuristic scores keyed by canonical board encodings
#[derive(Debug)]
pub struct SymmetryCache {
    entries: HashMap<CanonicalKey, Score>,
    max_entries: usize,
    max_move_depth: u32,
    hits: u64,
    misses: u64,
}

impl SymmetryCache {
    /// # Arguments
    /// * `max_entries` - Stores stop once the map would grow past this size
    /// * `max_move_depth` - States with at least this many moves are never stored
    pub fn new(max_entries: usize, max_move_depth: u32) -> Self {
        SymmetryCache {
            entries: HashMap::new(),
            max_entries,
            max_move_depth,
            hits: 0,
            misses: 0,
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cached score for any symmetric image of `board`, or
    /// computes it once with `compute` and stores it under every image's key.
    pub fn lookup_or_compute<F>(&mut self, board: &Board, player: Player, compute: F) -> Score
    where
        F: FnOnce(&Board, Player) -> Score,
    {
        let (w, h) = board.dimensions();
        let keys: Vec<CanonicalKey> = Transform::valid_for(w, h)
            .iter()
            .map(|&t| CanonicalKey::new(board, player, t))
            .collect();

        if let Some(&score) = keys.iter().find_map(|key| self.entries.get(key)) {
            self.hits += 1;
            simple_profiler::record_cache_lookup(true);
            return score;
        }

        self.misses += 1;
        simple_profiler::record_cache_lookup(false);
        let score = compute(board, player);

        if board.move_count() < self.max_move_depth
            && self.entries.len() + keys.len() <= self.max_entries
        {
            for key in keys {
                self.entries.insert(key, score);
            }
        }
        score
    }
}

/// A heuristic routed through an owned `SymmetryCache`.
///
/// Boards the inner heuristic is not symmetric on (see
/// `Heuristic::is_symmetric_on`) bypass the cache and touch no counter.
pub struct Cached<H> {
    inner: H,
    cache: SymmetryCache,
    name: String,
}

impl<H: Heuristic> Cached<H> {
    pub fn new(inner: H, cache: SymmetryCache) -> Self {
        let name = format!("cached-{}", inner.name());
        Cached { inner, cache, name }
    }

    pub fn cache(&self) -> &SymmetryCache {
        &self.cache
    }
}

impl<H: Heuristic> Heuristic for Cached<H> {
    fn name(&self) -> &str {
        &self.name
    }

    fn evaluate(&mut self, board: &Board, player: Player) -> Score {
        let (w, h) = board.dimensions();
        if !self.inner.is_symmetric_on(w, h) {
            return self.inner.evaluate(board, player);
        }
        let inner = &mut self.inner;
        self.cache
            .lookup_or_compute(board, player, |b, p| inner.evaluate(b, p))
    }

    fn cache_stats(&self) -> Option<(u64, u64)> {
        Some((self.cache.hits(), self.cache.misses()))
    }

    fn is_symmetric_on(&self, width: i32, height: i32) -> bool {
        self.inner.is_symmetric_on(width, height)
    }
}
