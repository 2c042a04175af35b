// Depth-limited adversarial search
//
// Minimax and alpha-beta share one recursive routine; pruning is a flag.
// Running out of time is reported as `Err(Timeout)` from every frame, so the
// whole call chain unwinds with `?` and no partial result escapes.

use std::cell::Cell;

use crate::board::Board;
use crate::heuristics::Heuristic;
use crate::simple_profiler;
use crate::types::{Coord, Player, Score, SCORE_LOSS, SCORE_WIN};

/// The search ran out of time. Only the move-selection loop handles this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout;

/// Deadline check polled at the top of every search call
pub struct SearchClock<'a> {
    time_left: &'a dyn Fn() -> f64,
    threshold_ms: f64,
    checks: Cell<u64>,
}

impl<'a> SearchClock<'a> {
    /// # Arguments
    /// * `time_left` - Milliseconds remaining in the current turn
    /// * `threshold_ms` - Abort once fewer than this many milliseconds remain
    pub fn new(time_left: &'a dyn Fn() -> f64, threshold_ms: f64) -> Self {
        SearchClock {
            time_left,
            threshold_ms,
            checks: Cell::new(0),
        }
    }

    #[inline]
    pub fn check(&self) -> Result<(), Timeout> {
        self.checks.set(self.checks.get() + 1);
        if (self.time_left)() < self.threshold_ms {
            Err(Timeout)
        } else {
            Ok(())
        }
    }

    /// Number of deadline checks so far, one per interior search node
    pub fn checks(&self) -> u64 {
        self.checks.get()
    }
}

/// Score and move returned by every search call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    pub score: Score,
    /// `None` when the searched position has no legal moves
    pub best_move: Option<Coord>,
    /// Some non-terminal leaf was cut off by the depth limit. When false the
    /// searched tree was complete and deeper searches cannot change the result.
    pub reached_cutoff: bool,
}

/// One search invocation: the heuristic and perspective are fixed for its duration
pub struct Search<'a> {
    heuristic: &'a mut dyn Heuristic,
    player: Player,
    clock: &'a SearchClock<'a>,
}

impl<'a> Search<'a> {
    /// `player` is the maximizing side, whose perspective every leaf is scored from
    pub fn new(heuristic: &'a mut dyn Heuristic, player: Player, clock: &'a SearchClock<'a>) -> Self {
        Search {
            heuristic,
            player,
            clock,
        }
    }

    /// Plain minimax: every legal move is expanded
    pub fn minimax(&mut self, board: &Board, depth: u32) -> Result<SearchResult, Timeout> {
        self.alphabeta_common(board, depth, SCORE_LOSS, SCORE_WIN, true, false)
    }

    /// Alpha-beta with a full initial window
    pub fn alphabeta(&mut self, board: &Board, depth: u32) -> Result<SearchResult, Timeout> {
        self.alphabeta_common(board, depth, SCORE_LOSS, SCORE_WIN, true, true)
    }

    fn evaluate(&mut self, board: &Board) -> Score {
        self.heuristic.evaluate(board, self.player)
    }

    /// Explores exactly `depth` plies below `board` before scoring with the heuristic.
    ///
    /// Ties keep the first move in enumeration order. With `prune` set, move
    /// enumeration stops once `lower >= upper`; the returned score and move are
    /// identical to the unpruned search.
    pub fn alphabeta_common(
        &mut self,
        board: &Board,
        depth: u32,
        mut lower: Score,
        mut upper: Score,
        maximize: bool,
        prune: bool,
    ) -> Result<SearchResult, Timeout> {
        self.clock.check()?;
        simple_profiler::record_search_node();

        if depth == 0 {
            return Ok(SearchResult {
                score: self.evaluate(board),
                best_move: None,
                reached_cutoff: !board.is_terminal(),
            });
        }

        let moves = board.legal_moves();
        let mut best = SearchResult {
            score: if maximize { SCORE_LOSS } else { SCORE_WIN },
            best_move: None,
            reached_cutoff: false,
        };

        if moves.is_empty() {
            best.score = self.evaluate(board);
            return Ok(best);
        }

        for mv in moves {
            let next = board.apply_move(mv);

            let score = if depth == 1 {
                best.reached_cutoff |= !next.is_terminal();
                self.evaluate(&next)
            } else {
                let child = self.alphabeta_common(&next, depth - 1, lower, upper, !maximize, prune)?;
                best.reached_cutoff |= child.reached_cutoff;
                child.score
            };

            let improves = best.best_move.is_none()
                || (maximize && score > best.score)
                || (!maximize && score < best.score);
            if improves {
                best.score = score;
                best.best_move = Some(mv);
            }

            if maximize {
                lower = lower.max(best.score);
            } else {
                upper = upper.min(best.score);
            }

            if prune && lower >= upper {
                simple_profiler::record_alpha_beta_cutoff();
                break;
            }
        }

        Ok(best)
    }
}
