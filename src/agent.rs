// Isolation game-playing agent
//
// Owns one heuristic (and through it, at most one symmetry cache) and picks
// moves with fixed-depth or iteratively deepened minimax / alpha-beta search
// under the harness's turn clock.

use log::{debug, info};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::board::Board;
use crate::config::{AgentConfig, CacheConfig, ConfigError};
use crate::heuristics::{build_heuristic, Heuristic};
use crate::search::{Search, SearchClock, SearchResult, Timeout};
use crate::types::{Coord, Score};

/// Search algorithm used by `select_move`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchMethod {
    Minimax,
    AlphaBeta,
}

impl SearchMethod {
    pub fn prunes(self) -> bool {
        matches!(self, SearchMethod::AlphaBeta)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMethod::Minimax => "minimax",
            SearchMethod::AlphaBeta => "alphabeta",
        }
    }
}

impl FromStr for SearchMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimax" => Ok(SearchMethod::Minimax),
            "alphabeta" => Ok(SearchMethod::AlphaBeta),
            other => Err(ConfigError::UnknownSearchMethod(other.to_string())),
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary of the most recent `select_move` call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    /// Deepest depth whose search finished; 0 if none did
    pub completed_depth: u32,
    /// Score of the completed search, if any
    pub score: Option<Score>,
    pub timed_out: bool,
    pub elapsed_ms: u128,
}

/// Game-playing agent with a fixed search configuration
pub struct Agent {
    config: AgentConfig,
    heuristic: Box<dyn Heuristic>,
    last_report: Option<SearchReport>,
}

impl Agent {
    /// Creates an agent with an explicit heuristic.
    /// Fails if the configuration could produce silently wrong search behaviour.
    pub fn new(config: AgentConfig, heuristic: Box<dyn Heuristic>) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Agent {
            config,
            heuristic,
            last_report: None,
        })
    }

    /// Creates an agent whose heuristic (and optional cache) is described by the config
    pub fn from_config(config: &AgentConfig, cache: &CacheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let heuristic = build_heuristic(&config.heuristic, cache);
        Self::new(config.clone(), heuristic)
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn heuristic(&self) -> &dyn Heuristic {
        self.heuristic.as_ref()
    }

    pub fn last_report(&self) -> Option<&SearchReport> {
        self.last_report.as_ref()
    }

    /// Fixed-depth minimax from the perspective of the player to move
    pub fn minimax(&mut self, board: &Board, depth: u32, clock: &SearchClock<'_>) -> Result<SearchResult, Timeout> {
        Search::new(self.heuristic.as_mut(), board.active_player(), clock).minimax(board, depth)
    }

    /// Fixed-depth alpha-beta from the perspective of the player to move
    pub fn alphabeta(&mut self, board: &Board, depth: u32, clock: &SearchClock<'_>) -> Result<SearchResult, Timeout> {
        Search::new(self.heuristic.as_mut(), board.active_player(), clock).alphabeta(board, depth)
    }

    /// Fixed-depth search with the configured method
    pub fn search(&mut self, board: &Board, depth: u32, clock: &SearchClock<'_>) -> Result<SearchResult, Timeout> {
        match self.config.method {
            SearchMethod::Minimax => self.minimax(board, depth, clock),
            SearchMethod::AlphaBeta => self.alphabeta(board, depth, clock),
        }
    }

    /// Chooses a move before the turn clock runs out.
    ///
    /// # Arguments
    /// * `board` - Current game state, with this agent to move
    /// * `legal_moves` - Moves the harness accepts; the result is always one of them
    /// * `time_left` - Milliseconds remaining in the turn
    ///
    /// # Returns
    /// `None` only if `legal_moves` is empty. With iterative deepening the move
    /// from the deepest completed depth is returned. If not even depth 1
    /// completes, the first entry of `legal_moves` is returned.
    pub fn select_move(
        &mut self,
        board: &Board,
        legal_moves: &[Coord],
        time_left: &dyn Fn() -> f64,
    ) -> Option<Coord> {
        let start = Instant::now();
        let fallback = *legal_moves.first()?;

        let clock = SearchClock::new(time_left, self.config.timeout_ms);
        let ceiling = self.config.depth_ceiling();
        let mut depth = match (self.config.iterative, ceiling) {
            (false, Some(max)) => max,
            _ => 1,
        };

        let mut best: Option<SearchResult> = None;
        let mut completed_depth = 0;
        let mut timed_out = false;

        loop {
            if ceiling.map_or(false, |max| depth > max) {
                break;
            }

            match self.search(board, depth, &clock) {
                Ok(result) => {
                    debug!(
                        "Depth {} complete: move {:?}, score {}",
                        depth, result.best_move, result.score
                    );
                    best = Some(result);
                    completed_depth = depth;
                    if !self.config.iterative {
                        break;
                    }
                    if !result.reached_cutoff {
                        debug!("Game tree exhausted at depth {}", depth);
                        break;
                    }
                    depth += 1;
                }
                Err(Timeout) => {
                    debug!("Timed out during depth {}", depth);
                    timed_out = true;
                    break;
                }
            }
        }

        let chosen = best
            .and_then(|result| result.best_move)
            .filter(|mv| legal_moves.contains(mv))
            .unwrap_or(fallback);

        let report = SearchReport {
            completed_depth,
            score: best.map(|result| result.score),
            timed_out,
            elapsed_ms: start.elapsed().as_millis(),
        };

        info!(
            "Move {}: {} chose {} (score: {:?}, depth: {}, time: {}ms)",
            board.move_count(),
            board.active_player(),
            chosen,
            report.score,
            report.completed_depth,
            report.elapsed_ms
        );
        if let Some((hits, misses)) = self.heuristic.cache_stats() {
            debug!("Cache hits {} / misses {}", hits, misses);
        }

        self.last_report = Some(report);
        Some(chosen)
    }
}
