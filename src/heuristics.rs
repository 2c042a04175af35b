// Board evaluation heuristics
//
// Every heuristic maps (board, player) to a score where higher favours `player`.
// Definitive outcomes are reported with SCORE_WIN / SCORE_LOSS; everything else
// is a finite comparative score. Heuristics never mutate the board.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::collections::HashSet;

use crate::board::Board;
use crate::cache::{Cached, SymmetryCache};
use crate::config::{CacheConfig, HeuristicConfig};
use crate::profile;
use crate::types::{Coord, Player, Score, KNIGHT_OFFSETS, SCORE_LOSS, SCORE_WIN};

/// A board evaluation strategy bound to an agent at construction.
///
/// `evaluate` takes `&mut self` so stateful variants (random salt, cache
/// counters) can update themselves without interior mutability.
pub trait Heuristic: Send {
    fn name(&self) -> &str;
    fn evaluate(&mut self, board: &Board, player: Player) -> Score;

    /// (hits, misses) for cache-backed heuristics
    fn cache_stats(&self) -> Option<(u64, u64)> {
        None
    }

    /// True if every valid `Transform` of a `width` x `height` board leaves
    /// the score unchanged. `Cached` only stores scores when this holds.
    fn is_symmetric_on(&self, _width: i32, _height: i32) -> bool {
        true
    }
}

impl<H: Heuristic + ?Sized> Heuristic for Box<H> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn evaluate(&mut self, board: &Board, player: Player) -> Score {
        (**self).evaluate(board, player)
    }

    fn cache_stats(&self) -> Option<(u64, u64)> {
        (**self).cache_stats()
    }

    fn is_symmetric_on(&self, width: i32, height: i32) -> bool {
        (**self).is_symmetric_on(width, height)
    }
}

/// Identifiers accepted in `[*.heuristic] kind`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HeuristicKind {
    Null,
    Open,
    Mobility,
    Accessibility,
    Reflect,
    Salted,
}

impl HeuristicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HeuristicKind::Null => "null",
            HeuristicKind::Open => "open",
            HeuristicKind::Mobility => "mobility",
            HeuristicKind::Accessibility => "accessibility",
            HeuristicKind::Reflect => "reflect",
            HeuristicKind::Salted => "salted",
        }
    }
}

/// How `Reflect` scores positions where no opening or mirroring rule applies
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReflectFallback {
    /// Own moves minus opponent moves
    Difference,
    /// Mobility difference plus a [0, 1] bonus for standing near the centre
    Centre,
    /// own / (own + opp), bounded to [0, 1]
    Ratio,
}

/// Terminal check shared by all heuristics.
///
/// Returns the sentinel if either side is out of moves. When both are stuck
/// the player to move has lost, since they must move first.
fn terminal_score(player: Player, own: f64, opp: f64, board: &Board) -> Option<Score> {
    match (own == 0.0, opp == 0.0) {
        (true, true) => Some(if board.active_player() == player {
            SCORE_LOSS
        } else {
            SCORE_WIN
        }),
        (true, false) => Some(SCORE_LOSS),
        (false, true) => Some(SCORE_WIN),
        (false, false) => None,
    }
}

fn mobility_pair(board: &Board, player: Player) -> (f64, f64) {
    (
        board.mobility(player) as f64,
        board.mobility(player.opponent()) as f64,
    )
}

/// Scores every non-terminal position as zero
#[derive(Debug, Default, Clone)]
pub struct NullScore;

impl Heuristic for NullScore {
    fn name(&self) -> &str {
        "null"
    }

    fn evaluate(&mut self, board: &Board, player: Player) -> Score {
        let (own, opp) = mobility_pair(board, player);
        terminal_score(player, own, opp, board).unwrap_or(0.0)
    }
}

/// Number of moves available to the player
#[derive(Debug, Default, Clone)]
pub struct OpenMoves;

impl Heuristic for OpenMoves {
    fn name(&self) -> &str {
        "open"
    }

    fn evaluate(&mut self, board: &Board, player: Player) -> Score {
        let (own, opp) = mobility_pair(board, player);
        terminal_score(player, own, opp, board).unwrap_or(own)
    }
}

/// Own legal move count minus the opponent's
#[derive(Debug, Default, Clone)]
pub struct MobilityDifference;

impl Heuristic for MobilityDifference {
    fn name(&self) -> &str {
        "mobility"
    }

    fn evaluate(&mut self, board: &Board, player: Player) -> Score {
        profile!("eval", {
            let (own, opp) = mobility_pair(board, player);
            terminal_score(player, own, opp, board).unwrap_or(own - opp)
        })
    }
}

/// Result of a bounded flood fill from one player's position
#[derive(Debug, Clone, Default)]
pub struct Reachability {
    /// Sum of 1/generation over every newly reached cell
    pub rating: f64,
    pub explored: HashSet<Coord>,
}

/// Breadth-first expansion along knight moves from the player's position,
/// stopping after `max_generation` generations.
///
/// Each cell first reached at generation `g` adds `1/g`. A player with no
/// reachable cell rates exactly 0. An unplaced player can jump to any open
/// cell, so every open cell counts as generation 1.
pub fn find_accessible(board: &Board, player: Player, max_generation: u32) -> Reachability {
    let _guard = crate::simple_profiler::ProfileGuard::new("flood_fill");

    let mut reach = Reachability::default();
    let start = match board.player_position(player) {
        Some(pos) => pos,
        None => {
            reach.explored = board.open_cells().into_iter().collect();
            reach.rating = reach.explored.len() as f64;
            return reach;
        }
    };

    let mut frontier = vec![start];
    let mut generation = 1;

    while !frontier.is_empty() && generation <= max_generation {
        let mut next_frontier = Vec::new();
        let weight = 1.0 / generation as f64;

        for point in &frontier {
            for &offset in KNIGHT_OFFSETS.iter() {
                let next = point.offset(offset);
                if !board.move_is_legal(next) || !reach.explored.insert(next) {
                    continue;
                }
                next_frontier.push(next);
                reach.rating += weight;
            }
        }

        frontier = next_frontier;
        generation += 1;
    }

    reach
}

/// Generation-weighted reachability of the player minus that of the opponent
#[derive(Debug, Clone)]
pub struct Accessibility {
    pub generations: u32,
}

impl Default for Accessibility {
    fn default() -> Self {
        Accessibility { generations: 5 }
    }
}

impl Heuristic for Accessibility {
    fn name(&self) -> &str {
        "accessibility"
    }

    fn evaluate(&mut self, board: &Board, player: Player) -> Score {
        profile!("eval", {
            let own = find_accessible(board, player, self.generations).rating;
            let opp = find_accessible(board, player.opponent(), self.generations).rating;
            terminal_score(player, own, opp, board).unwrap_or(own - opp)
        })
    }
}

/// Opening and mirroring gambits for small boards.
///
/// During the first two plies, claim the centre or avoid standing a knight's
/// move away from a centre-holding opponent. Later, `mirror_player` is rewarded for
/// standing at the point reflection of the opponent, which it can keep doing
/// for the rest of the game. Otherwise falls back to a mobility measure.
///
/// The mirror bonus only compares the two player positions. It does not check
/// that the blocked cells are themselves point-symmetric, so it can reward a
/// reflection the opponent is able to break.
///
/// `centre()` is only a true centre when both dimensions are odd, so the score
/// is not symmetry-invariant on boards with an even side.
#[derive(Debug, Clone)]
pub struct Reflect {
    pub mirror_player: Player,
    pub fallback: ReflectFallback,
}

impl Default for Reflect {
    fn default() -> Self {
        Reflect {
            mirror_player: Player::One,
            fallback: ReflectFallback::Difference,
        }
    }
}

/// Reward for holding the centre or the mirrored square
pub const REFLECT_BONUS: Score = 8.0;

/// Point reflection through the board centre
pub fn mirror_of(board: &Board, coord: Coord) -> Coord {
    Coord::new(board.width() - 1 - coord.x, board.height() - 1 - coord.y)
}

impl Reflect {
    fn gambit(&self, board: &Board, player: Player) -> Option<Score> {
        let centre = board.centre();
        let own_pos = board.player_position(player);
        let opp_pos = board.player_position(player.opponent());

        if board.move_count() <= 2 {
            return match opp_pos {
                None => Some(if own_pos == Some(centre) { REFLECT_BONUS } else { 0.0 }),
                Some(opp) if opp == centre => {
                    let reachable = own_pos.map_or(false, |own| {
                        KNIGHT_OFFSETS.iter().any(|&offset| opp.offset(offset) == own)
                    });
                    if reachable {
                        Some(-REFLECT_BONUS)
                    } else {
                        None
                    }
                }
                Some(_) => None,
            };
        }

        if player == self.mirror_player {
            if let (Some(own), Some(opp)) = (own_pos, opp_pos) {
                if own == mirror_of(board, opp) {
                    return Some(REFLECT_BONUS);
                }
            }
        }
        None
    }

    fn fallback_score(&self, board: &Board, player: Player, own: f64, opp: f64) -> Score {
        match self.fallback {
            ReflectFallback::Difference => own - opp,
            ReflectFallback::Centre => {
                let (w, h) = board.dimensions();
                let max_distance = ((w / 2) + (h / 2)).max(1) as f64;
                let proximity = board
                    .player_position(player)
                    .map_or(0.0, |pos| 1.0 - pos.manhattan(board.centre()) as f64 / max_distance);
                own - opp + proximity.clamp(0.0, 1.0)
            }
            ReflectFallback::Ratio => own / (own + opp),
        }
    }
}

impl Heuristic for Reflect {
    fn name(&self) -> &str {
        "reflect"
    }

    fn is_symmetric_on(&self, width: i32, height: i32) -> bool {
        width % 2 == 1 && height % 2 == 1
    }

    fn evaluate(&mut self, board: &Board, player: Player) -> Score {
        profile!("eval", {
            let (own, opp) = mobility_pair(board, player);
            if let Some(terminal) = terminal_score(player, own, opp, board) {
                return terminal;
            }
            self.gambit(board, player)
                .unwrap_or_else(|| self.fallback_score(board, player, own, opp))
        })
    }
}

/// Mobility difference plus a small random perturbation on the player's own
/// turn, so a fixed opponent does not see the same line every game
pub struct SaltedMobility {
    pub spice: f64,
    rng: StdRng,
}

impl SaltedMobility {
    /// Deterministic for a given seed
    pub fn with_seed(spice: f64, seed: u64) -> Self {
        SaltedMobility {
            spice,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_os_rng(spice: f64) -> Self {
        SaltedMobility {
            spice,
            rng: StdRng::from_os_rng(),
        }
    }
}

impl Heuristic for SaltedMobility {
    fn name(&self) -> &str {
        "salted"
    }

    // a stored score would freeze one random draw
    fn is_symmetric_on(&self, _width: i32, _height: i32) -> bool {
        false
    }

    fn evaluate(&mut self, board: &Board, player: Player) -> Score {
        profile!("eval", {
            let (own, opp) = mobility_pair(board, player);
            if let Some(terminal) = terminal_score(player, own, opp, board) {
                return terminal;
            }
            let mut score = own - opp;
            if board.active_player() == player {
                score += self.rng.random::<f64>() * self.spice;
            }
            score
        })
    }
}

/// Builds the heuristic described by the config, wrapped in a fresh symmetry
/// cache when `cached` is set. Each call gets its own cache.
pub fn build_heuristic(config: &HeuristicConfig, cache: &CacheConfig) -> Box<dyn Heuristic> {
    let base: Box<dyn Heuristic> = match config.kind {
        HeuristicKind::Null => Box::new(NullScore),
        HeuristicKind::Open => Box::new(OpenMoves),
        HeuristicKind::Mobility => Box::new(MobilityDifference),
        HeuristicKind::Accessibility => Box::new(Accessibility {
            generations: config.flood_fill_generations,
        }),
        HeuristicKind::Reflect => Box::new(Reflect {
            mirror_player: config.mirror_player,
            fallback: config.reflect_fallback,
        }),
        HeuristicKind::Salted => Box::new(match config.seed {
            Some(seed) => SaltedMobility::with_seed(config.salt_spice, seed),
            None => SaltedMobility::from_os_rng(config.salt_spice),
        }),
    };

    if config.cached {
        let cache = SymmetryCache::new(cache.max_entries, cache.max_move_depth);
        Box::new(Cached::new(base, cache))
    } else {
        base
    }
}
