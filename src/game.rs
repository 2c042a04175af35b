// Match harness
//
// Plays agents against each other under a per-turn wall clock and runs
// tournaments across the rayon thread pool. Every game builds its own agents,
// so no heuristic or cache is ever shared between threads.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::time::Instant;

use crate::agent::Agent;
use crate::board::Board;
use crate::config::{Config, ConfigError};
use crate::debug_logger::DebugLogger;
use crate::simple_profiler;
use crate::types::{Coord, Player};

/// Why the losing player lost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossReason {
    /// Had no legal move on their turn
    NoLegalMoves,
    /// Returned no move although moves were available
    Forfeit,
    IllegalMove(Coord),
    /// Returned after the turn clock had expired
    Timeout,
}

/// Result of a complete game
#[derive(Debug, Clone)]
pub struct GameOutcome {
    pub winner: Player,
    pub reason: LossReason,
    /// Moves in play order, including any random opening
    pub history: Vec<(Player, Coord)>,
    pub final_board: Board,
}

/// Plays single games with a fixed turn clock
pub struct GameRunner {
    time_limit_ms: u64,
    logger: DebugLogger,
}

impl GameRunner {
    pub fn new(time_limit_ms: u64, logger: DebugLogger) -> Self {
        GameRunner {
            time_limit_ms,
            logger,
        }
    }

    /// Plays `board` to completion. `agents[0]` moves for player one.
    pub fn play(&self, game_id: usize, agents: [&mut Agent; 2], board: Board) -> GameOutcome {
        self.play_with_history(game_id, agents, board, Vec::new())
    }

    fn play_with_history(
        &self,
        game_id: usize,
        mut agents: [&mut Agent; 2],
        mut board: Board,
        mut history: Vec<(Player, Coord)>,
    ) -> GameOutcome {
        loop {
            let active = board.active_player();
            let legal = board.legal_moves();

            if legal.is_empty() {
                return GameOutcome {
                    winner: board.inactive_player(),
                    reason: LossReason::NoLegalMoves,
                    history,
                    final_board: board,
                };
            }

            let start = Instant::now();
            let limit = self.time_limit_ms as f64;
            let time_left = move || limit - start.elapsed().as_secs_f64() * 1000.0;

            let agent = &mut agents[active.index()];
            let chosen = agent.select_move(&board, &legal, &time_left);
            let overran = time_left() < 0.0;

            let depth = agent.last_report().map_or(0, |r| r.completed_depth);
            self.logger
                .log_move(game_id, &board, chosen, depth, start.elapsed().as_millis());

            let reason = match chosen {
                None => Some(LossReason::Forfeit),
                Some(mv) if !legal.contains(&mv) => Some(LossReason::IllegalMove(mv)),
                Some(_) if overran => Some(LossReason::Timeout),
                Some(_) => None,
            };

            if let Some(reason) = reason {
                warn!("Game {}: player {} lost by {:?}", game_id, active, reason);
                return GameOutcome {
                    winner: active.opponent(),
                    reason,
                    history,
                    final_board: board,
                };
            }

            if let Some(mv) = chosen {
                history.push((active, mv));
                board = board.apply_move(mv);
            }
        }
    }
}

/// Places both players on random open cells
pub fn random_opening<R: Rng>(board: &Board, rng: &mut R) -> (Board, Vec<(Player, Coord)>) {
    let mut board = board.clone();
    let mut history = Vec::new();
    for _ in 0..2 {
        let moves = board.legal_moves();
        if moves.is_empty() {
            break;
        }
        let mv = moves[rng.random_range(0..moves.len())];
        history.push((board.active_player(), mv));
        board = board.apply_move(mv);
    }
    (board, history)
}

/// One tournament game from the `[agent]` side's point of view
#[derive(Debug, Clone)]
pub struct GameRecord {
    pub game: usize,
    pub agent_seat: Player,
    pub agent_won: bool,
    pub reason: LossReason,
    pub moves: usize,
}

/// Aggregate tournament results for `[agent]` against `[opponent]`
#[derive(Debug, Clone, Default)]
pub struct TournamentReport {
    pub records: Vec<GameRecord>,
    pub agent_wins: usize,
    pub opponent_wins: usize,
}

impl TournamentReport {
    pub fn games(&self) -> usize {
        self.records.len()
    }

    pub fn win_rate(&self) -> f64 {
        if self.records.is_empty() {
            0.0
        } else {
            self.agent_wins as f64 / self.records.len() as f64
        }
    }
}

/// Plays `[tournament] games` games between `[agent]` and `[opponent]` in
/// parallel. Seats alternate every game; with random openings each pair of
/// games shares one opening so both sides play it once from each seat.
pub fn run_tournament(config: &Config, logger: &DebugLogger) -> Result<TournamentReport, ConfigError> {
    // Fail before spawning any work
    config.validate()?;

    let t = &config.tournament;
    info!(
        "Starting tournament: {} games on {}x{} ({}ms per turn)",
        t.games, t.width, t.height, config.timing.turn_time_limit_ms
    );

    let records: Vec<GameRecord> = (0..t.games)
        .into_par_iter()
        .map(|game| play_tournament_game(config, logger, game))
        .collect::<Result<_, _>>()?;

    let agent_wins = records.iter().filter(|r| r.agent_won).count();
    let report = TournamentReport {
        agent_wins,
        opponent_wins: records.len() - agent_wins,
        records,
    };

    info!(
        "Tournament complete: agent won {}/{} ({:.1}%)",
        report.agent_wins,
        report.games(),
        100.0 * report.win_rate()
    );
    Ok(report)
}

fn play_tournament_game(config: &Config, logger: &DebugLogger, game: usize) -> Result<GameRecord, ConfigError> {
    let mut agent = Agent::from_config(&config.agent, &config.cache)?;
    let mut opponent = Agent::from_config(&config.opponent, &config.cache)?;

    let t = &config.tournament;
    let board = Board::new(t.width, t.height);
    let (board, opening) = if t.random_openings {
        let mut rng = StdRng::seed_from_u64(t.seed.wrapping_add((game / 2) as u64));
        random_opening(&board, &mut rng)
    } else {
        (board, Vec::new())
    };

    let agent_seat = if game % 2 == 0 { Player::One } else { Player::Two };
    let agents = match agent_seat {
        Player::One => [&mut agent, &mut opponent],
        Player::Two => [&mut opponent, &mut agent],
    };

    let runner = GameRunner::new(config.timing.turn_time_limit_ms, logger.clone());
    let outcome = runner.play_with_history(game, agents, board, opening);
    simple_profiler::merge_thread_local();

    info!(
        "Game {}: {} wins ({:?}) after {} moves",
        game,
        if outcome.winner == agent_seat { "agent" } else { "opponent" },
        outcome.reason,
        outcome.history.len()
    );

    Ok(GameRecord {
        game,
        agent_seat,
        agent_won: outcome.winner == agent_seat,
        reason: outcome.reason,
        moves: outcome.history.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_opening_places_both_players() {
        let mut rng = StdRng::seed_from_u64(3);
        let (board, history) = random_opening(&Board::new(5, 5), &mut rng);
        assert_eq!(history.len(), 2);
        assert_eq!(board.move_count(), 2);
        assert!(board.player_position(Player::One).is_some());
        assert!(board.player_position(Player::Two).is_some());
    }

    #[test]
    fn test_random_opening_is_seeded() {
        let a = random_opening(&Board::new(7, 7), &mut StdRng::seed_from_u64(11)).1;
        let b = random_opening(&Board::new(7, 7), &mut StdRng::seed_from_u64(11)).1;
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_report_win_rate() {
        assert_eq!(TournamentReport::default().win_rate(), 0.0);
    }
}
