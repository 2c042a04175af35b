//! Match Harness Tests
//!
//! Full games between configured agents: outcomes must be legal,
//! reproducible for deterministic agents, and tallied correctly.

use isolation_agent::agent::{Agent, SearchMethod};
use isolation_agent::board::Board;
use isolation_agent::config::{AgentConfig, Config, ConfigError, HeuristicConfig};
use isolation_agent::debug_logger::DebugLogger;
use isolation_agent::game::{random_opening, run_tournament, GameRunner, LossReason};
use isolation_agent::heuristics::HeuristicKind;
use isolation_agent::types::{Coord, Player};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn fixed_agent(depth: i32, kind: HeuristicKind) -> Agent {
    let config = AgentConfig {
        search_depth: depth,
        iterative: false,
        method: SearchMethod::AlphaBeta,
        timeout_ms: 1.0,
        heuristic: HeuristicConfig::of_kind(kind),
    };
    Agent::from_config(&config, &Config::default_hardcoded().cache).unwrap()
}

fn small_tournament(games: usize) -> Config {
    let mut config = Config::default_hardcoded();
    config.timing.turn_time_limit_ms = 60_000;
    config.agent = AgentConfig {
        search_depth: 2,
        iterative: false,
        method: SearchMethod::AlphaBeta,
        timeout_ms: 1.0,
        heuristic: HeuristicConfig::of_kind(HeuristicKind::Accessibility),
    };
    config.opponent = AgentConfig {
        search_depth: 1,
        iterative: false,
        method: SearchMethod::Minimax,
        timeout_ms: 1.0,
        heuristic: HeuristicConfig::of_kind(HeuristicKind::Mobility),
    };
    config.tournament.width = 5;
    config.tournament.height = 5;
    config.tournament.games = games;
    config.tournament.seed = 7;
    config
}

#[test]
fn test_full_game_ends_with_stuck_loser() {
    let runner = GameRunner::new(60_000, DebugLogger::disabled());
    let mut one = fixed_agent(2, HeuristicKind::Mobility);
    let mut two = fixed_agent(1, HeuristicKind::Open);

    let outcome = runner.play(0, [&mut one, &mut two], Board::new(5, 5));

    assert_eq!(outcome.reason, LossReason::NoLegalMoves);
    let loser = outcome.winner.opponent();
    assert_eq!(outcome.final_board.active_player(), loser);
    assert!(outcome.final_board.is_loser(loser));
    assert!(outcome.final_board.is_winner(outcome.winner));
    assert_eq!(outcome.final_board.inactive_player(), outcome.winner);

    // replay the history move by move; every move must have been legal
    let mut board = Board::new(5, 5);
    for &(player, mv) in &outcome.history {
        assert_eq!(board.active_player(), player);
        assert!(board.legal_moves().contains(&mv), "{} played illegal {}", player, mv);
        board = board.apply_move(mv);
    }
    assert_eq!(board, outcome.final_board);
}

#[test]
fn test_deterministic_agents_replay_identically() {
    let runner = GameRunner::new(60_000, DebugLogger::disabled());
    let play = || {
        let mut one = fixed_agent(2, HeuristicKind::Accessibility);
        let mut two = fixed_agent(2, HeuristicKind::Mobility);
        runner.play(3, [&mut one, &mut two], Board::new(5, 5))
    };
    let first = play();
    let second = play();
    assert_eq!(first.history, second.history);
    assert_eq!(first.winner, second.winner);
}

#[test]
fn test_game_from_opening_position() {
    let mut rng = StdRng::seed_from_u64(21);
    let (board, opening) = random_opening(&Board::new(5, 5), &mut rng);
    assert_eq!(opening.len(), 2);
    assert_eq!(opening[0].0, Player::One);
    assert_eq!(opening[1].0, Player::Two);

    let runner = GameRunner::new(60_000, DebugLogger::disabled());
    let mut one = fixed_agent(1, HeuristicKind::Mobility);
    let mut two = fixed_agent(1, HeuristicKind::Mobility);
    let outcome = runner.play(0, [&mut one, &mut two], board);
    assert_eq!(outcome.reason, LossReason::NoLegalMoves);
    assert!(outcome.final_board.move_count() >= 2);
}

#[test]
fn test_player_stuck_before_first_turn_loses_immediately() {
    let board = Board::from_parts(
        3,
        3,
        &[],
        [Some(Coord::new(1, 1)), Some(Coord::new(0, 0))],
        Player::One,
        2,
    );
    let runner = GameRunner::new(60_000, DebugLogger::disabled());
    let mut one = fixed_agent(1, HeuristicKind::Mobility);
    let mut two = fixed_agent(1, HeuristicKind::Mobility);
    let outcome = runner.play(0, [&mut one, &mut two], board);

    assert_eq!(outcome.winner, Player::Two);
    assert_eq!(outcome.reason, LossReason::NoLegalMoves);
    assert!(outcome.history.is_empty());
}

#[test]
fn test_tournament_tallies_every_game() {
    let config = small_tournament(4);
    let report = run_tournament(&config, &DebugLogger::disabled()).unwrap();

    assert_eq!(report.games(), 4);
    assert_eq!(report.agent_wins + report.opponent_wins, 4);
    assert!((0.0..=1.0).contains(&report.win_rate()));

    let mut records = report.records.clone();
    records.sort_by_key(|r| r.game);
    for record in &records {
        let expected_seat = if record.game % 2 == 0 { Player::One } else { Player::Two };
        assert_eq!(record.agent_seat, expected_seat);
        assert_eq!(record.reason, LossReason::NoLegalMoves);
        assert!(record.moves >= 2);
    }
}

#[test]
fn test_tournament_rejects_invalid_agent_config() {
    let mut config = small_tournament(2);
    config.opponent.timeout_ms = 0.0;
    assert!(run_tournament(&config, &DebugLogger::disabled()).is_err());
}

#[test]
fn test_tournament_rejects_cached_reflect_on_even_board() {
    let mut config = small_tournament(2);
    config.tournament.width = 6;
    config.agent.heuristic = HeuristicConfig {
        cached: true,
        ..HeuristicConfig::of_kind(HeuristicKind::Reflect)
    };
    assert!(matches!(
        run_tournament(&config, &DebugLogger::disabled()),
        Err(ConfigError::Invalid { field: "heuristic.cached", .. })
    ));
}

#[test]
fn test_tournament_is_reproducible_with_seed() {
    let config = small_tournament(2);
    let mut a = run_tournament(&config, &DebugLogger::disabled()).unwrap().records;
    let mut b = run_tournament(&config, &DebugLogger::disabled()).unwrap().records;
    a.sort_by_key(|r| r.game);
    b.sort_by_key(|r| r.game);
    let summary = |records: &[isolation_agent::game::GameRecord]| {
        records.iter().map(|r| (r.agent_won, r.moves)).collect::<Vec<_>>()
    };
    assert_eq!(summary(&a), summary(&b));
}
