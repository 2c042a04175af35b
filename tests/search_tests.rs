//! Search Engine Tests
//!
//! Checks that pruning never changes results, that iterative deepening agrees
//! with fixed-depth search, and that timeouts fall back to the last completed depth.

use std::cell::Cell;

use isolation_agent::agent::{Agent, SearchMethod};
use isolation_agent::board::Board;
use isolation_agent::config::{AgentConfig, HeuristicConfig};
use isolation_agent::heuristics::{
    Accessibility, Heuristic, HeuristicKind, MobilityDifference, NullScore, OpenMoves, Reflect,
};
use isolation_agent::search::{Search, SearchClock};
use isolation_agent::types::{Coord, Player};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn unlimited() -> f64 {
    f64::MAX
}

fn agent_config(search_depth: i32, iterative: bool, method: SearchMethod) -> AgentConfig {
    AgentConfig {
        search_depth,
        iterative,
        method,
        timeout_ms: 10.0,
        heuristic: HeuristicConfig::of_kind(HeuristicKind::Mobility),
    }
}

fn mobility_agent(search_depth: i32, iterative: bool, method: SearchMethod) -> Agent {
    Agent::new(agent_config(search_depth, iterative, method), Box::new(MobilityDifference))
        .expect("valid agent config")
}

/// Plays `plies` random moves from an empty board, stopping early at a terminal state
fn random_board(width: i32, height: i32, plies: usize, seed: u64) -> Board {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut board = Board::new(width, height);
    for _ in 0..plies {
        let moves = board.legal_moves();
        if moves.is_empty() {
            break;
        }
        board = board.apply_move(moves[rng.random_range(0..moves.len())]);
    }
    board
}

fn representative_boards() -> Vec<Board> {
    let mut boards = Vec::new();
    for seed in 0..4 {
        boards.push(random_board(5, 5, 4 + seed as usize, seed));
        boards.push(random_board(6, 6, 6 + seed as usize, seed + 100));
        boards.push(random_board(6, 5, 3 + seed as usize, seed + 200));
    }
    boards.retain(|b| !b.is_terminal());
    assert!(!boards.is_empty());
    boards
}

fn heuristics() -> Vec<Box<dyn Heuristic>> {
    vec![
        Box::new(MobilityDifference),
        Box::new(Accessibility::default()),
        Box::new(Reflect::default()),
        Box::new(OpenMoves),
        Box::new(NullScore),
    ]
}

#[test]
fn test_alphabeta_matches_minimax() {
    let clock = SearchClock::new(&unlimited, 10.0);

    for board in representative_boards() {
        for mut heuristic in heuristics() {
            for depth in 1..=4 {
                let player = board.active_player();
                let plain = Search::new(heuristic.as_mut(), player, &clock)
                    .minimax(&board, depth)
                    .unwrap();
                let pruned = Search::new(heuristic.as_mut(), player, &clock)
                    .alphabeta(&board, depth)
                    .unwrap();

                assert_eq!(
                    (pruned.score, pruned.best_move),
                    (plain.score, plain.best_move),
                    "{} depth {} on\n{}",
                    heuristic.name(),
                    depth,
                    board
                );
            }
        }
    }
}

#[test]
fn test_alphabeta_does_less_work() {
    let board = random_board(6, 6, 2, 9);
    let mut heuristic = MobilityDifference;

    let plain_clock = SearchClock::new(&unlimited, 10.0);
    Search::new(&mut heuristic, board.active_player(), &plain_clock)
        .minimax(&board, 4)
        .unwrap();

    let pruned_clock = SearchClock::new(&unlimited, 10.0);
    Search::new(&mut heuristic, board.active_player(), &pruned_clock)
        .alphabeta(&board, 4)
        .unwrap();

    assert!(pruned_clock.checks() < plain_clock.checks());
}

#[test]
fn test_iterative_deepening_matches_fixed_depth() {
    for board in representative_boards() {
        let legal = board.legal_moves();
        for depth in 1..=3 {
            let mut iterative = mobility_agent(depth, true, SearchMethod::AlphaBeta);
            let mut fixed = mobility_agent(depth, false, SearchMethod::AlphaBeta);

            let id_move = iterative.select_move(&board, &legal, &unlimited);
            let fixed_move = fixed.select_move(&board, &legal, &unlimited);
            assert_eq!(id_move, fixed_move, "depth {} on\n{}", depth, board);

            let completed = iterative.last_report().unwrap().completed_depth;
            assert!(completed >= 1 && completed <= depth as u32);
        }
    }
}

#[test]
fn test_unbounded_deepening_stops_when_tree_is_exhausted() {
    // Small late-game board: the whole tree is shallow
    let board = random_board(4, 4, 8, 5);
    if board.is_terminal() {
        return;
    }
    let legal = board.legal_moves();

    let mut agent = mobility_agent(-1, true, SearchMethod::AlphaBeta);
    let chosen = agent.select_move(&board, &legal, &unlimited);
    let report = agent.last_report().unwrap().clone();
    assert!(!report.timed_out);
    assert!(report.completed_depth >= 1);

    let clock = SearchClock::new(&unlimited, 10.0);
    let mut fixed = mobility_agent(report.completed_depth as i32, false, SearchMethod::AlphaBeta);
    let direct = fixed.alphabeta(&board, report.completed_depth, &clock).unwrap();
    assert_eq!(chosen, direct.best_move);
    assert!(!direct.reached_cutoff);
}

#[test]
fn test_timeout_at_depth_three_returns_depth_two_move() {
    let board = Board::from_parts(
        5,
        5,
        &[],
        [Some(Coord::new(0, 0)), Some(Coord::new(4, 4))],
        Player::One,
        2,
    );
    let legal = board.legal_moves();

    // Count the deadline checks of the depth 1 and depth 2 searches
    let mut probe = mobility_agent(6, true, SearchMethod::AlphaBeta);
    let clock = SearchClock::new(&unlimited, 10.0);
    probe.alphabeta(&board, 1, &clock).unwrap();
    let expected = probe.alphabeta(&board, 2, &clock).unwrap();
    let budget = clock.checks();

    let calls = Cell::new(0u64);
    let time_left = || {
        calls.set(calls.get() + 1);
        if calls.get() <= budget {
            1000.0
        } else {
            -1.0
        }
    };

    let mut agent = mobility_agent(6, true, SearchMethod::AlphaBeta);
    let chosen = agent.select_move(&board, &legal, &time_left);

    assert_eq!(chosen, expected.best_move);
    let report = agent.last_report().unwrap();
    assert_eq!(report.completed_depth, 2);
    assert!(report.timed_out);
    assert_eq!(report.score, Some(expected.score));
}

#[test]
fn test_depth_one_timeout_returns_first_legal_move() {
    let board = random_board(5, 5, 3, 1);
    let legal = board.legal_moves();
    let mut agent = mobility_agent(3, false, SearchMethod::Minimax);

    assert_eq!(agent.select_move(&board, &legal, &|| -1.0), Some(legal[0]));
    assert!(agent.last_report().unwrap().timed_out);
}

#[test]
fn test_opposite_corners_4x4_depth_two() {
    let board = Board::from_parts(
        4,
        4,
        &[],
        [Some(Coord::new(0, 0)), Some(Coord::new(3, 3))],
        Player::One,
        2,
    );
    let legal = board.legal_moves();
    assert_eq!(legal, vec![Coord::new(1, 2), Coord::new(2, 1)]);

    // Both replies are mirror images across the diagonal and score 0;
    // the first one enumerated wins the tie.
    let clock = SearchClock::new(&unlimited, 10.0);
    let mut agent = mobility_agent(2, false, SearchMethod::AlphaBeta);
    let result = agent.alphabeta(&board, 2, &clock).unwrap();
    assert_eq!(result.best_move, Some(Coord::new(1, 2)));
    assert_eq!(result.score, 0.0);

    assert_eq!(agent.select_move(&board, &legal, &unlimited), Some(Coord::new(1, 2)));

    let mut minimax = mobility_agent(2, false, SearchMethod::Minimax);
    assert_eq!(minimax.select_move(&board, &legal, &unlimited), Some(Coord::new(1, 2)));
}

#[test]
fn test_move_outside_harness_list_is_replaced() {
    let board = Board::from_parts(
        4,
        4,
        &[],
        [Some(Coord::new(0, 0)), Some(Coord::new(3, 3))],
        Player::One,
        2,
    );
    // harness only offers the second move
    let offered = [Coord::new(2, 1)];
    let mut agent = mobility_agent(2, false, SearchMethod::AlphaBeta);
    assert_eq!(agent.select_move(&board, &offered, &unlimited), Some(Coord::new(2, 1)));
}
