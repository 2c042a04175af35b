// Debug logging module for per-turn match records
//
// Each turn is appended to a JSONL file. Tournament games run on several rayon
// workers at once, so the file handle sits behind a mutex and every line is
// written whole.

use log::error;
use parking_lot::Mutex;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::sync::Arc;

use crate::board::Board;
use crate::types::{Coord, Player};

/// Represents a single debug log entry
#[derive(Debug, Serialize)]
struct DebugLogEntry<'a> {
    game: usize,
    turn: u32,
    player: Player,
    chosen_move: Option<Coord>,
    completed_depth: u32,
    elapsed_ms: u128,
    board: &'a Board,
    timestamp: String,
}

/// Shared debug logger; clones write to the same file
#[derive(Clone)]
pub struct DebugLogger {
    file: Arc<Mutex<Option<BufWriter<File>>>>,
    enabled: bool,
}

impl DebugLogger {
    /// Creates a new debug logger
    /// If enabled is true, initializes the log file (truncating if it exists)
    pub fn new(enabled: bool, log_file_path: &str) -> Self {
        if !enabled {
            return Self::disabled();
        }

        match OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_file_path)
        {
            Ok(file) => {
                log::info!("Debug logging enabled: {}", log_file_path);
                DebugLogger {
                    file: Arc::new(Mutex::new(Some(BufWriter::new(file)))),
                    enabled: true,
                }
            }
            Err(e) => {
                error!("Failed to create debug log file '{}': {}", log_file_path, e);
                Self::disabled()
            }
        }
    }

    /// Creates a disabled debug logger (no-op)
    pub fn disabled() -> Self {
        DebugLogger {
            file: Arc::new(Mutex::new(None)),
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Logs one turn. `board` is the state the move was chosen from.
    pub fn log_move(
        &self,
        game: usize,
        board: &Board,
        chosen_move: Option<Coord>,
        completed_depth: u32,
        elapsed_ms: u128,
    ) {
        if !self.enabled {
            return;
        }

        let entry = DebugLogEntry {
            game,
            turn: board.move_count(),
            player: board.active_player(),
            chosen_move,
            completed_depth,
            elapsed_ms,
            board,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let json_line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize debug log entry: {}", e);
                return;
            }
        };

        let mut guard = self.file.lock();
        if let Some(writer) = guard.as_mut() {
            if let Err(e) = writeln!(writer, "{}", json_line) {
                error!("Failed to write debug log entry: {}", e);
            } else if let Err(e) = writer.flush() {
                error!("Failed to flush debug log: {}", e);
            }
        }
    }
}
