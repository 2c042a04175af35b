// Configuration module for reading Isolation.toml
// Every tunable of the agents and the match harness lives here

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::agent::SearchMethod;
use crate::heuristics::{HeuristicKind, ReflectFallback};
use crate::types::Player;

/// Errors raised while loading or validating configuration.
/// All of them are fatal: an agent is never built from a bad config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unknown search method '{0}' (expected 'minimax' or 'alphabeta')")]
    UnknownSearchMethod(String),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub timing: TimingConfig,
    pub agent: AgentConfig,
    pub opponent: AgentConfig,
    pub cache: CacheConfig,
    pub tournament: TournamentConfig,
    pub debug: DebugConfig,
}

/// Turn clock used by the match harness
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    pub turn_time_limit_ms: u64,
}

/// Search parameters for one agent, fixed for the agent's lifetime
#[derive(Debug, Deserialize, Clone)]
pub struct AgentConfig {
    /// Plies to search; zero or negative removes the ceiling (iterative only)
    pub search_depth: i32,
    pub iterative: bool,
    pub method: SearchMethod,
    /// Milliseconds remaining at which the search aborts
    pub timeout_ms: f64,
    pub heuristic: HeuristicConfig,
}

impl AgentConfig {
    /// Depth ceiling, or `None` for unbounded deepening
    pub fn depth_ceiling(&self) -> Option<u32> {
        if self.search_depth > 0 {
            Some(self.search_depth as u32)
        } else {
            None
        }
    }

    /// Rejects settings that would make the search silently wrong
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.timeout_ms.is_finite() || self.timeout_ms <= 0.0 {
            return Err(ConfigError::invalid(
                "timeout_ms",
                format!("must be a positive number of milliseconds, got {}", self.timeout_ms),
            ));
        }
        if !self.iterative && self.depth_ceiling().is_none() {
            return Err(ConfigError::invalid(
                "search_depth",
                "fixed-depth search needs a positive depth",
            ));
        }
        self.heuristic.validate()
    }
}

/// Evaluation function selection and its parameters
#[derive(Debug, Deserialize, Clone)]
pub struct HeuristicConfig {
    pub kind: HeuristicKind,
    /// Route evaluations through the symmetry cache
    #[serde(default)]
    pub cached: bool,
    #[serde(default = "default_generations")]
    pub flood_fill_generations: u32,
    #[serde(default = "default_spice")]
    pub salt_spice: f64,
    /// Seed for the salted heuristic; drawn from the OS when absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_fallback")]
    pub reflect_fallback: ReflectFallback,
    #[serde(default = "default_mirror_player")]
    pub mirror_player: Player,
}

fn default_generations() -> u32 {
    5
}

fn default_spice() -> f64 {
    1.0
}

fn default_fallback() -> ReflectFallback {
    ReflectFallback::Difference
}

fn default_mirror_player() -> Player {
    Player::One
}

impl HeuristicConfig {
    /// Rejects `cached` for heuristics whose score changes under the
    /// symmetries of a `width` x `height` board
    pub fn check_cacheable_on(&self, width: i32, height: i32) -> Result<(), ConfigError> {
        let even_side = width % 2 == 0 || height % 2 == 0;
        if self.cached && self.kind == HeuristicKind::Reflect && even_side {
            return Err(ConfigError::invalid(
                "heuristic.cached",
                format!(
                    "the reflect heuristic has no true centre on a {}x{} board and cannot be cached",
                    width, height
                ),
            ));
        }
        Ok(())
    }

    pub fn of_kind(kind: HeuristicKind) -> Self {
        HeuristicConfig {
            kind,
            cached: false,
            flood_fill_generations: default_generations(),
            salt_spice: default_spice(),
            seed: None,
            reflect_fallback: default_fallback(),
            mirror_player: default_mirror_player(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cached && self.kind == HeuristicKind::Salted {
            return Err(ConfigError::invalid(
                "heuristic.cached",
                "the salted heuristic is random and cannot be cached",
            ));
        }
        if self.flood_fill_generations == 0 {
            return Err(ConfigError::invalid("flood_fill_generations", "must be at least 1"));
        }
        if !self.salt_spice.is_finite() || self.salt_spice < 0.0 {
            return Err(ConfigError::invalid(
                "salt_spice",
                format!("must be a non-negative number, got {}", self.salt_spice),
            ));
        }
        Ok(())
    }
}

/// Symmetry cache bounds
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub max_entries: usize,
    /// States at or beyond this move count are never stored
    pub max_move_depth: u32,
}

/// Match harness settings
#[derive(Debug, Deserialize, Clone)]
pub struct TournamentConfig {
    pub width: i32,
    pub height: i32,
    pub games: usize,
    /// Place both players on random cells before the agents take over
    pub random_openings: bool,
    pub seed: u64,
}

/// Per-turn JSONL match log
#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file and validates it
    ///
    /// # Arguments
    /// * `path` - Path to the Isolation.toml configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads default configuration from Isolation.toml in the project root
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::from_file("Isolation.toml")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.turn_time_limit_ms == 0 {
            return Err(ConfigError::invalid("turn_time_limit_ms", "must be positive"));
        }
        self.agent.validate()?;
        self.opponent.validate()?;
        if self.tournament.width <= 0 || self.tournament.height <= 0 {
            return Err(ConfigError::invalid(
                "tournament.width/height",
                format!(
                    "board must be at least 1x1, got {}x{}",
                    self.tournament.width, self.tournament.height
                ),
            ));
        }
        for agent in [&self.agent, &self.opponent] {
            agent.heuristic.check_cacheable_on(self.tournament.width, self.tournament.height)?;
        }
        Ok(())
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the values in Isolation.toml
    pub fn default_hardcoded() -> Self {
        Config {
            timing: TimingConfig {
                turn_time_limit_ms: 150,
            },
            agent: AgentConfig {
                search_depth: -1,
                iterative: true,
                method: SearchMethod::AlphaBeta,
                timeout_ms: 10.0,
                heuristic: HeuristicConfig {
                    cached: true,
                    ..HeuristicConfig::of_kind(HeuristicKind::Accessibility)
                },
            },
            opponent: AgentConfig {
                search_depth: 3,
                iterative: false,
                method: SearchMethod::AlphaBeta,
                timeout_ms: 10.0,
                heuristic: HeuristicConfig::of_kind(HeuristicKind::Mobility),
            },
            cache: CacheConfig {
                max_entries: 200_000,
                max_move_depth: 12,
            },
            tournament: TournamentConfig {
                width: 7,
                height: 7,
                games: 20,
                random_openings: true,
                seed: 42,
            },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "isolation_games.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Isolation.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hardcoded_defaults_are_valid() {
        let config = Config::default_hardcoded();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.depth_ceiling(), None);
        assert_eq!(config.opponent.depth_ceiling(), Some(3));
    }

    #[test]
    fn test_isolation_toml_can_be_parsed() {
        let result = Config::from_file("Isolation.toml");
        assert!(result.is_ok(), "Failed to parse Isolation.toml: {:?}", result.err());
    }

    #[test]
    fn test_isolation_toml_matches_hardcoded_defaults() {
        let file_config = Config::from_file("Isolation.toml").expect("Isolation.toml should be parseable");
        let hardcoded = Config::default_hardcoded();

        assert_eq!(file_config.timing.turn_time_limit_ms, hardcoded.timing.turn_time_limit_ms);
        assert_eq!(file_config.agent.search_depth, hardcoded.agent.search_depth);
        assert_eq!(file_config.agent.method, hardcoded.agent.method);
        assert_eq!(file_config.agent.heuristic.kind, hardcoded.agent.heuristic.kind);
        assert_eq!(file_config.agent.heuristic.cached, hardcoded.agent.heuristic.cached);
        assert_eq!(file_config.opponent.search_depth, hardcoded.opponent.search_depth);
        assert_eq!(file_config.opponent.iterative, hardcoded.opponent.iterative);
        assert_eq!(file_config.cache.max_entries, hardcoded.cache.max_entries);
        assert_eq!(file_config.cache.max_move_depth, hardcoded.cache.max_move_depth);
        assert_eq!(file_config.tournament.width, hardcoded.tournament.width);
        assert_eq!(file_config.tournament.games, hardcoded.tournament.games);
        assert_eq!(file_config.debug.log_file_path, hardcoded.debug.log_file_path);
    }

    #[test]
    fn test_unknown_search_method_fails_to_parse() {
        let toml = include_str!("../Isolation.toml").replace("method = \"alphabeta\"", "method = \"negascout\"");
        assert!(matches!(Config::from_toml_str(&toml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_non_positive_timeout_is_rejected() {
        let mut config = Config::default_hardcoded();
        config.agent.timeout_ms = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "timeout_ms", .. })
        ));
    }

    #[test]
    fn test_fixed_depth_requires_positive_depth() {
        let mut config = Config::default_hardcoded();
        config.opponent.search_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cached_salted_is_rejected() {
        let mut config = Config::default_hardcoded();
        config.opponent.heuristic = HeuristicConfig {
            cached: true,
            ..HeuristicConfig::of_kind(HeuristicKind::Salted)
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "heuristic.cached", .. })
        ));
        assert!(config.opponent.validate().is_err());
    }

    #[test]
    fn test_cached_reflect_needs_odd_board() {
        let mut config = Config::default_hardcoded();
        config.agent.heuristic = HeuristicConfig {
            cached: true,
            ..HeuristicConfig::of_kind(HeuristicKind::Reflect)
        };
        assert!(config.validate().is_ok());

        config.tournament.width = 6;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "heuristic.cached", .. })
        ));

        config.agent.heuristic.cached = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cached_reflect_in_toml_on_even_board_fails() {
        let toml = include_str!("../Isolation.toml")
            .replace("kind = \"accessibility\"", "kind = \"reflect\"")
            .replace("width = 7", "width = 8");
        assert!(matches!(
            Config::from_toml_str(&toml),
            Err(ConfigError::Invalid { field: "heuristic.cached", .. })
        ));
    }

    #[test]
    fn test_missing_file_returns_io_error() {
        assert!(matches!(Config::from_file("nonexistent.toml"), Err(ConfigError::Io(_))));
    }
}
