//! Harness configuration and the RON / TOML / JSON loader.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the reference scenario: Stark field, scale 10000, admin account 1,
//! player account 12345, the known-good move for each puzzle, and a bound
//! of 16 `ContinueMove` transactions.

use puzzlepool_chain::ChainConfig;
use puzzlepool_contracts::DEFAULT_SCALE;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// The configuration parsed but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

/// Deserialize `content` in the given format. `origin` names the source in
/// error messages.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<T, ConfigError> {
    let parse_err = |detail: String| ConfigError::Parse {
        file: origin.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string())),
    }
}

/// Read a file and deserialize it according to its format.
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Config types
// ===========================================================================

/// Largest accepted fixed-point scale. Larger scales push the arena past
/// the magnitudes a physics frame accepts.
pub const MAX_SCALE: i64 = 1_000_000;

/// An unscaled launch velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Velocity {
    pub vx: i64,
    pub vy: i64,
}

/// Launch velocity for one puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PuzzleMove {
    pub puzzle_id: u64,
    pub velocity: Velocity,
}

/// Score the scenario must record for one puzzle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedScore {
    pub puzzle_id: u64,
    pub score: u64,
}

/// Which move to play for which puzzle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoveTable {
    pub moves: Vec<PuzzleMove>,
    /// Played for any puzzle not listed in `moves`.
    pub fallback: Velocity,
}

impl MoveTable {
    pub fn velocity_for(&self, puzzle_id: u64) -> Velocity {
        self.moves
            .iter()
            .find(|m| m.puzzle_id == puzzle_id)
            .map(|m| m.velocity)
            .unwrap_or(self.fallback)
    }
}

impl Default for MoveTable {
    fn default() -> Self {
        Self {
            moves: vec![PuzzleMove {
                puzzle_id: 0,
                velocity: Velocity { vx: 190, vy: 240 },
            }],
            fallback: Velocity { vx: -100, vy: -230 },
        }
    }
}

/// Everything the scenario driver needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub chain: ChainConfig,
    /// Fixed-point scale of physical quantities.
    pub scale: i64,
    /// Account that deploys and initializes the contracts.
    pub admin: u64,
    /// Account that plays the move.
    pub player: u64,
    /// How many times to call `admin_initialize_puzzle` before pulling.
    /// Puzzles rotate, so 2 selects the second puzzle.
    pub puzzle_initializations: u32,
    pub moves: MoveTable,
    pub expected_scores: Vec<ExpectedScore>,
    /// Upper bound on `ContinueMove` transactions for one move.
    pub max_continue_iterations: u32,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            chain: ChainConfig::default(),
            scale: DEFAULT_SCALE,
            admin: 1,
            player: 12345,
            puzzle_initializations: 1,
            moves: MoveTable::default(),
            expected_scores: vec![
                ExpectedScore {
                    puzzle_id: 0,
                    score: 45,
                },
                ExpectedScore {
                    puzzle_id: 1,
                    score: 35,
                },
            ],
            max_continue_iterations: 16,
        }
    }
}

impl HarnessConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: Self = deserialize_file(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_SCALE).contains(&self.scale) {
            return Err(ConfigError::Invalid(format!(
                "scale must be between 1 and {MAX_SCALE}, got {}",
                self.scale
            )));
        }
        if self.max_continue_iterations == 0 {
            return Err(ConfigError::Invalid(
                "max_continue_iterations must be at least 1".to_string(),
            ));
        }
        if self.puzzle_initializations == 0 {
            return Err(ConfigError::Invalid(
                "puzzle_initializations must be at least 1".to_string(),
            ));
        }
        if self.admin == 0 || self.player == 0 {
            return Err(ConfigError::Invalid(
                "account 0 is reserved for the zero address".to_string(),
            ));
        }
        Ok(())
    }

    pub fn expected_score(&self, puzzle_id: u64) -> Option<u64> {
        self.expected_scores
            .iter()
            .find(|e| e.puzzle_id == puzzle_id)
            .map(|e| e.score)
    }
}
