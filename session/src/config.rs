//! Game configuration loaded from TOML.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use code_defence_core::{
    GameStatus, Rules, Stage, UnitArchetype, DEFAULT_GENERATION_COST, DEFAULT_INCOME_INTERVAL,
    DEFAULT_STAGE_DURATION, DEFAULT_UNIT_LIMIT,
};
use code_defence_world::{Catalog, CatalogError};
use serde::Deserialize;
use thiserror::Error;

/// Configuration format version understood by this crate.
pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

const DEFAULT_CONFIG: &str = include_str!("../data/default.toml");

/// Reasons a configuration file cannot be turned into a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration at {}", path.display())]
    Io {
        /// Location of the configuration file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The contents are not valid TOML for the configuration schema.
    #[error("failed to parse configuration toml contents")]
    Parse(#[from] toml::de::Error),
    /// The file declares a format version this crate does not understand.
    #[error("unsupported configuration version {found}; expected {expected}")]
    UnsupportedVersion {
        /// Version declared by the file.
        found: u32,
        /// Version this crate understands.
        expected: u32,
    },
    /// The unit definitions do not form a valid catalog.
    #[error("invalid unit catalog")]
    Catalog(#[from] CatalogError),
    /// Stages would elapse instantly.
    #[error("stage duration must be greater than zero")]
    ZeroStageDuration,
    /// Income would be paid without elapsed time.
    #[error("income interval must be greater than zero")]
    ZeroIncomeInterval,
    /// A batch spawns nothing.
    #[error("batch {batch} of stage {stage} has a zero count")]
    EmptyBatch {
        /// Zero-based stage index.
        stage: usize,
        /// Zero-based batch index inside the stage.
        batch: usize,
    },
    /// A batch names no mob.
    #[error("batch {batch} of stage {stage} has an empty mob name")]
    UnnamedMob {
        /// Zero-based stage index.
        stage: usize,
        /// Zero-based batch index inside the stage.
        batch: usize,
    },
    /// The board has no cells to place units on.
    #[error("board must have at least one column and one row")]
    EmptyBoard,
}

/// Dimensions of the board units are placed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoardSize {
    /// Number of cells along the x axis.
    pub columns: u32,
    /// Number of cells along the y axis.
    pub rows: u32,
}

impl Default for BoardSize {
    fn default() -> Self {
        Self {
            columns: 12,
            rows: 9,
        }
    }
}

/// Validated configuration of a game.
#[derive(Clone, Debug)]
pub struct GameConfig {
    rules: Rules,
    status: GameStatus,
    catalog: Catalog,
    stages: Vec<Stage>,
    board: BoardSize,
}

impl GameConfig {
    /// Loads the configuration embedded in the crate.
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    /// Loads and validates the configuration stored at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration contents.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(contents)?;
        if raw.version != SUPPORTED_CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: raw.version,
                expected: SUPPORTED_CONFIG_VERSION,
            });
        }

        let rules = raw.rules.into_rules()?;
        validate_stages(&raw.stages)?;
        if raw.board.columns == 0 || raw.board.rows == 0 {
            return Err(ConfigError::EmptyBoard);
        }
        let catalog = Catalog::new(raw.units)?;

        Ok(Self {
            rules,
            status: raw.status,
            catalog,
            stages: raw.stages,
            board: raw.board,
        })
    }

    /// Constants the world is created with.
    #[must_use]
    pub const fn rules(&self) -> Rules {
        self.rules
    }

    /// Opening game status.
    #[must_use]
    pub const fn status(&self) -> GameStatus {
        self.status
    }

    /// Validated unit catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Stage table driving the wave scheduler.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Board dimensions used by the grid placement provider.
    #[must_use]
    pub const fn board(&self) -> BoardSize {
        self.board
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    version: u32,
    #[serde(default)]
    rules: RawRules,
    #[serde(default)]
    board: BoardSize,
    #[serde(default)]
    status: GameStatus,
    units: Vec<UnitArchetype>,
    #[serde(default)]
    stages: Vec<Stage>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawRules {
    stage_duration_ms: u64,
    income_interval_ms: u64,
    generation_cost: u64,
    unit_limit: usize,
}

impl Default for RawRules {
    fn default() -> Self {
        Self {
            stage_duration_ms: millis(DEFAULT_STAGE_DURATION),
            income_interval_ms: millis(DEFAULT_INCOME_INTERVAL),
            generation_cost: DEFAULT_GENERATION_COST,
            unit_limit: DEFAULT_UNIT_LIMIT,
        }
    }
}

impl RawRules {
    fn into_rules(self) -> Result<Rules, ConfigError> {
        if self.stage_duration_ms == 0 {
            return Err(ConfigError::ZeroStageDuration);
        }
        if self.income_interval_ms == 0 {
            return Err(ConfigError::ZeroIncomeInterval);
        }

        Ok(Rules {
            stage_duration: Duration::from_millis(self.stage_duration_ms),
            income_interval: Duration::from_millis(self.income_interval_ms),
            generation_cost: self.generation_cost,
            unit_limit: self.unit_limit,
        })
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn validate_stages(stages: &[Stage]) -> Result<(), ConfigError> {
    for (stage, definition) in stages.iter().enumerate() {
        for (batch, entry) in definition.batches.iter().enumerate() {
            if entry.count == 0 {
                return Err(ConfigError::EmptyBatch { stage, batch });
            }
            if entry.mob.as_str().trim().is_empty() {
                return Err(ConfigError::UnnamedMob { stage, batch });
            }
        }
    }
    Ok(())
}
