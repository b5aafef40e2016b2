use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use match_five_core::GameConfig;
use serde::Deserialize;

/// Save file used when neither the command line nor the config file names one.
pub(crate) const DEFAULT_SAVE_PATH: &str = "match-five-save.json";

/// Highscore file used when neither the command line nor the config file names one.
pub(crate) const DEFAULT_HIGHSCORE_PATH: &str = "match-five-highscore";

/// Contents of an optional TOML configuration file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ConfigFile {
    /// Location of the JSON save file.
    pub(crate) save_path: Option<PathBuf>,
    /// Location of the highscore file.
    pub(crate) highscore_path: Option<PathBuf>,
    /// Simulation parameters, missing keys fall back to their defaults.
    pub(crate) game: GameConfig,
}

impl ConfigFile {
    /// Reads the file at `path`, or returns defaults when no path was given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config file at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("invalid match-five toml contents")
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Clone, Debug, Default, clap::Args)]
pub(crate) struct Overrides {
    /// Number of grid columns.
    #[arg(long, value_name = "CELLS")]
    pub(crate) width: Option<u32>,
    /// Number of grid rows.
    #[arg(long, value_name = "CELLS")]
    pub(crate) height: Option<u32>,
    /// Units pre-allocated per color.
    #[arg(long, value_name = "UNITS")]
    pub(crate) pool_size: Option<usize>,
    /// Probability in [0, 1] that a new unit carries a special.
    #[arg(long, value_name = "P")]
    pub(crate) special_chance: Option<f32>,
    /// Units spawned and queued per round.
    #[arg(long, value_name = "UNITS")]
    pub(crate) queue_lookahead: Option<usize>,
    /// Seed for the random number generator.
    #[arg(long, value_name = "SEED")]
    pub(crate) seed: Option<u64>,
    /// Score that wins the game.
    #[arg(long, value_name = "POINTS")]
    pub(crate) win_score: Option<u32>,
    /// Wait for `complete` after each move instead of resolving it at once.
    #[arg(long)]
    pub(crate) manual_moves: bool,
    /// Location of the JSON save file.
    #[arg(long, value_name = "PATH")]
    pub(crate) save_path: Option<PathBuf>,
    /// Location of the highscore file.
    #[arg(long, value_name = "PATH")]
    pub(crate) highscore_path: Option<PathBuf>,
}

/// Fully resolved settings of a session.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) game: GameConfig,
    pub(crate) save_path: PathBuf,
    pub(crate) highscore_path: PathBuf,
}

/// Layers `overrides` on top of `file` and validates the result.
pub(crate) fn resolve(file: ConfigFile, overrides: &Overrides) -> Result<Settings> {
    let mut game = file.game;
    if let Some(width) = overrides.width {
        game.width = width;
    }
    if let Some(height) = overrides.height {
        game.height = height;
    }
    if let Some(pool_size) = overrides.pool_size {
        game.pool_size_per_tag = pool_size;
    }
    if let Some(chance) = overrides.special_chance {
        game.special_chance = chance;
    }
    if let Some(lookahead) = overrides.queue_lookahead {
        game.queue_lookahead = lookahead;
    }
    if let Some(seed) = overrides.seed {
        game.rng_seed = seed;
    }
    if overrides.win_score.is_some() {
        game.win_score = overrides.win_score;
    }
    if overrides.manual_moves {
        game.auto_resolve_moves = false;
    }
    game.validate().context("invalid game configuration")?;

    let save_path = overrides
        .save_path
        .clone()
        .or(file.save_path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SAVE_PATH));
    let highscore_path = overrides
        .highscore_path
        .clone()
        .or(file.highscore_path)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_HIGHSCORE_PATH));
    Ok(Settings {
        game,
        save_path,
        highscore_path,
    })
}
