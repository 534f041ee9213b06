// Configuration loading and parsing (courtside.toml).

use serde::Deserialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Name of the single config file under `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "courtside.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub data_paths: DataPaths,
    pub scoring: ScoringConfig,
    pub query: QueryConfig,
    pub overview: OverviewConfig,
}

// ---------------------------------------------------------------------------
// courtside.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire courtside.toml file.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    data: DataPaths,
    #[serde(default)]
    scoring: ScoringConfig,
    #[serde(default)]
    query: QueryConfig,
    #[serde(default)]
    overview: OverviewConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
}

impl Default for DataPaths {
    fn default() -> Self {
        DataPaths {
            players: "data/players.csv".into(),
        }
    }
}

/// Weights and percentile tiers for the contract efficiency score.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoringWeights,
    #[serde(default)]
    pub tiers: ValueTiers,
}

/// Production weights applied to the max-normalized per-game stats.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScoringWeights {
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        ScoringWeights {
            points: 0.6,
            rebounds: 0.25,
            assists: 0.15,
        }
    }
}

/// Percentile ranks (0.0-1.0) at which the value labels switch.
///
/// A score at or above the `underpaid_percentile` cutoff is Underpaid, at or
/// above `fair_percentile` is Fair, anything below is Overpaid.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ValueTiers {
    pub fair_percentile: f64,
    pub underpaid_percentile: f64,
}

impl Default for ValueTiers {
    fn default() -> Self {
        ValueTiers {
            fair_percentile: 0.40,
            underpaid_percentile: 0.75,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    /// N for "top scorers" / "highest paid" when the question names none.
    pub default_top_n: usize,
    /// Row cap for efficiency and label listings.
    pub list_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            default_top_n: 5,
            list_limit: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OverviewConfig {
    pub top_n: usize,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        OverviewConfig { top_n: 5 }
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/courtside.toml` relative to
/// the given `base_dir`.
///
/// This is the lower-level loading primitive that does not auto-copy defaults.
/// Prefer `load_config_in()` which handles default initialization.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: ConfigFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        data_paths: file.data,
        scoring: file.scoring,
        query: file.query,
        overview: file.overview,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/courtside.toml` from `defaults/courtside.toml` when it is
/// missing. Returns the path written, or `None` when a config file was
/// already in place. An existing file is never overwritten.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    let seed = std::fs::read(&source).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!(
            "no config at {} and no defaults at {} ({e}); \
             run from the project root or pass --config-dir",
            target.display(),
            source.display()
        ),
    })?;

    std::fs::create_dir_all(base_dir.join("config")).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    // create_new: a file that appeared since the check above wins.
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(None),
        Err(e) => {
            return Err(ConfigError::DefaultsCopyError {
                message: format!("failed to create {}: {e}", target.display()),
            })
        }
    };
    dest.write_all(&seed).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to write {}: {e}", target.display()),
    })?;

    info!("Seeded {} from defaults", target.display());
    Ok(Some(target))
}

/// Seed the config from defaults if needed, then load it.
pub fn load_config_in(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_file(base_dir)?;
    load_config_from(base_dir)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.data_paths.players.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "data.players".into(),
            message: "must not be empty".into(),
        });
    }

    let w = &config.scoring.weights;
    let weight_fields: &[(&str, f64)] = &[
        ("scoring.weights.points", w.points),
        ("scoring.weights.rebounds", w.rebounds),
        ("scoring.weights.assists", w.assists),
    ];
    for (name, val) in weight_fields {
        if !val.is_finite() || *val < 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be a finite value >= 0, got {val}"),
            });
        }
    }
    if w.points + w.rebounds + w.assists <= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "scoring.weights".into(),
            message: "at least one weight must be > 0".into(),
        });
    }

    let tiers = &config.scoring.tiers;
    for (name, val) in [
        ("scoring.tiers.fair_percentile", tiers.fair_percentile),
        ("scoring.tiers.underpaid_percentile", tiers.underpaid_percentile),
    ] {
        if !(0.0..=1.0).contains(&val) {
            return Err(ConfigError::ValidationError {
                field: name.into(),
                message: format!("must be between 0.0 and 1.0 inclusive, got {val}"),
            });
        }
    }
    if tiers.fair_percentile > tiers.underpaid_percentile {
        return Err(ConfigError::ValidationError {
            field: "scoring.tiers.fair_percentile".into(),
            message: format!(
                "must not exceed underpaid_percentile ({} > {})",
                tiers.fair_percentile, tiers.underpaid_percentile
            ),
        });
    }

    let count_fields: &[(&str, usize)] = &[
        ("query.default_top_n", config.query.default_top_n),
        ("query.list_limit", config.query.list_limit),
        ("overview.top_n", config.overview.top_n),
    ];
    for (name, val) in count_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
