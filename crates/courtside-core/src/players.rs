// Player records and player-table loading.
//
// Reads a CSV export of the league spreadsheet. Column headers may use the
// spreadsheet's names (player_name, team_name, salary_usd, pts, reb, assists,
// gp, min, fgp, tpp, ftp) or plain names (name, team, salary, points, ...).
// Numeric cells that are missing or unparseable become 0 without an error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Session-stable identifier assigned by the player table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One row of the player table.
///
/// All numeric fields are finite and non-negative once the record has passed
/// through [`PlayerRecord::sanitized`] (which loading always applies).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub team: String,
    pub position: Option<String>,
    /// Annual salary in currency units (not millions).
    pub salary: f64,
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub fg_pct: f64,
    pub three_pct: f64,
    pub ft_pct: f64,
    pub games: f64,
    pub minutes: f64,
}

impl PlayerRecord {
    /// Build a record from the fields the scoring engine reads. Shooting and
    /// usage stats start at 0.
    pub fn new(
        name: impl Into<String>,
        team: impl Into<String>,
        salary: f64,
        points: f64,
        rebounds: f64,
        assists: f64,
    ) -> Self {
        PlayerRecord {
            name: name.into(),
            team: team.into(),
            position: None,
            salary,
            points,
            rebounds,
            assists,
            fg_pct: 0.0,
            three_pct: 0.0,
            ft_pct: 0.0,
            games: 0.0,
            minutes: 0.0,
        }
        .sanitized()
    }

    /// Trim text fields and coerce every number to a finite value >= 0.
    pub fn sanitized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.team = self.team.trim().to_string();
        self.position = self
            .position
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        for value in [
            &mut self.salary,
            &mut self.points,
            &mut self.rebounds,
            &mut self.assists,
            &mut self.fg_pct,
            &mut self.three_pct,
            &mut self.ft_pct,
            &mut self.games,
            &mut self.minutes,
        ] {
            *value = coerce_value(*value);
        }
        self
    }

    /// Salary expressed in millions.
    pub fn salary_millions(&self) -> f64 {
        self.salary / SALARY_UNIT
    }
}

/// Currency units per "million" in every per-salary metric.
pub const SALARY_UNIT: f64 = 1_000_000.0;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Numeric coercion
// ---------------------------------------------------------------------------

/// Clamp an already-numeric value: NaN, infinities and negatives become 0.
pub fn coerce_value(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parse a spreadsheet cell into a number, defaulting to 0.
///
/// Currency symbols, thousands separators and percent signs are stripped
/// first, so `$1,250,000` and `47.5%` parse.
pub fn coerce_number(raw: Option<&str>) -> f64 {
    let Some(text) = raw else {
        return 0.0;
    };
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '%' | '_') && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(v) => coerce_value(v),
        Err(_) => {
            debug!("coercing unparseable cell '{}' to 0", text);
            0.0
        }
    }
}

// ---------------------------------------------------------------------------
// Column resolution (private)
// ---------------------------------------------------------------------------

const NAME_HEADERS: &[&str] = &["name", "player_name", "player"];
const TEAM_HEADERS: &[&str] = &["team", "team_name", "tm"];
const POSITION_HEADERS: &[&str] = &["position", "pos"];
const SALARY_HEADERS: &[&str] = &["salary", "salary_usd"];
const POINTS_HEADERS: &[&str] = &["points", "pts"];
const REBOUNDS_HEADERS: &[&str] = &["rebounds", "reb", "trb"];
const ASSISTS_HEADERS: &[&str] = &["assists", "ast"];
const FG_PCT_HEADERS: &[&str] = &["fg_pct", "fgp", "fg_percent"];
const THREE_PCT_HEADERS: &[&str] = &["three_pct", "tpp", "3p_pct"];
const FT_PCT_HEADERS: &[&str] = &["ft_pct", "ftp", "ft_percent"];
const GAMES_HEADERS: &[&str] = &["games", "gp", "g"];
const MINUTES_HEADERS: &[&str] = &["minutes", "min", "mp"];

/// Column index of every field, resolved once from the header row.
///
/// A field maps to the leftmost column whose header matches one of its names
/// (ASCII case-insensitive). Later duplicates and unknown columns are ignored.
#[derive(Debug, Default, PartialEq)]
struct ColumnMap {
    name: Option<usize>,
    team: Option<usize>,
    position: Option<usize>,
    salary: Option<usize>,
    points: Option<usize>,
    rebounds: Option<usize>,
    assists: Option<usize>,
    fg_pct: Option<usize>,
    three_pct: Option<usize>,
    ft_pct: Option<usize>,
    games: Option<usize>,
    minutes: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
        };
        ColumnMap {
            name: find(NAME_HEADERS),
            team: find(TEAM_HEADERS),
            position: find(POSITION_HEADERS),
            salary: find(SALARY_HEADERS),
            points: find(POINTS_HEADERS),
            rebounds: find(REBOUNDS_HEADERS),
            assists: find(ASSISTS_HEADERS),
            fg_pct: find(FG_PCT_HEADERS),
            three_pct: find(THREE_PCT_HEADERS),
            ft_pct: find(FT_PCT_HEADERS),
            games: find(GAMES_HEADERS),
            minutes: find(MINUTES_HEADERS),
        }
    }

    /// Build a record from one row, or `None` when the name cell is blank.
    fn record(&self, row: &csv::StringRecord) -> Option<PlayerRecord> {
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i));
        let text = |idx: Option<usize>| cell(idx).map(str::to_string);

        let name = cell(self.name).map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return None;
        }
        Some(
            PlayerRecord {
                name: name.to_string(),
                team: text(self.team).unwrap_or_default(),
                position: text(self.position),
                salary: coerce_number(cell(self.salary)),
                points: coerce_number(cell(self.points)),
                rebounds: coerce_number(cell(self.rebounds)),
                assists: coerce_number(cell(self.assists)),
                fg_pct: coerce_number(cell(self.fg_pct)),
                three_pct: coerce_number(cell(self.three_pct)),
                ft_pct: coerce_number(cell(self.ft_pct)),
                games: coerce_number(cell(self.games)),
                minutes: coerce_number(cell(self.minutes)),
            }
            .sanitized(),
        )
    }
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Read player rows from any CSV source. Rows without a name and rows the CSV
/// reader cannot frame are skipped with a warning.
pub fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(rdr);
    let columns = ColumnMap::from_headers(reader.headers()?);
    if columns.name.is_none() {
        warn!("player CSV has no name column; every row will be skipped");
    }

    let mut players = Vec::new();
    for (line, result) in reader.records().enumerate() {
        match result {
            Ok(row) => match columns.record(&row) {
                Some(record) => players.push(record),
                None => warn!("skipping player row {}: missing name", line + 1),
            },
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
            }
        }
    }
    Ok(players)
}

/// Load the player table from a CSV file.
///
/// Fails when the file cannot be read or produces no usable rows.
pub fn load_players(path: &Path) -> Result<Vec<PlayerRecord>, LoadError> {
    let file = std::fs::File::open(path).map_err(|e| LoadError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let players = load_players_from_reader(file).map_err(|e| LoadError::Csv {
        path: path.display().to_string(),
        source: e,
    })?;

    if players.is_empty() {
        return Err(LoadError::Validation(format!(
            "{} produced zero player rows",
            path.display()
        )));
    }

    Ok(players)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
