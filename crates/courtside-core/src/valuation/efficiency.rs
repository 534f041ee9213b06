// Contract efficiency score and percentile value labels.
//
// score = (w_pts * pts/max_pts + w_reb * reb/max_reb + w_ast * ast/max_ast)
//         / (salary / 1,000,000)
//
// Maxima are taken over the whole table and floored at 1. A zero salary
// scores 0. Labels come from the 40th/75th percentile of the score column of
// the same table, so every edit to the table can relabel every row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{ScoringConfig, ScoringWeights, ValueTiers};
use crate::players::{PlayerId, PlayerRecord};
use crate::valuation::percentile::{percentile, sorted_finite};

// ---------------------------------------------------------------------------
// Value label
// ---------------------------------------------------------------------------

/// Three-tier contract verdict relative to the rest of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueLabel {
    Underpaid,
    Fair,
    Overpaid,
}

impl ValueLabel {
    pub const ALL: [ValueLabel; 3] = [ValueLabel::Underpaid, ValueLabel::Fair, ValueLabel::Overpaid];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            ValueLabel::Underpaid => "Underpaid",
            ValueLabel::Fair => "Fair",
            ValueLabel::Overpaid => "Overpaid",
        }
    }
}

impl fmt::Display for ValueLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ValueLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "underpaid" => Ok(ValueLabel::Underpaid),
            "fair" => Ok(ValueLabel::Fair),
            "overpaid" => Ok(ValueLabel::Overpaid),
            other => Err(format!(
                "unknown value label '{other}' (expected underpaid, fair or overpaid)"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Cutoffs and maxima
// ---------------------------------------------------------------------------

/// Score thresholds computed for one scoring pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueCutoffs {
    /// Scores at or above this are at least Fair.
    pub fair: f64,
    /// Scores at or above this are Underpaid.
    pub underpaid: f64,
}

impl ValueCutoffs {
    /// Compute cutoffs from a score column. `None` for an empty column.
    pub fn from_scores(scores: impl IntoIterator<Item = f64>, tiers: &ValueTiers) -> Option<Self> {
        let sorted = sorted_finite(scores);
        Some(ValueCutoffs {
            fair: percentile(&sorted, tiers.fair_percentile)?,
            underpaid: percentile(&sorted, tiers.underpaid_percentile)?,
        })
    }

    pub fn classify(&self, score: f64) -> ValueLabel {
        if score >= self.underpaid {
            ValueLabel::Underpaid
        } else if score >= self.fair {
            ValueLabel::Fair
        } else {
            ValueLabel::Overpaid
        }
    }
}

/// Per-stat table maxima used for normalization, each floored at 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatMaxima {
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
}

impl Default for StatMaxima {
    fn default() -> Self {
        StatMaxima {
            points: 1.0,
            rebounds: 1.0,
            assists: 1.0,
        }
    }
}

impl StatMaxima {
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a PlayerRecord>) -> Self {
        records.into_iter().fold(StatMaxima::default(), |acc, r| StatMaxima {
            points: acc.points.max(r.points),
            rebounds: acc.rebounds.max(r.rebounds),
            assists: acc.assists.max(r.assists),
        })
    }
}

// ---------------------------------------------------------------------------
// Per-record formulas
// ---------------------------------------------------------------------------

/// Weighted sum of each production stat divided by its table maximum.
pub fn normalized_production(record: &PlayerRecord, maxima: &StatMaxima, weights: &ScoringWeights) -> f64 {
    weights.points * (record.points / maxima.points)
        + weights.rebounds * (record.rebounds / maxima.rebounds)
        + weights.assists * (record.assists / maxima.assists)
}

/// Normalized production per million of salary; 0 when salary is 0.
pub fn efficiency_score(normalized_production: f64, salary: f64) -> f64 {
    if salary <= 0.0 || !salary.is_finite() {
        return 0.0;
    }
    let score = normalized_production / (salary / crate::players::SALARY_UNIT);
    if score.is_finite() && score > 0.0 {
        score
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Scored output
// ---------------------------------------------------------------------------

/// A player record with its derived efficiency columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    pub id: PlayerId,
    #[serde(flatten)]
    pub player: PlayerRecord,
    pub normalized_production: f64,
    pub efficiency_score: f64,
    pub value_label: ValueLabel,
}

/// Output of one full scoring pass. Rows keep the input order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTable {
    pub rows: Vec<ScoredRecord>,
    /// `None` only when the table is empty.
    pub cutoffs: Option<ValueCutoffs>,
    pub maxima: StatMaxima,
}

impl ScoredTable {
    pub fn get(&self, id: PlayerId) -> Option<&ScoredRecord> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows carrying the given label.
    pub fn count_label(&self, label: ValueLabel) -> usize {
        self.rows.iter().filter(|r| r.value_label == label).count()
    }
}

// ---------------------------------------------------------------------------
// Scoring pipeline
// ---------------------------------------------------------------------------

/// Score a table of identified records.
///
/// Pure and total: the same input always produces the same output, and every
/// record receives exactly one label.
pub fn score(entries: &[(PlayerId, PlayerRecord)], config: &ScoringConfig) -> ScoredTable {
    let maxima = StatMaxima::from_records(entries.iter().map(|(_, r)| r));

    let partial: Vec<(PlayerId, &PlayerRecord, f64, f64)> = entries
        .iter()
        .map(|(id, record)| {
            let normalized = normalized_production(record, &maxima, &config.weights);
            let score = efficiency_score(normalized, record.salary);
            (*id, record, normalized, score)
        })
        .collect();

    let cutoffs = ValueCutoffs::from_scores(partial.iter().map(|p| p.3), &config.tiers);

    let rows = partial
        .into_iter()
        .map(|(id, record, normalized, score)| ScoredRecord {
            id,
            player: record.clone(),
            normalized_production: normalized,
            efficiency_score: score,
            // Non-empty table always has cutoffs.
            value_label: cutoffs
                .map(|c| c.classify(score))
                .unwrap_or(ValueLabel::Overpaid),
        })
        .collect();

    ScoredTable {
        rows,
        cutoffs,
        maxima,
    }
}

/// Score bare records, numbering them 1..=n in input order.
pub fn score_records(records: &[PlayerRecord], config: &ScoringConfig) -> ScoredTable {
    let entries: Vec<(PlayerId, PlayerRecord)> = records
        .iter()
        .enumerate()
        .map(|(i, r)| (PlayerId(i as u32 + 1), r.clone()))
        .collect();
    score(&entries, config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
