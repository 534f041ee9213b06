// Per-player contract metrics shown alongside the efficiency score.

use serde::Serialize;

use crate::players::PlayerRecord;
use crate::valuation::efficiency::StatMaxima;

/// Unweighted points + rebounds + assists per million of salary.
/// 0 when salary is 0.
pub fn stats_per_million(record: &PlayerRecord) -> f64 {
    let millions = record.salary_millions();
    if millions <= 0.0 {
        return 0.0;
    }
    (record.points + record.rebounds + record.assists) / millions
}

/// Composite production figure: 0.4 pts + 0.3 reb + 0.3 ast.
pub fn player_value_index(record: &PlayerRecord) -> f64 {
    record.points * 0.4 + record.rebounds * 0.3 + record.assists * 0.3
}

/// Salary paid per point per game. 0 when the player has no points.
pub fn dollars_per_point(record: &PlayerRecord) -> f64 {
    if record.points <= 0.0 {
        return 0.0;
    }
    record.salary / record.points
}

/// Profile of a player on a 0-100 scale: counting stats as a share of the
/// table maximum, shooting percentages as recorded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProfileShape {
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub fg_pct: f64,
    pub three_pct: f64,
    pub ft_pct: f64,
}

pub fn profile_shape(record: &PlayerRecord, maxima: &StatMaxima) -> ProfileShape {
    ProfileShape {
        points: record.points / maxima.points * 100.0,
        rebounds: record.rebounds / maxima.rebounds * 100.0,
        assists: record.assists / maxima.assists * 100.0,
        fg_pct: record.fg_pct,
        three_pct: record.three_pct,
        ft_pct: record.ft_pct,
    }
}

/// Bundle of the contract metrics for one player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ContractMetrics {
    pub stats_per_million: f64,
    pub value_index: f64,
    pub dollars_per_point: f64,
}

impl ContractMetrics {
    pub fn for_record(record: &PlayerRecord) -> Self {
        ContractMetrics {
            stats_per_million: stats_per_million(record),
            value_index: player_value_index(record),
            dollars_per_point: dollars_per_point(record),
        }
    }
}
