// League and team analytics over the current scoring of the player table.
//
// Everything here is a one-shot pass over the scored rows. Averages over an
// empty set are 0.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::players::PlayerId;
use crate::search::{salary_bounds, teams};
use crate::table::PlayerTable;
use crate::valuation::efficiency::{ScoredRecord, ValueCutoffs, ValueLabel};
use crate::valuation::metrics::{player_value_index, profile_shape, ContractMetrics, ProfileShape};

// ---------------------------------------------------------------------------
// Ranking helpers
// ---------------------------------------------------------------------------

/// The `n` rows with the largest `key`, descending. Equal keys keep the
/// input order.
pub fn top_n<'a, F>(rows: impl IntoIterator<Item = &'a ScoredRecord>, n: usize, key: F) -> Vec<&'a ScoredRecord>
where
    F: Fn(&ScoredRecord) -> f64,
{
    let mut ranked: Vec<&ScoredRecord> = rows.into_iter().collect();
    ranked.sort_by(|a, b| key(b).total_cmp(&key(a)));
    ranked.truncate(n);
    ranked
}

/// The `n` rows with the smallest `key`, ascending. Equal keys keep the
/// input order.
pub fn bottom_n<'a, F>(rows: impl IntoIterator<Item = &'a ScoredRecord>, n: usize, key: F) -> Vec<&'a ScoredRecord>
where
    F: Fn(&ScoredRecord) -> f64,
{
    let mut ranked: Vec<&ScoredRecord> = rows.into_iter().collect();
    ranked.sort_by(|a, b| key(a).total_cmp(&key(b)));
    ranked.truncate(n);
    ranked
}

pub(crate) fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

// ---------------------------------------------------------------------------
// League
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LabelCounts {
    pub underpaid: usize,
    pub fair: usize,
    pub overpaid: usize,
}

/// Headline cards: who stands out on each axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyInsights {
    pub most_efficient: Option<ScoredRecord>,
    pub highest_paid: Option<ScoredRecord>,
    pub top_scorer: Option<ScoredRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueOverview {
    pub players: usize,
    pub teams: usize,
    pub average_salary: f64,
    /// Lowest and highest salary; `None` for an empty table.
    pub salary_range: Option<(f64, f64)>,
    pub average_efficiency: f64,
    pub labels: LabelCounts,
    pub cutoffs: Option<ValueCutoffs>,
    pub insights: KeyInsights,
    /// Highest efficiency scores, descending.
    pub top: Vec<ScoredRecord>,
}

pub fn league_overview(table: &PlayerTable, top_n_count: usize) -> LeagueOverview {
    let scored = table.scored();
    let rows = &scored.rows;

    let first = |key: fn(&ScoredRecord) -> f64| top_n(rows, 1, key).first().map(|r| (*r).clone());

    LeagueOverview {
        players: rows.len(),
        teams: teams(rows).len(),
        average_salary: mean(rows.iter().map(|r| r.player.salary)),
        salary_range: salary_bounds(rows),
        average_efficiency: mean(rows.iter().map(|r| r.efficiency_score)),
        labels: LabelCounts {
            underpaid: scored.count_label(ValueLabel::Underpaid),
            fair: scored.count_label(ValueLabel::Fair),
            overpaid: scored.count_label(ValueLabel::Overpaid),
        },
        cutoffs: scored.cutoffs,
        insights: KeyInsights {
            most_efficient: first(|r| r.efficiency_score),
            highest_paid: first(|r| r.player.salary),
            top_scorer: first(|r| r.player.points),
        },
        top: top_n(rows, top_n_count, |r| r.efficiency_score)
            .into_iter()
            .cloned()
            .collect(),
    }
}

/// Per-game league means used as the comparison line in player profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LeagueAverages {
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub salary: f64,
}

pub fn league_averages(table: &PlayerTable) -> LeagueAverages {
    let rows = &table.scored().rows;
    LeagueAverages {
        points: mean(rows.iter().map(|r| r.player.points)),
        rebounds: mean(rows.iter().map(|r| r.player.rebounds)),
        assists: mean(rows.iter().map(|r| r.player.assists)),
        salary: mean(rows.iter().map(|r| r.player.salary)),
    }
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamSummary {
    pub team: String,
    pub players: usize,
    pub payroll: f64,
    pub average_value_index: f64,
    pub average_efficiency: f64,
    pub best_value: ScoredRecord,
    pub highest_paid: ScoredRecord,
    pub top_performer: ScoredRecord,
}

/// Summary for one team code (case-insensitive). `None` when no player is on
/// that team.
pub fn team_summary(table: &PlayerTable, team: &str) -> Option<TeamSummary> {
    let team = team.trim();
    let roster: Vec<&ScoredRecord> = table
        .scored()
        .rows
        .iter()
        .filter(|r| r.player.team.eq_ignore_ascii_case(team))
        .collect();
    summarize(&roster)
}

/// Summaries for every team, sorted by team code.
pub fn team_summaries(table: &PlayerTable) -> Vec<TeamSummary> {
    let mut rosters: BTreeMap<&str, Vec<&ScoredRecord>> = BTreeMap::new();
    for row in &table.scored().rows {
        rosters.entry(row.player.team.as_str()).or_default().push(row);
    }
    rosters.values().filter_map(|roster| summarize(roster)).collect()
}

fn summarize(roster: &[&ScoredRecord]) -> Option<TeamSummary> {
    let head = roster.first()?;
    let pick = |key: fn(&ScoredRecord) -> f64| top_n(roster.iter().copied(), 1, key).first().map(|r| (*r).clone());

    Some(TeamSummary {
        team: head.player.team.clone(),
        players: roster.len(),
        payroll: roster.iter().map(|r| r.player.salary).sum(),
        average_value_index: mean(roster.iter().map(|r| player_value_index(&r.player))),
        average_efficiency: mean(roster.iter().map(|r| r.efficiency_score)),
        best_value: pick(|r| r.efficiency_score)?,
        highest_paid: pick(|r| r.player.salary)?,
        top_performer: pick(|r| player_value_index(&r.player))?,
    })
}

// ---------------------------------------------------------------------------
// Player profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerProfile {
    pub player: ScoredRecord,
    pub metrics: ContractMetrics,
    pub shape: ProfileShape,
    pub league: LeagueAverages,
    pub cutoffs: Option<ValueCutoffs>,
}

pub fn player_profile(table: &PlayerTable, id: PlayerId) -> Option<PlayerProfile> {
    let row = table.get(id)?;
    Some(PlayerProfile {
        player: row.clone(),
        metrics: ContractMetrics::for_record(&row.player),
        shape: profile_shape(&row.player, &table.scored().maxima),
        league: league_averages(table),
        cutoffs: table.cutoffs(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
