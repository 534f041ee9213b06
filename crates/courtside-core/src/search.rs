// Player search filters over a scored table.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::valuation::efficiency::{ScoredRecord, ValueLabel};

/// Conjunctive search criteria. The default filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerFilter {
    /// Case-insensitive substring of the player name.
    pub name: Option<String>,
    /// Team code, compared case-insensitively.
    pub team: Option<String>,
    /// Inclusive salary bounds.
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub min_points: Option<f64>,
    pub label: Option<ValueLabel>,
}

impl PlayerFilter {
    pub fn matches(&self, row: &ScoredRecord) -> bool {
        let player = &row.player;

        if let Some(name) = non_blank(&self.name) {
            if !player.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(team) = non_blank(&self.team) {
            if !player.team.eq_ignore_ascii_case(team) {
                return false;
            }
        }
        if self.salary_min.is_some_and(|min| player.salary < min) {
            return false;
        }
        if self.salary_max.is_some_and(|max| player.salary > max) {
            return false;
        }
        if self.min_points.is_some_and(|min| player.points < min) {
            return false;
        }
        if self.label.is_some_and(|label| row.value_label != label) {
            return false;
        }
        true
    }

    /// Rows that satisfy every criterion, in table order.
    pub fn apply<'a>(&self, rows: &'a [ScoredRecord]) -> Vec<&'a ScoredRecord> {
        rows.iter().filter(|row| self.matches(row)).collect()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Distinct team codes, sorted.
pub fn teams<'a>(rows: impl IntoIterator<Item = &'a ScoredRecord>) -> Vec<String> {
    rows.into_iter()
        .map(|r| r.player.team.clone())
        .filter(|t| !t.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Lowest and highest salary in the rows, for range prompts.
pub fn salary_bounds<'a>(rows: impl IntoIterator<Item = &'a ScoredRecord>) -> Option<(f64, f64)> {
    rows.into_iter().fold(None, |acc, r| {
        let s = r.player.salary;
        Some(match acc {
            None => (s, s),
            Some((lo, hi)) => (lo.min(s), hi.max(s)),
        })
    })
}
