// Session player table: create/update/delete with full-table rescoring.
//
// Edits live only as long as the process. Every mutation rescores the whole
// table, so a single edit can move the percentile cutoffs and relabel rows
// that were not touched.

use tracing::{debug, info};

use crate::config::ScoringConfig;
use crate::players::{PlayerId, PlayerRecord};
use crate::valuation::efficiency::{score, ScoredRecord, ScoredTable, ValueCutoffs};
use crate::valuation::simulate::{simulate_salary, SalarySimulation};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("no player with id {0}")]
    UnknownId(PlayerId),

    #[error("no player matching '{0}'")]
    NoMatch(String),

    #[error("'{query}' matches {count} players: {names}")]
    Ambiguous {
        query: String,
        count: usize,
        names: String,
    },

    #[error("player name must not be empty")]
    EmptyName,
}

// ---------------------------------------------------------------------------
// Partial update
// ---------------------------------------------------------------------------

/// Field patch for [`PlayerTable::update`]. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerUpdate {
    pub name: Option<String>,
    pub team: Option<String>,
    pub position: Option<String>,
    pub salary: Option<f64>,
    pub points: Option<f64>,
    pub rebounds: Option<f64>,
    pub assists: Option<f64>,
    pub fg_pct: Option<f64>,
    pub three_pct: Option<f64>,
    pub ft_pct: Option<f64>,
    pub games: Option<f64>,
    pub minutes: Option<f64>,
}

impl PlayerUpdate {
    pub fn is_empty(&self) -> bool {
        *self == PlayerUpdate::default()
    }

    fn apply_to(self, record: &mut PlayerRecord) {
        if let Some(name) = self.name {
            record.name = name;
        }
        if let Some(team) = self.team {
            record.team = team;
        }
        if let Some(position) = self.position {
            record.position = Some(position);
        }
        let numeric = [
            (self.salary, &mut record.salary),
            (self.points, &mut record.points),
            (self.rebounds, &mut record.rebounds),
            (self.assists, &mut record.assists),
            (self.fg_pct, &mut record.fg_pct),
            (self.three_pct, &mut record.three_pct),
            (self.ft_pct, &mut record.ft_pct),
            (self.games, &mut record.games),
            (self.minutes, &mut record.minutes),
        ];
        for (patch, field) in numeric {
            if let Some(value) = patch {
                *field = value;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// PlayerTable
// ---------------------------------------------------------------------------

/// The in-memory player table and its current scoring.
#[derive(Debug, Clone)]
pub struct PlayerTable {
    entries: Vec<(PlayerId, PlayerRecord)>,
    scored: ScoredTable,
    config: ScoringConfig,
    next_id: u32,
}

impl PlayerTable {
    /// Build a table from loaded records, numbering them 1..=n in file order.
    pub fn from_records(records: Vec<PlayerRecord>, config: ScoringConfig) -> Self {
        let entries: Vec<(PlayerId, PlayerRecord)> = records
            .into_iter()
            .enumerate()
            .map(|(i, r)| (PlayerId(i as u32 + 1), r.sanitized()))
            .collect();
        let next_id = entries.len() as u32 + 1;
        let scored = score(&entries, &config);
        PlayerTable {
            entries,
            scored,
            config,
            next_id,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identified records in table order.
    pub fn entries(&self) -> &[(PlayerId, PlayerRecord)] {
        &self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &PlayerRecord> {
        self.entries.iter().map(|(_, r)| r)
    }

    /// Scoring of the current table contents.
    pub fn scored(&self) -> &ScoredTable {
        &self.scored
    }

    pub fn cutoffs(&self) -> Option<ValueCutoffs> {
        self.scored.cutoffs
    }

    pub fn get(&self, id: PlayerId) -> Option<&ScoredRecord> {
        self.scored.get(id)
    }

    pub fn record(&self, id: PlayerId) -> Option<&PlayerRecord> {
        self.entries.iter().find(|(e, _)| *e == id).map(|(_, r)| r)
    }

    /// Resolve a player by name: exact (case-insensitive) match first, then a
    /// unique substring match.
    pub fn find_by_name(&self, query: &str) -> Result<PlayerId, TableError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(TableError::EmptyName);
        }

        let exact: Vec<&(PlayerId, PlayerRecord)> = self
            .entries
            .iter()
            .filter(|(_, r)| r.name.to_lowercase() == needle)
            .collect();
        if exact.len() == 1 {
            return Ok(exact[0].0);
        }

        let candidates = if exact.is_empty() {
            self.entries
                .iter()
                .filter(|(_, r)| r.name.to_lowercase().contains(&needle))
                .collect()
        } else {
            exact
        };

        match candidates.as_slice() {
            [] => Err(TableError::NoMatch(query.trim().to_string())),
            [(id, _)] => Ok(*id),
            many => Err(TableError::Ambiguous {
                query: query.trim().to_string(),
                count: many.len(),
                names: many
                    .iter()
                    .take(5)
                    .map(|(id, r)| format!("{} {}", id, r.name))
                    .collect::<Vec<_>>()
                    .join(", "),
            }),
        }
    }

    /// Add a player and rescore. Returns the new id.
    pub fn insert(&mut self, record: PlayerRecord) -> Result<PlayerId, TableError> {
        let record = record.sanitized();
        if record.name.is_empty() {
            return Err(TableError::EmptyName);
        }
        let id = PlayerId(self.next_id);
        self.next_id += 1;
        info!("Adding player {} '{}' ({})", id, record.name, record.team);
        self.entries.push((id, record));
        self.rescore();
        Ok(id)
    }

    /// Patch a player's fields and rescore.
    pub fn update(&mut self, id: PlayerId, patch: PlayerUpdate) -> Result<&ScoredRecord, TableError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|(e, _)| *e == id)
            .ok_or(TableError::UnknownId(id))?;

        let mut candidate = entry.1.clone();
        patch.apply_to(&mut candidate);
        let candidate = candidate.sanitized();
        if candidate.name.is_empty() {
            return Err(TableError::EmptyName);
        }
        info!("Updating player {} '{}'", id, candidate.name);
        entry.1 = candidate;

        self.rescore();
        self.scored.get(id).ok_or(TableError::UnknownId(id))
    }

    /// Remove a player and rescore. Returns the removed record.
    pub fn remove(&mut self, id: PlayerId) -> Result<PlayerRecord, TableError> {
        let idx = self
            .entries
            .iter()
            .position(|(e, _)| *e == id)
            .ok_or(TableError::UnknownId(id))?;
        let (_, record) = self.entries.remove(idx);
        info!("Removed player {} '{}'", id, record.name);
        self.rescore();
        Ok(record)
    }

    /// What-if salary for one player against the current table. The table
    /// itself is not changed.
    pub fn simulate_salary(&self, id: PlayerId, salary: f64) -> Result<SalarySimulation, TableError> {
        simulate_salary(&self.entries, id, salary, &self.config).ok_or(TableError::UnknownId(id))
    }

    fn rescore(&mut self) {
        self.scored = score(&self.entries, &self.config);
        match self.scored.cutoffs {
            Some(c) => debug!(
                "Rescored {} players (fair >= {:.4}, underpaid >= {:.4})",
                self.scored.len(),
                c.fair,
                c.underpaid
            ),
            None => debug!("Rescored empty table"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::efficiency::ValueLabel;

    fn ladder_table() -> PlayerTable {
        let records = (1..=10)
            .map(|m| PlayerRecord::new(format!("P{m}"), "TST", m as f64 * 1_000_000.0, 10.0, 10.0, 10.0))
            .collect();
        PlayerTable::from_records(records, ScoringConfig::default())
    }

    fn label_of(table: &PlayerTable, name: &str) -> ValueLabel {
        let id = table.find_by_name(name).unwrap();
        table.get(id).unwrap().value_label
    }

    #[test]
    fn from_records_assigns_sequential_ids() {
        let table = ladder_table();
        assert_eq!(table.len(), 10);
        assert_eq!(table.entries()[0].0, PlayerId(1));
        assert_eq!(table.entries()[9].0, PlayerId(10));
        assert_eq!(table.scored().len(), 10);
    }

    // -- Delete relabels untouched rows --

    #[test]
    fn deleting_top_player_flips_fair_to_underpaid() {
        let mut table = ladder_table();
        assert_eq!(label_of(&table, "P4"), ValueLabel::Fair);

        let removed = table.remove(PlayerId(1)).unwrap();
        assert_eq!(removed.name, "P1");
        assert_eq!(table.len(), 9);

        // P4's own stats are unchanged; the 75th cutoff dropped onto its score.
        let p4 = table.get(PlayerId(4)).unwrap();
        assert!((p4.efficiency_score - 0.25).abs() < 1e-12);
        assert_eq!(p4.value_label, ValueLabel::Underpaid);
    }

    #[test]
    fn insert_rescores_and_returns_fresh_id() {
        let mut table = ladder_table();
        let before = table.cutoffs().unwrap();
        let id = table
            .insert(PlayerRecord::new("Rookie", "NEW", 500_000.0, 10.0, 10.0, 10.0))
            .unwrap();
        assert_eq!(id, PlayerId(11));
        assert_eq!(table.get(id).unwrap().value_label, ValueLabel::Underpaid);
        assert_ne!(table.cutoffs().unwrap(), before);
    }

    #[test]
    fn ids_not_reused_after_delete() {
        let mut table = ladder_table();
        table.remove(PlayerId(10)).unwrap();
        let id = table.insert(PlayerRecord::new("Next", "NEW", 1.0, 1.0, 1.0, 1.0)).unwrap();
        assert_eq!(id, PlayerId(11));
    }

    #[test]
    fn insert_rejects_blank_name() {
        let mut table = ladder_table();
        let err = table
            .insert(PlayerRecord::new("   ", "NEW", 1.0, 1.0, 1.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, TableError::EmptyName));
        assert_eq!(table.len(), 10);
    }

    #[test]
    fn update_patches_fields_and_rescores() {
        let mut table = ladder_table();
        let updated = table
            .update(
                PlayerId(10),
                PlayerUpdate {
                    salary: Some(1_000_000.0),
                    team: Some("MOV".into()),
                    ..PlayerUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.player.team, "MOV");
        assert!((updated.efficiency_score - 1.0).abs() < 1e-12);
        assert_eq!(updated.value_label, ValueLabel::Underpaid);
    }

    #[test]
    fn update_coerces_bad_numbers() {
        let mut table = ladder_table();
        let updated = table
            .update(
                PlayerId(3),
                PlayerUpdate {
                    points: Some(f64::NAN),
                    salary: Some(-10.0),
                    ..PlayerUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(updated.player.points, 0.0);
        assert_eq!(updated.player.salary, 0.0);
        assert_eq!(updated.efficiency_score, 0.0);
    }

    #[test]
    fn update_unknown_id_fails() {
        let mut table = ladder_table();
        let err = table.update(PlayerId(42), PlayerUpdate::default()).unwrap_err();
        assert!(matches!(err, TableError::UnknownId(PlayerId(42))));
    }

    #[test]
    fn update_to_blank_name_rejected_and_table_unchanged() {
        let mut table = ladder_table();
        let err = table
            .update(
                PlayerId(2),
                PlayerUpdate {
                    name: Some(" ".into()),
                    ..PlayerUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, TableError::EmptyName));
        assert_eq!(table.record(PlayerId(2)).unwrap().name, "P2");
    }

    #[test]
    fn remove_unknown_id_fails() {
        let mut table = ladder_table();
        assert!(matches!(
            table.remove(PlayerId(0)).unwrap_err(),
            TableError::UnknownId(_)
        ));
    }

    #[test]
    fn removing_everyone_leaves_empty_scoring() {
        let mut table = PlayerTable::from_records(
            vec![PlayerRecord::new("Solo", "ONE", 1_000_000.0, 1.0, 1.0, 1.0)],
            ScoringConfig::default(),
        );
        table.remove(PlayerId(1)).unwrap();
        assert!(table.is_empty());
        assert!(table.cutoffs().is_none());
    }

    // -- Name resolution --

    #[test]
    fn find_by_name_exact_then_substring() {
        let records = vec![
            PlayerRecord::new("James LeBron", "LAL", 1.0, 1.0, 1.0, 1.0),
            PlayerRecord::new("James Bronny", "LAL", 1.0, 1.0, 1.0, 1.0),
            PlayerRecord::new("Curry Stephen", "GSW", 1.0, 1.0, 1.0, 1.0),
        ];
        let table = PlayerTable::from_records(records, ScoringConfig::default());

        assert_eq!(table.find_by_name("james lebron").unwrap(), PlayerId(1));
        assert_eq!(table.find_by_name("curry").unwrap(), PlayerId(3));
        match table.find_by_name("james").unwrap_err() {
            TableError::Ambiguous { count, names, .. } => {
                assert_eq!(count, 2);
                assert!(names.contains("James LeBron"));
            }
            other => panic!("expected Ambiguous, got {other}"),
        }
        assert!(matches!(table.find_by_name("jordan").unwrap_err(), TableError::NoMatch(_)));
        assert!(matches!(table.find_by_name("  ").unwrap_err(), TableError::EmptyName));
    }

    #[test]
    fn simulate_leaves_table_untouched() {
        let table = ladder_table();
        let before = table.scored().clone();
        let sim = table.simulate_salary(PlayerId(10), 500_000.0).unwrap();
        assert!(sim.label_changed());
        assert_eq!(table.scored(), &before);
        assert!(matches!(
            table.simulate_salary(PlayerId(77), 1.0).unwrap_err(),
            TableError::UnknownId(_)
        ));
    }

    #[test]
    fn player_update_is_empty() {
        assert!(PlayerUpdate::default().is_empty());
        let patch = PlayerUpdate {
            games: Some(70.0),
            ..PlayerUpdate::default()
        };
        assert!(!patch.is_empty());
    }
}
