// What-if salary simulation.
//
// Reruns the full scoring pipeline, cutoffs included, over a copy of the table
// with one salary replaced. Because the cutoffs are percentiles of that same
// copy, other players can change label too; those shifts are reported rather
// than hidden.

use serde::Serialize;

use crate::config::ScoringConfig;
use crate::players::{coerce_value, PlayerId, PlayerRecord};
use crate::valuation::efficiency::{score, ScoredRecord, ValueCutoffs, ValueLabel};

/// A player other than the simulated one whose label moved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reclassification {
    pub id: PlayerId,
    pub name: String,
    pub from: ValueLabel,
    pub to: ValueLabel,
}

/// Before/after view of a hypothetical salary change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalarySimulation {
    pub id: PlayerId,
    pub baseline: ScoredRecord,
    pub simulated: ScoredRecord,
    pub baseline_cutoffs: Option<ValueCutoffs>,
    pub simulated_cutoffs: Option<ValueCutoffs>,
    pub reclassified: Vec<Reclassification>,
}

impl SalarySimulation {
    pub fn score_delta(&self) -> f64 {
        self.simulated.efficiency_score - self.baseline.efficiency_score
    }

    pub fn label_changed(&self) -> bool {
        self.baseline.value_label != self.simulated.value_label
    }
}

/// Simulate `id` earning `new_salary`. Returns `None` when `id` is not in
/// `entries`. The input slice is never modified.
pub fn simulate_salary(
    entries: &[(PlayerId, PlayerRecord)],
    id: PlayerId,
    new_salary: f64,
    config: &ScoringConfig,
) -> Option<SalarySimulation> {
    let baseline_table = score(entries, config);
    let baseline = baseline_table.get(id)?.clone();

    let mut hypothetical = entries.to_vec();
    if let Some((_, record)) = hypothetical.iter_mut().find(|(entry_id, _)| *entry_id == id) {
        record.salary = coerce_value(new_salary);
    }
    let simulated_table = score(&hypothetical, config);
    let simulated = simulated_table.get(id)?.clone();

    let reclassified = baseline_table
        .rows
        .iter()
        .zip(simulated_table.rows.iter())
        .filter(|(before, after)| before.id != id && before.value_label != after.value_label)
        .map(|(before, after)| Reclassification {
            id: before.id,
            name: before.player.name.clone(),
            from: before.value_label,
            to: after.value_label,
        })
        .collect();

    Some(SalarySimulation {
        id,
        baseline,
        simulated,
        baseline_cutoffs: baseline_table.cutoffs,
        simulated_cutoffs: simulated_table.cutoffs,
        reclassified,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> Vec<(PlayerId, PlayerRecord)> {
        (1..=10)
            .map(|m| {
                (
                    PlayerId(m),
                    PlayerRecord::new(format!("P{m}"), "TST", m as f64 * 1_000_000.0, 10.0, 10.0, 10.0),
                )
            })
            .collect()
    }

    #[test]
    fn unknown_player_returns_none() {
        assert!(simulate_salary(&ladder(), PlayerId(99), 1.0, &ScoringConfig::default()).is_none());
    }

    #[test]
    fn same_salary_changes_nothing() {
        let sim = simulate_salary(&ladder(), PlayerId(5), 5_000_000.0, &ScoringConfig::default()).unwrap();
        assert_eq!(sim.baseline, sim.simulated);
        assert_eq!(sim.baseline_cutoffs, sim.simulated_cutoffs);
        assert!(sim.reclassified.is_empty());
        assert_eq!(sim.score_delta(), 0.0);
        assert!(!sim.label_changed());
    }

    #[test]
    fn pay_cut_raises_score_and_label() {
        // P10 at 10M is the least efficient; at 0.5M it tops the table.
        let sim = simulate_salary(&ladder(), PlayerId(10), 500_000.0, &ScoringConfig::default()).unwrap();
        assert_eq!(sim.baseline.value_label, ValueLabel::Overpaid);
        assert_eq!(sim.simulated.value_label, ValueLabel::Underpaid);
        assert!((sim.simulated.efficiency_score - 2.0).abs() < 1e-12);
        assert!(sim.score_delta() > 0.0);
        assert!(sim.label_changed());
    }

    #[test]
    fn simulation_can_relabel_untouched_players() {
        // Moving P10 from the bottom to the top shifts both cutoffs upward:
        // P3 (0.333) falls below the new 75th cutoff (~0.458).
        let sim = simulate_salary(&ladder(), PlayerId(10), 500_000.0, &ScoringConfig::default()).unwrap();
        let p3 = sim
            .reclassified
            .iter()
            .find(|r| r.name == "P3")
            .expect("P3 should be reclassified");
        assert_eq!(p3.from, ValueLabel::Underpaid);
        assert_eq!(p3.to, ValueLabel::Fair);
        assert!(sim.reclassified.iter().all(|r| r.id != PlayerId(10)));
    }

    #[test]
    fn zero_salary_simulation_scores_zero() {
        let sim = simulate_salary(&ladder(), PlayerId(1), 0.0, &ScoringConfig::default()).unwrap();
        assert_eq!(sim.simulated.efficiency_score, 0.0);
        assert_eq!(sim.simulated.value_label, ValueLabel::Overpaid);
    }

    #[test]
    fn negative_salary_coerced_to_zero() {
        let sim = simulate_salary(&ladder(), PlayerId(2), -3.0, &ScoringConfig::default()).unwrap();
        assert_eq!(sim.simulated.player.salary, 0.0);
        assert_eq!(sim.simulated.efficiency_score, 0.0);
    }

    #[test]
    fn input_entries_untouched() {
        let entries = ladder();
        let snapshot = entries.clone();
        let _ = simulate_salary(&entries, PlayerId(4), 123.0, &ScoringConfig::default());
        assert_eq!(entries, snapshot);
    }
}
