// Text rendering for terminal output. Every formatter takes `use_colors` so
// piped output stays plain.

use std::io::IsTerminal;

use owo_colors::OwoColorize;
use serde::Serialize;

use courtside_core::analytics::{LeagueOverview, PlayerProfile, TeamSummary};
use courtside_core::query::{HistoryEntry, QueryOutcome, QueryResult};
use courtside_core::valuation::{SalarySimulation, ScoredRecord, ValueCutoffs, ValueLabel};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Pretty JSON for `--json` output.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Salary in compact millions: "$12.77M".
pub fn format_salary(salary: f64) -> String {
    format!("${:.2}M", salary / 1_000_000.0)
}

pub fn format_salary_range(range: Option<(f64, f64)>) -> String {
    match range {
        Some((lo, hi)) => format!("{} - {}", format_salary(lo), format_salary(hi)),
        None => "-".to_string(),
    }
}

/// Value label padded to a fixed width, colored by tier.
pub fn format_label(label: ValueLabel, use_colors: bool) -> String {
    let padded = format!("{:<9}", label.label());
    if !use_colors {
        return padded;
    }
    match label {
        ValueLabel::Underpaid => padded.green().to_string(),
        ValueLabel::Fair => padded.yellow().to_string(),
        ValueLabel::Overpaid => padded.red().to_string(),
    }
}

fn heading(text: &str, use_colors: bool) -> String {
    if use_colors {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

/// Truncate to `width` characters, marking the cut with "~".
fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

// ---------------------------------------------------------------------------
// Player rows
// ---------------------------------------------------------------------------

const TABLE_HEADER: &str = "   ID  PLAYER                    TEAM      SALARY    PTS   REB   AST   SCORE  VALUE";

fn format_row(row: &ScoredRecord, use_colors: bool) -> String {
    format!(
        "{:>5}  {:<24}  {:<4}  {:>10}  {:>5.1} {:>5.1} {:>5.1}  {:>6.4}  {}",
        row.id.to_string(),
        fit(&row.player.name, 24),
        fit(&row.player.team, 4),
        format_salary(row.player.salary),
        row.player.points,
        row.player.rebounds,
        row.player.assists,
        row.efficiency_score,
        format_label(row.value_label, use_colors),
    )
}

/// One line per player under a column header.
pub fn format_player_table(rows: &[&ScoredRecord], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No players found.".to_string();
    }
    let mut lines = vec![heading(TABLE_HEADER, use_colors)];
    lines.extend(rows.iter().map(|r| format_row(r, use_colors)));
    lines.join("\n")
}

pub fn format_cutoffs(cutoffs: Option<ValueCutoffs>) -> String {
    match cutoffs {
        Some(c) => format!(
            "Cutoffs: Underpaid >= {:.4}, Fair >= {:.4}, Overpaid below",
            c.underpaid, c.fair
        ),
        None => "Cutoffs: none (empty table)".to_string(),
    }
}

// ---------------------------------------------------------------------------
// League and teams
// ---------------------------------------------------------------------------

pub fn format_overview(overview: &LeagueOverview, use_colors: bool) -> String {
    let mut lines = vec![
        heading("League overview", use_colors),
        format!("  Players:            {}", overview.players),
        format!("  Teams:              {}", overview.teams),
        format!("  Average salary:     {}", format_salary(overview.average_salary)),
        format!("  Salary range:       {}", format_salary_range(overview.salary_range)),
        format!("  Average efficiency: {:.4}", overview.average_efficiency),
        format!(
            "  Labels:             {} Underpaid, {} Fair, {} Overpaid",
            overview.labels.underpaid, overview.labels.fair, overview.labels.overpaid
        ),
        format!("  {}", format_cutoffs(overview.cutoffs)),
    ];

    let insights = [
        ("Most efficient", &overview.insights.most_efficient),
        ("Highest paid", &overview.insights.highest_paid),
        ("Top scorer", &overview.insights.top_scorer),
    ];
    for (title, row) in insights {
        if let Some(row) = row {
            lines.push(format!(
                "  {:<19} {} ({}, {}, {:.1} pts)",
                format!("{title}:"),
                row.player.name,
                row.player.team,
                format_salary(row.player.salary),
                row.player.points
            ));
        }
    }

    if !overview.top.is_empty() {
        lines.push(String::new());
        lines.push(heading(&format!("Top {} by efficiency", overview.top.len()), use_colors));
        let top: Vec<&ScoredRecord> = overview.top.iter().collect();
        lines.push(format_player_table(&top, use_colors));
    }
    lines.join("\n")
}

pub fn format_team_summary(summary: &TeamSummary, use_colors: bool) -> String {
    [
        heading(&format!("{} ({} players)", summary.team, summary.players), use_colors),
        format!("  Payroll:            {}", format_salary(summary.payroll)),
        format!("  Avg value index:    {:.2}", summary.average_value_index),
        format!("  Avg efficiency:     {:.4}", summary.average_efficiency),
        format!(
            "  Best value:         {} ({:.4})",
            summary.best_value.player.name, summary.best_value.efficiency_score
        ),
        format!(
            "  Highest paid:       {} ({})",
            summary.highest_paid.player.name,
            format_salary(summary.highest_paid.player.salary)
        ),
        format!("  Top performer:      {}", summary.top_performer.player.name),
    ]
    .join("\n")
}

// ---------------------------------------------------------------------------
// Player profile
// ---------------------------------------------------------------------------

fn compare(value: f64, league: f64) -> String {
    let diff = value - league;
    format!("{value:>6.1}  (league {league:.1}, {diff:+.1})")
}

pub fn format_profile(profile: &PlayerProfile, use_colors: bool) -> String {
    let row = &profile.player;
    let p = &row.player;
    let position = p.position.as_deref().unwrap_or("-");

    let mut lines = vec![
        heading(&format!("{} {} ({}, {})", row.id, p.name, p.team, position), use_colors),
        format!("  Salary:             {}", format_salary(p.salary)),
        format!("  Value:              {}", format_label(row.value_label, use_colors).trim_end()),
        format!("  Efficiency score:   {:.4}", row.efficiency_score),
        format!("  Production:         {:.4}", row.normalized_production),
        format!("  Stats per $1M:      {:.2}", profile.metrics.stats_per_million),
        format!("  Value index:        {:.2}", profile.metrics.value_index),
        format!("  $ per point:        {}", format_salary(profile.metrics.dollars_per_point)),
        format!("  {}", format_cutoffs(profile.cutoffs)),
        String::new(),
        format!("  Points:   {}", compare(p.points, profile.league.points)),
        format!("  Rebounds: {}", compare(p.rebounds, profile.league.rebounds)),
        format!("  Assists:  {}", compare(p.assists, profile.league.assists)),
        format!(
            "  Shape:    PTS {:.0}%  REB {:.0}%  AST {:.0}%  FG {:.1}%  3P {:.1}%  FT {:.1}%",
            profile.shape.points,
            profile.shape.rebounds,
            profile.shape.assists,
            profile.shape.fg_pct,
            profile.shape.three_pct,
            profile.shape.ft_pct
        ),
    ];
    if p.games > 0.0 {
        lines.push(format!("  Usage:    {:.0} games, {:.1} min", p.games, p.minutes));
    }
    lines.join("\n")
}

// ---------------------------------------------------------------------------
// Simulation and queries
// ---------------------------------------------------------------------------

pub fn format_simulation(sim: &SalarySimulation, use_colors: bool) -> String {
    let before = &sim.baseline;
    let after = &sim.simulated;
    let mut lines = vec![
        heading(&format!("What if {} earned {}?", before.player.name, format_salary(after.player.salary)), use_colors),
        format!(
            "  Score:  {:.4} -> {:.4} ({:+.4})",
            before.efficiency_score,
            after.efficiency_score,
            sim.score_delta()
        ),
        format!(
            "  Label:  {} -> {}",
            format_label(before.value_label, use_colors).trim_end(),
            format_label(after.value_label, use_colors).trim_end()
        ),
        format!("  Before: {}", format_cutoffs(sim.baseline_cutoffs)),
        format!("  After:  {}", format_cutoffs(sim.simulated_cutoffs)),
    ];
    if !sim.reclassified.is_empty() {
        lines.push("  Other players relabeled by the shifted cutoffs:".to_string());
        for r in &sim.reclassified {
            lines.push(format!("    {} {}: {} -> {}", r.id, r.name, r.from, r.to));
        }
    }
    lines.push("  (not saved)".to_string());
    lines.join("\n")
}

pub fn format_query_outcome(outcome: &QueryOutcome, use_colors: bool) -> String {
    match outcome {
        QueryOutcome::Advisory { message } => message.clone(),
        QueryOutcome::Answered(answer) => {
            let sql = if use_colors {
                answer.sql.as_str().dimmed().to_string()
            } else {
                answer.sql.clone()
            };
            let body = match &answer.result {
                QueryResult::Players { rows } => {
                    let refs: Vec<&ScoredRecord> = rows.iter().collect();
                    format_player_table(&refs, use_colors)
                }
                QueryResult::Scalar { name, value } if name.contains("salary") => {
                    format!("{name}: {}", format_salary(*value))
                }
                QueryResult::Scalar { name, value } => format!("{name}: {value:.2}"),
                QueryResult::Team { best: Some(best) } => {
                    format!("{}: {:.2} points per player", best.team, best.average_points)
                }
                QueryResult::Team { best: None } => "No teams.".to_string(),
            };
            format!("{sql}\n{body}")
        }
    }
}

pub fn format_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No questions asked yet.".to_string();
    }
    entries
        .iter()
        .map(|e| format!("[{}] {} -> {}", e.asked_at.format("%H:%M:%S"), e.question, e.summary))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_core::config::ScoringConfig;
    use courtside_core::players::PlayerRecord;
    use courtside_core::table::PlayerTable;

    fn table() -> PlayerTable {
        PlayerTable::from_records(
            vec![
                PlayerRecord::new("Star", "AAA", 10_000_000.0, 30.0, 5.0, 5.0),
                PlayerRecord::new("Role", "BBB", 1_000_000.0, 10.0, 10.0, 10.0),
            ],
            ScoringConfig::default(),
        )
    }

    #[test]
    fn salary_in_millions() {
        assert_eq!(format_salary(35_859_950.0), "$35.86M");
        assert_eq!(format_salary(0.0), "$0.00M");
    }

    #[test]
    fn overview_shows_salary_range() {
        let overview = courtside_core::analytics::league_overview(&table(), 5);
        let text = format_overview(&overview, false);
        assert!(text.contains("Salary range:       $1.00M - $10.00M"));
        assert_eq!(format_salary_range(None), "-");
    }

    #[test]
    fn plain_label_is_padded() {
        assert_eq!(format_label(ValueLabel::Fair, false), "Fair     ");
        assert!(!format_label(ValueLabel::Overpaid, false).contains('\u{1b}'));
    }

    #[test]
    fn colored_label_has_escape_codes() {
        assert!(format_label(ValueLabel::Underpaid, true).contains('\u{1b}'));
    }

    #[test]
    fn player_table_lists_rows() {
        let table = table();
        let rows: Vec<&ScoredRecord> = table.scored().rows.iter().collect();
        let text = format_player_table(&rows, false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("PLAYER"));
        assert!(lines[1].contains("Star") && lines[1].contains("Overpaid"));
        assert!(lines[2].contains("Role") && lines[2].contains("$1.00M"));
    }

    #[test]
    fn empty_player_table() {
        assert_eq!(format_player_table(&[], false), "No players found.");
    }

    #[test]
    fn long_names_are_cut() {
        assert_eq!(fit("abcdef", 4), "abc~");
        assert_eq!(fit("abc", 4), "abc");
    }

    #[test]
    fn cutoffs_text() {
        let text = format_cutoffs(table().cutoffs());
        assert!(text.contains("0.4700"));
        assert!(text.contains("0.2880"));
        assert_eq!(format_cutoffs(None), "Cutoffs: none (empty table)");
    }

    #[test]
    fn json_output_is_serializable() {
        let table = table();
        let json = to_json(&table.scored().rows).unwrap();
        assert!(json.contains("\"efficiency_score\""));
        assert!(json.contains("\"value_label\": \"Underpaid\""));
    }

    #[test]
    fn simulation_text_marks_unsaved() {
        let table = table();
        let sim = table.simulate_salary(courtside_core::players::PlayerId(1), 500_000.0).unwrap();
        let text = format_simulation(&sim, false);
        assert!(text.contains("What if Star earned $0.50M?"));
        assert!(text.contains("Overpaid -> Underpaid"));
        assert!(text.ends_with("(not saved)"));
    }
}
