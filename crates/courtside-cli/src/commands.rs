// One-shot subcommands. Each renders to a String so main only has to print it.

use anyhow::{bail, Context};
use tracing::info;

use courtside_core::analytics::{league_overview, player_profile, team_summaries, team_summary};
use courtside_core::config::Config;
use courtside_core::query;
use courtside_core::search::PlayerFilter;
use courtside_core::table::PlayerTable;

use crate::cli::{joined, Command};
use crate::output;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Render {
    pub json: bool,
    pub use_colors: bool,
}

impl Render {
    pub fn text(use_colors: bool) -> Self {
        Render { json: false, use_colors }
    }

    pub fn json() -> Self {
        Render {
            json: true,
            use_colors: false,
        }
    }
}

/// Run a non-interactive command against the loaded table.
///
/// `Command::Session` is handled by the caller because it owns stdin.
pub fn run(command: &Command, table: &PlayerTable, config: &Config, render: Render) -> anyhow::Result<String> {
    match command {
        Command::Overview => {
            let overview = league_overview(table, config.overview.top_n);
            if render.json {
                return Ok(output::to_json(&overview)?);
            }
            Ok(output::format_overview(&overview, render.use_colors))
        }

        Command::Players(args) => {
            let filter = PlayerFilter::from(args.clone());
            let rows = filter.apply(&table.scored().rows);
            info!("Filter matched {} of {} players", rows.len(), table.len());
            if render.json {
                return Ok(output::to_json(&rows)?);
            }
            Ok(output::format_player_table(&rows, render.use_colors))
        }

        Command::Player { name } => {
            let name = joined(name);
            let id = table.find_by_name(&name)?;
            let profile = player_profile(table, id).with_context(|| format!("player {id} vanished"))?;
            if render.json {
                return Ok(output::to_json(&profile)?);
            }
            Ok(output::format_profile(&profile, render.use_colors))
        }

        Command::Teams { team: Some(team) } => {
            let Some(summary) = team_summary(table, team) else {
                bail!("no players on team '{team}'");
            };
            if render.json {
                return Ok(output::to_json(&summary)?);
            }
            Ok(output::format_team_summary(&summary, render.use_colors))
        }

        Command::Teams { team: None } => {
            let summaries = team_summaries(table);
            if render.json {
                return Ok(output::to_json(&summaries)?);
            }
            Ok(summaries
                .iter()
                .map(|s| output::format_team_summary(s, render.use_colors))
                .collect::<Vec<_>>()
                .join("\n\n"))
        }

        Command::Ask { question } => {
            let outcome = query::answer(table, &joined(question), &config.query)?;
            if render.json {
                return Ok(output::to_json(&outcome)?);
            }
            Ok(output::format_query_outcome(&outcome, render.use_colors))
        }

        Command::Simulate { name, salary } => {
            let id = table.find_by_name(&joined(name))?;
            let sim = table.simulate_salary(id, *salary)?;
            if render.json {
                return Ok(output::to_json(&sim)?);
            }
            Ok(output::format_simulation(&sim, render.use_colors))
        }

        Command::Session => bail!("the session command is interactive and cannot be run here"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::FilterArgs;
    use courtside_core::config::ScoringConfig;
    use courtside_core::players::PlayerRecord;
    use courtside_core::valuation::ValueLabel;

    fn table() -> PlayerTable {
        PlayerTable::from_records(
            vec![
                PlayerRecord::new("Star Guard", "AAA", 10_000_000.0, 30.0, 5.0, 5.0),
                PlayerRecord::new("Role Forward", "BBB", 1_000_000.0, 10.0, 10.0, 10.0),
                PlayerRecord::new("Bench Center", "BBB", 4_000_000.0, 6.0, 8.0, 1.0),
            ],
            ScoringConfig::default(),
        )
    }

    fn words(text: &str) -> Vec<String> {
        text.split_whitespace().map(String::from).collect()
    }

    fn text(command: Command) -> anyhow::Result<String> {
        run(&command, &table(), &Config::default(), Render::text(false))
    }

    #[test]
    fn overview_text() {
        let out = text(Command::Overview).unwrap();
        assert!(out.starts_with("League overview"));
        assert!(out.contains("Players:            3"));
    }

    #[test]
    fn players_filtered_json() {
        let command = Command::Players(FilterArgs {
            team: Some("bbb".into()),
            label: Some(ValueLabel::Underpaid),
            ..FilterArgs::default()
        });
        let out = run(&command, &table(), &Config::default(), Render::json()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["name"], "Role Forward");
    }

    #[test]
    fn player_profile_by_partial_name() {
        let out = text(Command::Player { name: words("star") }).unwrap();
        assert!(out.contains("Star Guard (AAA, -)"));
    }

    #[test]
    fn unknown_player_is_error() {
        let err = text(Command::Player { name: words("nobody") }).unwrap_err();
        assert!(err.to_string().contains("no player matching 'nobody'"));
    }

    #[test]
    fn teams_all_and_single() {
        let all = text(Command::Teams { team: None }).unwrap();
        assert!(all.contains("AAA (1 players)"));
        assert!(all.contains("BBB (2 players)"));

        let one = text(Command::Teams { team: Some("bbb".into()) }).unwrap();
        assert!(one.starts_with("BBB"));
        assert!(text(Command::Teams { team: Some("ZZZ".into()) }).is_err());
    }

    #[test]
    fn ask_routes_and_rejects() {
        let out = text(Command::Ask { question: words("average salary") }).unwrap();
        assert!(out.contains("AVG(salary_usd)"));
        assert!(out.contains("avg_salary: $5.00M"));

        let err = text(Command::Ask { question: words("drop table players") }).unwrap_err();
        assert!(err.to_string().contains("restricted keyword 'drop'"));
    }

    #[test]
    fn simulate_text() {
        let out = text(Command::Simulate {
            name: words("star guard"),
            salary: 500_000.0,
        })
        .unwrap();
        assert!(out.contains("What if Star Guard earned $0.50M?"));
    }

    #[test]
    fn session_not_runnable_here() {
        assert!(text(Command::Session).is_err());
    }
}
