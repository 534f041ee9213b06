use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser, Subcommand};
use courtside_core::search::PlayerFilter;
use courtside_core::valuation::ValueLabel;

#[derive(Parser, Debug)]
#[command(name = "courtside")]
#[command(about = "NBA contract efficiency scoring", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Base directory holding config/ and defaults/ (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Player CSV to load instead of the configured path
    #[arg(long, global = true, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Print JSON instead of text tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Reject flag combinations the derive cannot express.
    pub fn check(&self) -> Result<(), clap::Error> {
        if self.json && self.command == Some(Command::Session) {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                "--json cannot be used with the interactive session",
            ));
        }
        Ok(())
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// League overview (default if no subcommand)
    Overview,
    /// List players, optionally filtered
    Players(FilterArgs),
    /// Profile of one player against the league
    Player {
        /// Player name or unique part of it
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Team payroll and value summaries
    Teams {
        /// Only this team code
        #[arg(long)]
        team: Option<String>,
    },
    /// Ask a question such as "top 5 scorers" or "average salary"
    Ask {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// Rescore the table with one player's salary replaced
    Simulate {
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
        /// Hypothetical salary in dollars
        #[arg(long)]
        salary: f64,
    },
    /// Interactive session with in-memory edits (text only, no --json)
    Session,
}

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct FilterArgs {
    /// Case-insensitive part of the player name
    #[arg(long)]
    pub name: Option<String>,
    /// Team code
    #[arg(long)]
    pub team: Option<String>,
    #[arg(long)]
    pub min_salary: Option<f64>,
    #[arg(long)]
    pub max_salary: Option<f64>,
    #[arg(long)]
    pub min_points: Option<f64>,
    /// underpaid, fair or overpaid
    #[arg(long)]
    pub label: Option<ValueLabel>,
}

impl From<FilterArgs> for PlayerFilter {
    fn from(args: FilterArgs) -> Self {
        PlayerFilter {
            name: args.name,
            team: args.team,
            salary_min: args.min_salary,
            salary_max: args.max_salary,
            min_points: args.min_points,
            label: args.label,
        }
    }
}

/// Join positional words back into one string.
pub fn joined(words: &[String]) -> String {
    words.join(" ")
}
