// Interactive session: a line-oriented loop over an owned player table.
//
// Edits (add / update / delete) rescore the whole table immediately and last
// only as long as the session. Errors are printed and the loop continues.

use std::io::{BufRead, Write};

use thiserror::Error;
use tracing::{debug, info};

use courtside_core::analytics::player_profile;
use courtside_core::config::QueryConfig;
use courtside_core::players::PlayerRecord;
use courtside_core::query::QueryHistory;
use courtside_core::table::{PlayerTable, PlayerUpdate};
use courtside_core::valuation::ValueLabel;

use crate::output;

pub const HELP: &str = "\
Commands:
  add <name>, <team>, <salary>, <pts>, <reb>, <ast>   add a player
  update <name> field=value ...                      change fields (salary, pts, reb, ast,
                                                     team, pos, fgp, tpp, ftp, gp, min)
  delete <name>                                      remove a player
  list [underpaid|fair|overpaid]                     show the scored table
  show <name>                                        player profile
  ask <question>                                     e.g. ask top 5 scorers
  simulate <name> <salary>                           what-if salary, not saved
  history                                            questions asked so far
  clear                                              forget the question history
  cutoffs                                            current value cutoffs
  help                                               this text
  quit                                               leave (edits are discarded)";

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("unknown command '{0}' (type 'help')")]
    UnknownCommand(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid number for {field}: '{value}'")]
    InvalidNumber { field: String, value: String },

    #[error("unknown field '{0}'")]
    UnknownField(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Add(PlayerRecord),
    Update { name: String, patch: PlayerUpdate },
    Delete(String),
    List(Option<ValueLabel>),
    Show(String),
    Ask(String),
    Simulate { name: String, salary: f64 },
    History,
    ClearHistory,
    Cutoffs,
    Help,
    Quit,
    Blank,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a number the way a person types it: "$1,200,000" and "1_200_000"
/// are both fine; anything else is an error.
fn parse_amount(field: &str, value: &str) -> Result<f64, SessionError> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '_'))
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SessionError::InvalidNumber {
            field: field.to_string(),
            value: value.trim().to_string(),
        })
}

fn parse_add(rest: &str) -> Result<SessionCommand, SessionError> {
    const USAGE: &str = "add <name>, <team>, <salary>, <pts>, <reb>, <ast>";
    let parts: Vec<&str> = rest.split(',').map(str::trim).collect();
    // Salaries written with thousands separators split into extra parts, so
    // read the numeric tail from the right.
    if parts.len() < 6 {
        return Err(SessionError::Usage(USAGE));
    }
    let (head, stats) = parts.split_at(parts.len() - 3);
    let name = head[0];
    let team = head[1];
    let salary = head[2..].concat();
    if name.is_empty() {
        return Err(SessionError::Usage(USAGE));
    }
    Ok(SessionCommand::Add(PlayerRecord::new(
        name,
        team,
        parse_amount("salary", &salary)?,
        parse_amount("pts", stats[0])?,
        parse_amount("reb", stats[1])?,
        parse_amount("ast", stats[2])?,
    )))
}

fn apply_assignment(patch: &mut PlayerUpdate, field: &str, value: &str) -> Result<(), SessionError> {
    let number = |f: &str| parse_amount(f, value).map(Some);
    match field.to_ascii_lowercase().as_str() {
        "name" => patch.name = Some(value.replace('_', " ")),
        "team" => patch.team = Some(value.to_string()),
        "pos" | "position" => patch.position = Some(value.to_string()),
        "salary" => patch.salary = number("salary")?,
        "pts" | "points" => patch.points = number("pts")?,
        "reb" | "rebounds" => patch.rebounds = number("reb")?,
        "ast" | "assists" => patch.assists = number("ast")?,
        "fgp" | "fg_pct" => patch.fg_pct = number("fgp")?,
        "tpp" | "three_pct" => patch.three_pct = number("tpp")?,
        "ftp" | "ft_pct" => patch.ft_pct = number("ftp")?,
        "gp" | "games" => patch.games = number("gp")?,
        "min" | "minutes" => patch.minutes = number("min")?,
        other => return Err(SessionError::UnknownField(other.to_string())),
    }
    Ok(())
}

fn parse_update(rest: &str) -> Result<SessionCommand, SessionError> {
    const USAGE: &str = "update <name> field=value ...";
    let mut name_words = Vec::new();
    let mut patch = PlayerUpdate::default();
    for token in rest.split_whitespace() {
        match token.split_once('=') {
            Some((field, value)) => apply_assignment(&mut patch, field, value)?,
            None => name_words.push(token),
        }
    }
    if name_words.is_empty() || patch.is_empty() {
        return Err(SessionError::Usage(USAGE));
    }
    Ok(SessionCommand::Update {
        name: name_words.join(" "),
        patch,
    })
}

fn parse_simulate(rest: &str) -> Result<SessionCommand, SessionError> {
    const USAGE: &str = "simulate <name> <salary>";
    let Some((name, salary)) = rest.trim().rsplit_once(char::is_whitespace) else {
        return Err(SessionError::Usage(USAGE));
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(SessionError::Usage(USAGE));
    }
    Ok(SessionCommand::Simulate {
        name: name.to_string(),
        salary: parse_amount("salary", salary)?,
    })
}

fn required(rest: &str, usage: &'static str) -> Result<String, SessionError> {
    let rest = rest.trim();
    if rest.is_empty() {
        Err(SessionError::Usage(usage))
    } else {
        Ok(rest.to_string())
    }
}

/// Parse one input line into a command.
pub fn parse_command(line: &str) -> Result<SessionCommand, SessionError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(SessionCommand::Blank);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    match word.to_ascii_lowercase().as_str() {
        "add" => parse_add(rest),
        "update" | "edit" => parse_update(rest),
        "delete" | "remove" | "rm" => Ok(SessionCommand::Delete(required(rest, "delete <name>")?)),
        "list" | "ls" => {
            let rest = rest.trim();
            if rest.is_empty() {
                Ok(SessionCommand::List(None))
            } else {
                rest.parse::<ValueLabel>()
                    .map(|label| SessionCommand::List(Some(label)))
                    .map_err(|_| SessionError::Usage("list [underpaid|fair|overpaid]"))
            }
        }
        "show" => Ok(SessionCommand::Show(required(rest, "show <name>")?)),
        "ask" => Ok(SessionCommand::Ask(required(rest, "ask <question>")?)),
        "simulate" | "sim" => parse_simulate(rest),
        "history" => Ok(SessionCommand::History),
        "clear" => Ok(SessionCommand::ClearHistory),
        "cutoffs" => Ok(SessionCommand::Cutoffs),
        "help" | "?" => Ok(SessionCommand::Help),
        "quit" | "exit" | "q" => Ok(SessionCommand::Quit),
        other => Err(SessionError::UnknownCommand(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

pub struct Session {
    table: PlayerTable,
    history: QueryHistory,
    query_config: QueryConfig,
    use_colors: bool,
}

impl Session {
    pub fn new(table: PlayerTable, query_config: QueryConfig, use_colors: bool) -> Self {
        Session {
            table,
            history: QueryHistory::new(),
            query_config,
            use_colors,
        }
    }

    pub fn table(&self) -> &PlayerTable {
        &self.table
    }

    pub fn history(&self) -> &QueryHistory {
        &self.history
    }

    /// Execute one command and return the text to print. `None` means quit.
    pub fn execute(&mut self, command: SessionCommand) -> anyhow::Result<Option<String>> {
        let colors = self.use_colors;
        let text = match command {
            SessionCommand::Blank => String::new(),
            SessionCommand::Quit => return Ok(None),
            SessionCommand::Help => HELP.to_string(),

            SessionCommand::Add(record) => {
                let id = self.table.insert(record)?;
                let row = self.table.get(id).map(|r| vec![r]).unwrap_or_default();
                format!("Added {id}.\n{}", output::format_player_table(&row, colors))
            }

            SessionCommand::Update { name, patch } => {
                let id = self.table.find_by_name(&name)?;
                let row = self.table.update(id, patch)?;
                format!("Updated {id}.\n{}", output::format_player_table(&[row], colors))
            }

            SessionCommand::Delete(name) => {
                let id = self.table.find_by_name(&name)?;
                let removed = self.table.remove(id)?;
                format!("Deleted {id} {}. {} players left.", removed.name, self.table.len())
            }

            SessionCommand::List(label) => {
                let rows: Vec<_> = self
                    .table
                    .scored()
                    .rows
                    .iter()
                    .filter(|r| label.is_none_or(|l| r.value_label == l))
                    .collect();
                output::format_player_table(&rows, colors)
            }

            SessionCommand::Show(name) => {
                let id = self.table.find_by_name(&name)?;
                match player_profile(&self.table, id) {
                    Some(profile) => output::format_profile(&profile, colors),
                    None => format!("No player {id}."),
                }
            }

            SessionCommand::Ask(question) => {
                let outcome = self.history.ask(&self.table, &question, &self.query_config)?;
                output::format_query_outcome(&outcome, colors)
            }

            SessionCommand::Simulate { name, salary } => {
                let id = self.table.find_by_name(&name)?;
                let sim = self.table.simulate_salary(id, salary)?;
                output::format_simulation(&sim, colors)
            }

            SessionCommand::History => output::format_history(self.history.entries()),
            SessionCommand::ClearHistory => {
                let cleared = self.history.len();
                self.history.clear();
                info!("Cleared {} history entries", cleared);
                format!("Cleared {cleared} questions from history.")
            }
            SessionCommand::Cutoffs => output::format_cutoffs(self.table.cutoffs()),
        };
        Ok(Some(text))
    }

    /// Read commands from `input` until quit or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> anyhow::Result<()> {
        info!("Session started with {} players", self.table.len());
        writeln!(out, "{} players loaded. Type 'help' for commands.", self.table.len())?;

        for line in input.lines() {
            let line = line?;
            debug!("session input: {}", line);
            let result = parse_command(&line)
                .map_err(anyhow::Error::from)
                .and_then(|command| self.execute(command));
            match result {
                Ok(Some(text)) if text.is_empty() => {}
                Ok(Some(text)) => writeln!(out, "{text}")?,
                Ok(None) => break,
                Err(e) => writeln!(out, "error: {e}")?,
            }
        }

        info!("Session ended");
        writeln!(out, "Session ended; edits were not saved.")?;
        Ok(())
    }
}
