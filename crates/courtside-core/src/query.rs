// Keyword-matched question answering over the player table.
//
// Questions are lowercased and run through an ordered route table; the first
// route whose predicate matches produces the answer, so recognition and
// execution can never disagree. Each answer carries an illustrative SQL
// string describing the computation. Nothing is executed against a database.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::{DateTime, Local};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analytics::{bottom_n, mean, top_n};
use crate::config::QueryConfig;
use crate::table::PlayerTable;
use crate::valuation::efficiency::{ScoredRecord, ValueLabel};

/// Words that reject a question outright. Matched as substrings.
pub const RESTRICTED_KEYWORDS: [&str; 6] = ["drop", "delete", "truncate", "alter", "create", "insert"];

/// Reply when no route recognizes the question.
pub const ADVISORY: &str =
    "Could not match that question. Try: 'top 5 scorers', 'average salary', 'most efficient players'";

#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("question rejected for security reasons: contains restricted keyword '{keyword}'")]
    Rejected { keyword: &'static str },

    #[error("question is empty")]
    Empty,
}

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

/// Which route answered a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryRoute {
    TopScorers,
    AverageSalary,
    AveragePoints,
    HighestScoringTeam,
    HighestPaid,
    Underpaid,
    Overpaid,
    MostEfficient,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAverage {
    pub team: String,
    pub average_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryResult {
    Players { rows: Vec<ScoredRecord> },
    Scalar { name: &'static str, value: f64 },
    Team { best: Option<TeamAverage> },
}

impl QueryResult {
    /// One-line description used in the session history.
    pub fn summary(&self) -> String {
        match self {
            QueryResult::Players { rows } => match rows.len() {
                1 => "1 player".to_string(),
                n => format!("{n} players"),
            },
            QueryResult::Scalar { name, value } => format!("{name} = {value:.2}"),
            QueryResult::Team { best: Some(best) } => {
                format!("{} ({:.2} pts)", best.team, best.average_points)
            }
            QueryResult::Team { best: None } => "no teams".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryAnswer {
    pub route: QueryRoute,
    pub sql: String,
    pub result: QueryResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum QueryOutcome {
    Answered(QueryAnswer),
    Advisory { message: String },
}

// ---------------------------------------------------------------------------
// Route table
// ---------------------------------------------------------------------------

struct Request<'a> {
    table: &'a PlayerTable,
    question: &'a str,
    config: &'a QueryConfig,
}

struct Route {
    kind: QueryRoute,
    matches: fn(&str) -> bool,
    answer: fn(&Request<'_>) -> QueryAnswer,
}

static ROUTES: [Route; 8] = [
    Route {
        kind: QueryRoute::TopScorers,
        matches: |q| q.contains("top") && q.contains("scorer"),
        answer: answer_top_scorers,
    },
    Route {
        kind: QueryRoute::AverageSalary,
        matches: |q| mentions_average(q) && q.contains("salary"),
        answer: answer_average_salary,
    },
    Route {
        kind: QueryRoute::AveragePoints,
        matches: |q| mentions_average(q) && (q.contains("points") || q.contains("pts")),
        answer: answer_average_points,
    },
    Route {
        kind: QueryRoute::HighestScoringTeam,
        matches: |q| q.contains("team") && q.contains("highest"),
        answer: answer_highest_scoring_team,
    },
    Route {
        kind: QueryRoute::HighestPaid,
        matches: |q| q.contains("highest paid") || q.contains("most paid"),
        answer: answer_highest_paid,
    },
    Route {
        kind: QueryRoute::Underpaid,
        matches: |q| q.contains("underpaid"),
        answer: answer_underpaid,
    },
    Route {
        kind: QueryRoute::Overpaid,
        matches: |q| q.contains("overpaid"),
        answer: answer_overpaid,
    },
    Route {
        kind: QueryRoute::MostEfficient,
        matches: |q| q.contains("efficient") || q.contains("value"),
        answer: answer_most_efficient,
    },
];

fn mentions_average(q: &str) -> bool {
    q.contains("average") || q.contains("avg")
}

/// `N` from "top N", or the configured default.
fn requested_count(question: &str, default: usize) -> usize {
    static TOP_N: OnceLock<Option<Regex>> = OnceLock::new();
    TOP_N
        .get_or_init(|| Regex::new(r"top (\d+)").ok())
        .as_ref()
        .and_then(|re| re.captures(question))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(default)
}

fn owned(rows: Vec<&ScoredRecord>) -> Vec<ScoredRecord> {
    rows.into_iter().cloned().collect()
}

fn answer_top_scorers(req: &Request<'_>) -> QueryAnswer {
    let n = requested_count(req.question, req.config.default_top_n);
    QueryAnswer {
        route: QueryRoute::TopScorers,
        sql: format!("SELECT player_name, team_name, pts, salary_usd FROM players ORDER BY pts DESC LIMIT {n}"),
        result: QueryResult::Players {
            rows: owned(top_n(&req.table.scored().rows, n, |r| r.player.points)),
        },
    }
}

fn answer_average_salary(req: &Request<'_>) -> QueryAnswer {
    QueryAnswer {
        route: QueryRoute::AverageSalary,
        sql: "SELECT AVG(salary_usd) AS avg_salary FROM players".to_string(),
        result: QueryResult::Scalar {
            name: "avg_salary",
            value: mean(req.table.records().map(|r| r.salary)),
        },
    }
}

fn answer_average_points(req: &Request<'_>) -> QueryAnswer {
    QueryAnswer {
        route: QueryRoute::AveragePoints,
        sql: "SELECT AVG(pts) AS avg_points FROM players".to_string(),
        result: QueryResult::Scalar {
            name: "avg_points",
            value: mean(req.table.records().map(|r| r.points)),
        },
    }
}

fn answer_highest_scoring_team(req: &Request<'_>) -> QueryAnswer {
    let mut by_team: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in req.table.records() {
        by_team.entry(record.team.as_str()).or_default().push(record.points);
    }
    // First team in code order wins a tie.
    let best = by_team
        .into_iter()
        .map(|(team, points)| TeamAverage {
            team: team.to_string(),
            average_points: mean(points),
        })
        .fold(None::<TeamAverage>, |best, candidate| match best {
            Some(b) if b.average_points >= candidate.average_points => Some(b),
            _ => Some(candidate),
        });

    QueryAnswer {
        route: QueryRoute::HighestScoringTeam,
        sql: "SELECT team_name, AVG(pts) AS avg_pts FROM players GROUP BY team_name ORDER BY avg_pts DESC LIMIT 1"
            .to_string(),
        result: QueryResult::Team { best },
    }
}

fn answer_highest_paid(req: &Request<'_>) -> QueryAnswer {
    let n = requested_count(req.question, req.config.default_top_n);
    QueryAnswer {
        route: QueryRoute::HighestPaid,
        sql: format!("SELECT player_name, team_name, salary_usd FROM players ORDER BY salary_usd DESC LIMIT {n}"),
        result: QueryResult::Players {
            rows: owned(top_n(&req.table.scored().rows, n, |r| r.player.salary)),
        },
    }
}

fn labeled<'a>(req: &Request<'a>, label: ValueLabel) -> impl Iterator<Item = &'a ScoredRecord> {
    req.table
        .scored()
        .rows
        .iter()
        .filter(move |r| r.value_label == label)
}

fn answer_underpaid(req: &Request<'_>) -> QueryAnswer {
    let n = req.config.list_limit;
    QueryAnswer {
        route: QueryRoute::Underpaid,
        sql: format!(
            "SELECT player_name, team_name, salary_usd, efficiency_score FROM players \
             WHERE value_label = 'Underpaid' ORDER BY efficiency_score DESC LIMIT {n}"
        ),
        result: QueryResult::Players {
            rows: owned(top_n(labeled(req, ValueLabel::Underpaid), n, |r| r.efficiency_score)),
        },
    }
}

fn answer_overpaid(req: &Request<'_>) -> QueryAnswer {
    let n = req.config.list_limit;
    QueryAnswer {
        route: QueryRoute::Overpaid,
        sql: format!(
            "SELECT player_name, team_name, salary_usd, efficiency_score FROM players \
             WHERE value_label = 'Overpaid' ORDER BY efficiency_score ASC LIMIT {n}"
        ),
        result: QueryResult::Players {
            rows: owned(bottom_n(labeled(req, ValueLabel::Overpaid), n, |r| r.efficiency_score)),
        },
    }
}

fn answer_most_efficient(req: &Request<'_>) -> QueryAnswer {
    let n = req.config.list_limit;
    QueryAnswer {
        route: QueryRoute::MostEfficient,
        sql: format!("SELECT player_name, efficiency_score FROM players ORDER BY efficiency_score DESC LIMIT {n}"),
        result: QueryResult::Players {
            rows: owned(top_n(&req.table.scored().rows, n, |r| r.efficiency_score)),
        },
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// First restricted keyword found in the question, if any.
pub fn restricted_keyword(question: &str) -> Option<&'static str> {
    let lowered = question.to_lowercase();
    RESTRICTED_KEYWORDS.into_iter().find(|k| lowered.contains(k))
}

/// First route whose predicate accepts the lowercased question.
fn route_for(lowered: &str) -> Option<&'static Route> {
    ROUTES.iter().find(|r| (r.matches)(lowered))
}

/// Answer a natural-language question against the current table.
pub fn answer(table: &PlayerTable, question: &str, config: &QueryConfig) -> Result<QueryOutcome, QueryError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(QueryError::Empty);
    }
    if let Some(keyword) = restricted_keyword(question) {
        warn!("Rejected question containing '{}': {}", keyword, question);
        return Err(QueryError::Rejected { keyword });
    }

    let lowered = question.to_lowercase();
    let Some(route) = route_for(&lowered) else {
        debug!("No route for question: {}", question);
        return Ok(QueryOutcome::Advisory {
            message: ADVISORY.to_string(),
        });
    };

    let request = Request {
        table,
        question: &lowered,
        config,
    };
    let answer = (route.answer)(&request);
    info!("Answered {:?}: {}", route.kind, answer.result.summary());
    Ok(QueryOutcome::Answered(answer))
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub asked_at: DateTime<Local>,
    pub question: String,
    pub sql: Option<String>,
    pub summary: String,
}

/// Timestamped log of the questions asked during one session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryHistory {
    entries: Vec<HistoryEntry>,
}

impl QueryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `question` and record it, including rejections.
    pub fn ask(
        &mut self,
        table: &PlayerTable,
        question: &str,
        config: &QueryConfig,
    ) -> Result<QueryOutcome, QueryError> {
        let outcome = answer(table, question, config);
        let (sql, summary) = match &outcome {
            Ok(QueryOutcome::Answered(a)) => (Some(a.sql.clone()), a.result.summary()),
            Ok(QueryOutcome::Advisory { message }) => (None, message.clone()),
            Err(e) => (None, e.to_string()),
        };
        self.entries.push(HistoryEntry {
            asked_at: Local::now(),
            question: question.trim().to_string(),
            sql,
            summary,
        });
        outcome
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::players::PlayerRecord;

    fn table() -> PlayerTable {
        PlayerTable::from_records(
            vec![
                PlayerRecord::new("Ace", "AAA", 40_000_000.0, 30.0, 6.0, 6.0),
                PlayerRecord::new("Bench", "AAA", 2_000_000.0, 8.0, 4.0, 2.0),
                PlayerRecord::new("Center", "BBB", 20_000_000.0, 18.0, 12.0, 3.0),
                PlayerRecord::new("Dime", "BBB", 10_000_000.0, 14.0, 3.0, 10.0),
                PlayerRecord::new("Wing", "CCC", 15_000_000.0, 21.0, 5.0, 2.0),
                PlayerRecord::new("Sixth", "CCC", 6_000_000.0, 12.0, 3.0, 2.0),
            ],
            ScoringConfig::default(),
        )
    }

    fn ask(question: &str) -> Result<QueryOutcome, QueryError> {
        answer(&table(), question, &QueryConfig::default())
    }

    fn answered(question: &str) -> QueryAnswer {
        match ask(question) {
            Ok(QueryOutcome::Answered(a)) => a,
            other => panic!("expected an answer for {question:?}, got {other:?}"),
        }
    }

    fn player_names(answer: &QueryAnswer) -> Vec<String> {
        match &answer.result {
            QueryResult::Players { rows } => rows.iter().map(|r| r.player.name.clone()).collect(),
            other => panic!("expected player rows, got {other:?}"),
        }
    }

    // -- Routing --

    #[test]
    fn route_order_first_match_wins() {
        let route_of = |q: &str| route_for(&q.to_lowercase()).map(|r| r.kind);
        assert_eq!(route_of("Top 3 scorers"), Some(QueryRoute::TopScorers));
        assert_eq!(route_of("what is the average salary"), Some(QueryRoute::AverageSalary));
        assert_eq!(route_of("AVG pts?"), Some(QueryRoute::AveragePoints));
        assert_eq!(route_of("team with highest scoring"), Some(QueryRoute::HighestScoringTeam));
        assert_eq!(route_of("who is the highest paid"), Some(QueryRoute::HighestPaid));
        assert_eq!(route_of("underpaid players"), Some(QueryRoute::Underpaid));
        assert_eq!(route_of("show overpaid contracts"), Some(QueryRoute::Overpaid));
        assert_eq!(route_of("most efficient players"), Some(QueryRoute::MostEfficient));
        assert_eq!(route_of("best value"), Some(QueryRoute::MostEfficient));
        // "average" + "salary" outranks "value".
        assert_eq!(route_of("average salary value"), Some(QueryRoute::AverageSalary));
        assert_eq!(route_of("tell me a joke"), None);
    }

    #[test]
    fn top_scorers_with_count() {
        let a = answered("top 3 scorers");
        assert_eq!(player_names(&a), vec!["Ace", "Wing", "Center"]);
        assert!(a.sql.ends_with("LIMIT 3"));
    }

    #[test]
    fn top_scorers_default_count() {
        let a = answered("Who are the top scorers?");
        assert_eq!(player_names(&a).len(), 5);
        assert!(a.sql.ends_with("LIMIT 5"));
    }

    #[test]
    fn average_salary_scalar() {
        let a = answered("average salary");
        match a.result {
            QueryResult::Scalar { name, value } => {
                assert_eq!(name, "avg_salary");
                assert!((value - 15_500_000.0).abs() < 1e-6);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn average_points_scalar() {
        let a = answered("avg points per game");
        match a.result {
            QueryResult::Scalar { value, .. } => assert!((value - 17.166_666_666_666_668).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn highest_scoring_team() {
        // AAA 19.0, BBB 16.0, CCC 16.5
        let a = answered("which team has the highest points");
        match a.result {
            QueryResult::Team { best: Some(best) } => {
                assert_eq!(best.team, "AAA");
                assert!((best.average_points - 19.0).abs() < 1e-12);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn highest_paid() {
        let a = answered("most paid top 2");
        assert_eq!(player_names(&a), vec!["Ace", "Center"]);
    }

    #[test]
    fn underpaid_rows_all_underpaid() {
        let a = answered("underpaid");
        let QueryResult::Players { rows } = &a.result else {
            panic!("expected rows");
        };
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.value_label == ValueLabel::Underpaid));
        assert!(rows.windows(2).all(|w| w[0].efficiency_score >= w[1].efficiency_score));
    }

    #[test]
    fn overpaid_rows_lowest_first() {
        let a = answered("overpaid");
        let QueryResult::Players { rows } = &a.result else {
            panic!("expected rows");
        };
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|r| r.value_label == ValueLabel::Overpaid));
        assert!(rows.windows(2).all(|w| w[0].efficiency_score <= w[1].efficiency_score));
        assert_eq!(rows[0].player.name, "Ace");
    }

    #[test]
    fn most_efficient_descending() {
        let a = answered("most efficient players");
        let names = player_names(&a);
        assert_eq!(names.len(), 6);
        assert_eq!(names[0], "Bench");
    }

    // -- Guard and advisory --

    #[test]
    fn restricted_keywords_rejected() {
        for q in ["DROP TABLE players", "delete everyone", "please insert a row", "Create a team"] {
            assert!(matches!(ask(q), Err(QueryError::Rejected { .. })), "{q}");
        }
        assert_eq!(
            ask("truncate the salaries"),
            Err(QueryError::Rejected { keyword: "truncate" })
        );
    }

    #[test]
    fn restricted_check_is_substring() {
        assert_eq!(restricted_keyword("Walter's top scorers"), Some("alter"));
        assert_eq!(restricted_keyword("top scorers"), None);
    }

    #[test]
    fn unmatched_question_is_advisory() {
        assert_eq!(
            ask("what's the weather"),
            Ok(QueryOutcome::Advisory {
                message: ADVISORY.to_string()
            })
        );
    }

    #[test]
    fn empty_question_is_error() {
        assert_eq!(ask("   "), Err(QueryError::Empty));
    }

    #[test]
    fn requested_count_parsing() {
        assert_eq!(requested_count("top 12 scorers", 5), 12);
        assert_eq!(requested_count("top scorers", 5), 5);
        assert_eq!(requested_count("top 99999999999999999999999 scorers", 5), 5);
    }

    // -- History --

    #[test]
    fn history_records_every_question() {
        let table = table();
        let config = QueryConfig::default();
        let mut history = QueryHistory::new();
        assert!(history.is_empty());

        history.ask(&table, "top 2 scorers", &config).unwrap();
        history.ask(&table, "drop table", &config).unwrap_err();
        history.ask(&table, "hello", &config).unwrap();

        assert_eq!(history.len(), 3);
        let entries = history.entries();
        assert_eq!(entries[0].question, "top 2 scorers");
        assert_eq!(entries[0].summary, "2 players");
        assert!(entries[0].sql.is_some());
        assert!(entries[1].sql.is_none());
        assert!(entries[1].summary.contains("drop"));
        assert_eq!(entries[2].summary, ADVISORY);
        assert!(entries[0].asked_at <= entries[2].asked_at);

        history.clear();
        assert!(history.is_empty());
    }
}
