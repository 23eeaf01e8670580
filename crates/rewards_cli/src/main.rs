//! `rewards` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, resolve config and open the local store.
//! - Drive one board session per invocation and print its sections.
//!
//! # Invariants
//! - Store and config failures go to stderr with a non-zero exit code.
//! - A duplicate completion is an expected outcome, not a failure.

mod render;

use chrono::Utc;
use clap::{Parser, Subcommand};
use rewards_core::db::open_db;
use rewards_core::{
    default_config_path, default_log_level, init_logging, BoardConfig, CompletionOutcome, NewTask,
    RetrievalError, RewardsConfig, SqliteBoard, SqliteTaskCatalogRepository, TaskId,
};
use rusqlite::Connection;
use serde_json::Value;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "rewards")]
#[command(about = "Track daily tasks, reward points and goals", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (TOML); defaults to the platform config dir
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// SQLite database path; overrides config and REWARDS_DB
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Acting user id; overrides config
    #[arg(short, long, global = true)]
    user: Option<String>,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the task catalog
    Tasks,
    /// Mark a task as completed for today
    Complete {
        /// Task id
        id: TaskId,
    },
    /// Show completion history, newest first
    History,
    /// Show the current points total
    Total,
    /// Show progress toward each goal
    Goals,
    /// Show total, goals, tasks and history
    Status,
    /// Add a task to the catalog
    AddTask {
        /// Task name
        name: String,
        /// Points awarded per completion
        #[arg(short, long)]
        points: u32,
        /// Category label
        #[arg(short = 'C', long, default_value = "")]
        category: String,
        /// Recurrence label, e.g. daily
        #[arg(short, long, default_value = "")]
        recurrence: String,
        /// Free-form description
        #[arg(short, long)]
        description: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = match cli.config.as_deref() {
        // An explicit path must exist.
        Some(path) => RewardsConfig::load(path)?,
        None => RewardsConfig::load_or_default(default_config_path().as_deref())?,
    };

    if let Some(log_dir) = &config.log_dir {
        let level = config.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir)?;
    }

    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path());
    let conn = open_db(&db_path)?;

    let mut board_config = config.board_config();
    if let Some(user) = cli.user.as_deref().map(str::trim) {
        if user.is_empty() {
            return Err("--user must not be blank".into());
        }
        board_config.user_id = user.to_string();
    }

    let json = cli.json;
    match cli.command.unwrap_or(Commands::Status) {
        Commands::AddTask {
            name,
            points,
            category,
            recurrence,
            description,
        } => {
            let mut new_task = NewTask::new(name, points)
                .with_category(category)
                .with_recurrence(recurrence);
            if let Some(description) = description {
                new_task = new_task.with_description(description);
            }
            cmd_add_task(&conn, &new_task, json)
        }
        Commands::Tasks => cmd_tasks(&load_board(&conn, board_config)?, json),
        Commands::Complete { id } => cmd_complete(&mut load_board(&conn, board_config)?, id, json),
        Commands::History => cmd_history(&load_board(&conn, board_config)?, json),
        Commands::Total => cmd_total(&load_board(&conn, board_config)?, json),
        Commands::Goals => cmd_goals(&load_board(&conn, board_config)?, json),
        Commands::Status => cmd_status(&load_board(&conn, board_config)?, json),
    }
}

fn load_board(conn: &Connection, config: BoardConfig) -> CliResult<SqliteBoard<'_>> {
    let mut board = SqliteBoard::from_connection(conn, config)?;
    board.load();
    Ok(board)
}

fn cmd_add_task(conn: &Connection, new_task: &NewTask, json: bool) -> CliResult<()> {
    let task = SqliteTaskCatalogRepository::try_new(conn)?.insert_task(new_task)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    } else {
        println!("Added [{}] {} — {} pts", task.id, task.name, task.points);
    }
    Ok(())
}

fn cmd_tasks(board: &SqliteBoard<'_>, json: bool) -> CliResult<()> {
    print_warnings(board);
    if json {
        let tasks = board.tasks().map(|section| &section.data);
        return print_json(with_warnings(
            serde_json::json!({ "tasks": tasks }),
            &board.warnings(),
        ));
    }
    print_lines(render::task_lines(board.tasks()));
    Ok(())
}

fn cmd_complete(board: &mut SqliteBoard<'_>, id: TaskId, json: bool) -> CliResult<()> {
    let outcome = board.complete_task(id, Utc::now())?;
    let points = match &outcome {
        CompletionOutcome::Recorded(event) => board
            .history()
            .data
            .iter()
            .find(|record| record.event.id == event.id)
            .and_then(|record| record.task_points),
        CompletionOutcome::Duplicate(_) => None,
    };

    print_warnings(board);
    if json {
        return print_json(with_warnings(
            serde_json::json!({
                "recorded": outcome.is_recorded(),
                "task_id": id,
                "points": points,
                "total": board.total(),
            }),
            &board.warnings(),
        ));
    }
    println!("{}", render::outcome_line(&outcome, points));
    println!("{}", render::total_line(board.total(), board.total_source()));
    Ok(())
}

fn cmd_history(board: &SqliteBoard<'_>, json: bool) -> CliResult<()> {
    print_warnings(board);
    if json {
        return print_json(with_warnings(
            serde_json::json!({ "history": board.history().data }),
            &board.warnings(),
        ));
    }
    print_lines(render::history_lines(&board.history().data));
    Ok(())
}

fn cmd_total(board: &SqliteBoard<'_>, json: bool) -> CliResult<()> {
    print_warnings(board);
    if json {
        return print_json(with_warnings(
            serde_json::json!({
                "user_id": board.user_id(),
                "total": board.total(),
                "source": board.total_source(),
            }),
            &board.warnings(),
        ));
    }
    println!("{}", render::total_line(board.total(), board.total_source()));
    Ok(())
}

fn cmd_goals(board: &SqliteBoard<'_>, json: bool) -> CliResult<()> {
    print_warnings(board);
    if json {
        return print_json(with_warnings(
            serde_json::json!({ "goals": board.snapshot().goals }),
            &board.warnings(),
        ));
    }
    print_lines(render::goal_lines(&board.goal_progress()));
    Ok(())
}

fn cmd_status(board: &SqliteBoard<'_>, json: bool) -> CliResult<()> {
    print_warnings(board);
    if json {
        // The snapshot already lists its warnings.
        println!("{}", serde_json::to_string_pretty(&board.snapshot())?);
        return Ok(());
    }
    println!("User: {}", board.user_id());
    println!("{}", render::total_line(board.total(), board.total_source()));
    println!();
    println!("Goals");
    print_lines(render::goal_lines(&board.goal_progress()));
    println!();
    println!("Tasks");
    print_lines(render::task_lines(board.tasks()));
    println!();
    println!("History");
    print_lines(render::history_lines(&board.history().data));
    Ok(())
}

/// Warnings go to stderr so stdout stays machine-readable under `--json`.
fn print_warnings(board: &SqliteBoard<'_>) {
    for warning in board.warnings() {
        eprintln!("{}", render::warning_line(warning));
    }
}

/// Adds a `warnings` array of degraded-section messages to a JSON object.
fn with_warnings(mut payload: Value, warnings: &[&RetrievalError]) -> Value {
    if let Value::Object(map) = &mut payload {
        let messages = warnings
            .iter()
            .map(|warning| Value::String(warning.to_string()))
            .collect();
        map.insert("warnings".to_string(), Value::Array(messages));
    }
    payload
}

fn print_json(value: Value) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

#[cfg(test)]
mod tests {
    use super::{with_warnings, Cli, Commands};
    use clap::{CommandFactory, Parser};
    use rewards_core::{RepoError, RetrievalError};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from(["rewards", "complete", "3", "--user", "Ana", "--json"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.user.as_deref(), Some("Ana"));
        assert!(matches!(cli.command, Some(Commands::Complete { id: 3 })));
    }

    #[test]
    fn add_task_requires_points() {
        assert!(Cli::try_parse_from(["rewards", "add-task", "Skate"]).is_err());

        let cli = Cli::try_parse_from([
            "rewards", "add-task", "Skate", "-p", "50", "-C", "sport", "-r", "daily",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::AddTask {
                name,
                points,
                category,
                recurrence,
                description,
            }) => {
                assert_eq!(name, "Skate");
                assert_eq!(points, 50);
                assert_eq!(category, "sport");
                assert_eq!(recurrence, "daily");
                assert!(description.is_none());
            }
            _ => panic!("expected add-task"),
        }
    }

    #[test]
    fn no_subcommand_means_status() {
        let cli = Cli::try_parse_from(["rewards"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn json_payload_carries_degraded_section_warnings() {
        let offline = RetrievalError::new(
            "list_tasks",
            RepoError::Unavailable("connection refused".to_string()),
        );
        let payload = with_warnings(
            serde_json::json!({ "tasks": Vec::<String>::new() }),
            &[&offline],
        );
        assert_eq!(payload["tasks"], serde_json::json!([]));
        assert_eq!(payload["warnings"].as_array().unwrap().len(), 1);
        assert!(payload["warnings"][0]
            .as_str()
            .unwrap()
            .starts_with("list_tasks failed"));

        let clean = with_warnings(serde_json::json!({ "total": 0 }), &[]);
        assert_eq!(clean["warnings"], serde_json::json!([]));
    }
}
