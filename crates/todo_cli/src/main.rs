//! Command-line harness over the todo core.
//!
//! # Responsibility
//! - Drive create/list/delete against a SQLite file without the mobile shell.
//! - Keep output line-oriented for quick local sanity checks.

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use todo_core::{
    init_logging, ConfirmPrompt, CoreConfig, DeleteDecision, DeleteOutcome, HydrateOutcome,
    Importance, SqliteStorage, TodoForm, TodoService,
};

#[derive(Debug, Parser)]
#[command(name = "todo", version, about = "Local todo list")]
struct Cli {
    /// Database file; defaults to `TODO_DB_PATH` or a temp-dir file.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core linkage info.
    Ping,
    /// List todos in insertion order.
    List,
    /// Create a todo.
    Add {
        name: String,
        /// `YYYY-MM-DD` or RFC 3339 timestamp.
        #[arg(long)]
        deadline: Option<String>,
        /// low | medium | high
        #[arg(long, value_parser = parse_importance)]
        importance: Option<Importance>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a todo by id.
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

/// Asks on stdin; anything but `y`/`yes` cancels.
struct StdinPrompt;

impl ConfirmPrompt for StdinPrompt {
    fn confirm_delete(&self, id: &str) -> DeleteDecision {
        print!("Delete todo {id}? [y/N] ");
        if std::io::stdout().flush().is_err() {
            return DeleteDecision::Cancelled;
        }
        let mut answer = String::new();
        match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) if matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") => {
                DeleteDecision::Confirmed
            }
            _ => DeleteDecision::Cancelled,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if let Command::Ping = cli.command {
        println!("todo_core ping={}", todo_core::ping());
        println!("todo_core version={}", todo_core::core_version());
        return Ok(());
    }

    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level.as_str(), &log_dir.to_string_lossy())
            .map_err(|err| err.to_string())?;
    }
    let db_path = cli.db.unwrap_or(config.db_path);
    let storage = SqliteStorage::open(&db_path).map_err(|err| err.to_string())?;
    let service = TodoService::new(storage);
    if let HydrateOutcome::Recovered { error } = service.start().map_err(|err| err.to_string())? {
        eprintln!("warning: saved todos unreadable, starting empty: {error}");
    }

    match cli.command {
        Command::Ping => Ok(()),
        Command::List => {
            for todo in service.todos().map_err(|err| err.to_string())? {
                let deadline = todo
                    .deadline
                    .map(|value| value.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string());
                let importance = todo.importance.map_or("-", Importance::as_str);
                println!(
                    "{}\t{}\t{}\t{}",
                    todo.id, importance, deadline, todo.todo_name
                );
            }
            Ok(())
        }
        Command::Add {
            name,
            deadline,
            importance,
            description,
        } => {
            let fields = TodoForm {
                todo_name: name,
                deadline: deadline.as_deref().map(parse_deadline).transpose()?,
                importance,
                description,
            };
            let report = service.create(&fields).map_err(|err| err.to_string())?;
            if let Err(err) = report.persistence {
                eprintln!("warning: todo not saved: {err}");
            }
            println!("{}", report.todo.id);
            Ok(())
        }
        Command::Delete { id, yes } => {
            let prompt: &dyn ConfirmPrompt = if yes {
                &DeleteDecision::Confirmed
            } else {
                &StdinPrompt
            };
            match service.delete(&id, prompt).map_err(|err| err.to_string())? {
                DeleteOutcome::Cancelled => println!("cancelled"),
                DeleteOutcome::NotFound => println!("not found: {id}"),
                DeleteOutcome::Deleted { todo, persistence } => {
                    if let Err(err) = persistence {
                        eprintln!("warning: delete not saved: {err}");
                    }
                    println!("deleted {}", todo.id);
                }
            }
            Ok(())
        }
    }
}

fn parse_importance(raw: &str) -> Result<Importance, String> {
    Importance::parse(raw).ok_or_else(|| format!("`{raw}` is not one of low|medium|high"))
}

fn parse_deadline(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|value| value.and_utc())
            .ok_or_else(|| format!("invalid deadline `{raw}`"));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|value| value.with_timezone(&Utc))
        .map_err(|err| format!("invalid deadline `{raw}`: {err}"))
}

#[cfg(test)]
mod tests {
    use super::{parse_deadline, parse_importance, Cli};
    use chrono::{TimeZone, Utc};
    use clap::Parser;

    #[test]
    fn deadline_accepts_plain_dates_and_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2030, 5, 6, 0, 0, 0).unwrap();
        assert_eq!(parse_deadline("2030-05-06").unwrap(), expected);
        assert_eq!(parse_deadline("2030-05-06T02:00:00+02:00").unwrap(), expected);
        assert!(parse_deadline("next week").is_err());
    }

    #[test]
    fn importance_flag_is_validated() {
        assert!(parse_importance("MEDIUM").is_ok());
        assert!(Cli::try_parse_from(["todo", "add", "x", "--importance", "urgent"]).is_err());
    }
}
