use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use core_types::Environment;
use database::{ConnectionInfo, ConnectionManager, DbError, FetchMode, QueryResult, Row};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the pgconnect tool.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_tracing(cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<DbError>() {
                Some(db_error) => eprintln!("{}: {e:#}", db_error.kind()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Resolves PostgreSQL credentials for the current environment and talks to the database.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Force the environment instead of detecting it ("local" or "prod").
    #[arg(long, global = true)]
    environment: Option<Environment>,

    /// Write logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the resolved connection parameters (never the password).
    Info,
    /// Connect, run the liveness probe and report the server version.
    Check,
    /// Execute one SQL statement.
    Query(QueryArgs),
}

#[derive(Parser)]
struct QueryArgs {
    /// The statement to run, with `$1`, `$2`, ... placeholders.
    sql: String,

    /// A positional parameter as a JSON value (e.g. `42`, `'"text"'`, `null`). Repeatable.
    #[arg(long = "param")]
    params: Vec<String>,

    /// How many rows to return.
    #[arg(long, value_enum, default_value_t = Fetch::All)]
    fetch: Fetch,

    /// Roll the statement back instead of committing it.
    #[arg(long)]
    no_commit: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Fetch {
    All,
    One,
    None,
}

impl From<Fetch> for FetchMode {
    fn from(fetch: Fetch) -> Self {
        match fetch {
            Fetch::All => FetchMode::All,
            Fetch::One => FetchMode::One,
            Fetch::None => FetchMode::None,
        }
    }
}

fn init_tracing(log_file: Option<&std::path::Path>) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(Some(guard))
        }
        None => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
            Ok(None)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut manager = ConnectionManager::new(cli.environment).await?;

    match cli.command {
        Commands::Info => {
            println!("{}", info_table(&manager.get_connection_info()));
        }
        Commands::Check => handle_check(&mut manager).await?,
        Commands::Query(args) => handle_query(&mut manager, args).await?,
    }

    Ok(())
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_check(manager: &mut ConnectionManager) -> Result<()> {
    let version = manager
        .with_connection(async |m| m.execute_query("SELECT version()", &[], FetchMode::One).await)
        .await?
        .into_rows()
        .into_iter()
        .next()
        .and_then(|row| row.get("version").map(render_value))
        .unwrap_or_default();

    let info = manager.get_connection_info();
    println!(
        "Connected to {}:{}/{} as {} ({})",
        info.host, info.port, info.database, info.username, info.environment
    );
    println!("{version}");
    Ok(())
}

async fn handle_query(manager: &mut ConnectionManager, args: QueryArgs) -> Result<()> {
    let params = args
        .params
        .iter()
        .map(|raw| serde_json::from_str::<Value>(raw).with_context(|| format!("Invalid JSON parameter: {raw}")))
        .collect::<Result<Vec<_>>>()?;
    let fetch = FetchMode::from(args.fetch);
    let commit = !args.no_commit;
    let sql = args.sql.as_str();

    let result = manager
        .with_connection(async |m| {
            m.with_cursor(commit, async |cursor| {
                cursor.execute(sql, &params).await?;
                Ok(match fetch {
                    FetchMode::All => QueryResult::Rows(cursor.fetch_all()),
                    FetchMode::One => QueryResult::Row(cursor.fetch_one()),
                    FetchMode::None => QueryResult::Empty,
                })
            })
            .await
        })
        .await?;

    match result {
        QueryResult::Empty => println!("OK"),
        other => {
            let rows = other.into_rows();
            if rows.is_empty() {
                println!("(no rows)");
            } else {
                println!("{}", rows_table(&rows));
                println!("({} row{})", rows.len(), if rows.len() == 1 { "" } else { "s" });
            }
        }
    }
    Ok(())
}

// ==============================================================================
// Rendering
// ==============================================================================

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn info_table(info: &ConnectionInfo) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Parameter", "Value"]);
    table.add_row(vec![Cell::new("host"), Cell::new(&info.host)]);
    table.add_row(vec![Cell::new("port"), Cell::new(info.port)]);
    table.add_row(vec![Cell::new("database"), Cell::new(&info.database)]);
    table.add_row(vec![Cell::new("username"), Cell::new(&info.username)]);
    table.add_row(vec![Cell::new("ssl_mode"), Cell::new(info.ssl_mode)]);
    table.add_row(vec![Cell::new("environment"), Cell::new(info.environment)]);
    table.add_row(vec![Cell::new("connected"), Cell::new(info.connected)]);
    table
}

fn rows_table(rows: &[Row]) -> Table {
    let mut table = new_table();
    if let Some(first) = rows.first() {
        table.set_header(first.keys().map(Cell::new));
    }
    for row in rows {
        table.add_row(row.values().map(|value| Cell::new(render_value(value))));
    }
    table
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_render_without_json_quoting() {
        assert_eq!(render_value(&json!("plain")), "plain");
        assert_eq!(render_value(&Value::Null), "NULL");
        assert_eq!(render_value(&json!(42)), "42");
        assert_eq!(render_value(&json!({"a": 1})), "{\"a\":1}");
    }

    #[test]
    fn cli_parses_query_options() {
        let cli = Cli::try_parse_from([
            "pgconnect",
            "--environment",
            "prod",
            "query",
            "SELECT $1",
            "--param",
            "42",
            "--fetch",
            "one",
            "--no-commit",
        ])
        .unwrap();

        assert_eq!(cli.environment, Some(Environment::Production));
        match cli.command {
            Commands::Query(args) => {
                assert_eq!(args.sql, "SELECT $1");
                assert_eq!(args.params, vec!["42"]);
                assert!(matches!(args.fetch, Fetch::One));
                assert!(args.no_commit);
            }
            _ => panic!("expected the query command"),
        }
    }

    #[test]
    fn unknown_environment_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["pgconnect", "--environment", "staging", "info"]).is_err());
    }
}
