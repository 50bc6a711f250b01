//! Terminal front end for the routine tracker.
//!
//! # Responsibility
//! - Collect routine input, print the ordered list, and confirm before
//!   deleting.
//! - Report save and export failures with their cause.
//! - Leave every routine rule to `routine_core`.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};
use log::info;
use routine_core::{
    default_export_file_name, error_chain, export_routines, init_logging, render_json, resolve_log_level,
    ExportFormat, JsonFileRoutineRepository, NewRoutine, RoutineItem, RoutineStore,
    StorageConfig,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

type Store = RoutineStore<JsonFileRoutineRepository>;

#[derive(Debug, Parser)]
#[command(name = "routine", version, about = "Record dated, timed daily routines")]
struct Cli {
    /// Directory holding routines.json and logs
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Record a routine
    Add(AddArgs),
    /// Show routines in schedule order
    List {
        /// Print the JSON document instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Delete a routine by id
    Remove {
        id: Uuid,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Write routines to a text or JSON file
    Export(ExportArgs),
    /// Print the routine document path
    Path,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Add(_) => "add",
            Self::List { .. } => "list",
            Self::Remove { .. } => "remove",
            Self::Export(_) => "export",
            Self::Path => "path",
        }
    }

    /// Whether the command can change the collection.
    fn mutates(&self) -> bool {
        matches!(self, Self::Add(_) | Self::Remove { .. })
    }
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Date as YYYY-MM-DD (defaults to today)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,

    /// Start time as HH:MM
    #[arg(long, value_parser = parse_time)]
    start: NaiveTime,

    /// End time as HH:MM; omit to record a single instant
    #[arg(long, value_parser = parse_time)]
    end: Option<NaiveTime>,

    /// What you did
    #[arg(required = true, num_args = 1..)]
    activity: Vec<String>,
}

#[derive(Debug, Args)]
struct ExportArgs {
    /// text or json
    #[arg(long, default_value = "text")]
    format: ExportFormat,

    /// Destination file (defaults to Routine_<timestamp>.<ext> here)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = StorageConfig::resolve(cli.data_dir.as_deref());
    let level = resolve_log_level(cli.log_level.as_deref());
    if let Err(err) = init_logging(&level, &config.log_dir()) {
        eprintln!("warning: file logging disabled: {}", error_chain(&err));
    }

    info!(
        "event=cli_command module=cli status=start command={}",
        cli.command.name()
    );
    let mutates = cli.command.mutates();
    let mut store = RoutineStore::open(JsonFileRoutineRepository::from_config(&config));
    let outcome = dispatch(&mut store, &config, cli.command);

    // Read-only commands leave an unparseable document in place for repair.
    if !mutates {
        return outcome;
    }
    if let Err(err) = store.flush() {
        if outcome.is_ok() {
            return Err(err).context("failed to save routines on exit");
        }
        eprintln!("error: failed to save routines on exit: {}", error_chain(&err));
    }
    outcome
}

fn dispatch(store: &mut Store, config: &StorageConfig, command: Command) -> Result<()> {
    match command {
        Command::Add(args) => add(store, args),
        Command::List { json } => list(store, json),
        Command::Remove { id, yes } => remove(store, id, yes),
        Command::Export(args) => export(store, args),
        Command::Path => {
            println!("{}", config.document_path().display());
            Ok(())
        }
    }
}

fn add(store: &mut Store, args: AddArgs) -> Result<()> {
    let request = NewRoutine {
        date: args.date.unwrap_or_else(|| Local::now().date_naive()),
        start_time: args.start,
        end_time: args.end,
        activity: args.activity.join(" "),
    };
    let item = store.add(&request).context("routine not added")?;
    println!("Added {}", describe(&item));
    println!("id: {}", item.id());
    Ok(())
}

fn list(store: &Store, json: bool) -> Result<()> {
    let items = store.list();
    if json {
        println!("{}", render_json(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No routines recorded yet.");
        return Ok(());
    }

    println!("{:<12}  {:<11}  {:<32}  Id", "Tanggal", "Waktu", "Kegiatan");
    for item in &items {
        println!(
            "{:<12}  {:<11}  {:<32}  {}",
            item.formatted_date(),
            item.time_range(),
            item.activity(),
            item.id()
        );
    }
    Ok(())
}

fn remove(store: &mut Store, id: Uuid, yes: bool) -> Result<()> {
    let Some(item) = store.get(id) else {
        println!("No routine with id {id}; nothing removed.");
        return Ok(());
    };

    if !yes && !confirm_delete(&item)? {
        println!("Kept {}", describe(&item));
        return Ok(());
    }

    store.remove(id).context("routine not removed")?;
    println!("Removed {}", describe(&item));
    Ok(())
}

fn export(store: &Store, args: ExportArgs) -> Result<()> {
    let path = args.output.unwrap_or_else(|| {
        PathBuf::from(default_export_file_name(
            Local::now().naive_local(),
            args.format,
        ))
    });
    let items = store.list();
    export_routines(&items, args.format, &path).context("export failed")?;
    println!("Exported {} routine(s) to {}", items.len(), path.display());
    Ok(())
}

fn confirm_delete(item: &RoutineItem) -> Result<bool> {
    print!("Delete {}? [y/N] ", describe(item));
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(is_yes(&answer))
}

fn describe(item: &RoutineItem) -> String {
    format!(
        "'{}' ({} {})",
        item.activity(),
        item.formatted_date(),
        item.time_range()
    )
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| format!("expected YYYY-MM-DD, got `{value}`"))
}

fn parse_time(value: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|_| format!("expected HH:MM (00:00-23:59), got `{value}`"))
}
