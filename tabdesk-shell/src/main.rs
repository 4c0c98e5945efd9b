//! Tabdesk command-line shell
//!
//! Usage:
//!   tabdesk --root ~/tabdesk tabs
//!   tabdesk quick rmb_rate 7.23
//!   tabdesk run rate_history period 30

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tabdesk_shell::quick::QuickField;
use tabdesk_shell::{App, ShellConfig};
use tabdesk_store::{Decoded, Encoding};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tabdesk")]
#[command(about = "Headless Tabdesk shell")]
struct Args {
    /// Application root; the database and config live under it
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Config file (defaults to <root>/tabdesk.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show every tab with its contents
    Tabs,
    /// Activate the first tab whose title matches
    Select { query: String },
    /// Send a command to a plugin
    Run {
        plugin: String,
        command: String,
        args: Vec<String>,
    },
    /// List registered plugins, most recently used first
    Plugins,
    /// List user tables
    Tables,
    /// Read a global value
    Get {
        key: String,
        /// Return the stored text without decoding
        #[arg(long)]
        raw: bool,
    },
    /// Write a global value (JSON when it parses, otherwise a string)
    Set {
        key: String,
        value: String,
        /// Store the text as-is
        #[arg(long)]
        raw: bool,
    },
    /// List the entries of a category
    Category { name: String },
    /// Show or save quick values
    Quick {
        field: Option<QuickField>,
        value: Option<String>,
    },
    /// Write a copy of the database
    Export { dest: PathBuf },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .compact()
        .init();

    let config = match &args.config {
        Some(path) => ShellConfig::load_from(path),
        None => ShellConfig::load(&args.root),
    };
    let mut app = App::start(&config, &args.root)?;
    let result = run(&mut app, args.command.unwrap_or(Command::Tabs), &args.root);
    let shutdown = app.shutdown();
    finish(result, shutdown)
}

/// Combines the command outcome with the shutdown outcome. A command error
/// wins; a shutdown failure is attached to it as context.
fn finish(result: Result<()>, shutdown: Result<()>) -> Result<()> {
    match (result, shutdown) {
        (Ok(()), shutdown) => shutdown,
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(shutdown_err)) => {
            Err(e.context(format!("shutdown also failed: {shutdown_err:#}")))
        }
    }
}

fn run(app: &mut App, command: Command, root: &Path) -> Result<()> {
    match command {
        Command::Tabs => {
            for tab in app.manager().tabs() {
                println!("[{}] {}", tab.id, tab.name);
                println!("  {}", tab.surface.heading);
                for line in &tab.surface.lines {
                    println!("  {line}");
                }
            }
        }
        Command::Select { query } => {
            let id = app
                .manager()
                .search_tabs(&query)
                .with_context(|| format!("no tab matches '{query}'"))?;
            let surface = app.manager_mut().select_tab(&id)?;
            println!("{}", surface.heading);
            for line in surface.lines {
                println!("{line}");
            }
        }
        Command::Run {
            plugin,
            command,
            args,
        } => {
            let reply = app.manager_mut().send_command(&plugin, &command, &args)?;
            println!("{reply}");
        }
        Command::Plugins => {
            for record in app.store().plugins().list_all()? {
                println!(
                    "{:<20} {:<10} {:<16} last used {}",
                    record.id, record.version, record.author, record.last_used
                );
            }
        }
        Command::Tables => {
            for table in app.store().tables().list_tables()? {
                let rows = app.store().count(&table, None)?;
                println!("{table:<24} {rows} rows");
            }
        }
        Command::Get { key, raw } => {
            let encoding = if raw { Encoding::Raw } else { Encoding::Structured };
            match app.store().global().lookup(&key, encoding)? {
                Some(value) => println!("{}", render(value)),
                None => println!("(not set)"),
            }
        }
        Command::Set { key, value, raw } => {
            if raw {
                app.store().global().set(&key, value.as_str(), Encoding::Raw)?;
            } else {
                let parsed =
                    serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
                app.store().global().set(&key, &parsed, Encoding::Structured)?;
            }
            info!(key = %key, "Global value saved");
        }
        Command::Category { name } => {
            for entry in app.store().dynamic().list_category(&name)? {
                println!(
                    "{:<20} {:<5} {}  ({})",
                    entry.key,
                    entry.data_type,
                    render(entry.decode()),
                    entry.updated_at
                );
            }
        }
        Command::Quick { field, value } => {
            let quick = app.quick();
            match (field, value) {
                (Some(field), Some(value)) => {
                    let today = Local::now().date_naive();
                    if !quick.save(field, &value, today)? {
                        println!("{}: blank value ignored", field.label());
                    }
                }
                (Some(field), None) => println!("{}", quick.get(field)?),
                (None, _) => {
                    for field in QuickField::ALL {
                        println!("{:<14} {}", field.label(), quick.get(field)?);
                    }
                }
            }
        }
        Command::Export { dest } => {
            let dest = if dest.is_absolute() { dest } else { root.join(dest) };
            app.store()
                .export_to(&dest)
                .with_context(|| format!("failed to export to {dest:?}"))?;
            println!("Exported to {}", dest.display());
        }
    }
    Ok(())
}

fn render(value: Decoded) -> String {
    match value {
        Decoded::Structured(Value::String(s)) => s,
        Decoded::Structured(v) => v.to_string(),
        Decoded::Raw(s) => s,
        Decoded::Fallback(s) => format!("{s} (undecodable)"),
    }
}
