//! SQL data loader wizard state inspector.
//!
//! The wizard itself runs inside a host UI; this binary inspects and repairs
//! the snapshot it persists under `.sql-loader/state/`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use sql_loader::core::types::Step;
use sql_loader::exit_codes;
use sql_loader::io::config::{LoaderConfig, LoaderPaths, load_config};
use sql_loader::io::snapshot::SnapshotStore;
use sql_loader::io::store::FileStore;
use sql_loader::logging;
use sql_loader::wizard::Wizard;

#[derive(Parser)]
#[command(
    name = "sql-loader",
    version,
    about = "Inspect and manage the SQL data loader wizard snapshot"
)]
struct Cli {
    /// Project root containing `.sql-loader/`.
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Log wizard transitions and snapshot writes to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the step a new wizard session would open on.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the stored snapshot as JSON.
    Show,
    /// Delete the stored snapshot (same as "start a new flow").
    Discard,
    /// Stop tracking the submitted task, keeping the statement for editing.
    Close,
    /// Print the effective configuration as TOML.
    Config,
}

#[derive(Serialize)]
struct StatusReport<'a> {
    step: Step,
    need_verify: bool,
    task_id: Option<&'a str>,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let paths = LoaderPaths::new(&cli.root);
    let cfg = load_config(&paths.config_path)?;
    match cli.command {
        Command::Status { json } => cmd_status(&paths, &cfg, json),
        Command::Show => cmd_show(&paths, &cfg),
        Command::Discard => cmd_discard(&paths, &cfg),
        Command::Close => cmd_close(&paths, &cfg),
        Command::Config => cmd_config(&cfg),
    }
}

fn open_snapshots(paths: &LoaderPaths, cfg: &LoaderConfig) -> Result<SnapshotStore> {
    SnapshotStore::with_key(FileStore::new(&paths.state_dir), cfg.storage_key.clone())
}

fn cmd_status(paths: &LoaderPaths, cfg: &LoaderConfig, json: bool) -> Result<i32> {
    let wizard = Wizard::open(open_snapshots(paths, cfg)?)?;
    let view = wizard.view();
    if json {
        let report = StatusReport {
            step: view.step,
            need_verify: wizard.need_verify(),
            task_id: view.progress_task_id,
        };
        println!(
            "{}",
            serde_json::to_string(&report).context("serialize status")?
        );
    } else {
        match view.progress_task_id {
            Some(task_id) => println!("{} (tracking task {task_id})", view.step.as_str()),
            None => println!("{}", view.step.as_str()),
        }
    }
    Ok(match (view.step, view.progress_task_id) {
        (Step::Resume, _) => exit_codes::NEEDS_VERIFY,
        (_, Some(_)) => exit_codes::IN_PROGRESS,
        _ => exit_codes::OK,
    })
}

fn cmd_show(paths: &LoaderPaths, cfg: &LoaderConfig) -> Result<i32> {
    match open_snapshots(paths, cfg)?.load()? {
        Some(content) => println!(
            "{}",
            serde_json::to_string_pretty(&content).context("serialize snapshot")?
        ),
        None => println!("null"),
    }
    Ok(exit_codes::OK)
}

fn cmd_discard(paths: &LoaderPaths, cfg: &LoaderConfig) -> Result<i32> {
    open_snapshots(paths, cfg)?.clear()?;
    Ok(exit_codes::OK)
}

fn cmd_close(paths: &LoaderPaths, cfg: &LoaderConfig) -> Result<i32> {
    let mut wizard = Wizard::open(open_snapshots(paths, cfg)?)?;
    wizard.close_progress()?;
    Ok(exit_codes::OK)
}

fn cmd_config(cfg: &LoaderConfig) -> Result<i32> {
    print!(
        "{}",
        toml::to_string_pretty(cfg).context("serialize config")?
    );
    Ok(exit_codes::OK)
}
