//! Weekender - Conversational Weekend Itinerary Planner
//!
//! CLI entry point for generating, refining and managing saved plans.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use weekender::cli::{Cli, Command, PlansCommand};
use weekender::config::Config;
use weekender::display;
use weekender::domain::Preferences;
use weekender::planner::Planner;
use weekender::repl::ChatRepl;
use weekender::store::{LocalPlanStore, PlanStore};
use weekender::PlannerError;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("weekender")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("weekender.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Planner errors are shown with their user-facing text
fn user_error(err: PlannerError) -> eyre::Report {
    eyre::eyre!("{}", err.user_message())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    info!(provider = %config.llm.provider, model = %config.llm.model, "Weekender loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::New {
            prefs,
            save,
            email,
            chat,
        } => cmd_new(&config, &prefs, save, email, chat).await,
        Command::Chat { id, email } => cmd_chat(&config, &id, email).await,
        Command::Plans { command } => match command {
            PlansCommand::List { email } => cmd_plans_list(&config, &email).await,
            PlansCommand::Show { id, json } => cmd_plans_show(&config, &id, json).await,
            PlansCommand::Delete { id } => cmd_plans_delete(&config, &id).await,
        },
    }
}

fn open_store(config: &Config) -> Result<Arc<LocalPlanStore>> {
    let dir = &config.storage.plans_dir;
    let store = LocalPlanStore::open(dir).context(format!("Failed to open plan store at {}", dir.display()))?;
    Ok(Arc::new(store))
}

fn load_preferences(path: &Path) -> Result<Preferences> {
    let content = fs::read_to_string(path).context(format!("Failed to read preferences {}", path.display()))?;
    // YAML is a superset of JSON, so this reads both
    serde_yaml::from_str(&content).context(format!("Failed to parse preferences {}", path.display()))
}

/// Generate a new itinerary
async fn cmd_new(config: &Config, prefs_path: &Path, save: bool, email: Option<String>, chat: bool) -> Result<()> {
    debug!(?prefs_path, save, chat, "cmd_new: called");
    config.validate()?;
    let preferences = load_preferences(prefs_path)?;
    let planner = Planner::from_config(config).map_err(user_error)?;
    let store = open_store(config)?;

    println!("{}", "Crafting your weekend...".dimmed());
    let (session, plan) = planner.generate(&preferences).await.map_err(user_error)?;
    display::print_itinerary(&plan);

    let mut plan_id = None;
    if save {
        if let Some(owner) = email.as_deref() {
            let saved = store.create(owner, &plan).await.map_err(user_error)?;
            println!("{} Plan saved: {}", "✓".green(), saved.id.cyan());
            plan_id = Some(saved.id);
        }
    }

    if chat {
        ChatRepl::new(&planner, store, session, plan, plan_id, email).run().await?;
    }
    Ok(())
}

/// Chat about a saved plan
async fn cmd_chat(config: &Config, id: &str, email: Option<String>) -> Result<()> {
    debug!(%id, "cmd_chat: called");
    config.validate()?;
    let store = open_store(config)?;
    let saved = store.get(id).await.map_err(user_error)?;
    let planner = Planner::from_config(config).map_err(user_error)?;
    let session = planner.resume_saved(&saved, None).map_err(user_error)?;

    let owner = email.or_else(|| Some(saved.user_email.clone()));
    ChatRepl::new(&planner, store, session, saved.plan, Some(saved.id), owner)
        .run()
        .await
}

async fn cmd_plans_list(config: &Config, email: &str) -> Result<()> {
    debug!(%email, "cmd_plans_list: called");
    let plans = open_store(config)?.list_by_owner(email).await.map_err(user_error)?;
    if plans.is_empty() {
        println!("{}", "No saved plans.".dimmed());
        return Ok(());
    }
    for plan in &plans {
        display::print_summary(plan);
    }
    Ok(())
}

async fn cmd_plans_show(config: &Config, id: &str, json: bool) -> Result<()> {
    debug!(%id, json, "cmd_plans_show: called");
    let saved = open_store(config)?.get(id).await.map_err(user_error)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&saved)?);
    } else {
        display::print_summary(&saved);
        display::print_itinerary(&saved.plan);
    }
    Ok(())
}

async fn cmd_plans_delete(config: &Config, id: &str) -> Result<()> {
    debug!(%id, "cmd_plans_delete: called");
    open_store(config)?.delete(id).await.map_err(user_error)?;
    println!("{} Deleted plan {}", "✓".green(), id.cyan());
    Ok(())
}
