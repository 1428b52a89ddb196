use std::sync::Arc;

use clap::Parser;
use owo_colors::{OwoColorize, Style};
use remind_core::api::ErrorResponse;
use remind_core::db;
use remind_core::error::CoreError;
use remind_core::geocoding::NominatimGeocoder;
use remind_core::notify::PollerError;
use remind_core::repository::SqliteRepository;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod context;
mod parser;
mod presenter;
mod views;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    let config = match config::Config::new() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} Invalid configuration: {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let tz = match config.display_tz() {
        Ok(tz) => tz,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let db_pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let geocoder = match NominatimGeocoder::new(config.geocoder_config()) {
        Ok(geocoder) => geocoder,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };

    let repository = Arc::new(SqliteRepository::with_local_locations(db_pool, Arc::new(geocoder)));
    let ctx = context::Context::new(repository, config, tz, cli.user);

    let result = match cli.command {
        cli::Commands::User(command) => commands::user::user_command(&ctx, command).await,
        cli::Commands::Add(command) => commands::add::add_reminder(&ctx, command).await,
        cli::Commands::List(command) => commands::list::list_reminders(&ctx, command).await,
        cli::Commands::Show(command) => commands::list::show_reminder(&ctx, command).await,
        cli::Commands::Edit(command) => commands::edit::edit_reminder(&ctx, command).await,
        cli::Commands::Done(command) => commands::done::complete_reminder(&ctx, command).await,
        cli::Commands::Delete(command) => commands::delete::delete_reminder(&ctx, command).await,
        cli::Commands::Recur(command) => {
            commands::recurrence::recurrence_command(&ctx, command).await
        }
        cli::Commands::Share(command) => commands::share::share_reminder(&ctx, command).await,
        cli::Commands::Unshare(command) => commands::share::unshare_reminder(&ctx, command).await,
        cli::Commands::Friend(command) => commands::friend::friend_command(&ctx, command).await,
        cli::Commands::Group(command) => commands::group::group_command(&ctx, command).await,
        cli::Commands::Calendar(command) => commands::calendar::show_calendar(&ctx, command).await,
        cli::Commands::Watch(command) => commands::watch::watch(&ctx, command).await,
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {} not found", "Error:".style(error_style), s);
            }
            CoreError::Forbidden(s) => {
                eprintln!("{} Not allowed: {}", "Error:".style(error_style), s.yellow());
            }
            CoreError::Validation(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidPattern(p) => {
                eprintln!(
                    "{} Unknown recurrence pattern '{}'. Use daily, weekly, monthly or yearly",
                    "Error:".style(error_style),
                    p.yellow()
                );
            }
            CoreError::Upstream(s) => {
                eprintln!("{} Location service unavailable: {}", "Error:".style(error_style), s);
            }
            internal => {
                let (status, body) = ErrorResponse::from_error(internal);
                eprintln!("{} {} ({})", "Error:".style(error_style), body.message, status);
            }
        }
    } else if let Some(PollerError::Disabled) = err.downcast_ref::<PollerError>() {
        eprintln!(
            "{} Notifications are disabled. Set notifications.enabled = true in remind.toml",
            "Error:".style(error_style)
        );
    } else {
        eprintln!("{} {}", "Error:".style(error_style), err);
    }
}
