/*
duty-roster: A rotating duty roster and penalty engine for classroom groups.
Copyright (C) 2024 duty-roster contributors

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/
/// This module is a simple cron equivalent. It spawns a loop for each [`tasks::Task`]
/// that needs to be completed.
mod scheduler;
/// A trait to define a job that needs to be executed regularly, for example the daily
/// duty reminder.
mod tasks;
mod utils;

use std::fs::File;
use std::sync::Arc;

use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use duty_roster::report::{format_resolution, format_statistics, format_week};
use duty_roster::Settings;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

#[derive(Parser)]
#[command(name = "duty-roster", version, about = "Rotating duty roster and penalty engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show who is on duty on a date
    Schedule {
        /// Defaults to today in the configured time zone
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show the week containing a date
    Week {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Show penalty standings and low-score warnings
    Stats {
        /// Limit the standings to one group id
        #[arg(long)]
        group: Option<String>,
    },
    /// Start the daily reminder scheduler
    Run,
}

fn setup_tracing() -> anyhow::Result<()> {
    let env = std::env::var("ROSTER_RUST_ENV").unwrap_or_else(|_| "development".to_string());
    let enable_debug_libraries = match std::env::var("ENABLE_DEBUG_LIBRARIES") {
        Ok(value) => value
            .parse()
            .context("Failed to parse ENABLE_DEBUG_LIBRARIES")?,
        Err(_) => false,
    };
    let crate_name = env!("CARGO_CRATE_NAME");

    let filter = EnvFilter::new(if env == "production" && enable_debug_libraries {
        "info".to_string()
    } else if env == "production" && !enable_debug_libraries {
        format!("{crate_name}=info")
    } else if enable_debug_libraries {
        "trace".to_string()
    } else {
        format!("{crate_name}=trace")
    });

    let log_file = File::create("duty-roster.log").context("Failed to create log file")?;

    if env != "production" {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(std::io::stdout))
            .with(fmt::layer().pretty().with_ansi(false).with_writer(log_file));

        tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_ansi(false).with_writer(log_file));

        tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    setup_tracing().context("Failed to setup tracing")?;
    let cli = Cli::parse();

    info!("Tracing initialized. Continuing main...");
    let settings = Settings::from_env().context("Failed to read settings from the ENV")?;
    let service = tasks::load_service(&settings)?;

    match cli.command {
        Command::Schedule { date } => {
            let resolution = service.resolve_schedule(date.unwrap_or_else(|| settings.today()));
            println!("{}", format_resolution(&resolution));
        }
        Command::Week { date } => {
            let week = service.resolve_week(date.unwrap_or_else(|| settings.today()));
            println!("{}", format_week(&week));
        }
        Command::Stats { group } => {
            let statistics = service
                .statistics(group.as_deref())
                .context("Failed to compute statistics")?;
            println!("{}", format_statistics(&statistics));
        }
        Command::Run => {
            info!("Starting duty-roster scheduler...");
            let handles = scheduler::run_scheduler(Arc::new(settings));
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for shutdown")?;
            warn!("Shutting down {} scheduled tasks", handles.len());
            for handle in handles {
                handle.abort();
            }
        }
    }

    Ok(())
}
