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
use std::sync::Arc;

use anyhow::Context as _;
use async_trait::async_trait;
use chrono::NaiveTime;
use chrono_tz::Tz;
use duty_roster::report::format_reminder;
use duty_roster::{store, DutyService, Settings};
use tracing::{info, trace, warn};

use super::Task;
use crate::utils::time::time_until;

/// Announces the day's duty every morning at the configured reminder time.
pub struct DutyReminder {
    timezone: Tz,
    at: NaiveTime,
}

impl DutyReminder {
    pub fn new(settings: &Settings) -> Self {
        Self {
            timezone: settings.timezone,
            at: settings.reminder_time,
        }
    }
}

#[async_trait]
impl Task for DutyReminder {
    fn name(&self) -> &str {
        "Duty Reminder"
    }

    fn run_in(&self) -> tokio::time::Duration {
        time_until(self.timezone, self.at)
    }

    async fn run(&self, settings: Arc<Settings>) -> anyhow::Result<()> {
        send_duty_reminder(&settings)
    }
}

pub fn send_duty_reminder(settings: &Settings) -> anyhow::Result<()> {
    trace!("Starting duty reminder");
    let service = load_service(settings).context("Failed to load roster state")?;

    let resolution = service.resolve_schedule(settings.today());
    for warning in &resolution.warnings {
        warn!("Reminder resolution warning: {:?}", warning);
    }
    if resolution.on_duty.is_empty() {
        info!("Nobody is on duty on {}", resolution.date);
        return Ok(());
    }

    let reminder = format_reminder(&resolution, |member_id| {
        service.outstanding_penalty(member_id).max(0)
    });
    info!("{}", reminder);
    Ok(())
}

pub fn load_service(settings: &Settings) -> anyhow::Result<DutyService> {
    let roster = store::load_roster(settings.roster_path.as_deref())?;
    let rules = store::load_rules(settings.rules_path.as_deref())?;
    let ledger = store::load_snapshot(&settings.data_path)?;
    Ok(DutyService::from_settings(settings, roster, rules, ledger))
}
