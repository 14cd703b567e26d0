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
mod duty_reminder;

use std::sync::Arc;

use async_trait::async_trait;
use duty_roster::Settings;
use tokio::time::Duration;

pub use duty_reminder::{load_service, DutyReminder};

/// A [`Task`] is any job that needs to be executed on a regular basis.
/// Tasks have a function "`run_in`" that returns the time till the next
/// run of the task. The scheduler sleeps for that long before calling
/// `run`.
#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> &str;
    fn run_in(&self) -> Duration;
    async fn run(&self, settings: Arc<Settings>) -> anyhow::Result<()>;
}

/// Every task the scheduler should start.
pub fn get_tasks(settings: &Settings) -> Vec<Box<dyn Task>> {
    vec![Box::new(DutyReminder::new(settings))]
}
