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

use duty_roster::Settings;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::tasks::{get_tasks, Task};

/// Spawns one sleep-then-run loop per [`Task`].
pub fn run_scheduler(settings: Arc<Settings>) -> Vec<JoinHandle<()>> {
    let tasks = get_tasks(&settings);

    tasks
        .into_iter()
        .map(|task| tokio::spawn(schedule_task(settings.clone(), task)))
        .collect()
}

async fn schedule_task(settings: Arc<Settings>, task: Box<dyn Task>) {
    loop {
        let next_run_in = task.run_in();
        debug!("Next run of {} in {:?}", task.name(), next_run_in);
        tokio::time::sleep(next_run_in).await;

        if let Err(e) = task.run(settings.clone()).await {
            error!("Could not run task {}, error {}", task.name(), e);
        }
    }
}
