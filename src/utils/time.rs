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
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use chrono_tz::Tz;
use tokio::time::Duration;

/// How long from now until the next `at` on the wall clock of `timezone`.
pub fn time_until(timezone: Tz, at: NaiveTime) -> Duration {
    time_until_from(Utc::now().with_timezone(&timezone), at)
}

fn time_until_from(now: DateTime<Tz>, at: NaiveTime) -> Duration {
    let timezone = now.timezone();
    let mut day = now.date_naive();

    // DST gaps can erase a wall-clock time, so keep looking at later days
    loop {
        if let Some(next) = day.and_time(at).and_local_timezone(timezone).earliest() {
            if next > now {
                return (next - now).to_std().unwrap_or_default();
            }
        }
        day += ChronoDuration::days(1);
    }
}
