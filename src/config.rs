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
use std::path::PathBuf;

use anyhow::{anyhow, Context as _};
use chrono::{NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::schedule::default_rotation_anchor;

/// Whether a record graded exactly 0 counts toward a member's outstanding
/// penalty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ZeroScorePolicy {
    /// Every record counts.
    Include,
    /// Records with score 0 never count.
    Exclude,
    /// Score-0 records only count when they are an infraction (`absent` or
    /// `fail`). Pending and present placeholders are skipped.
    #[default]
    ExcludePlaceholders,
}

/// The adjustable constants of the penalty rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PenaltyRules {
    pub first_absence_days: i32,
    pub repeat_absence_days: i32,
    pub first_fail_days: i32,
    pub fail_increment_days: i32,
    /// Graded scores below this read as a fail.
    pub pass_score: u8,
    /// Scores below this add `low_score_bonus_days` to a fail.
    pub low_score_threshold: u8,
    pub low_score_bonus_days: i32,
    pub special_day_bonus_days: i32,
    pub substitution_penalty_days: i32,
    pub compensation_score: u8,
    pub zero_score_policy: ZeroScorePolicy,
}

impl Default for PenaltyRules {
    fn default() -> Self {
        Self {
            first_absence_days: 2,
            repeat_absence_days: 3,
            first_fail_days: 1,
            fail_increment_days: 2,
            pass_score: 6,
            low_score_threshold: 3,
            low_score_bonus_days: 1,
            special_day_bonus_days: 1,
            substitution_penalty_days: 2,
            compensation_score: 8,
            zero_score_policy: ZeroScorePolicy::default(),
        }
    }
}

const DEFAULT_DATA_PATH: &str = "roster-data.json";
const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Shanghai;

#[derive(Clone, Debug)]
pub struct Settings {
    pub data_path: PathBuf,
    pub roster_path: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
    pub timezone: Tz,
    pub rotation_anchor: NaiveDate,
    pub reminder_time: NaiveTime,
}

impl Settings {
    /// Reads every `ROSTER_*` variable, falling back to defaults for the ones
    /// that are unset. Values that are set but malformed are an error.
    pub fn from_env() -> anyhow::Result<Self> {
        let data_path = optional_var("ROSTER_DATA_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        let roster_path = optional_var("ROSTER_ROSTER_PATH").map(PathBuf::from);
        let rules_path = optional_var("ROSTER_RULES_PATH").map(PathBuf::from);

        let timezone = match optional_var("ROSTER_TIMEZONE") {
            Some(name) => name
                .parse::<Tz>()
                .map_err(|e| anyhow!("Failed to parse ROSTER_TIMEZONE {name:?}: {e}"))?,
            None => DEFAULT_TIMEZONE,
        };

        let rotation_anchor = match optional_var("ROSTER_ROTATION_ANCHOR") {
            Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d")
                .context("Failed to parse ROSTER_ROTATION_ANCHOR")?,
            None => default_rotation_anchor(),
        };

        let reminder_time = match optional_var("ROSTER_REMINDER_TIME") {
            Some(value) => NaiveTime::parse_from_str(&value, "%H:%M")
                .context("Failed to parse ROSTER_REMINDER_TIME")?,
            None => NaiveTime::from_hms_opt(7, 30, 0).context("Invalid default reminder time")?,
        };

        Ok(Self {
            data_path,
            roster_path,
            rules_path,
            timezone,
            rotation_anchor,
            reminder_time,
        })
    }

    pub fn today(&self) -> NaiveDate {
        today_in(self.timezone)
    }
}

pub fn today_in(timezone: Tz) -> NaiveDate {
    Utc::now().with_timezone(&timezone).date_naive()
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
