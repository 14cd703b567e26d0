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
use chrono::{Duration, NaiveDate, Weekday};
use tracing::trace;

use crate::config::PenaltyRules;
use crate::models::{clamp_score, AttendanceRecord, AttendanceStatus, AttendanceUpdate};
use crate::schedule::week_start;

/// How many earlier infractions a member has. Negative counts clamp to zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PenaltyHistory {
    pub absent_count: i32,
    pub fail_count: i32,
}

impl PenaltyHistory {
    pub fn new(absent_count: i32, fail_count: i32) -> Self {
        Self {
            absent_count,
            fail_count,
        }
    }

    /// Counts the member's absences and fails dated strictly before `date`.
    /// Important-event records are not infractions.
    pub fn before(records: &[AttendanceRecord], member_id: &str, date: NaiveDate) -> Self {
        records
            .iter()
            .filter(|record| {
                record.member_id == member_id && record.date < date && !record.is_important_event
            })
            .fold(Self::default(), |mut history, record| {
                match record.status {
                    AttendanceStatus::Absent => history.absent_count += 1,
                    AttendanceStatus::Fail => history.fail_count += 1,
                    AttendanceStatus::Present | AttendanceStatus::Pending => {}
                }
                history
            })
    }
}

/// Status a graded score reads as when no status was chosen explicitly.
pub fn derive_status(rules: &PenaltyRules, score: u8) -> AttendanceStatus {
    if clamp_score(score) < rules.pass_score {
        AttendanceStatus::Fail
    } else {
        AttendanceStatus::Present
    }
}

/// Penalty days for one attendance entry.
///
/// Absences cost `first_absence_days` the first time and
/// `repeat_absence_days` afterwards, plus the special-day bonus when `date`
/// is the week's special day. Fails escalate linearly from
/// `first_fail_days` by `fail_increment_days` and gain `low_score_bonus_days`
/// when the score is under `low_score_threshold`. Present and pending cost
/// nothing.
pub fn calculate_penalty_days(
    rules: &PenaltyRules,
    status: AttendanceStatus,
    date: NaiveDate,
    history: PenaltyHistory,
    score: Option<u8>,
    records: &[AttendanceRecord],
) -> i32 {
    let days = match status {
        AttendanceStatus::Absent => {
            let base = if history.absent_count.max(0) == 0 {
                rules.first_absence_days
            } else {
                rules.repeat_absence_days
            };
            if special_day(date, records) == date {
                base + rules.special_day_bonus_days
            } else {
                base
            }
        }
        AttendanceStatus::Fail => {
            let earlier_fails = history.fail_count.max(0);
            let base = rules.first_fail_days + rules.fail_increment_days * earlier_fails;
            match score.map(clamp_score) {
                Some(score) if score < rules.low_score_threshold => {
                    base + rules.low_score_bonus_days
                }
                _ => base,
            }
        }
        AttendanceStatus::Present | AttendanceStatus::Pending => 0,
    };

    trace!(
        "Penalty for {:?} on {} with {:?}: {} days",
        status,
        date,
        history,
        days
    );
    days.max(0)
}

/// The late-week day an absence penalty gets its extra day on: Friday of the
/// week of `date`, moved back to Thursday and then Wednesday while the
/// candidate is an important-event day. If all three are important-event
/// days it stays on Friday.
pub fn special_day(date: NaiveDate, records: &[AttendanceRecord]) -> NaiveDate {
    let monday = week_start(date);
    let day_of = |weekday: Weekday| monday + Duration::days(weekday.num_days_from_monday() as i64);

    [Weekday::Fri, Weekday::Thu, Weekday::Wed]
        .into_iter()
        .map(|weekday| day_of(weekday))
        .find(|candidate| !is_important_event_day(*candidate, records))
        .unwrap_or_else(|| day_of(Weekday::Fri))
}

pub fn is_important_event_day(date: NaiveDate, records: &[AttendanceRecord]) -> bool {
    records
        .iter()
        .any(|record| record.date == date && record.is_important_event)
}

pub fn compensation_comment(makeup_date: NaiveDate) -> String {
    format!("Makeup duty on {makeup_date}: one penalty day waived")
}

/// The record that credits one penalty day back for makeup duty on
/// `makeup_date`. It is dated `today`, the day the makeup was scheduled.
pub fn compensation_update(
    rules: &PenaltyRules,
    member_id: &str,
    today: NaiveDate,
    makeup_date: NaiveDate,
) -> AttendanceUpdate {
    AttendanceUpdate::new(member_id, today)
        .status(AttendanceStatus::Present)
        .score(Some(rules.compensation_score))
        .penalty_days(-1)
        .compensation(true)
        .comment(compensation_comment(makeup_date))
}
