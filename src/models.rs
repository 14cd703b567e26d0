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
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

pub type MemberId = String;
pub type GroupId = String;
pub type RecordId = String;

/// Week-start Monday -> group on duty for that week instead of the rotation.
pub type ScheduleOverrides = BTreeMap<NaiveDate, GroupId>;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Fail,
    #[default]
    Pending,
}

/// One member's attendance on one date. At most one record exists per
/// `(member_id, date)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: RecordId,
    #[serde(rename = "memberId")]
    pub member_id: MemberId,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: AttendanceStatus,
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(rename = "penaltyDays", default)]
    pub penalty_days: i32,
    #[serde(rename = "isGroupAbsent", default)]
    pub is_group_absent: bool,
    #[serde(rename = "isImportantEvent", default)]
    pub is_important_event: bool,
    #[serde(rename = "isSubstituted", default)]
    pub is_substituted: bool,
    #[serde(rename = "substitutedBy", default, skip_serializing_if = "Option::is_none")]
    pub substituted_by: Option<MemberId>,
    #[serde(rename = "isExchanged", default)]
    pub is_exchanged: bool,
    #[serde(rename = "exchangedWith", default, skip_serializing_if = "Option::is_none")]
    pub exchanged_with: Option<MemberId>,
    #[serde(rename = "isCompensation", default)]
    pub is_compensation: bool,
    // None means this record carries no substitution bookkeeping
    #[serde(rename = "substitutionCount", default, skip_serializing_if = "Option::is_none")]
    pub substitution_count: Option<u32>,
    #[serde(rename = "substitutedFor", default, skip_serializing_if = "Vec::is_empty")]
    pub substituted_for: Vec<MemberId>,
    #[serde(default)]
    pub comment: String,
}

impl AttendanceRecord {
    pub fn new(id: RecordId, member_id: MemberId, date: NaiveDate) -> Self {
        Self {
            id,
            member_id,
            date,
            status: AttendanceStatus::Pending,
            score: None,
            penalty_days: 0,
            is_group_absent: false,
            is_important_event: false,
            is_substituted: false,
            substituted_by: None,
            is_exchanged: false,
            exchanged_with: None,
            is_compensation: false,
            substitution_count: None,
            substituted_for: Vec::new(),
            comment: String::new(),
        }
    }

    /// Merges every field present in `update` into this record. The key and
    /// the id are never touched.
    pub fn apply(&mut self, update: AttendanceUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(score) = update.score {
            self.score = score.map(clamp_score);
        }
        if let Some(penalty_days) = update.penalty_days {
            self.penalty_days = penalty_days;
        }
        if let Some(flag) = update.is_group_absent {
            self.is_group_absent = flag;
        }
        if let Some(flag) = update.is_important_event {
            self.is_important_event = flag;
        }
        if let Some(flag) = update.is_substituted {
            self.is_substituted = flag;
        }
        if let Some(substituted_by) = update.substituted_by {
            self.substituted_by = substituted_by;
        }
        if let Some(flag) = update.is_exchanged {
            self.is_exchanged = flag;
        }
        if let Some(exchanged_with) = update.exchanged_with {
            self.exchanged_with = exchanged_with;
        }
        if let Some(flag) = update.is_compensation {
            self.is_compensation = flag;
        }
        if let Some(count) = update.substitution_count {
            self.substitution_count = Some(count);
        }
        if let Some(substituted_for) = update.substituted_for {
            self.substituted_for = substituted_for;
        }
        if let Some(comment) = update.comment {
            self.comment = comment;
        }
    }
}

pub fn clamp_score(score: u8) -> u8 {
    score.min(10)
}

/// A partial record. Fields left as `None` keep the stored value on upsert.
///
/// `score`, `substituted_by` and `exchanged_with` are double options so an
/// update can explicitly clear them (`Some(None)`, or `null` in JSON).
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AttendanceUpdate {
    #[serde(rename = "memberId")]
    pub member_id: MemberId,
    pub date: NaiveDate,
    pub status: Option<AttendanceStatus>,
    #[serde(default, deserialize_with = "present_value")]
    pub score: Option<Option<u8>>,
    #[serde(rename = "penaltyDays")]
    pub penalty_days: Option<i32>,
    #[serde(rename = "isGroupAbsent")]
    pub is_group_absent: Option<bool>,
    #[serde(rename = "isImportantEvent")]
    pub is_important_event: Option<bool>,
    #[serde(rename = "isSubstituted")]
    pub is_substituted: Option<bool>,
    #[serde(rename = "substitutedBy", default, deserialize_with = "present_value")]
    pub substituted_by: Option<Option<MemberId>>,
    #[serde(rename = "isExchanged")]
    pub is_exchanged: Option<bool>,
    #[serde(rename = "exchangedWith", default, deserialize_with = "present_value")]
    pub exchanged_with: Option<Option<MemberId>>,
    #[serde(rename = "isCompensation")]
    pub is_compensation: Option<bool>,
    #[serde(rename = "substitutionCount")]
    pub substitution_count: Option<u32>,
    #[serde(rename = "substitutedFor")]
    pub substituted_for: Option<Vec<MemberId>>,
    pub comment: Option<String>,
}

fn present_value<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl AttendanceUpdate {
    pub fn new(member_id: impl Into<MemberId>, date: NaiveDate) -> Self {
        Self {
            member_id: member_id.into(),
            date,
            status: None,
            score: None,
            penalty_days: None,
            is_group_absent: None,
            is_important_event: None,
            is_substituted: None,
            substituted_by: None,
            is_exchanged: None,
            exchanged_with: None,
            is_compensation: None,
            substitution_count: None,
            substituted_for: None,
            comment: None,
        }
    }

    pub fn status(mut self, status: AttendanceStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn score(mut self, score: Option<u8>) -> Self {
        self.score = Some(score);
        self
    }

    pub fn penalty_days(mut self, days: i32) -> Self {
        self.penalty_days = Some(days);
        self
    }

    pub fn group_absent(mut self, flag: bool) -> Self {
        self.is_group_absent = Some(flag);
        self
    }

    pub fn important_event(mut self, flag: bool) -> Self {
        self.is_important_event = Some(flag);
        self
    }

    pub fn substituted_by(mut self, substitute: Option<MemberId>) -> Self {
        self.is_substituted = Some(substitute.is_some());
        self.substituted_by = Some(substitute);
        self
    }

    pub fn exchanged_with(mut self, member: Option<MemberId>) -> Self {
        self.is_exchanged = Some(member.is_some());
        self.exchanged_with = Some(member);
        self
    }

    pub fn compensation(mut self, flag: bool) -> Self {
        self.is_compensation = Some(flag);
        self
    }

    pub fn substitution(mut self, count: u32, substituted_for: Vec<MemberId>) -> Self {
        self.substitution_count = Some(count);
        self.substituted_for = Some(substituted_for);
        self
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Puts one member on duty for one date on top of the rotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraDutyAssignment {
    #[serde(rename = "memberId")]
    pub member_id: MemberId,
    pub date: NaiveDate,
}
