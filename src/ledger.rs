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
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ZeroScorePolicy;
use crate::error::RosterError;
use crate::models::{
    AttendanceRecord, AttendanceStatus, AttendanceUpdate, ExtraDutyAssignment, GroupId, MemberId,
    ScheduleOverrides,
};
use crate::penalty::PenaltyHistory;
use crate::schedule::week_start;

/// A member's running substitution bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubstitutionState {
    pub count: u32,
    pub substituted_for: Vec<MemberId>,
}

/// All mutable roster state: attendance records, weekly overrides, extra
/// duty and displayed-penalty overrides. This is the snapshot the
/// persistence layer stores verbatim.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    records: Vec<AttendanceRecord>,
    #[serde(rename = "scheduleOverrides", default)]
    schedule_overrides: ScheduleOverrides,
    #[serde(rename = "extraDutyMembers", default)]
    extra_duty: Vec<ExtraDutyAssignment>,
    #[serde(rename = "penaltyDisplayOverrides", default)]
    penalty_display_overrides: BTreeMap<MemberId, i32>,
    #[serde(rename = "nextRecordId", default)]
    next_record_id: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    pub fn get(&self, member_id: &str, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.records
            .iter()
            .find(|record| record.member_id == member_id && record.date == date)
    }

    /// Merges `update` into the record for its `(member, date)` key, creating
    /// the record on first save. The record id never changes once assigned.
    pub fn upsert(&mut self, update: AttendanceUpdate) -> &AttendanceRecord {
        let position = self
            .records
            .iter()
            .position(|record| record.member_id == update.member_id && record.date == update.date);

        let index = match position {
            Some(index) => index,
            None => {
                let id = self.allocate_id();
                debug!(
                    "Creating record {} for {} on {}",
                    id, update.member_id, update.date
                );
                self.records.push(AttendanceRecord::new(
                    id,
                    update.member_id.clone(),
                    update.date,
                ));
                self.records.len() - 1
            }
        };

        let record = &mut self.records[index];
        record.apply(update);
        record
    }

    fn allocate_id(&mut self) -> String {
        // Snapshots written by hand may lack the counter, so skip past any
        // id already taken.
        loop {
            self.next_record_id += 1;
            let id = format!("rec-{}", self.next_record_id);
            if !self.records.iter().any(|record| record.id == id) {
                return id;
            }
        }
    }

    pub fn records_for<'a>(
        &'a self,
        member_id: &'a str,
    ) -> impl Iterator<Item = &'a AttendanceRecord> {
        self.records
            .iter()
            .filter(move |record| record.member_id == member_id)
    }

    pub fn records_on(&self, date: NaiveDate) -> impl Iterator<Item = &AttendanceRecord> {
        self.records.iter().filter(move |record| record.date == date)
    }

    /// Deletes the records on `date` that belong to `members`. Returns how
    /// many were removed.
    pub fn remove_day(&mut self, date: NaiveDate, members: &[MemberId]) -> usize {
        let before = self.records.len();
        self.records
            .retain(|record| !(record.date == date && members.contains(&record.member_id)));
        let removed = before - self.records.len();
        info!("Removed {} records on {}", removed, date);
        removed
    }

    /// Drops every record, override and assignment.
    pub fn wipe(&mut self) {
        info!("Wiping {} records", self.records.len());
        *self = Self::default();
    }

    pub fn history(&self, member_id: &str, date: NaiveDate) -> PenaltyHistory {
        PenaltyHistory::before(&self.records, member_id, date)
    }

    /// Penalty days the member still owes.
    pub fn outstanding_penalty(&self, member_id: &str, policy: ZeroScorePolicy) -> i32 {
        self.records_for(member_id)
            .filter(|record| counts_toward_penalty(record, policy))
            .map(|record| record.penalty_days)
            .sum()
    }

    /// Members this member stood in for and has not been exchanged back
    /// with, oldest first. Derived from the substitution pairs themselves so
    /// it stays right whatever order the records were written in.
    pub fn substitution_state(&self, member_id: &str) -> SubstitutionState {
        let mut covered: Vec<&AttendanceRecord> = self
            .records
            .iter()
            .filter(|record| {
                record.is_substituted && record.substituted_by.as_deref() == Some(member_id)
            })
            .collect();
        covered.sort_by_key(|record| record.date);

        let mut substituted_for: Vec<MemberId> = covered
            .into_iter()
            .map(|record| record.member_id.clone())
            .collect();

        for record in self.records_for(member_id).filter(|record| record.is_exchanged) {
            let Some(target) = record.exchanged_with.as_deref() else {
                continue;
            };
            if let Some(position) = substituted_for.iter().position(|owed| owed == target) {
                substituted_for.remove(position);
            }
        }

        SubstitutionState {
            count: substituted_for.len() as u32,
            substituted_for,
        }
    }

    /// Whether `member_id` stands in for someone on `date`.
    pub fn stands_in_on(&self, member_id: &str, date: NaiveDate) -> bool {
        self.records_on(date).any(|record| {
            record.is_substituted && record.substituted_by.as_deref() == Some(member_id)
        })
    }

    /// Whether `member_id` is covered by, or covering for, someone on `date`.
    pub fn substitution_on(&self, member_id: &str, date: NaiveDate) -> bool {
        self.get(member_id, date)
            .is_some_and(|record| record.is_substituted)
            || self.stands_in_on(member_id, date)
    }

    pub fn schedule_overrides(&self) -> &ScheduleOverrides {
        &self.schedule_overrides
    }

    /// Stores an override for the week containing `date`. The group id is
    /// taken as given; callers check it against the roster.
    pub fn set_override(&mut self, date: NaiveDate, group_id: GroupId) -> NaiveDate {
        let monday = week_start(date);
        info!("Week of {} is now assigned to {}", monday, group_id);
        self.schedule_overrides.insert(monday, group_id);
        monday
    }

    pub fn clear_override(&mut self, date: NaiveDate) -> Option<GroupId> {
        self.schedule_overrides.remove(&week_start(date))
    }

    pub fn extra_duty(&self) -> &[ExtraDutyAssignment] {
        &self.extra_duty
    }

    pub fn has_extra_duty(&self, member_id: &str, date: NaiveDate) -> bool {
        self.extra_duty
            .iter()
            .any(|assignment| assignment.member_id == member_id && assignment.date == date)
    }

    pub fn push_extra_duty(&mut self, member_id: &str, date: NaiveDate) -> Result<(), RosterError> {
        if self.has_extra_duty(member_id, date) {
            return Err(RosterError::DuplicateExtraDuty {
                member: member_id.to_string(),
                date,
            });
        }
        self.extra_duty.push(ExtraDutyAssignment {
            member_id: member_id.to_string(),
            date,
        });
        Ok(())
    }

    pub fn remove_extra_duty(
        &mut self,
        member_id: &str,
        date: NaiveDate,
    ) -> Result<(), RosterError> {
        let position = self
            .extra_duty
            .iter()
            .position(|assignment| assignment.member_id == member_id && assignment.date == date)
            .ok_or_else(|| RosterError::MissingExtraDuty {
                member: member_id.to_string(),
                date,
            })?;
        self.extra_duty.remove(position);
        Ok(())
    }

    pub fn display_penalty_override(&self, member_id: &str) -> Option<i32> {
        self.penalty_display_overrides.get(member_id).copied()
    }

    /// Pins the penalty total shown for a member. Statistics and the
    /// outstanding sum are unaffected.
    pub fn set_display_penalty(&mut self, member_id: &str, days: i32) {
        self.penalty_display_overrides
            .insert(member_id.to_string(), days.max(0));
    }

    pub fn clear_display_penalty(&mut self, member_id: &str) -> Option<i32> {
        self.penalty_display_overrides.remove(member_id)
    }
}

/// Whether a record's penalty days are part of the outstanding sum.
pub fn counts_toward_penalty(record: &AttendanceRecord, policy: ZeroScorePolicy) -> bool {
    if record.is_important_event {
        return false;
    }
    if record.score != Some(0) {
        return true;
    }
    match policy {
        ZeroScorePolicy::Include => true,
        ZeroScorePolicy::Exclude => false,
        ZeroScorePolicy::ExcludePlaceholders => {
            matches!(record.status, AttendanceStatus::Absent | AttendanceStatus::Fail)
        }
    }
}
