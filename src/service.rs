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
use chrono::NaiveDate;
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::bulk::{self, BulkOutcome};
use crate::config::{today_in, PenaltyRules, Settings};
use crate::error::RosterError;
use crate::ledger::Ledger;
use crate::models::{AttendanceRecord, AttendanceStatus, AttendanceUpdate, GroupId, MemberId};
use crate::penalty::{calculate_penalty_days, derive_status};
use crate::roster::Roster;
use crate::schedule::{resolve_schedule, resolve_week, Rotation, ScheduleResolution};
use crate::statistics::{roster_statistics, MemberStatistics};
use crate::substitution;

/// The roster, its rules and the ledger they act on. Every mutation either
/// completes or returns a [`RosterError`] with the ledger untouched.
#[derive(Clone, Debug)]
pub struct DutyService {
    roster: Roster,
    rotation: Rotation,
    rules: PenaltyRules,
    ledger: Ledger,
    timezone: Tz,
}

impl DutyService {
    pub fn new(
        roster: Roster,
        rotation: Rotation,
        rules: PenaltyRules,
        ledger: Ledger,
        timezone: Tz,
    ) -> Self {
        Self {
            roster,
            rotation,
            rules,
            ledger,
            timezone,
        }
    }

    pub fn from_settings(
        settings: &Settings,
        roster: Roster,
        rules: PenaltyRules,
        ledger: Ledger,
    ) -> Self {
        Self::new(
            roster,
            Rotation::new(settings.rotation_anchor),
            rules,
            ledger,
            settings.timezone,
        )
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn rules(&self) -> &PenaltyRules {
        &self.rules
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn into_ledger(self) -> Ledger {
        self.ledger
    }

    pub fn today(&self) -> NaiveDate {
        today_in(self.timezone)
    }

    pub fn resolve_schedule(&self, date: NaiveDate) -> ScheduleResolution {
        resolve_schedule(
            &self.roster,
            &self.rotation,
            self.ledger.schedule_overrides(),
            self.ledger.extra_duty(),
            date,
        )
    }

    pub fn resolve_week(&self, date: NaiveDate) -> Vec<ScheduleResolution> {
        resolve_week(
            &self.roster,
            &self.rotation,
            self.ledger.schedule_overrides(),
            self.ledger.extra_duty(),
            date,
        )
    }

    pub fn on_duty(&self, date: NaiveDate) -> Vec<MemberId> {
        self.resolve_schedule(date).member_ids()
    }

    /// The stored record, if any. A missing record reads as pending.
    pub fn attendance(&self, member_id: &str, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.ledger.get(member_id, date)
    }

    pub fn upsert_attendance(
        &mut self,
        update: AttendanceUpdate,
    ) -> Result<AttendanceRecord, RosterError> {
        self.roster.require_member(&update.member_id)?;
        Ok(self.ledger.upsert(update).clone())
    }

    /// Grades one member's day. Without an explicit status the score decides
    /// between present and fail, and an ungraded day stays pending. Penalty
    /// days come from the member's earlier history.
    pub fn grade(
        &mut self,
        member_id: &str,
        date: NaiveDate,
        status: Option<AttendanceStatus>,
        score: Option<u8>,
        comment: Option<String>,
    ) -> Result<AttendanceRecord, RosterError> {
        self.roster.require_member(member_id)?;

        let status = status.unwrap_or_else(|| match score {
            Some(score) => derive_status(&self.rules, score),
            None => AttendanceStatus::Pending,
        });
        let important_event = self
            .ledger
            .get(member_id, date)
            .is_some_and(|record| record.is_important_event);
        let penalty_days = if important_event {
            0
        } else {
            calculate_penalty_days(
                &self.rules,
                status,
                date,
                self.ledger.history(member_id, date),
                score,
                self.ledger.records(),
            )
        };

        let mut update = AttendanceUpdate::new(member_id, date)
            .status(status)
            .score(score)
            .penalty_days(penalty_days);
        if let Some(comment) = comment {
            update = update.comment(comment);
        }

        let record = self.ledger.upsert(update).clone();
        debug!(
            "Graded {} on {}: {:?} with {} penalty days",
            member_id, date, record.status, record.penalty_days
        );
        Ok(record)
    }

    pub fn apply_group_absence(&mut self, date: NaiveDate, members: &[MemberId]) -> BulkOutcome {
        bulk::apply_group_absence(&mut self.ledger, &self.rules, date, members)
    }

    pub fn apply_important_event(&mut self, date: NaiveDate, members: &[MemberId]) -> BulkOutcome {
        bulk::apply_important_event(&mut self.ledger, date, members)
    }

    pub fn reset_day(&mut self, date: NaiveDate, members: &[MemberId]) -> usize {
        bulk::reset_day(&mut self.ledger, date, members)
    }

    /// Schedules makeup duty, crediting the member as of today in the
    /// configured time zone.
    pub fn add_extra_duty(
        &mut self,
        member_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, RosterError> {
        let today = self.today();
        self.add_extra_duty_as_of(member_id, date, today)
    }

    pub fn add_extra_duty_as_of(
        &mut self,
        member_id: &str,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, RosterError> {
        bulk::add_extra_duty(&mut self.ledger, &self.roster, &self.rules, member_id, date, today)
    }

    pub fn remove_extra_duty(
        &mut self,
        member_id: &str,
        date: NaiveDate,
    ) -> Result<(), RosterError> {
        self.ledger.remove_extra_duty(member_id, date)?;
        info!("Removed extra duty for {} on {}", member_id, date);
        Ok(())
    }

    pub fn substitute(
        &mut self,
        member_id: &str,
        date: NaiveDate,
        substitute_id: &str,
        score: u8,
    ) -> Result<(), RosterError> {
        substitution::substitute(
            &mut self.ledger,
            &self.roster,
            &self.rules,
            member_id,
            date,
            substitute_id,
            score,
        )
    }

    pub fn exchange(
        &mut self,
        member_id: &str,
        date: NaiveDate,
        target_id: &str,
    ) -> Result<(), RosterError> {
        substitution::exchange(&mut self.ledger, &self.roster, member_id, date, target_id)
    }

    pub fn exchange_candidates(&self, member_id: &str) -> Vec<MemberId> {
        substitution::exchange_candidates(&self.ledger, member_id)
    }

    /// Assigns the week containing `date` to `group_id`. Returns the week's
    /// Monday.
    pub fn set_override(
        &mut self,
        date: NaiveDate,
        group_id: &str,
    ) -> Result<NaiveDate, RosterError> {
        if self.roster.group(group_id).is_none() {
            warn!("Refusing override to unknown group {}", group_id);
            return Err(RosterError::UnknownGroup(group_id.to_string()));
        }
        Ok(self.ledger.set_override(date, group_id.to_string()))
    }

    pub fn clear_override(&mut self, date: NaiveDate) -> Option<GroupId> {
        self.ledger.clear_override(date)
    }

    pub fn set_display_penalty(&mut self, member_id: &str, days: i32) -> Result<(), RosterError> {
        self.roster.require_member(member_id)?;
        self.ledger.set_display_penalty(member_id, days);
        Ok(())
    }

    pub fn clear_display_penalty(&mut self, member_id: &str) -> Option<i32> {
        self.ledger.clear_display_penalty(member_id)
    }

    pub fn outstanding_penalty(&self, member_id: &str) -> i32 {
        self.ledger
            .outstanding_penalty(member_id, self.rules.zero_score_policy)
    }

    pub fn statistics(&self, group_id: Option<&str>) -> Result<Vec<MemberStatistics>, RosterError> {
        roster_statistics(&self.roster, &self.ledger, self.rules.zero_score_policy, group_id)
    }

    /// Drops all records, overrides and assignments.
    pub fn wipe(&mut self) {
        self.ledger.wipe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn service() -> DutyService {
        DutyService::new(
            Roster::classroom(),
            Rotation::default(),
            PenaltyRules::default(),
            Ledger::new(),
            chrono_tz::Asia::Shanghai,
        )
    }

    #[test]
    fn grade_derives_status_and_escalates() {
        let mut service = service();

        let first = service
            .grade("member-2-0", date("2025-01-07"), None, Some(4), None)
            .unwrap();
        let second = service
            .grade("member-2-0", date("2025-01-08"), None, Some(2), Some("messy".into()))
            .unwrap();
        let passed = service
            .grade("member-2-0", date("2025-01-09"), None, Some(7), None)
            .unwrap();

        assert_eq!(first.status, AttendanceStatus::Fail);
        assert_eq!(first.penalty_days, 1);
        assert_eq!(second.penalty_days, 4);
        assert_eq!(second.comment, "messy");
        assert_eq!(passed.status, AttendanceStatus::Present);
        assert_eq!(passed.penalty_days, 0);
        assert_eq!(service.outstanding_penalty("member-2-0"), 5);
    }

    #[test]
    fn set_override_rejects_unknown_group() {
        let mut service = service();

        assert_eq!(
            service.set_override(date("2025-01-08"), "group-9"),
            Err(RosterError::UnknownGroup("group-9".into()))
        );
        assert!(service.ledger().schedule_overrides().is_empty());

        assert_eq!(service.set_override(date("2025-01-08"), "group-5"), Ok(date("2025-01-06")));
        assert_eq!(service.resolve_schedule(date("2025-01-09")).group.id, "group-5");
        assert_eq!(service.clear_override(date("2025-01-12")), Some("group-5".into()));
    }

    #[test]
    fn upsert_rejects_unknown_member() {
        let mut service = service();

        let result = service.upsert_attendance(
            AttendanceUpdate::new("member-0-0", date("2025-01-08")),
        );

        assert_eq!(result, Err(RosterError::UnknownMember("member-0-0".into())));
        assert!(service.ledger().records().is_empty());
    }

    #[test]
    fn wipe_drops_everything() {
        let mut service = service();
        service
            .grade("member-1-0", date("2025-01-06"), Some(AttendanceStatus::Absent), None, None)
            .unwrap();
        service.set_override(date("2025-01-13"), "group-4").unwrap();
        service.add_extra_duty_as_of("member-1-0", date("2025-01-18"), date("2025-01-14")).unwrap();

        service.wipe();

        assert_eq!(service.ledger(), &Ledger::default());
        assert_eq!(service.outstanding_penalty("member-1-0"), 0);
    }
}
