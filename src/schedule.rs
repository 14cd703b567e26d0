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
use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use tracing::{trace, warn};

use crate::models::{ExtraDutyAssignment, GroupId, MemberId, ScheduleOverrides};
use crate::roster::{Group, Member, Roster};

/// Monday of the first rotation week. The classroom schedule begins on
/// 2025-01-01, a Wednesday, so its first week starts 2024-12-30.
pub fn default_rotation_anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 30).expect("Valid rotation anchor")
}

/// Monday of the week `date` falls in. Saturdays and Sundays map back to the
/// Monday of the same week.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The base weekly rotation: week `n` after the anchor belongs to
/// `groups[n mod len]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rotation {
    anchor: NaiveDate,
}

impl Rotation {
    pub fn new(anchor: NaiveDate) -> Self {
        Self {
            anchor: week_start(anchor),
        }
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn week_index(&self, date: NaiveDate) -> i64 {
        (week_start(date) - self.anchor).num_days() / 7
    }

    pub fn base_group<'a>(&self, roster: &'a Roster, date: NaiveDate) -> &'a Group {
        roster.group_at(self.week_index(date))
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::new(default_rotation_anchor())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DutyMember {
    #[serde(flatten)]
    pub member: Member,
    #[serde(rename = "isExtra")]
    pub is_extra: bool,
}

/// Something the resolver skipped instead of failing on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum ScheduleWarning {
    UnknownOverrideGroup {
        #[serde(rename = "weekStart")]
        week_start: NaiveDate,
        #[serde(rename = "groupId")]
        group_id: GroupId,
    },
    UnknownExtraDutyMember {
        date: NaiveDate,
        #[serde(rename = "memberId")]
        member_id: MemberId,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduleResolution {
    pub date: NaiveDate,
    #[serde(rename = "weekStart")]
    pub week_start: NaiveDate,
    pub group: Group,
    #[serde(rename = "isOverride")]
    pub is_override: bool,
    #[serde(rename = "onDutyMembers")]
    pub on_duty: Vec<DutyMember>,
    pub warnings: Vec<ScheduleWarning>,
}

impl ScheduleResolution {
    pub fn member_ids(&self) -> Vec<MemberId> {
        self.on_duty
            .iter()
            .map(|duty| duty.member.id.clone())
            .collect()
    }

    pub fn is_on_duty(&self, member_id: &str) -> bool {
        self.on_duty.iter().any(|duty| duty.member.id == member_id)
    }
}

/// Resolves who is on duty on `date`.
///
/// The week's group is the override for its Monday when that names a known
/// group, otherwise the rotation group. On weekdays the group's members are
/// on duty. On weekends only an override puts a whole group on duty. Extra
/// duty for the exact date is added on top in both cases, without
/// duplicating a member already present.
pub fn resolve_schedule(
    roster: &Roster,
    rotation: &Rotation,
    overrides: &ScheduleOverrides,
    extra_duty: &[ExtraDutyAssignment],
    date: NaiveDate,
) -> ScheduleResolution {
    let monday = week_start(date);
    let mut warnings = Vec::new();

    let override_group = overrides.get(&monday).and_then(|group_id| {
        let group = roster.group(group_id);
        if group.is_none() {
            warn!(
                "Override for week {} names unknown group {}, using the rotation",
                monday, group_id
            );
            warnings.push(ScheduleWarning::UnknownOverrideGroup {
                week_start: monday,
                group_id: group_id.clone(),
            });
        }
        group
    });

    let is_override = override_group.is_some();
    let group = override_group.unwrap_or_else(|| rotation.base_group(roster, date));

    let mut on_duty = Vec::new();
    if is_override || !is_weekend(date) {
        on_duty.extend(group.members.iter().map(|member| DutyMember {
            member: member.clone(),
            is_extra: false,
        }));
    }

    let mut seen: HashSet<MemberId> = on_duty.iter().map(|duty| duty.member.id.clone()).collect();
    for assignment in extra_duty.iter().filter(|assignment| assignment.date == date) {
        let Some(member) = roster.member(&assignment.member_id) else {
            warn!(
                "Extra duty on {} names unknown member {}",
                date, assignment.member_id
            );
            warnings.push(ScheduleWarning::UnknownExtraDutyMember {
                date,
                member_id: assignment.member_id.clone(),
            });
            continue;
        };
        if seen.insert(member.id.clone()) {
            on_duty.push(DutyMember {
                member: member.clone(),
                is_extra: true,
            });
        }
    }

    trace!(
        "Resolved {} to {} with {} members on duty",
        date,
        group.id,
        on_duty.len()
    );

    ScheduleResolution {
        date,
        week_start: monday,
        group: group.clone(),
        is_override,
        on_duty,
        warnings,
    }
}

/// Resolutions for Monday through Sunday of the week containing `date`.
pub fn resolve_week(
    roster: &Roster,
    rotation: &Rotation,
    overrides: &ScheduleOverrides,
    extra_duty: &[ExtraDutyAssignment],
    date: NaiveDate,
) -> Vec<ScheduleResolution> {
    let monday = week_start(date);
    (0..7)
        .map(|offset| {
            resolve_schedule(
                roster,
                rotation,
                overrides,
                extra_duty,
                monday + Duration::days(offset),
            )
        })
        .collect()
}
