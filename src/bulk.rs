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
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{PenaltyRules, ZeroScorePolicy};
use crate::error::RosterError;
use crate::ledger::{counts_toward_penalty, Ledger};
use crate::models::{AttendanceRecord, AttendanceStatus, AttendanceUpdate, MemberId};
use crate::penalty::{calculate_penalty_days, compensation_comment, compensation_update};
use crate::roster::Roster;

/// What a toggling bulk action ended up doing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum BulkOutcome {
    Applied,
    Reverted,
    Unchanged,
}

/// Marks every member absent as a group, or reverts the marking when all of
/// them already carry it.
///
/// Members whose day is already settled by a substitution, either as the one
/// being covered or as the one standing in, are left as they are.
pub fn apply_group_absence(
    ledger: &mut Ledger,
    rules: &PenaltyRules,
    date: NaiveDate,
    members: &[MemberId],
) -> BulkOutcome {
    let members: Vec<MemberId> = members
        .iter()
        .filter(|member_id| {
            let covered = ledger.substitution_on(member_id, date);
            if covered {
                debug!("{} has a substitution on {}, skipping group absence", member_id, date);
            }
            !covered
        })
        .cloned()
        .collect();
    if members.is_empty() {
        return BulkOutcome::Unchanged;
    }

    let all_marked = members.iter().all(|member_id| {
        ledger
            .get(member_id, date)
            .is_some_and(|record| record.is_group_absent)
    });

    if all_marked {
        for member_id in &members {
            ledger.upsert(
                AttendanceUpdate::new(member_id.clone(), date)
                    .status(AttendanceStatus::Pending)
                    .score(None)
                    .penalty_days(0)
                    .group_absent(false),
            );
        }
        info!("Reverted group absence for {} members on {}", members.len(), date);
        return BulkOutcome::Reverted;
    }

    // Penalties are computed against the pre-action records so the order
    // members are processed in does not matter.
    let penalties: Vec<i32> = members
        .iter()
        .map(|member_id| {
            calculate_penalty_days(
                rules,
                AttendanceStatus::Absent,
                date,
                ledger.history(member_id, date),
                Some(0),
                ledger.records(),
            )
        })
        .collect();

    for (member_id, penalty_days) in members.iter().zip(penalties) {
        debug!("{} group absent on {}: {} days", member_id, date, penalty_days);
        ledger.upsert(
            AttendanceUpdate::new(member_id.clone(), date)
                .status(AttendanceStatus::Absent)
                .score(Some(0))
                .penalty_days(penalty_days)
                .group_absent(true),
        );
    }
    info!("Marked {} members group absent on {}", members.len(), date);
    BulkOutcome::Applied
}

/// Flags the day as an important event for every member, or clears the flag
/// when all of them already carry it. Either way the records are left
/// pending with score 0 and no penalty.
pub fn apply_important_event(
    ledger: &mut Ledger,
    date: NaiveDate,
    members: &[MemberId],
) -> BulkOutcome {
    if members.is_empty() {
        return BulkOutcome::Unchanged;
    }

    let all_flagged = members.iter().all(|member_id| {
        ledger
            .get(member_id, date)
            .is_some_and(|record| record.is_important_event)
    });

    for member_id in members {
        ledger.upsert(
            AttendanceUpdate::new(member_id.clone(), date)
                .status(AttendanceStatus::Pending)
                .score(Some(0))
                .penalty_days(0)
                .important_event(!all_flagged),
        );
    }

    if all_flagged {
        info!("Cleared important event on {}", date);
        BulkOutcome::Reverted
    } else {
        info!("Flagged {} as an important event", date);
        BulkOutcome::Applied
    }
}

/// Deletes the day's records for `members`.
pub fn reset_day(ledger: &mut Ledger, date: NaiveDate, members: &[MemberId]) -> usize {
    if members.is_empty() {
        return 0;
    }
    ledger.remove_day(date, members)
}

/// Puts `member_id` on duty for `date`. A member who still owes penalty days
/// gets one day credited back by a compensation record, which is returned.
///
/// The credit is dated `today`. When the member's record for today cannot
/// carry it (an important-event day, a substituted day, or a record the
/// outstanding sum skips) it goes on the makeup date instead. If neither
/// date can take it the assignment is refused.
pub fn add_extra_duty(
    ledger: &mut Ledger,
    roster: &Roster,
    rules: &PenaltyRules,
    member_id: &str,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<Option<AttendanceRecord>, RosterError> {
    roster.require_member(member_id)?;
    if ledger.has_extra_duty(member_id, date) {
        return Err(RosterError::DuplicateExtraDuty {
            member: member_id.to_string(),
            date,
        });
    }

    let outstanding = ledger.outstanding_penalty(member_id, rules.zero_score_policy);
    let slot = if outstanding > 0 {
        let day = [today, date]
            .into_iter()
            .find(|day| {
                ledger
                    .get(member_id, *day)
                    .map_or(true, |record| can_carry_credit(record, rules.zero_score_policy))
            })
            .ok_or_else(|| RosterError::NoCompensationSlot {
                member: member_id.to_string(),
                date,
            })?;
        Some(day)
    } else {
        None
    };

    ledger.push_extra_duty(member_id, date)?;
    info!("{} has extra duty on {}", member_id, date);

    let Some(day) = slot else {
        return Ok(None);
    };

    let update = match ledger.get(member_id, day) {
        Some(existing) => {
            let comment = if existing.comment.is_empty() {
                compensation_comment(date)
            } else {
                format!("{}; {}", existing.comment, compensation_comment(date))
            };
            AttendanceUpdate::new(member_id, day)
                .penalty_days(existing.penalty_days - 1)
                .compensation(true)
                .comment(comment)
        }
        None => compensation_update(rules, member_id, day, date),
    };

    let record = ledger.upsert(update).clone();
    info!(
        "{} owed {} days, credited one on {} for makeup on {}",
        member_id, outstanding, day, date
    );
    Ok(Some(record))
}

/// Whether folding a penalty credit into `record` reaches the outstanding
/// sum without disturbing its flags.
fn can_carry_credit(record: &AttendanceRecord, policy: ZeroScorePolicy) -> bool {
    !record.is_important_event && !record.is_substituted && counts_toward_penalty(record, policy)
}

/// Penalty days a member owes under `policy`, never shown below zero.
pub fn owed_days(ledger: &Ledger, member_id: &str, policy: ZeroScorePolicy) -> i32 {
    ledger.outstanding_penalty(member_id, policy).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn group_two() -> Vec<MemberId> {
        vec!["member-2-0".into(), "member-2-1".into(), "member-2-2".into()]
    }

    #[test]
    fn group_absence_toggles() {
        let mut ledger = Ledger::new();
        let rules = PenaltyRules::default();
        let tuesday = date("2025-01-07");
        ledger.upsert(
            AttendanceUpdate::new("member-2-1", date("2025-01-02"))
                .status(AttendanceStatus::Absent)
                .penalty_days(2),
        );

        let applied = apply_group_absence(&mut ledger, &rules, tuesday, &group_two());
        assert_eq!(applied, BulkOutcome::Applied);

        let first = ledger.get("member-2-0", tuesday).unwrap();
        assert_eq!(first.status, AttendanceStatus::Absent);
        assert_eq!(first.score, Some(0));
        assert!(first.is_group_absent);
        assert_eq!(first.penalty_days, 2);
        assert_eq!(ledger.get("member-2-1", tuesday).unwrap().penalty_days, 3);

        let reverted = apply_group_absence(&mut ledger, &rules, tuesday, &group_two());
        assert_eq!(reverted, BulkOutcome::Reverted);
        for member_id in group_two() {
            let record = ledger.get(&member_id, tuesday).unwrap();
            assert_eq!(record.status, AttendanceStatus::Pending);
            assert_eq!(record.penalty_days, 0);
            assert!(!record.is_group_absent);
        }
    }

    #[test]
    fn partial_group_absence_applies_to_everyone() {
        let mut ledger = Ledger::new();
        let rules = PenaltyRules::default();
        let tuesday = date("2025-01-07");
        ledger.upsert(AttendanceUpdate::new("member-2-0", tuesday).group_absent(true));

        let outcome = apply_group_absence(&mut ledger, &rules, tuesday, &group_two());

        assert_eq!(outcome, BulkOutcome::Applied);
        assert!(group_two()
            .iter()
            .all(|member_id| ledger.get(member_id, tuesday).unwrap().is_group_absent));
    }

    #[test]
    fn important_event_toggled_twice_is_pending_zero() {
        let mut ledger = Ledger::new();
        let day = date("2025-01-08");
        ledger.upsert(
            AttendanceUpdate::new("member-2-0", day)
                .status(AttendanceStatus::Fail)
                .score(Some(4))
                .penalty_days(1),
        );

        assert_eq!(apply_important_event(&mut ledger, day, &group_two()), BulkOutcome::Applied);
        assert!(ledger.get("member-2-0", day).unwrap().is_important_event);
        assert_eq!(apply_important_event(&mut ledger, day, &group_two()), BulkOutcome::Reverted);

        let record = ledger.get("member-2-0", day).unwrap();
        assert!(!record.is_important_event);
        assert_eq!(record.status, AttendanceStatus::Pending);
        assert_eq!(record.score, Some(0));
        assert_eq!(record.penalty_days, 0);
    }

    #[test]
    fn empty_member_set_is_a_no_op() {
        let mut ledger = Ledger::new();
        let rules = PenaltyRules::default();
        let day = date("2025-01-08");

        assert_eq!(apply_group_absence(&mut ledger, &rules, day, &[]), BulkOutcome::Unchanged);
        assert_eq!(apply_important_event(&mut ledger, day, &[]), BulkOutcome::Unchanged);
        assert_eq!(reset_day(&mut ledger, day, &[]), 0);
        assert!(ledger.records().is_empty());
    }

    #[test]
    fn reset_day_only_touches_listed_members_on_that_date() {
        let mut ledger = Ledger::new();
        let day = date("2025-01-08");
        ledger.upsert(AttendanceUpdate::new("member-2-0", day).comment("a"));
        ledger.upsert(AttendanceUpdate::new("member-2-1", day).comment("b"));
        ledger.upsert(AttendanceUpdate::new("member-6-0", day).comment("c"));
        ledger.upsert(AttendanceUpdate::new("member-2-0", date("2025-01-09")).comment("d"));

        assert_eq!(reset_day(&mut ledger, day, &group_two()), 2);
        assert_eq!(ledger.records().len(), 2);
        assert!(ledger.get("member-6-0", day).is_some());
    }

    #[test]
    fn extra_duty_for_owing_member_credits_one_day() {
        let mut ledger = Ledger::new();
        let roster = Roster::classroom();
        let rules = PenaltyRules::default();
        ledger.upsert(
            AttendanceUpdate::new("member-4-1", date("2025-01-20"))
                .status(AttendanceStatus::Absent)
                .penalty_days(3),
        );
        let today = date("2025-01-22");

        let record = add_extra_duty(
            &mut ledger,
            &roster,
            &rules,
            "member-4-1",
            date("2025-01-25"),
            today,
        )
        .unwrap()
        .unwrap();

        assert_eq!(record.date, today);
        assert_eq!(record.penalty_days, -1);
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.score, Some(8));
        assert!(record.is_compensation);
        assert!(record.comment.contains("2025-01-25"));
        assert_eq!(ledger.outstanding_penalty("member-4-1", rules.zero_score_policy), 2);
        assert!(ledger.has_extra_duty("member-4-1", date("2025-01-25")));
    }

    #[test]
    fn second_makeup_on_same_day_folds_into_one_record() {
        let mut ledger = Ledger::new();
        let roster = Roster::classroom();
        let rules = PenaltyRules::default();
        ledger.upsert(
            AttendanceUpdate::new("member-4-1", date("2025-01-20"))
                .status(AttendanceStatus::Absent)
                .penalty_days(3),
        );
        let today = date("2025-01-22");

        add_extra_duty(
            &mut ledger,
            &roster,
            &rules,
            "member-4-1",
            date("2025-01-25"),
            today,
        )
        .unwrap();
        add_extra_duty(
            &mut ledger,
            &roster,
            &rules,
            "member-4-1",
            date("2025-01-26"),
            today,
        )
        .unwrap();

        let record = ledger.get("member-4-1", today).unwrap();
        assert_eq!(record.penalty_days, -2);
        assert!(record.comment.contains("2025-01-25"));
        assert!(record.comment.contains("2025-01-26"));
        assert_eq!(ledger.outstanding_penalty("member-4-1", rules.zero_score_policy), 1);
    }

    #[test]
    fn extra_duty_without_debt_writes_no_record() {
        let mut ledger = Ledger::new();
        let roster = Roster::classroom();
        let rules = PenaltyRules::default();

        let result = add_extra_duty(
            &mut ledger,
            &roster,
            &rules,
            "member-4-1",
            date("2025-01-25"),
            date("2025-01-22"),
        );

        assert_eq!(result, Ok(None));
        assert!(ledger.records().is_empty());
        assert_eq!(ledger.extra_duty().len(), 1);
    }

    #[test]
    fn duplicate_extra_duty_is_rejected_without_credit() {
        let mut ledger = Ledger::new();
        let roster = Roster::classroom();
        let rules = PenaltyRules::default();
        ledger.upsert(
            AttendanceUpdate::new("member-4-1", date("2025-01-20"))
                .status(AttendanceStatus::Absent)
                .penalty_days(3),
        );
        let today = date("2025-01-22");
        add_extra_duty(
            &mut ledger,
            &roster,
            &rules,
            "member-4-1",
            date("2025-01-25"),
            today,
        )
        .unwrap();

        let again = add_extra_duty(
            &mut ledger,
            &roster,
            &rules,
            "member-4-1",
            date("2025-01-25"),
            today,
        );

        assert!(matches!(again, Err(RosterError::DuplicateExtraDuty { .. })));
        assert_eq!(owed_days(&ledger, "member-4-1", rules.zero_score_policy), 2);
    }

    fn owing_member(ledger: &mut Ledger) {
        ledger.upsert(
            AttendanceUpdate::new("member-2-0", date("2025-01-07"))
                .status(AttendanceStatus::Absent)
                .score(Some(0))
                .penalty_days(2),
        );
    }

    #[test]
    fn makeup_credit_skips_important_event_today() {
        let mut ledger = Ledger::new();
        let roster = Roster::classroom();
        let rules = PenaltyRules::default();
        owing_member(&mut ledger);
        let today = date("2025-01-08");
        apply_important_event(&mut ledger, today, &group_two());

        let record = add_extra_duty(
            &mut ledger,
            &roster,
            &rules,
            "member-2-0",
            date("2025-01-11"),
            today,
        )
        .unwrap()
        .unwrap();

        assert_eq!(record.date, date("2025-01-11"));
        assert!(record.is_compensation);
        let event_day = ledger.get("member-2-0", today).unwrap();
        assert!(event_day.is_important_event);
        assert!(!event_day.is_compensation);
        assert_eq!(event_day.penalty_days, 0);
        assert_eq!(ledger.outstanding_penalty("member-2-0", rules.zero_score_policy), 1);
    }

    #[test]
    fn makeup_credit_leaves_substituted_day_ungraded() {
        let mut ledger = Ledger::new();
        let roster = Roster::classroom();
        let rules = PenaltyRules::default();
        owing_member(&mut ledger);
        let today = date("2025-01-08");
        crate::substitution::substitute(
            &mut ledger,
            &roster,
            &rules,
            "member-2-0",
            today,
            "member-5-0",
            9,
        )
        .unwrap();

        let record = add_extra_duty(
            &mut ledger,
            &roster,
            &rules,
            "member-2-0",
            date("2025-01-11"),
            today,
        )
        .unwrap()
        .unwrap();

        assert_eq!(record.date, date("2025-01-11"));
        let covered = ledger.get("member-2-0", today).unwrap();
        assert!(covered.is_substituted);
        assert_eq!(covered.status, AttendanceStatus::Pending);
        assert_eq!(covered.score, Some(0));
        assert!(!covered.is_compensation);
        assert_eq!(ledger.outstanding_penalty("member-2-0", rules.zero_score_policy), 1);
    }

    #[test]
    fn makeup_credit_skips_uncounted_placeholder_today() {
        let mut ledger = Ledger::new();
        let roster = Roster::classroom();
        let rules = PenaltyRules::default();
        owing_member(&mut ledger);
        let today = date("2025-01-08");
        ledger.upsert(
            AttendanceUpdate::new("member-2-0", today)
                .status(AttendanceStatus::Present)
                .score(Some(0)),
        );

        let record = add_extra_duty(
            &mut ledger,
            &roster,
            &rules,
            "member-2-0",
            date("2025-01-11"),
            today,
        )
        .unwrap()
        .unwrap();

        assert_eq!(record.date, date("2025-01-11"));
        assert_eq!(ledger.get("member-2-0", today).unwrap().penalty_days, 0);
        assert_eq!(ledger.outstanding_penalty("member-2-0", rules.zero_score_policy), 1);
    }

    #[test]
    fn makeup_is_refused_when_no_record_can_carry_the_credit() {
        let mut ledger = Ledger::new();
        let roster = Roster::classroom();
        let rules = PenaltyRules::default();
        owing_member(&mut ledger);
        let today = date("2025-01-08");
        apply_important_event(&mut ledger, today, &group_two());
        apply_important_event(&mut ledger, date("2025-01-11"), &group_two());
        let before = ledger.clone();

        let result = add_extra_duty(
            &mut ledger,
            &roster,
            &rules,
            "member-2-0",
            date("2025-01-11"),
            today,
        );

        assert_eq!(
            result,
            Err(RosterError::NoCompensationSlot {
                member: "member-2-0".into(),
                date: date("2025-01-11"),
            })
        );
        assert_eq!(ledger, before);
        assert!(!ledger.has_extra_duty("member-2-0", date("2025-01-11")));
    }

    #[test]
    fn group_absence_on_friday_adds_special_day_bonus() {
        let mut ledger = Ledger::new();
        let rules = PenaltyRules::default();
        let friday = date("2025-01-10");

        apply_group_absence(&mut ledger, &rules, friday, &group_two());

        for member_id in group_two() {
            assert_eq!(ledger.get(&member_id, friday).unwrap().penalty_days, 3);
        }
    }

    #[test]
    fn group_absence_keeps_substitution_records() {
        let mut ledger = Ledger::new();
        let roster = Roster::classroom();
        let rules = PenaltyRules::default();
        let tuesday = date("2025-01-07");
        crate::substitution::substitute(
            &mut ledger,
            &roster,
            &rules,
            "member-2-0",
            tuesday,
            "member-5-1",
            9,
        )
        .unwrap();
        let mut members = group_two();
        members.push("member-5-1".into());

        let outcome = apply_group_absence(&mut ledger, &rules, tuesday, &members);

        assert_eq!(outcome, BulkOutcome::Applied);
        assert!(ledger.get("member-2-1", tuesday).unwrap().is_group_absent);
        assert!(ledger.get("member-2-2", tuesday).unwrap().is_group_absent);
        let covered = ledger.get("member-2-0", tuesday).unwrap();
        assert!(covered.is_substituted);
        assert!(!covered.is_group_absent);
        assert_eq!(covered.status, AttendanceStatus::Pending);
        let stand_in = ledger.get("member-5-1", tuesday).unwrap();
        assert_eq!(stand_in.status, AttendanceStatus::Present);
        assert_eq!(stand_in.score, Some(9));
        assert_eq!(stand_in.penalty_days, 2);
        assert!(!stand_in.is_group_absent);

        assert_eq!(
            apply_group_absence(&mut ledger, &rules, tuesday, &members),
            BulkOutcome::Reverted
        );
        assert_eq!(ledger.get("member-5-1", tuesday).unwrap().penalty_days, 2);
        assert!(ledger.get("member-2-0", date("2025-01-07")).unwrap().is_substituted);
    }
}
