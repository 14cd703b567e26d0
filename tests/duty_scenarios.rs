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
// Whole-flow scenarios driven through the public service API.

use chrono::NaiveDate;
use duty_roster::{
    store, AttendanceStatus, AttendanceUpdate, BulkOutcome, DutyService, Ledger, PenaltyRules,
    Roster, RosterError, Rotation,
};

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
fn override_week_grading_and_group_absence() {
    let mut service = service();
    service.set_override(date("2025-01-06"), "group-3").unwrap();

    let thursday = date("2025-01-09");
    let on_duty = service.on_duty(thursday);
    assert_eq!(on_duty, vec!["member-3-0", "member-3-1", "member-3-2"]);

    service
        .grade("member-3-0", date("2025-01-06"), Some(AttendanceStatus::Absent), None, None)
        .unwrap();

    assert_eq!(service.apply_group_absence(thursday, &on_duty), BulkOutcome::Applied);
    // second absence for member-3-0, first for the others
    assert_eq!(service.attendance("member-3-0", thursday).unwrap().penalty_days, 3);
    assert_eq!(service.attendance("member-3-1", thursday).unwrap().penalty_days, 2);

    assert_eq!(service.apply_group_absence(thursday, &on_duty), BulkOutcome::Reverted);
    assert_eq!(service.outstanding_penalty("member-3-1"), 0);
    assert_eq!(service.outstanding_penalty("member-3-0"), 2);
}

#[test]
fn important_event_day_is_no_infraction_and_moves_special_day() {
    let mut service = service();
    let group = service.on_duty(date("2025-01-10"));
    service.apply_important_event(date("2025-01-10"), &group);

    // Friday is an event, so Thursday carries the extra day
    let absent = service
        .grade("member-2-1", date("2025-01-09"), Some(AttendanceStatus::Absent), None, None)
        .unwrap();
    assert_eq!(absent.penalty_days, 3);

    let later = service
        .grade("member-2-2", date("2025-01-14"), Some(AttendanceStatus::Absent), None, None)
        .unwrap();
    assert_eq!(later.penalty_days, 2);

    assert_eq!(service.outstanding_penalty("member-2-0"), 0);
}

#[test]
fn substitution_and_exchange_round_trip() {
    let mut service = service();

    service.substitute("member-4-0", date("2025-01-20"), "member-6-2", 9).unwrap();
    assert_eq!(service.exchange_candidates("member-6-2"), vec!["member-4-0"]);
    assert_eq!(service.outstanding_penalty("member-6-2"), 2);

    assert!(matches!(
        service.substitute("member-4-0", date("2025-01-20"), "member-1-1", 7),
        Err(RosterError::AlreadySubstituted { .. })
    ));

    service.exchange("member-6-2", date("2025-01-27"), "member-4-0").unwrap();
    assert!(service.exchange_candidates("member-6-2").is_empty());
    assert_eq!(
        service.exchange("member-6-2", date("2025-01-28"), "member-4-0"),
        Err(RosterError::NothingToExchange {
            member: "member-6-2".into(),
            target: "member-4-0".into(),
        })
    );
}

#[test]
fn each_makeup_removes_exactly_one_day() {
    let mut service = service();
    service
        .grade("member-5-2", date("2025-02-03"), Some(AttendanceStatus::Absent), None, None)
        .unwrap();
    service.grade("member-5-2", date("2025-02-04"), None, Some(2), None).unwrap();
    let owed = service.outstanding_penalty("member-5-2");
    assert_eq!(owed, 4);

    let today = date("2025-02-05");
    service.add_extra_duty_as_of("member-5-2", date("2025-02-08"), today).unwrap();
    assert_eq!(service.outstanding_penalty("member-5-2"), owed - 1);
    service.add_extra_duty_as_of("member-5-2", date("2025-02-09"), date("2025-02-06")).unwrap();
    assert_eq!(service.outstanding_penalty("member-5-2"), owed - 2);

    let saturday = service.resolve_schedule(date("2025-02-08"));
    assert_eq!(saturday.member_ids(), vec!["member-5-2"]);
    assert!(saturday.on_duty[0].is_extra);

    service.remove_extra_duty("member-5-2", date("2025-02-08")).unwrap();
    assert!(service.resolve_schedule(date("2025-02-08")).on_duty.is_empty());
}

#[test]
fn reset_day_and_snapshot_persistence() {
    let mut service = service();
    let day = date("2025-01-15");
    let on_duty = service.on_duty(day);
    for member_id in &on_duty {
        service
            .upsert_attendance(AttendanceUpdate::new(member_id.clone(), day).score(Some(7)))
            .unwrap();
    }
    service.set_display_penalty("member-1-0", 5).unwrap();

    let path =
        std::env::temp_dir().join(format!("duty-roster-scenario-{}.json", std::process::id()));
    store::save_snapshot(&path, service.ledger()).unwrap();
    let restored = store::load_snapshot(&path).unwrap();
    assert_eq!(&restored, service.ledger());

    assert_eq!(service.reset_day(day, &on_duty), 3);
    assert!(service.ledger().records().is_empty());
    let stats = service.statistics(Some("group-1")).unwrap();
    assert_eq!(stats[0].displayed_penalty, 5);
    assert_eq!(stats[0].outstanding_penalty, 0);
}

#[test]
fn makeup_on_an_event_day_still_pays_down_one_day() {
    let mut service = service();
    let owing = "member-2-0";
    let team: Vec<String> = vec![owing.into(), "member-2-1".into(), "member-2-2".into()];
    service
        .grade(owing, date("2025-01-07"), Some(AttendanceStatus::Absent), None, None)
        .unwrap();
    service.apply_important_event(date("2025-01-08"), &team);
    assert_eq!(service.outstanding_penalty(owing), 2);

    let credit = service
        .add_extra_duty_as_of(owing, date("2025-01-11"), date("2025-01-08"))
        .unwrap()
        .unwrap();

    assert_eq!(credit.date, date("2025-01-11"));
    assert_eq!(service.outstanding_penalty(owing), 1);
    assert!(service.attendance(owing, date("2025-01-08")).unwrap().is_important_event);
    assert!(service.on_duty(date("2025-01-11")).contains(&owing.to_string()));

    service.substitute(owing, date("2025-01-09"), "member-5-0", 9).unwrap();
    assert!(matches!(
        service.substitute("member-5-0", date("2025-01-09"), "member-6-0", 7),
        Err(RosterError::SubstituteIsCovering { .. })
    ));
    assert_eq!(service.outstanding_penalty("member-5-0"), 2);
}
