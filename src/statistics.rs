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
use serde::Serialize;

use crate::config::ZeroScorePolicy;
use crate::error::RosterError;
use crate::ledger::Ledger;
use crate::models::{AttendanceRecord, AttendanceStatus, MemberId};
use crate::roster::{Member, Roster};

/// Scores from 1 up to this are flagged; 0 is an ungraded placeholder.
const LOW_SCORE_CEILING: u8 = 5;
const SEVERE_BELOW: u8 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    Warning,
    Severe,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LowScoreWarning {
    #[serde(rename = "memberId")]
    pub member_id: MemberId,
    pub date: chrono::NaiveDate,
    pub score: u8,
    pub severity: Severity,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MemberStatistics {
    pub member: Member,
    #[serde(rename = "outstandingPenalty")]
    pub outstanding_penalty: i32,
    /// What the roster shows, which an admin override may pin.
    #[serde(rename = "displayedPenalty")]
    pub displayed_penalty: i32,
    #[serde(rename = "averageScore")]
    pub average_score: Option<f64>,
    #[serde(rename = "presentCount")]
    pub present_count: usize,
    #[serde(rename = "absentCount")]
    pub absent_count: usize,
    #[serde(rename = "failCount")]
    pub fail_count: usize,
    pub records: Vec<AttendanceRecord>,
    pub warnings: Vec<LowScoreWarning>,
}

pub fn member_statistics(
    ledger: &Ledger,
    member: &Member,
    policy: ZeroScorePolicy,
) -> MemberStatistics {
    let mut records: Vec<AttendanceRecord> = ledger.records_for(&member.id).cloned().collect();
    records.sort_by(|a, b| b.date.cmp(&a.date));

    let count = |status: AttendanceStatus| {
        records
            .iter()
            .filter(|record| !record.is_important_event && record.status == status)
            .count()
    };

    let outstanding_penalty = ledger.outstanding_penalty(&member.id, policy);

    MemberStatistics {
        member: member.clone(),
        outstanding_penalty,
        displayed_penalty: displayed_penalty(ledger, &member.id, outstanding_penalty),
        average_score: average_score(&records),
        present_count: count(AttendanceStatus::Present),
        absent_count: count(AttendanceStatus::Absent),
        fail_count: count(AttendanceStatus::Fail),
        warnings: low_score_warnings(&records),
        records,
    }
}

/// Statistics for every member, or for one group's members.
pub fn roster_statistics(
    roster: &Roster,
    ledger: &Ledger,
    policy: ZeroScorePolicy,
    group_id: Option<&str>,
) -> Result<Vec<MemberStatistics>, RosterError> {
    let members: Vec<&Member> = match group_id {
        Some(group_id) => roster
            .group(group_id)
            .ok_or_else(|| RosterError::UnknownGroup(group_id.to_string()))?
            .members
            .iter()
            .collect(),
        None => roster.members().collect(),
    };

    Ok(members
        .into_iter()
        .map(|member| member_statistics(ledger, member, policy))
        .collect())
}

pub fn displayed_penalty(ledger: &Ledger, member_id: &str, outstanding: i32) -> i32 {
    ledger
        .display_penalty_override(member_id)
        .unwrap_or_else(|| outstanding.max(0))
}

/// Mean of the graded scores, rounded to one decimal. Important-event days
/// and ungraded records are left out.
pub fn average_score(records: &[AttendanceRecord]) -> Option<f64> {
    let scores: Vec<u8> = records
        .iter()
        .filter(|record| !record.is_important_event)
        .filter_map(|record| record.score)
        .collect();

    if scores.is_empty() {
        return None;
    }

    let total: u32 = scores.iter().map(|&score| u32::from(score)).sum();
    let mean = f64::from(total) / scores.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

pub fn low_score_warnings(records: &[AttendanceRecord]) -> Vec<LowScoreWarning> {
    records
        .iter()
        .filter(|record| !record.is_important_event)
        .filter_map(|record| {
            let score = record.score?;
            if score == 0 || score > LOW_SCORE_CEILING {
                return None;
            }
            Some(LowScoreWarning {
                member_id: record.member_id.clone(),
                date: record.date,
                score,
                severity: if score < SEVERE_BELOW {
                    Severity::Severe
                } else {
                    Severity::Warning
                },
            })
        })
        .collect()
}
