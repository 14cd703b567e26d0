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
use crate::schedule::{DutyMember, ScheduleResolution, ScheduleWarning};
use crate::statistics::{MemberStatistics, Severity};

pub fn format_resolution(resolution: &ScheduleResolution) -> String {
    let mut description = String::new();

    description.push_str(&format!(
        "# {} ({})\n",
        resolution.date,
        resolution.date.format("%A")
    ));
    description.push_str(&format!(
        "## {}{}\n",
        resolution.group.name,
        if resolution.is_override { " (override)" } else { "" }
    ));

    if resolution.on_duty.is_empty() {
        description.push_str("- nobody on duty\n");
    } else {
        description.push_str(&format_duty_members(&resolution.on_duty));
    }

    for warning in &resolution.warnings {
        description.push_str(&format!("! {}\n", format_warning(warning)));
    }

    description
}

pub fn format_week(week: &[ScheduleResolution]) -> String {
    week.iter()
        .map(format_resolution)
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_duty_members(members: &[DutyMember]) -> String {
    members
        .iter()
        .map(|duty| {
            if duty.is_extra {
                format!("- {} (extra)\n", duty.member.name)
            } else {
                format!("- {}\n", duty.member.name)
            }
        })
        .collect()
}

fn format_warning(warning: &ScheduleWarning) -> String {
    match warning {
        ScheduleWarning::UnknownOverrideGroup {
            week_start,
            group_id,
        } => format!("override for {week_start} names unknown group {group_id}"),
        ScheduleWarning::UnknownExtraDutyMember { date, member_id } => {
            format!("extra duty on {date} names unknown member {member_id}")
        }
    }
}

pub fn format_statistics(statistics: &[MemberStatistics]) -> String {
    let mut description = String::new();

    description.push_str("# Penalty Standings\n");
    for stats in statistics {
        let average = stats
            .average_score
            .map(|average| format!("{average:.1}"))
            .unwrap_or_else(|| "-".to_string());
        description.push_str(&format!(
            "- {} | {} days | avg {} | {}/{}/{} present/absent/fail\n",
            stats.member.name,
            stats.displayed_penalty,
            average,
            stats.present_count,
            stats.absent_count,
            stats.fail_count
        ));
    }

    let warnings: Vec<_> = statistics
        .iter()
        .flat_map(|stats| stats.warnings.iter().map(move |warning| (stats, warning)))
        .collect();
    if !warnings.is_empty() {
        description.push_str("# Low Scores\n");
        for (stats, warning) in warnings {
            let marker = match warning.severity {
                Severity::Severe => "!!",
                Severity::Warning => "!",
            };
            description.push_str(&format!(
                "- {} {} scored {} on {}\n",
                marker, stats.member.name, warning.score, warning.date
            ));
        }
    }

    description
}

/// One line per on-duty member, with what they still owe.
pub fn format_reminder(resolution: &ScheduleResolution, owed: impl Fn(&str) -> i32) -> String {
    let mut description = format!("Duty for {} is {}:\n", resolution.date, resolution.group.name);
    for duty in &resolution.on_duty {
        let days = owed(&duty.member.id);
        if days > 0 {
            description.push_str(&format!("- {} (owes {} days)\n", duty.member.name, days));
        } else {
            description.push_str(&format!("- {}\n", duty.member.name));
        }
    }
    description
}
