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
//! A rotating weekly duty roster for classroom groups, with attendance
//! grading, escalating penalty days, substitutions and makeup duty.
pub mod bulk;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod penalty;
pub mod report;
pub mod roster;
pub mod schedule;
pub mod service;
pub mod statistics;
pub mod store;
pub mod substitution;

pub use bulk::BulkOutcome;
pub use config::{PenaltyRules, Settings, ZeroScorePolicy};
pub use error::RosterError;
pub use ledger::Ledger;
pub use models::{AttendanceRecord, AttendanceStatus, AttendanceUpdate};
pub use roster::{Group, Member, Roster};
pub use schedule::{Rotation, ScheduleResolution, ScheduleWarning};
pub use service::DutyService;
