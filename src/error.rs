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
use thiserror::Error;

use crate::models::{GroupId, MemberId};

/// A mutation the rule engine refused. Nothing is written to the ledger when
/// one of these is returned.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("a roster needs at least one group")]
    EmptyRoster,
    #[error("member {0} is not in the roster")]
    UnknownMember(MemberId),
    #[error("group {0} is not in the roster")]
    UnknownGroup(GroupId),
    #[error("member {0} cannot substitute for themselves")]
    SelfSubstitution(MemberId),
    #[error("member {member} is already substituted by {substitute} on {date}")]
    AlreadySubstituted {
        member: MemberId,
        substitute: MemberId,
        date: NaiveDate,
    },
    #[error("member {member} stands in for someone on {date} and cannot be substituted")]
    SubstituteIsCovering { member: MemberId, date: NaiveDate },
    #[error("member {0} cannot be exchanged with themselves")]
    SelfExchange(MemberId),
    #[error("member {member} is already exchanged with {other} on {date}")]
    AlreadyExchanged {
        member: MemberId,
        other: MemberId,
        date: NaiveDate,
    },
    #[error("member {member} has no outstanding substitution for {target}")]
    NothingToExchange { member: MemberId, target: MemberId },
    #[error("the exchange with {target} has to fall on a different date than {date}")]
    ExchangeOnSubstitutionDate { target: MemberId, date: NaiveDate },
    #[error("member {member} already has extra duty on {date}")]
    DuplicateExtraDuty { member: MemberId, date: NaiveDate },
    #[error("no record can carry the makeup credit for {member} for extra duty on {date}")]
    NoCompensationSlot { member: MemberId, date: NaiveDate },
    #[error("member {member} has no extra duty on {date}")]
    MissingExtraDuty { member: MemberId, date: NaiveDate },
}
