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
use tracing::{debug, info};

use crate::config::PenaltyRules;
use crate::error::RosterError;
use crate::ledger::Ledger;
use crate::models::{AttendanceStatus, AttendanceUpdate, MemberId};
use crate::roster::Roster;

/// Records `substitute_id` standing in for `member_id` on `date`.
///
/// The absent member is marked substituted and left ungraded (score 0). The
/// substitute is marked present with the evaluator's `score`, takes the
/// substitution penalty on top of whatever that day already held, and gains
/// one entry in their `substituted_for` list.
pub fn substitute(
    ledger: &mut Ledger,
    roster: &Roster,
    rules: &PenaltyRules,
    member_id: &str,
    date: NaiveDate,
    substitute_id: &str,
    score: u8,
) -> Result<(), RosterError> {
    if member_id == substitute_id {
        return Err(RosterError::SelfSubstitution(member_id.to_string()));
    }
    roster.require_member(member_id)?;
    roster.require_member(substitute_id)?;

    for id in [member_id, substitute_id] {
        if let Some(existing) = ledger.get(id, date).filter(|record| record.is_substituted) {
            return Err(RosterError::AlreadySubstituted {
                member: id.to_string(),
                substitute: existing.substituted_by.clone().unwrap_or_default(),
                date,
            });
        }
    }

    if ledger.stands_in_on(member_id, date) {
        return Err(RosterError::SubstituteIsCovering {
            member: member_id.to_string(),
            date,
        });
    }

    let previous_penalty = ledger
        .get(substitute_id, date)
        .map(|record| record.penalty_days)
        .unwrap_or_default();
    let mut state = ledger.substitution_state(substitute_id);
    state.substituted_for.push(member_id.to_string());
    state.count += 1;

    ledger.upsert(
        AttendanceUpdate::new(member_id, date)
            .substituted_by(Some(substitute_id.to_string()))
            .score(Some(0)),
    );
    ledger.upsert(
        AttendanceUpdate::new(substitute_id, date)
            .status(AttendanceStatus::Present)
            .score(Some(score))
            .penalty_days(previous_penalty + rules.substitution_penalty_days)
            .substitution(state.count, state.substituted_for),
    );

    info!(
        "{} substitutes for {} on {} (now covering {})",
        substitute_id, member_id, date, state.count
    );
    Ok(())
}

/// Settles one substitution: `target_id`, whom `member_id` once stood in
/// for, takes `member_id`'s duty on `date` in return.
///
/// Only a member still owed by `member_id` can be the target, and the
/// exchange cannot land on the day of a substitution between the two.
pub fn exchange(
    ledger: &mut Ledger,
    roster: &Roster,
    member_id: &str,
    date: NaiveDate,
    target_id: &str,
) -> Result<(), RosterError> {
    if member_id == target_id {
        return Err(RosterError::SelfExchange(member_id.to_string()));
    }
    roster.require_member(member_id)?;
    roster.require_member(target_id)?;

    let mut state = ledger.substitution_state(member_id);
    let Some(position) = state
        .substituted_for
        .iter()
        .position(|owed| owed == target_id)
    else {
        debug!("{} owes nothing to {}, exchange rejected", target_id, member_id);
        return Err(RosterError::NothingToExchange {
            member: member_id.to_string(),
            target: target_id.to_string(),
        });
    };

    let covered_that_day = ledger
        .get(target_id, date)
        .is_some_and(|record| record.substituted_by.as_deref() == Some(member_id));
    if covered_that_day {
        return Err(RosterError::ExchangeOnSubstitutionDate {
            target: target_id.to_string(),
            date,
        });
    }

    if let Some(record) = ledger.get(member_id, date).filter(|record| record.is_exchanged) {
        return Err(RosterError::AlreadyExchanged {
            member: member_id.to_string(),
            other: record.exchanged_with.clone().unwrap_or_default(),
            date,
        });
    }

    state.substituted_for.remove(position);
    state.count = state.count.saturating_sub(1);

    ledger.upsert(
        AttendanceUpdate::new(member_id, date)
            .exchanged_with(Some(target_id.to_string()))
            .substitution(state.count, state.substituted_for),
    );

    info!(
        "{} exchanged with {} on {} (still covering {})",
        member_id, target_id, date, state.count
    );
    Ok(())
}

/// Members `member_id` may be exchanged with, without repeats.
pub fn exchange_candidates(ledger: &Ledger, member_id: &str) -> Vec<MemberId> {
    let mut candidates = ledger.substitution_state(member_id).substituted_for;
    let mut seen = std::collections::HashSet::new();
    candidates.retain(|candidate| seen.insert(candidate.clone()));
    candidates
}
