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
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::Context as _;
use tracing::{debug, info};

use crate::config::PenaltyRules;
use crate::ledger::Ledger;
use crate::roster::Roster;

/// Loads the ledger snapshot at `path`. A missing file is an empty ledger.
pub fn load_snapshot(path: &Path) -> anyhow::Result<Ledger> {
    let Some(contents) = read_optional(path)? else {
        info!("No snapshot at {}, starting empty", path.display());
        return Ok(Ledger::default());
    };

    let ledger: Ledger = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;
    debug!(
        "Loaded {} records from {}",
        ledger.records().len(),
        path.display()
    );
    Ok(ledger)
}

/// Writes the snapshot next to `path` first and then renames it into place,
/// so a crash mid-write leaves the previous snapshot intact.
pub fn save_snapshot(path: &Path, ledger: &Ledger) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(ledger).context("Failed to serialize snapshot")?;

    let temp = path.with_extension("json.tmp");
    fs::write(&temp, json).with_context(|| format!("Failed to write {}", temp.display()))?;
    fs::rename(&temp, path)
        .with_context(|| format!("Failed to move snapshot into {}", path.display()))?;

    debug!(
        "Saved {} records to {}",
        ledger.records().len(),
        path.display()
    );
    Ok(())
}

/// The roster at `path`, or the built-in classroom roster when no path is set.
pub fn load_roster(path: Option<&Path>) -> anyhow::Result<Roster> {
    let Some(path) = path else {
        return Ok(Roster::classroom());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse roster {}", path.display()))
}

pub fn load_rules(path: Option<&Path>) -> anyhow::Result<PenaltyRules> {
    let Some(path) = path else {
        return Ok(PenaltyRules::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read penalty rules {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse penalty rules {}", path.display()))
}

fn read_optional(path: &Path) -> anyhow::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}
