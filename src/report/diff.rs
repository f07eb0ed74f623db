// Snapraid-exporter -- SnapRAID metrics for Prometheus
// Copyright (C) 2024  Laurent Pelecq
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

// Summary of `snapraid diff`.

use log::debug;
use regex_lite::Regex;
use std::{fmt, sync::LazyLock};
use strum::{EnumIter, EnumMessage, IntoEnumIterator, IntoStaticStr};

use crate::{
    exposition::{Exposition, MetricType},
    parse::{ParseOutcome, parse_count},
};

const FILES_TOTAL: &str = "snapraid_diff_files_total";
const HAS_DIFFERENCES: &str = "snapraid_diff_has_differences";

/// Printed when the array is in sync.
const NO_DIFFERENCES: &str = "No differences";

/// State of the files compared to the last sync
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumMessage, IntoStaticStr)]
pub enum DiffState {
    #[strum(serialize = "equal", message = "Files unchanged since last sync")]
    Equal,
    #[strum(serialize = "added", message = "Files added since last sync")]
    Added,
    #[strum(serialize = "removed", message = "Files removed since last sync")]
    Removed,
    #[strum(serialize = "updated", message = "Files updated since last sync")]
    Updated,
    #[strum(serialize = "moved", message = "Files moved since last sync")]
    Moved,
    #[strum(serialize = "copied", message = "Files copied since last sync")]
    Copied,
    #[strum(serialize = "restored", message = "Files restored since last sync")]
    Restored,
}

impl DiffState {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    pub fn description(self) -> &'static str {
        self.get_message().unwrap_or_default()
    }
}

/// One pattern `<count> <state>` per state.
static PATTERNS: LazyLock<Vec<(DiffState, Regex)>> = LazyLock::new(|| {
    DiffState::iter()
        .map(|state| {
            let pattern = format!(r"(?i)(\d+)\s+{}", state.as_str());
            (state, Regex::new(&pattern).expect("diff pattern"))
        })
        .collect()
});

/// Number of files in each state.
///
/// The counts are independent. They don't add up to a total.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    pub equal: u64,
    pub added: u64,
    pub removed: u64,
    pub updated: u64,
    pub moved: u64,
    pub copied: u64,
    pub restored: u64,
    pub has_differences: bool,
}

impl ChangeSummary {
    pub fn count(&self, state: DiffState) -> u64 {
        match state {
            DiffState::Equal => self.equal,
            DiffState::Added => self.added,
            DiffState::Removed => self.removed,
            DiffState::Updated => self.updated,
            DiffState::Moved => self.moved,
            DiffState::Copied => self.copied,
            DiffState::Restored => self.restored,
        }
    }

    fn count_mut(&mut self, state: DiffState) -> &mut u64 {
        match state {
            DiffState::Equal => &mut self.equal,
            DiffState::Added => &mut self.added,
            DiffState::Removed => &mut self.removed,
            DiffState::Updated => &mut self.updated,
            DiffState::Moved => &mut self.moved,
            DiffState::Copied => &mut self.copied,
            DiffState::Restored => &mut self.restored,
        }
    }
}

/// Parse the output of `snapraid diff`.
///
/// A line may set several counts if it contains several states. The last line
/// wins when a state is repeated.
pub fn parse(text: &str) -> ParseOutcome<ChangeSummary> {
    let mut outcome = text.lines().enumerate().fold(
        ParseOutcome::<ChangeSummary>::default(),
        |mut outcome, (index, line)| {
            for (state, pattern) in PATTERNS.iter() {
                if let Some(captures) = pattern.captures(line) {
                    match parse_count(state.as_str(), &captures[1]) {
                        Ok(count) => {
                            debug!("{}: {count}", state.description());
                            *outcome.value.count_mut(*state) = count;
                        }
                        Err(err) => outcome.warn(index + 1, line, err),
                    }
                }
            }
            outcome
        },
    );
    outcome.value.has_differences = !text.contains(NO_DIFFERENCES);
    outcome
}

impl fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut expo = Exposition::new(f);
        expo.family(
            FILES_TOTAL,
            MetricType::Gauge,
            "Number of files in each state",
        )?;
        for state in DiffState::iter() {
            expo.sample(FILES_TOTAL, &[("state", state.as_str())], self.count(state))?;
        }
        expo.family(
            HAS_DIFFERENCES,
            MetricType::Gauge,
            "Whether there are any differences (0=no, 1=yes)",
        )?;
        expo.sample(HAS_DIFFERENCES, &[], self.has_differences)
    }
}
