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

//! Reports produced by SnapRAID and their conversion to metrics.

use strum::{EnumIter, EnumString, IntoStaticStr};

use crate::parse::ParseOutcome;

pub mod diff;
pub mod smart;
pub mod status;

const FILE_PREFIX: &str = "snapraid";
const FILE_EXTENSION: &str = "prom";

/// Kind of report, named after the SnapRAID subcommand that produces it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, EnumString, IntoStaticStr, strum::Display)]
pub enum ReportKind {
    /// Files changed since the last sync.
    #[strum(serialize = "diff")]
    Diff,
    /// Health of the disks.
    #[strum(serialize = "smart")]
    Smart,
    /// Usage of the disks, scrub age and status of the array.
    #[strum(serialize = "status")]
    Status,
}

/// Exposition text with the warnings of the parser.
pub type Rendered = ParseOutcome<String>;

impl ReportKind {
    pub fn subcommand(self) -> &'static str {
        self.into()
    }

    /// Name of the exposition file.
    pub fn file_name(self) -> String {
        format!("{FILE_PREFIX}_{}.{FILE_EXTENSION}", self.subcommand())
    }

    /// Parse a report and format the metrics.
    pub fn render(self, text: &str) -> Rendered {
        match self {
            ReportKind::Diff => diff::parse(text).map(|summary| summary.to_string()),
            ReportKind::Smart => smart::parse(text).map(|report| report.to_string()),
            ReportKind::Status => status::parse(text).map(|report| report.to_string()),
        }
    }
}

pub use diff::{ChangeSummary, DiffState};
pub use smart::{SmartReport, UnitHealth};
pub use status::{ArrayTotals, Capacity, OperationalFlags, ScrubStatus, StatusReport, UnitCapacity};
