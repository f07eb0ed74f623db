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

//! Convert SnapRAID reports into Prometheus metrics.
//!
//! The reports of `snapraid diff`, `snapraid smart` and `snapraid status` are
//! parsed and written as text files for the node exporter textfile collector.

pub mod cfg;
pub mod exposition;
pub mod output;
pub mod parse;
pub mod pipeline;
pub mod report;
pub mod source;

pub use crate::{
    cfg::Settings,
    pipeline::{RunStatus, run},
    report::ReportKind,
};
