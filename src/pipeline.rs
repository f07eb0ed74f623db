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

// One run: fetch a report, convert it and write the metrics.

use anyhow::Context;
use log::{info, warn};
use std::path::PathBuf;

use crate::{
    cfg::Settings, output::TextfileWriter, report::ReportKind, source::ReportSource,
};

/// What happened to the exposition file.
#[derive(Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The file has been replaced.
    Written(PathBuf),
    /// No report, the file is unchanged.
    Skipped,
}

/// Export a report with the given settings.
pub fn run(kind: ReportKind, settings: &Settings) -> anyhow::Result<RunStatus> {
    let source = settings.source();
    export(kind, source.as_ref(), &settings.writer())
}

/// Export a report from a source to a writer.
///
/// A report that can't be fetched or that is empty is skipped. Lines that
/// can't be parsed are only logged. Only write errors are returned.
pub fn export(
    kind: ReportKind,
    source: &dyn ReportSource,
    writer: &TextfileWriter,
) -> anyhow::Result<RunStatus> {
    let text = match source.fetch(kind) {
        Ok(text) => text,
        Err(err) => {
            warn!("{kind}: {:#}", anyhow::Error::new(err));
            return Ok(RunStatus::Skipped);
        }
    };
    if text.is_empty() {
        warn!("{kind}: no output from snapraid");
        return Ok(RunStatus::Skipped);
    }
    let rendered = kind.render(&text);
    for warning in &rendered.warnings {
        warn!("{kind}: {warning}");
    }
    let path = writer
        .write(&kind.file_name(), &rendered.value)
        .with_context(|| format!("{kind}: cannot write metrics"))?;
    info!("{kind}: metrics written to {}", path.display());
    Ok(RunStatus::Written(path))
}
