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

// Acquisition of the reports.

use log::debug;
use std::{
    fs, io,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
    string::FromUtf8Error,
};

use crate::report::ReportKind;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("{0}: cannot read input file")]
    Read(PathBuf, #[source] io::Error),
    #[error("empty command")]
    EmptyCommand,
    #[error("{0}: cannot run command")]
    Spawn(String, #[source] io::Error),
    #[error("{0}: command failed ({1})")]
    Failed(String, ExitStatus),
    #[error("{0}: invalid UTF-8 text")]
    Decode(String, #[source] FromUtf8Error),
}

/// Provider of report text.
pub trait ReportSource {
    fn fetch(&self, kind: ReportKind) -> Result<String, SourceError>;
}

/// Run SnapRAID and capture the standard output.
#[derive(Debug, Clone)]
pub struct CommandSource {
    command: Vec<String>,
}

impl CommandSource {
    /// The command is completed with the subcommand of the report.
    pub fn new(command: Vec<String>) -> Self {
        Self { command }
    }

    fn command_line(&self, kind: ReportKind) -> String {
        let mut line = self.command.join(" ");
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(kind.subcommand());
        line
    }
}

impl ReportSource for CommandSource {
    fn fetch(&self, kind: ReportKind) -> Result<String, SourceError> {
        let (program, args) = self.command.split_first().ok_or(SourceError::EmptyCommand)?;
        let command_line = self.command_line(kind);
        debug!("running {command_line}");
        let output = Command::new(program)
            .args(args)
            .arg(kind.subcommand())
            .output()
            .map_err(|err| SourceError::Spawn(command_line.clone(), err))?;
        if !output.status.success() {
            debug!(
                "{command_line}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Err(SourceError::Failed(command_line, output.status));
        }
        String::from_utf8(output.stdout).map_err(|err| SourceError::Decode(command_line, err))
    }
}

/// Report captured beforehand in a file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P>(path: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ReportSource for FileSource {
    fn fetch(&self, kind: ReportKind) -> Result<String, SourceError> {
        debug!("{kind}: reading {}", self.path.display());
        let content =
            fs::read(&self.path).map_err(|err| SourceError::Read(self.path.clone(), err))?;
        String::from_utf8(content)
            .map_err(|err| SourceError::Decode(self.path.display().to_string(), err))
    }
}
