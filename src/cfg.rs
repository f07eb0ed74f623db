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

use getset::{Getters, Setters};
use smart_default::SmartDefault;
use std::{env, ffi::OsString, path::PathBuf};

use crate::{
    output::TextfileWriter,
    source::{CommandSource, FileSource, ReportSource},
};

/// Variable containing the directory of the text files.
pub const ENV_DIRECTORY: &str = "TEXTFILE_DIRECTORY";

/// Variable containing a file to read instead of running SnapRAID.
pub const ENV_INPUT_FILE: &str = "SNAPRAID_INPUT_FILE";

pub const DEFAULT_DIRECTORY: &str = "/var/lib/prometheus/node_exporter";

const DEFAULT_COMMAND: &[&str] = &["sudo", "snapraid"];

fn default_command() -> Vec<String> {
    DEFAULT_COMMAND.iter().map(|arg| arg.to_string()).collect()
}

/// Settings of a run, resolved once at start-up.
#[derive(Debug, Clone, PartialEq, Eq, SmartDefault, Getters, Setters)]
pub struct Settings {
    /// Directory of the exposition files.
    #[default(PathBuf::from(DEFAULT_DIRECTORY))]
    #[getset(get = "pub", set = "pub")]
    directory: PathBuf,
    /// Report file read instead of running the command.
    #[getset(get = "pub", set = "pub")]
    input_file: Option<PathBuf>,
    /// Command completed by the report subcommand.
    #[default(default_command())]
    #[getset(get = "pub", set = "pub")]
    command: Vec<String>,
}

impl Settings {
    /// Settings from the process environment.
    pub fn from_env() -> Settings {
        Settings::from_lookup(|key| env::var_os(key))
    }

    /// Settings from a variable lookup function. Empty variables are ignored.
    pub fn from_lookup<F>(lookup: F) -> Settings
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let mut settings = Settings::default();
        if let Some(directory) = var(ENV_DIRECTORY) {
            settings.directory = PathBuf::from(directory);
        }
        settings.input_file = var(ENV_INPUT_FILE).map(PathBuf::from);
        settings
    }

    /// Read the input file if any, run the command otherwise.
    pub fn source(&self) -> Box<dyn ReportSource> {
        match self.input_file {
            Some(ref path) => Box::new(FileSource::new(path)),
            None => Box::new(CommandSource::new(self.command.clone())),
        }
    }

    pub fn writer(&self) -> TextfileWriter {
        TextfileWriter::new(&self.directory)
    }
}
