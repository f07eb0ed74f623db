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

use argh::FromArgs;
use log::{debug, error};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::{path::PathBuf, process::ExitCode};

use snapraid_exporter::{ReportKind, RunStatus, Settings};

/// Export a SnapRAID report as a Prometheus text file.
#[derive(FromArgs, Debug)]
struct Args {
    /// directory of the metrics files (overrides TEXTFILE_DIRECTORY)
    #[argh(option, short = 'd')]
    directory: Option<PathBuf>,

    /// read the report from a file instead of running snapraid (overrides SNAPRAID_INPUT_FILE)
    #[argh(option, short = 'i')]
    input: Option<PathBuf>,

    /// verbose mode
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// report to export: diff, smart or status
    #[argh(positional)]
    report: ReportKind,
}

fn main() -> ExitCode {
    let args: Args = argh::from_env();

    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(err) = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("cannot initialize logger: {err}");
    }

    let mut settings = Settings::from_env();
    if let Some(directory) = args.directory {
        settings.set_directory(directory);
    }
    if let Some(input) = args.input {
        settings.set_input_file(Some(input));
    }
    debug!("{settings:?}");

    match snapraid_exporter::run(args.report, &settings) {
        Ok(RunStatus::Written(_)) | Ok(RunStatus::Skipped) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
