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

// Disk health from `snapraid smart`.
//
// The report is a table with one line per disk:
//
//    Temp  Power   Error   FP Size
//       C OnDays   Count        TB  Serial    Device    Disk
//  -----------------------------------------------------------
//      38   1234       0  5%  4.0  WD-XXXXX  /dev/sda  d1
//  -----------------------------------------------------------
// The FP column is the estimated probability (in percentage) that the disk
// is going to fail in the next year.
//
// Probability that at least one disk is going to fail in the next year is 16%.

use regex_lite::Regex;
use std::{fmt, sync::LazyLock};

use crate::{
    exposition::{Exposition, MetricType, terabytes_to_bytes},
    parse::{
        FieldError, ParseOutcome, is_sentinel, is_separator, parse_digits, parse_number,
        parse_percent, tokens,
    },
};

const TEMPERATURE: &str = "snapraid_disk_temperature_celsius";
const POWER_ON_DAYS: &str = "snapraid_disk_power_on_days";
const ERROR_COUNT: &str = "snapraid_disk_error_count";
const FAILURE_PROBABILITY: &str = "snapraid_disk_failure_probability_percent";
const SIZE: &str = "snapraid_disk_size_bytes";
const ARRAY_FAILURE_PROBABILITY: &str = "snapraid_array_failure_probability_percent";

/// Lines before the table.
const HEADER_LINES: usize = 3;

/// First words of the legend after the table.
const LEGEND: &str = "The FP column";

/// Sentence giving the probability for the whole array.
const ARRAY_SENTENCE: &str = "fail in the next year is";

const MIN_FIELDS: usize = 8;

static PERCENTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("percentage pattern"));

/// Health of a disk.
///
/// Temperature, power-on days and error count are `None` when the disk doesn't
/// report them. An unknown failure probability or size is 0.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnitHealth {
    pub temperature: Option<u64>,
    pub power_on_days: Option<u64>,
    pub error_count: Option<u64>,
    pub failure_probability_percent: f64,
    pub size_terabytes: f64,
    pub serial: String,
    pub device: String,
    pub name: String,
}

impl UnitHealth {
    fn labels(&self) -> [(&str, &str); 3] {
        [
            ("device", self.device.as_str()),
            ("serial", self.serial.as_str()),
            ("name", self.name.as_str()),
        ]
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SmartReport {
    pub units: Vec<UnitHealth>,
    /// Probability that at least one disk fails in the next year.
    pub array_failure_probability_percent: f64,
}

fn parse_unit(fields: &[&str]) -> Option<Result<UnitHealth, FieldError>> {
    let [temperature, power, errors, probability, size, serial, device, name, ..] = fields else {
        return None;
    };
    let parse = || -> Result<UnitHealth, FieldError> {
        Ok(UnitHealth {
            temperature: parse_digits("temperature", temperature)?,
            power_on_days: parse_digits("power on days", power)?,
            error_count: parse_digits("error count", errors)?,
            failure_probability_percent: if is_sentinel(probability) {
                0.0
            } else {
                parse_percent("failure probability", probability)?
            },
            size_terabytes: if is_sentinel(size) {
                0.0
            } else {
                parse_number("size", size)?
            },
            serial: serial.to_string(),
            device: device.to_string(),
            name: name.to_string(),
        })
    };
    Some(parse())
}

/// Probability in the first line containing the array sentence.
fn array_failure_probability<'a, I>(mut lines: I) -> f64
where
    I: Iterator<Item = &'a str>,
{
    lines
        .find(|line| line.contains(ARRAY_SENTENCE))
        .and_then(|line| PERCENTAGE.captures(line))
        .and_then(|captures| captures[1].parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Parse the output of `snapraid smart`.
///
/// Disks without device or serial number are ignored.
pub fn parse(text: &str) -> ParseOutcome<SmartReport> {
    let lines = || text.trim().lines().enumerate().skip(HEADER_LINES);
    let mut outcome = lines()
        .take_while(|(_, line)| !line.trim_start().starts_with(LEGEND))
        .filter(|(_, line)| !is_separator(line))
        .fold(
            ParseOutcome::<SmartReport>::default(),
            |mut outcome, (index, line)| {
                match parse_unit(&tokens(line)) {
                    Some(Ok(unit)) if !is_sentinel(&unit.device) && !is_sentinel(&unit.serial) => {
                        outcome.value.units.push(unit)
                    }
                    Some(Ok(_)) | None => (),
                    Some(Err(err)) => outcome.warn(index + 1, line, err),
                }
                outcome
            },
        );
    outcome.value.array_failure_probability_percent =
        array_failure_probability(lines().map(|(_, line)| line));
    outcome
}

impl fmt::Display for SmartReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut expo = Exposition::new(f);
        expo.family(
            TEMPERATURE,
            MetricType::Gauge,
            "Current temperature of the disk",
        )?;
        for unit in &self.units {
            if let Some(temperature) = unit.temperature.filter(|value| *value > 0) {
                expo.sample(TEMPERATURE, &unit.labels(), temperature)?;
            }
        }
        expo.family(
            POWER_ON_DAYS,
            MetricType::Counter,
            "Total number of days the disk has been powered on",
        )?;
        for unit in &self.units {
            if let Some(days) = unit.power_on_days.filter(|value| *value > 0) {
                expo.sample(POWER_ON_DAYS, &unit.labels(), days)?;
            }
        }
        expo.family(
            ERROR_COUNT,
            MetricType::Counter,
            "Total number of errors detected on the disk",
        )?;
        for unit in &self.units {
            expo.sample(ERROR_COUNT, &unit.labels(), unit.error_count.unwrap_or(0))?;
        }
        expo.family(
            FAILURE_PROBABILITY,
            MetricType::Gauge,
            "Estimated probability of disk failure in the next year",
        )?;
        for unit in &self.units {
            expo.sample(
                FAILURE_PROBABILITY,
                &unit.labels(),
                unit.failure_probability_percent,
            )?;
        }
        expo.family(SIZE, MetricType::Gauge, "Size of the disk in bytes")?;
        for unit in &self.units {
            expo.sample(
                SIZE,
                &unit.labels(),
                terabytes_to_bytes(unit.size_terabytes),
            )?;
        }
        expo.family(
            ARRAY_FAILURE_PROBABILITY,
            MetricType::Gauge,
            "Probability that at least one disk will fail in the next year",
        )?;
        expo.sample(
            ARRAY_FAILURE_PROBABILITY,
            &[],
            self.array_failure_probability_percent,
        )
    }
}
