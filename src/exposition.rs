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

//! Prometheus text exposition format.
//!
//! Each family is written as a `# HELP` line, a `# TYPE` line and the samples.
//! Families are separated by an empty line.

use std::fmt::{self, Write};

use itertools::Itertools;
use strum::Display as StrumDisplay;

const TERA: f64 = 1e12;
const GIGA: f64 = 1e9;

/// Type of a metric family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, StrumDisplay)]
pub enum MetricType {
    #[strum(serialize = "counter")]
    Counter,
    #[strum(serialize = "gauge")]
    Gauge,
}

/// Value of a sample.
pub trait SampleValue {
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl SampleValue for u64 {
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl SampleValue for i64 {
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl SampleValue for bool {
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Shortest representation that reads back to the same value, with at least one decimal.
impl SampleValue for f64 {
    fn fmt_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_nan() {
            f.write_str("NaN")
        } else if self.is_infinite() {
            f.write_str(if self.is_sign_positive() { "+Inf" } else { "-Inf" })
        } else {
            write!(f, "{self:?}")
        }
    }
}

struct Value<V>(V);

impl<V: SampleValue> fmt::Display for Value<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_value(f)
    }
}

/// Label value with backslash, double quote and line feed escaped.
struct LabelValue<'a>(&'a str);

impl fmt::Display for LabelValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            match c {
                '\\' => f.write_str("\\\\")?,
                '"' => f.write_str("\\\"")?,
                '\n' => f.write_str("\\n")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

/// Size in bytes of a number of terabytes, truncated.
pub fn terabytes_to_bytes(terabytes: f64) -> i64 {
    (terabytes * TERA) as i64
}

/// Size in bytes of a number of gigabytes, truncated.
pub fn gigabytes_to_bytes(gigabytes: f64) -> i64 {
    (gigabytes * GIGA) as i64
}

/// Write metric families on a formatter.
pub struct Exposition<'a, 'b> {
    f: &'a mut fmt::Formatter<'b>,
    families: usize,
}

impl<'a, 'b> Exposition<'a, 'b> {
    pub fn new(f: &'a mut fmt::Formatter<'b>) -> Self {
        Self { f, families: 0 }
    }

    /// Start a new family.
    pub fn family(&mut self, name: &str, kind: MetricType, help: &str) -> fmt::Result {
        if self.families > 0 {
            writeln!(self.f)?;
        }
        self.families += 1;
        writeln!(self.f, "# HELP {name} {help}")?;
        writeln!(self.f, "# TYPE {name} {kind}")
    }

    /// Write a sample of the current family.
    pub fn sample<V>(&mut self, name: &str, labels: &[(&str, &str)], value: V) -> fmt::Result
    where
        V: SampleValue,
    {
        self.f.write_str(name)?;
        if !labels.is_empty() {
            let labels = labels
                .iter()
                .map(|(key, value)| format!("{key}=\"{}\"", LabelValue(value)))
                .join(",");
            write!(self.f, "{{{labels}}}")?;
        }
        writeln!(self.f, " {}", Value(value))
    }
}
