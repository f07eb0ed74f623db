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

// Helpers shared by the report parsers.
//
// Reports are loosely formatted text tables. A parser never fails: a line that
// cannot be decoded is dropped and recorded as a warning.

use std::fmt;

use nom::{
    IResult, Parser,
    character::complete::char,
    combinator::all_consuming,
    multi::many0,
    number::complete::double,
    sequence::terminated,
};

/// Value of a field that is unknown or not applicable.
pub const SENTINEL: &str = "-";

const SEPARATOR: &str = "----";

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("{column}: invalid integer '{value}'")]
    InvalidInteger { column: &'static str, value: String },
    #[error("{column}: invalid number '{value}'")]
    InvalidNumber { column: &'static str, value: String },
}

/// A line dropped by a parser.
#[derive(Debug, Clone, PartialEq)]
pub struct LineWarning {
    /// Line number starting at 1.
    pub number: usize,
    pub line: String,
    pub error: FieldError,
}

impl fmt::Display for LineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}: {}", self.number, self.error, self.line.trim())
    }
}

/// Result of a parser: the value and the lines that have been dropped.
#[derive(Debug, Default)]
pub struct ParseOutcome<T> {
    pub value: T,
    pub warnings: Vec<LineWarning>,
}

impl<T> ParseOutcome<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn warn(&mut self, number: usize, line: &str, error: FieldError) {
        self.warnings.push(LineWarning {
            number,
            line: line.to_string(),
            error,
        });
    }

    /// Transform the value keeping the warnings.
    pub fn map<U, F>(self, func: F) -> ParseOutcome<U>
    where
        F: FnOnce(T) -> U,
    {
        ParseOutcome {
            value: func(self.value),
            warnings: self.warnings,
        }
    }
}

/// Tell if the line is a horizontal ruler.
pub fn is_separator(line: &str) -> bool {
    line.trim_start().starts_with(SEPARATOR)
}

/// Tell if a token is the placeholder for unknown values.
pub fn is_sentinel(token: &str) -> bool {
    token == SENTINEL
}

/// Split a line in whitespace separated tokens.
pub fn tokens(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

fn float(input: &str) -> IResult<&str, f64> {
    all_consuming(double).parse(input)
}

/// Float followed by percent signs (ex: 94%)
fn percent(input: &str) -> IResult<&str, f64> {
    all_consuming(terminated(double, many0(char('%')))).parse(input)
}

/// Parse an unsigned integer.
pub fn parse_count(column: &'static str, token: &str) -> Result<u64, FieldError> {
    token.parse::<u64>().map_err(|_| FieldError::InvalidInteger {
        column,
        value: token.to_string(),
    })
}

/// Parse an integer if the token is only made of digits.
///
/// Any other token such as the sentinel means that the value is unknown.
pub fn parse_digits(column: &'static str, token: &str) -> Result<Option<u64>, FieldError> {
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        parse_count(column, token).map(Some)
    } else {
        Ok(None)
    }
}

/// Parse a floating point number.
pub fn parse_number(column: &'static str, token: &str) -> Result<f64, FieldError> {
    float(token)
        .map(|(_, value)| value)
        .map_err(|_| FieldError::InvalidNumber {
            column,
            value: token.to_string(),
        })
}

/// Parse a floating point number with optional trailing percent signs.
pub fn parse_percent(column: &'static str, token: &str) -> Result<f64, FieldError> {
    percent(token)
        .map(|(_, value)| value)
        .map_err(|_| FieldError::InvalidNumber {
            column,
            value: token.to_string(),
        })
}
