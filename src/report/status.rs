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

// Usage and status of the array from `snapraid status`.

use log::debug;
use regex_lite::Regex;
use smart_default::SmartDefault;
use std::{fmt, sync::LazyLock};

use crate::{
    exposition::{Exposition, MetricType, gigabytes_to_bytes},
    parse::{
        FieldError, ParseOutcome, is_sentinel, is_separator, parse_count, parse_number,
        parse_percent, tokens,
    },
};

const DISK_FILES: &str = "snapraid_disk_files_total";
const DISK_FRAGMENTED: &str = "snapraid_disk_fragmented_files";
const DISK_EXCESS: &str = "snapraid_disk_excess_fragments";
const DISK_SPACE: &str = "snapraid_disk_space_bytes";
const ARRAY_FILES: &str = "snapraid_array_files_total";
const ARRAY_FRAGMENTED: &str = "snapraid_array_fragmented_files_total";
const ARRAY_EXCESS: &str = "snapraid_array_excess_fragments_total";
const ARRAY_SPACE: &str = "snapraid_array_space_bytes";
const SCRUB_AGE: &str = "snapraid_scrub_age_days";
const SCRUB_COVERAGE: &str = "snapraid_scrub_coverage_ratio";
const STATUS: &str = "snapraid_status";

/// Number of columns in the table.
const TABLE_FIELDS: usize = 8;

/// Title of the name column.
const NAME_TITLE: &str = "Name";

const NO_SYNC: &str = "No sync is in progress";
const NO_ZERO_SUBSECOND: &str = "No file has a zero sub-second timestamp";
const NO_REHASH: &str = "No rehash is in progress or needed";
const NO_ERROR: &str = "No error detected";

static UNSCRUBBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)% of the array is not scrubbed").expect("unscrubbed pattern")
});

static SCRUB_DAYS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"scrubbed (\d+) days ago, the median (\d+), the newest (\d+)")
        .expect("scrub days pattern")
});

/// Usage figures of a disk or of the whole array.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Capacity {
    pub file_count: u64,
    pub fragmented_count: u64,
    pub excess_fragment_count: u64,
    pub used_gb: f64,
    pub free_gb: f64,
    pub use_percent: f64,
}

/// Totals as printed below the table. They are not recomputed from the disks.
pub type ArrayTotals = Capacity;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnitCapacity {
    pub name: String,
    pub capacity: Capacity,
}

/// Age of the last scrub. When the report doesn't tell, the array is
/// considered fully scrubbed.
#[derive(Clone, Debug, PartialEq, SmartDefault)]
pub struct ScrubStatus {
    pub oldest_days: u64,
    pub median_days: u64,
    pub newest_days: u64,
    /// Fraction of the array already scrubbed in [0, 1].
    #[default(1.0)]
    pub coverage_ratio: f64,
}

/// Conditions that SnapRAID reports by a sentence only when they are false.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OperationalFlags {
    pub sync_in_progress: bool,
    pub zero_subsecond_timestamps: bool,
    pub rehash_needed: bool,
    pub errors_detected: bool,
}

impl OperationalFlags {
    fn from_text(text: &str) -> Self {
        Self {
            sync_in_progress: !text.contains(NO_SYNC),
            zero_subsecond_timestamps: !text.contains(NO_ZERO_SUBSECOND),
            rehash_needed: !text.contains(NO_REHASH),
            errors_detected: !text.contains(NO_ERROR),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusReport {
    pub units: Vec<UnitCapacity>,
    pub totals: ArrayTotals,
    pub scrub: ScrubStatus,
    pub flags: OperationalFlags,
}

/// Decode the numeric columns. The fourth column (wasted space) is ignored.
fn parse_capacity(fields: &[&str]) -> Result<Capacity, FieldError> {
    Ok(Capacity {
        file_count: parse_count("files", fields[0])?,
        fragmented_count: parse_count("fragmented files", fields[1])?,
        excess_fragment_count: parse_count("excess fragments", fields[2])?,
        used_gb: parse_number("used", fields[4])?,
        free_gb: parse_number("free", fields[5])?,
        use_percent: parse_percent("use", fields[6])?,
    })
}

fn parse_unit(line: &str) -> Option<Result<UnitCapacity, FieldError>> {
    let fields = tokens(line);
    match fields.as_slice() {
        [.., name] if fields.len() == TABLE_FIELDS && !is_sentinel(name) && *name != NAME_TITLE => {
            Some(parse_capacity(&fields).map(|capacity| UnitCapacity {
                name: name.to_string(),
                capacity,
            }))
        }
        _ => None,
    }
}

fn parse_totals(line: &str) -> Option<Result<ArrayTotals, FieldError>> {
    let fields = tokens(line);
    if fields.len() >= TABLE_FIELDS {
        Some(parse_capacity(&fields))
    } else {
        None
    }
}

/// Find the rows of the table: from the second line after the title to the ruler.
///
/// Return the first row and the index of the ruler.
fn locate_table(lines: &[&str]) -> Option<(usize, usize)> {
    let mut start = None;
    for (index, line) in lines.iter().enumerate() {
        if line.contains("Files") && line.contains("Fragmented") {
            start = Some(index + 2);
        } else if let Some(start) = start {
            if is_separator(line) {
                return Some((start, index));
            }
        }
    }
    None
}

fn parse_scrub(text: &str) -> ScrubStatus {
    let mut scrub = ScrubStatus::default();
    if let Some(percent) = UNSCRUBBED
        .captures(text)
        .and_then(|captures| captures[1].parse::<f64>().ok())
    {
        scrub.coverage_ratio = 1.0 - percent / 100.0;
    }
    if let Some(captures) = SCRUB_DAYS.captures(text) {
        if let (Ok(oldest), Ok(median), Ok(newest)) = (
            captures[1].parse::<u64>(),
            captures[2].parse::<u64>(),
            captures[3].parse::<u64>(),
        ) {
            scrub.oldest_days = oldest;
            scrub.median_days = median;
            scrub.newest_days = newest;
        }
    }
    scrub
}

/// Parse the output of `snapraid status`.
pub fn parse(text: &str) -> ParseOutcome<StatusReport> {
    let lines: Vec<&str> = text.trim().lines().collect();
    let mut outcome = ParseOutcome::new(StatusReport {
        scrub: parse_scrub(text),
        flags: OperationalFlags::from_text(text),
        ..Default::default()
    });
    if let Some((start, end)) = locate_table(&lines) {
        let rows = lines.get(start..end).unwrap_or_default();
        outcome = rows
            .iter()
            .enumerate()
            .fold(outcome, |mut outcome, (offset, line)| {
                match parse_unit(line) {
                    Some(Ok(unit)) => outcome.value.units.push(unit),
                    Some(Err(err)) => outcome.warn(start + offset + 1, line, err),
                    None => (),
                }
                outcome
            });
        if let Some(line) = lines.get(end + 1) {
            match parse_totals(line) {
                Some(Ok(totals)) => outcome.value.totals = totals,
                Some(Err(err)) => outcome.warn(end + 2, line, err),
                None => debug!("status: no totals in line {}", end + 2),
            }
        }
    }
    outcome
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut expo = Exposition::new(f);

        expo.family(DISK_FILES, MetricType::Gauge, "Number of files on each disk")?;
        for unit in &self.units {
            expo.sample(
                DISK_FILES,
                &[("name", unit.name.as_str())],
                unit.capacity.file_count,
            )?;
        }
        expo.family(
            DISK_FRAGMENTED,
            MetricType::Gauge,
            "Number of fragmented files on each disk",
        )?;
        for unit in &self.units {
            expo.sample(
                DISK_FRAGMENTED,
                &[("name", unit.name.as_str())],
                unit.capacity.fragmented_count,
            )?;
        }
        expo.family(
            DISK_EXCESS,
            MetricType::Gauge,
            "Number of excess fragments on each disk",
        )?;
        for unit in &self.units {
            expo.sample(
                DISK_EXCESS,
                &[("name", unit.name.as_str())],
                unit.capacity.excess_fragment_count,
            )?;
        }
        expo.family(
            DISK_SPACE,
            MetricType::Gauge,
            "Disk space information in bytes",
        )?;
        for unit in &self.units {
            expo.sample(
                DISK_SPACE,
                &[("name", unit.name.as_str()), ("type", "used")],
                gigabytes_to_bytes(unit.capacity.used_gb),
            )?;
            expo.sample(
                DISK_SPACE,
                &[("name", unit.name.as_str()), ("type", "free")],
                gigabytes_to_bytes(unit.capacity.free_gb),
            )?;
        }

        let totals = &self.totals;
        expo.family(
            ARRAY_FILES,
            MetricType::Gauge,
            "Total number of files in the array",
        )?;
        expo.sample(ARRAY_FILES, &[], totals.file_count)?;
        expo.family(
            ARRAY_FRAGMENTED,
            MetricType::Gauge,
            "Total number of fragmented files in the array",
        )?;
        expo.sample(ARRAY_FRAGMENTED, &[], totals.fragmented_count)?;
        expo.family(
            ARRAY_EXCESS,
            MetricType::Gauge,
            "Total number of excess fragments in the array",
        )?;
        expo.sample(ARRAY_EXCESS, &[], totals.excess_fragment_count)?;
        expo.family(
            ARRAY_SPACE,
            MetricType::Gauge,
            "Array space information in bytes",
        )?;
        expo.sample(
            ARRAY_SPACE,
            &[("type", "used")],
            gigabytes_to_bytes(totals.used_gb),
        )?;
        expo.sample(
            ARRAY_SPACE,
            &[("type", "free")],
            gigabytes_to_bytes(totals.free_gb),
        )?;

        let scrub = &self.scrub;
        expo.family(SCRUB_AGE, MetricType::Gauge, "Age of blocks in days")?;
        expo.sample(SCRUB_AGE, &[("type", "oldest")], scrub.oldest_days)?;
        expo.sample(SCRUB_AGE, &[("type", "median")], scrub.median_days)?;
        expo.sample(SCRUB_AGE, &[("type", "newest")], scrub.newest_days)?;
        expo.family(
            SCRUB_COVERAGE,
            MetricType::Gauge,
            "Ratio of array that has been scrubbed (0.0-1.0)",
        )?;
        expo.sample(SCRUB_COVERAGE, &[], scrub.coverage_ratio)?;

        let flags = &self.flags;
        expo.family(STATUS, MetricType::Gauge, "Various status indicators")?;
        expo.sample(
            STATUS,
            &[("type", "sync_in_progress")],
            flags.sync_in_progress,
        )?;
        expo.sample(
            STATUS,
            &[("type", "zero_subsecond_timestamps")],
            flags.zero_subsecond_timestamps,
        )?;
        expo.sample(STATUS, &[("type", "rehash_needed")], flags.rehash_needed)?;
        expo.sample(STATUS, &[("type", "errors_detected")], flags.errors_detected)
    }
}

#[cfg(test)]
mod tests {

    use rstest::rstest;

    use super::{Capacity, OperationalFlags, ScrubStatus, UnitCapacity, parse};

    const REPORT: &str = "SnapRAID status report:

   Files Fragmented Excess  Wasted  Used    Free  Use Name
            Files  Fragments  GB      GB      GB
   29546     394    1436    10.0    3724     221  94% d1
   30141     401    1519     8.3  3690.5   255.5  93% d2
       0       0       0       -       -       -   -  -
 --------------------------------------------------------------------------
   59687     795    2955    18.3  7414.5   476.5  93% total

 14%|o
    |*
    |*                                                         o
    |*                                                         o
  0%|*oooooooooooooooooooooooooooooooooooooooooooooooooooooooooo*
    97                    days ago of the last scrub/sync                 0

The oldest block was scrubbed 97 days ago, the median 45, the newest 2.

No sync is in progress.
25% of the array is not scrubbed.
No file has a zero sub-second timestamp.
No rehash is in progress or needed.
No error detected.
";

    fn table(rows: &str, totals: &str) -> String {
        format!(
            "SnapRAID status report:\n\n\
             Files Fragmented Excess  Wasted  Used    Free  Use Name\n\
             Files  Fragments  GB      GB      GB\n\
             {rows}\
             ----------------------------------------\n\
             {totals}\n"
        )
    }

    #[test]
    fn test_report() {
        let outcome = parse(REPORT);
        assert!(outcome.warnings.is_empty());
        let report = outcome.value;
        assert_eq!(
            vec![
                UnitCapacity {
                    name: "d1".to_string(),
                    capacity: Capacity {
                        file_count: 29546,
                        fragmented_count: 394,
                        excess_fragment_count: 1436,
                        used_gb: 3724.0,
                        free_gb: 221.0,
                        use_percent: 94.0,
                    },
                },
                UnitCapacity {
                    name: "d2".to_string(),
                    capacity: Capacity {
                        file_count: 30141,
                        fragmented_count: 401,
                        excess_fragment_count: 1519,
                        used_gb: 3690.5,
                        free_gb: 255.5,
                        use_percent: 93.0,
                    },
                },
            ],
            report.units
        );
        assert_eq!(
            Capacity {
                file_count: 59687,
                fragmented_count: 795,
                excess_fragment_count: 2955,
                used_gb: 7414.5,
                free_gb: 476.5,
                use_percent: 93.0,
            },
            report.totals
        );
        assert_eq!(
            ScrubStatus {
                oldest_days: 97,
                median_days: 45,
                newest_days: 2,
                coverage_ratio: 0.75,
            },
            report.scrub
        );
        assert_eq!(OperationalFlags::default(), report.flags);
    }

    #[test]
    fn test_sentinel_name_is_excluded() {
        let text = table("1 2 3 0.1 4.0 5.0 50% -\n", "");
        let outcome = parse(&text);
        assert!(outcome.value.units.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[rstest]
    #[case("1 2 3 0.1 4.0 5.0 50%")]
    #[case("1 2 3 0.1 4.0 5.0 50% d1 extra")]
    #[case("Files Frag Excess Wasted Used Free Use Name")]
    fn test_ignored_rows(#[case] row: &str) {
        let text = table(&format!("{row}\n"), "");
        let outcome = parse(&text);
        assert!(outcome.value.units.is_empty(), "{row}");
        assert!(outcome.warnings.is_empty(), "{row}");
    }

    #[test]
    fn test_invalid_row_is_dropped() {
        let text = table(
            "1 2 3 0.1 4.0 5.0 50% d1\n1 2 3 - - - - d2\n",
            "",
        );
        let outcome = parse(&text);
        assert_eq!(1, outcome.value.units.len());
        assert_eq!("d1", outcome.value.units[0].name);
        assert_eq!(1, outcome.warnings.len());
        assert_eq!(6, outcome.warnings[0].number);
    }

    #[test]
    fn test_totals_with_seven_fields_are_zero() {
        let text = table(
            "1 2 3 0.1 4.0 5.0 50% d1\n",
            "1 2 3 0.1 4.0 5.0 50%",
        );
        let report = parse(&text).value;
        assert_eq!(1, report.units.len());
        assert_eq!(Capacity::default(), report.totals);
    }

    #[test]
    fn test_totals_are_not_recomputed() {
        let text = table(
            "1 2 3 0.1 4.0 5.0 50% d1\n10 20 30 0.1 40.0 50.0 50% d2\n",
            "100 200 300 0.2 400.0 500.0 50% total",
        );
        let report = parse(&text).value;
        assert_eq!(100, report.totals.file_count);
        assert_eq!(400.0, report.totals.used_gb);
    }

    #[test]
    fn test_invalid_totals() {
        let text = table("", "x 200 300 0.2 400.0 500.0 50% total");
        let outcome = parse(&text);
        assert_eq!(Capacity::default(), outcome.value.totals);
        assert_eq!(1, outcome.warnings.len());
    }

    #[test]
    fn test_table_without_end() {
        let text = "   Files Fragmented Excess  Wasted  Used    Free  Use Name\n\
                    \n\
                    1 2 3 0.1 4.0 5.0 50% d1\n";
        let report = parse(text).value;
        assert!(report.units.is_empty());
        assert_eq!(Capacity::default(), report.totals);
    }

    #[test]
    fn test_ruler_before_rows() {
        let text = "   Files Fragmented Excess  Wasted  Used    Free  Use Name\n\
                    --------\n\
                    1 2 3 0.1 4.0 5.0 50% d1\n";
        let report = parse(text).value;
        assert!(report.units.is_empty());
        assert_eq!(1, report.totals.file_count);
    }

    #[rstest]
    #[case("The 25% of the array is not scrubbed.", 0.75)]
    #[case("100% of the array is not scrubbed.", 0.0)]
    #[case("0% of the array is not scrubbed.", 1.0)]
    #[case("The array is fully scrubbed.", 1.0)]
    fn test_coverage(#[case] text: &str, #[case] expected: f64) {
        assert_eq!(expected, parse(text).value.scrub.coverage_ratio);
    }

    #[test]
    fn test_scrub_days_absent() {
        let scrub = parse("The oldest block was scrubbed recently.").value.scrub;
        assert_eq!(ScrubStatus::default(), scrub);
        assert_eq!(1.0, scrub.coverage_ratio);
    }

    #[rstest]
    #[case("No sync is in progress.", false, true, true, true)]
    #[case("No file has a zero sub-second timestamp.", true, false, true, true)]
    #[case("No rehash is in progress or needed.", true, true, false, true)]
    #[case("No error detected.", true, true, true, false)]
    #[case("", true, true, true, true)]
    fn test_flags(
        #[case] text: &str,
        #[case] sync_in_progress: bool,
        #[case] zero_subsecond_timestamps: bool,
        #[case] rehash_needed: bool,
        #[case] errors_detected: bool,
    ) {
        assert_eq!(
            OperationalFlags {
                sync_in_progress,
                zero_subsecond_timestamps,
                rehash_needed,
                errors_detected,
            },
            parse(text).value.flags
        );
    }

    #[test]
    fn test_metrics() {
        let expected = "# HELP snapraid_disk_files_total Number of files on each disk
# TYPE snapraid_disk_files_total gauge
snapraid_disk_files_total{name=\"d1\"} 29546
snapraid_disk_files_total{name=\"d2\"} 30141

# HELP snapraid_disk_fragmented_files Number of fragmented files on each disk
# TYPE snapraid_disk_fragmented_files gauge
snapraid_disk_fragmented_files{name=\"d1\"} 394
snapraid_disk_fragmented_files{name=\"d2\"} 401

# HELP snapraid_disk_excess_fragments Number of excess fragments on each disk
# TYPE snapraid_disk_excess_fragments gauge
snapraid_disk_excess_fragments{name=\"d1\"} 1436
snapraid_disk_excess_fragments{name=\"d2\"} 1519

# HELP snapraid_disk_space_bytes Disk space information in bytes
# TYPE snapraid_disk_space_bytes gauge
snapraid_disk_space_bytes{name=\"d1\",type=\"used\"} 3724000000000
snapraid_disk_space_bytes{name=\"d1\",type=\"free\"} 221000000000
snapraid_disk_space_bytes{name=\"d2\",type=\"used\"} 3690500000000
snapraid_disk_space_bytes{name=\"d2\",type=\"free\"} 255500000000

# HELP snapraid_array_files_total Total number of files in the array
# TYPE snapraid_array_files_total gauge
snapraid_array_files_total 59687

# HELP snapraid_array_fragmented_files_total Total number of fragmented files in the array
# TYPE snapraid_array_fragmented_files_total gauge
snapraid_array_fragmented_files_total 795

# HELP snapraid_array_excess_fragments_total Total number of excess fragments in the array
# TYPE snapraid_array_excess_fragments_total gauge
snapraid_array_excess_fragments_total 2955

# HELP snapraid_array_space_bytes Array space information in bytes
# TYPE snapraid_array_space_bytes gauge
snapraid_array_space_bytes{type=\"used\"} 7414500000000
snapraid_array_space_bytes{type=\"free\"} 476500000000

# HELP snapraid_scrub_age_days Age of blocks in days
# TYPE snapraid_scrub_age_days gauge
snapraid_scrub_age_days{type=\"oldest\"} 97
snapraid_scrub_age_days{type=\"median\"} 45
snapraid_scrub_age_days{type=\"newest\"} 2

# HELP snapraid_scrub_coverage_ratio Ratio of array that has been scrubbed (0.0-1.0)
# TYPE snapraid_scrub_coverage_ratio gauge
snapraid_scrub_coverage_ratio 0.75

# HELP snapraid_status Various status indicators
# TYPE snapraid_status gauge
snapraid_status{type=\"sync_in_progress\"} 0
snapraid_status{type=\"zero_subsecond_timestamps\"} 0
snapraid_status{type=\"rehash_needed\"} 0
snapraid_status{type=\"errors_detected\"} 0
";
        assert_eq!(expected, parse(REPORT).value.to_string());
    }
}
