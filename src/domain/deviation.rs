//! Deviation computer.
//!
//! Joins the financial rows against the affiliation map, computes the
//! all/red/blue intake-outflow ratios and reports how far each segment sits
//! from the nationwide ratio per year.

use crate::domain::affiliation::{
    AffiliationMap, Color, DEFAULT_RED_PARTY, Overlap, classify, classify_strict,
};
use crate::domain::error::RedblueError;
use crate::domain::ratio::{
    Discrepancy, RECONCILE_TOLERANCE, Ratio, RatioMap, YearlySum, ratio, reconcile, sum_per_year,
};
use crate::domain::record::{Column, ElectionRecord, FinancialRecord};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// What to do when a year lacks affiliation data or a segment ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingYearPolicy {
    /// Abort with [`RedblueError::MissingYear`].
    #[default]
    Fail,
    /// Best effort: drop the year from the output and log a warning.
    Skip,
}

impl FromStr for MissingYearPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail" => Ok(MissingYearPolicy::Fail),
            "skip" => Ok(MissingYearPolicy::Skip),
            other => Err(format!("expected 'fail' or 'skip', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviationOptions {
    pub red_party: String,
    pub missing_year: MissingYearPolicy,
    pub reject_overlap: bool,
}

impl Default for DeviationOptions {
    fn default() -> Self {
        Self {
            red_party: DEFAULT_RED_PARTY.to_string(),
            missing_year: MissingYearPolicy::Fail,
            reject_overlap: false,
        }
    }
}

/// Nationwide ratio plus each segment's signed distance from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YearDeviation {
    pub all: Ratio,
    pub reds: Ratio,
    pub blues: Ratio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoElectionData,
    NoSegmentRows(Color),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoElectionData => write!(f, "no election results"),
            SkipReason::NoSegmentRows(color) => write!(f, "no {color}-state financial rows"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedYear {
    pub year: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviationReport {
    pub years: BTreeMap<String, YearDeviation>,
    /// Rows whose state is in neither the red nor the blue set for its year.
    pub excluded: usize,
    pub skipped_years: Vec<SkippedYear>,
    pub overlaps: Vec<Overlap>,
    pub discrepancies: Vec<Discrepancy>,
}

/// Financial rows split by their state's affiliation in the row's year.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub red: Vec<&'a FinancialRecord>,
    pub blue: Vec<&'a FinancialRecord>,
    pub excluded: Vec<&'a FinancialRecord>,
    /// Years with financial rows but no election results (Skip policy only).
    pub unaffiliated_years: BTreeSet<String>,
}

/// Split `records` into red and blue rows.
///
/// A row joins the red (blue) side iff its state is in that year's red (blue)
/// set, so a state listed under both colors lands on both sides.
pub fn partition<'a>(
    records: &'a [FinancialRecord],
    affiliation: &AffiliationMap,
    policy: MissingYearPolicy,
) -> Result<Partition<'a>, RedblueError> {
    records
        .iter()
        .try_fold(Partition::default(), |mut part, record| {
            let Some(aff) = affiliation.get(&record.year) else {
                if policy == MissingYearPolicy::Fail {
                    return Err(RedblueError::MissingYear {
                        year: record.year.clone(),
                        reason: format!("no election results (financial row for {})", record.state),
                    });
                }
                part.unaffiliated_years.insert(record.year.clone());
                return Ok(part);
            };

            let in_red = aff.contains(Color::Red, &record.state);
            let in_blue = aff.contains(Color::Blue, &record.state);
            if in_red {
                part.red.push(record);
            }
            if in_blue {
                part.blue.push(record);
            }
            if !in_red && !in_blue {
                part.excluded.push(record);
            }
            Ok(part)
        })
}

struct Totals {
    intake: YearlySum,
    outflow: YearlySum,
}

impl Totals {
    fn compute<'a, I>(records: I) -> Result<Self, RedblueError>
    where
        I: IntoIterator<Item = &'a FinancialRecord> + Clone,
    {
        Ok(Self {
            intake: sum_per_year(records.clone(), Column::Intake)?,
            outflow: sum_per_year(records, Column::Outflow)?,
        })
    }

    fn ratios(&self) -> Result<RatioMap, RedblueError> {
        ratio(&self.intake, &self.outflow)
    }
}

/// Compute per-year deviations of the red and blue ratios from the
/// nationwide ratio.
pub fn diff_ratios(
    financial: &[FinancialRecord],
    election: &[ElectionRecord],
    options: &DeviationOptions,
) -> Result<DeviationReport, RedblueError> {
    let affiliation = if options.reject_overlap {
        classify_strict(election, &options.red_party)?
    } else {
        classify(election, &options.red_party)
    };
    let overlaps = affiliation.overlaps();
    for overlap in &overlaps {
        warn!(
            year = %overlap.year,
            state = %overlap.state,
            "state classified both red and blue; its rows count toward both segments"
        );
    }
    debug!(years = affiliation.len(), "classified election results");

    let part = partition(financial, &affiliation, options.missing_year)?;
    if !part.excluded.is_empty() {
        warn!(
            count = part.excluded.len(),
            "financial rows excluded: state has no election result for that year"
        );
        for record in &part.excluded {
            debug!(state = %record.state, year = %record.year, "excluded row");
        }
    }
    debug!(
        red = part.red.len(),
        blue = part.blue.len(),
        excluded = part.excluded.len(),
        "partitioned financial rows"
    );

    let all = Totals::compute(financial)?;
    let red = Totals::compute(part.red.iter().copied())?;
    let blue = Totals::compute(part.blue.iter().copied())?;

    let all_ratios = all.ratios()?;
    let red_ratios = red.ratios()?;
    let blue_ratios = blue.ratios()?;

    let mut years = BTreeMap::new();
    let mut skipped_years = Vec::new();

    for (year, &all_ratio) in &all_ratios {
        if part.unaffiliated_years.contains(year) {
            skip_year(&mut skipped_years, year, SkipReason::NoElectionData);
            continue;
        }

        let segment = |ratios: &RatioMap, color: Color| -> Result<Option<Ratio>, RedblueError> {
            match ratios.get(year) {
                Some(&r) => Ok(Some(r)),
                None if options.missing_year == MissingYearPolicy::Skip => Ok(None),
                None => Err(RedblueError::MissingYear {
                    year: year.clone(),
                    reason: SkipReason::NoSegmentRows(color).to_string(),
                }),
            }
        };

        let Some(red_ratio) = segment(&red_ratios, Color::Red)? else {
            skip_year(&mut skipped_years, year, SkipReason::NoSegmentRows(Color::Red));
            continue;
        };
        let Some(blue_ratio) = segment(&blue_ratios, Color::Blue)? else {
            skip_year(&mut skipped_years, year, SkipReason::NoSegmentRows(Color::Blue));
            continue;
        };

        years.insert(
            year.clone(),
            YearDeviation {
                all: all_ratio,
                reds: (red_ratio - all_ratio).finite(year, "red deviation")?,
                blues: (blue_ratio - all_ratio).finite(year, "blue deviation")?,
            },
        );
    }

    let mut discrepancies = Vec::new();
    if part.excluded.is_empty() && part.unaffiliated_years.is_empty() && overlaps.is_empty() {
        for (column, all_sum, red_sum, blue_sum) in [
            (Column::Intake, &all.intake, &red.intake, &blue.intake),
            (Column::Outflow, &all.outflow, &red.outflow, &blue.outflow),
        ] {
            discrepancies.extend(reconcile(
                all_sum,
                red_sum,
                blue_sum,
                column,
                RECONCILE_TOLERANCE,
            ));
        }
        for d in &discrepancies {
            warn!(
                year = %d.year,
                column = %d.column,
                expected = d.expected,
                actual = d.actual,
                "red + blue totals do not reconcile with all states"
            );
        }
    }

    Ok(DeviationReport {
        years,
        excluded: part.excluded.len(),
        skipped_years,
        overlaps,
        discrepancies,
    })
}

fn skip_year(skipped: &mut Vec<SkippedYear>, year: &str, reason: SkipReason) {
    warn!(year = %year, reason = %reason, "year omitted from output");
    skipped.push(SkippedYear {
        year: year.to_string(),
        reason,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn election(state: &str, year: &str, party: &str) -> ElectionRecord {
        ElectionRecord::new(state, year, party)
    }

    fn money(state: &str, year: &str, intake: &str, outflow: &str) -> FinancialRecord {
        FinancialRecord::new(state, year, intake, outflow)
    }

    fn skip_options() -> DeviationOptions {
        DeviationOptions {
            missing_year: MissingYearPolicy::Skip,
            ..DeviationOptions::default()
        }
    }

    fn two_state_election() -> Vec<ElectionRecord> {
        vec![
            election("TX", "2000", "Republican"),
            election("CA", "2000", "Democrat"),
        ]
    }

    #[test]
    fn concrete_two_state_scenario() {
        let financial = vec![
            money("TX", "2000", "100", "50"),
            money("CA", "2000", "60", "60"),
        ];
        let report =
            diff_ratios(&financial, &two_state_election(), &DeviationOptions::default()).unwrap();

        let dev = report.years["2000"];
        assert_abs_diff_eq!(dev.all.value().unwrap(), 1.4545, epsilon = 1e-4);
        assert_abs_diff_eq!(dev.reds.value().unwrap(), 0.5455, epsilon = 1e-4);
        assert_abs_diff_eq!(dev.blues.value().unwrap(), -0.4545, epsilon = 1e-4);
        assert_eq!(report.excluded, 0);
        assert!(report.skipped_years.is_empty());
        assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn single_red_state_fails_without_blue_rows() {
        let financial = vec![money("TX", "2000", "100", "50")];
        let elections = vec![election("TX", "2000", "Republican")];

        let err = diff_ratios(&financial, &elections, &DeviationOptions::default()).unwrap_err();
        assert!(matches!(err, RedblueError::MissingYear { year, .. } if year == "2000"));
    }

    #[test]
    fn single_red_state_omitted_in_best_effort_mode() {
        let financial = vec![money("TX", "2000", "100", "50")];
        let elections = vec![election("TX", "2000", "Republican")];

        let report = diff_ratios(&financial, &elections, &skip_options()).unwrap();
        assert!(report.years.is_empty());
        assert_eq!(
            report.skipped_years,
            vec![SkippedYear {
                year: "2000".into(),
                reason: SkipReason::NoSegmentRows(Color::Blue),
            }]
        );
    }

    #[test]
    fn single_red_state_reds_deviation_is_zero() {
        let financial = vec![
            money("TX", "2000", "100", "50"),
            money("CA", "2000", "0", "0"),
        ];
        let report =
            diff_ratios(&financial, &two_state_election(), &DeviationOptions::default()).unwrap();
        let dev = report.years["2000"];
        assert_abs_diff_eq!(dev.all.value().unwrap(), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dev.reds.value().unwrap(), 0.0, epsilon = 1e-9);
        assert!(dev.blues.is_undefined());
    }

    #[test]
    fn financial_year_without_election_data_fails() {
        let financial = vec![
            money("TX", "2000", "100", "50"),
            money("TX", "2002", "1", "1"),
        ];
        let err =
            diff_ratios(&financial, &two_state_election(), &DeviationOptions::default()).unwrap_err();
        assert!(matches!(err, RedblueError::MissingYear { year, .. } if year == "2002"));
    }

    #[test]
    fn financial_year_without_election_data_skipped_when_opted_in() {
        let financial = vec![
            money("TX", "2000", "100", "50"),
            money("CA", "2000", "60", "60"),
            money("TX", "2002", "1", "1"),
        ];
        let report = diff_ratios(&financial, &two_state_election(), &skip_options()).unwrap();

        assert_eq!(report.years.keys().collect::<Vec<_>>(), vec!["2000"]);
        assert_eq!(
            report.skipped_years,
            vec![SkippedYear {
                year: "2002".into(),
                reason: SkipReason::NoElectionData,
            }]
        );
    }

    #[test]
    fn unknown_state_is_excluded_and_counted() {
        let financial = vec![
            money("TX", "2000", "100", "50"),
            money("CA", "2000", "60", "60"),
            money("PR", "2000", "30", "10"),
        ];
        let report =
            diff_ratios(&financial, &two_state_election(), &DeviationOptions::default()).unwrap();

        assert_eq!(report.excluded, 1);
        let dev = report.years["2000"];
        // PR still counts toward the nationwide ratio
        assert_abs_diff_eq!(dev.all.value().unwrap(), 190.0 / 120.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dev.reds.value().unwrap(), 2.0 - 190.0 / 120.0, epsilon = 1e-9);
        assert!(report.discrepancies.is_empty());
    }

    #[test]
    fn zero_outflow_year_propagates_undefined() {
        let financial = vec![money("TX", "2000", "100", "0"), money("CA", "2000", "60", "0")];
        let report =
            diff_ratios(&financial, &two_state_election(), &DeviationOptions::default()).unwrap();

        let dev = report.years["2000"];
        assert!(dev.all.is_undefined());
        assert!(dev.reds.is_undefined());
        assert!(dev.blues.is_undefined());
    }

    #[test]
    fn overflowing_totals_abort_run() {
        let financial = vec![money("TX", "2000", "1e308", "1"), money("CA", "2000", "1e308", "1")];
        let err =
            diff_ratios(&financial, &two_state_election(), &DeviationOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            RedblueError::Overflow { ref year, ref what } if year == "2000" && what == "intake total"
        ));
        assert_eq!(err.exit_status(), 4);
    }

    #[test]
    fn parse_error_aborts_run() {
        let financial = vec![money("TX", "2000", "lots", "50"), money("CA", "2000", "60", "60")];
        let err =
            diff_ratios(&financial, &two_state_election(), &DeviationOptions::default()).unwrap_err();
        assert!(matches!(err, RedblueError::Parse { state, .. } if state == "TX"));
    }

    #[test]
    fn overlap_counts_state_in_both_segments() {
        let elections = vec![
            election("GA", "2020", "Republican"),
            election("GA", "2020", "Democrat"),
            election("CA", "2020", "Democrat"),
        ];
        let financial = vec![money("GA", "2020", "10", "10"), money("CA", "2020", "30", "10")];
        let report = diff_ratios(&financial, &elections, &DeviationOptions::default()).unwrap();

        assert_eq!(report.overlaps.len(), 1);
        let dev = report.years["2020"];
        assert_abs_diff_eq!(dev.all.value().unwrap(), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dev.reds.value().unwrap(), -1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(dev.blues.value().unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn overlap_rejected_when_configured() {
        let elections = vec![
            election("GA", "2020", "Republican"),
            election("GA", "2020", "Democrat"),
        ];
        let financial = vec![money("GA", "2020", "10", "10")];
        let options = DeviationOptions {
            reject_overlap: true,
            ..DeviationOptions::default()
        };
        let err = diff_ratios(&financial, &elections, &options).unwrap_err();
        assert!(matches!(err, RedblueError::AffiliationOverlap { .. }));
    }

    #[test]
    fn output_keys_match_all_ratio_years() {
        let elections = vec![
            election("TX", "2000", "Republican"),
            election("CA", "2000", "Democrat"),
            election("TX", "2004", "Republican"),
            election("CA", "2004", "Democrat"),
        ];
        let financial = vec![
            money("CA", "2004", "5", "4"),
            money("TX", "2000", "100", "50"),
            money("TX", "2004", "3", "6"),
            money("CA", "2000", "60", "60"),
        ];
        let report = diff_ratios(&financial, &elections, &DeviationOptions::default()).unwrap();
        assert_eq!(report.years.keys().collect::<Vec<_>>(), vec!["2000", "2004"]);
    }

    #[test]
    fn partition_splits_and_excludes() {
        let affiliation = classify(&two_state_election(), DEFAULT_RED_PARTY);
        let financial = vec![
            money("TX", "2000", "1", "1"),
            money("CA", "2000", "1", "1"),
            money("GU", "2000", "1", "1"),
        ];
        let part = partition(&financial, &affiliation, MissingYearPolicy::Fail).unwrap();
        assert_eq!(part.red.len(), 1);
        assert_eq!(part.red[0].state, "TX");
        assert_eq!(part.blue.len(), 1);
        assert_eq!(part.blue[0].state, "CA");
        assert_eq!(part.excluded.len(), 1);
        assert!(part.unaffiliated_years.is_empty());
    }

    #[test]
    fn partition_collects_unaffiliated_years_when_skipping() {
        let affiliation = classify(&two_state_election(), DEFAULT_RED_PARTY);
        let financial = vec![money("TX", "1999", "1", "1")];
        let part = partition(&financial, &affiliation, MissingYearPolicy::Skip).unwrap();
        assert!(part.red.is_empty());
        assert!(part.unaffiliated_years.contains("1999"));
    }

    #[test]
    fn missing_year_policy_from_str() {
        assert_eq!("fail".parse::<MissingYearPolicy>(), Ok(MissingYearPolicy::Fail));
        assert_eq!(" Skip ".parse::<MissingYearPolicy>(), Ok(MissingYearPolicy::Skip));
        assert!("ignore".parse::<MissingYearPolicy>().is_err());
    }
}
