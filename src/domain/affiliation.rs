//! Affiliation classifier.
//!
//! Partitions the states of each election year into red (the configured
//! party won) and blue (anyone else won). The blue side is a catch-all, not a
//! two-party model.

use crate::domain::error::RedblueError;
use crate::domain::record::ElectionRecord;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub const DEFAULT_RED_PARTY: &str = "Republican";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    Red,
    Blue,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Blue => write!(f, "blue"),
        }
    }
}

/// Red and blue state sets for a single year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Affiliation {
    pub red: BTreeSet<String>,
    pub blue: BTreeSet<String>,
}

impl Affiliation {
    pub fn states(&self, color: Color) -> &BTreeSet<String> {
        match color {
            Color::Red => &self.red,
            Color::Blue => &self.blue,
        }
    }

    pub fn contains(&self, color: Color, state: &str) -> bool {
        self.states(color).contains(state)
    }
}

/// A state listed under both colors in the same year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlap {
    pub year: String,
    pub state: String,
}

/// Year -> red/blue partition. Built once by [`classify`], read-only after.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffiliationMap {
    by_year: BTreeMap<String, Affiliation>,
}

impl AffiliationMap {
    pub fn get(&self, year: &str) -> Option<&Affiliation> {
        self.by_year.get(year)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Affiliation)> {
        self.by_year.iter().map(|(y, a)| (y.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.by_year.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_year.is_empty()
    }

    pub fn overlaps(&self) -> Vec<Overlap> {
        self.by_year
            .iter()
            .flat_map(|(year, aff)| {
                aff.red.intersection(&aff.blue).map(move |state| Overlap {
                    year: year.clone(),
                    state: state.clone(),
                })
            })
            .collect()
    }
}

/// Build the year -> red/blue partition. `red_party` is matched exactly,
/// case-sensitive; every other party lands in the blue set.
pub fn classify(records: &[ElectionRecord], red_party: &str) -> AffiliationMap {
    let by_year = records.iter().fold(
        BTreeMap::<String, Affiliation>::new(),
        |mut acc, record| {
            let entry = acc.entry(record.year.clone()).or_default();
            if record.party == red_party {
                entry.red.insert(record.state.clone());
            } else {
                entry.blue.insert(record.state.clone());
            }
            acc
        },
    );
    AffiliationMap { by_year }
}

/// Like [`classify`], but a state appearing under both colors in one year is
/// an error rather than a warning.
pub fn classify_strict(
    records: &[ElectionRecord],
    red_party: &str,
) -> Result<AffiliationMap, RedblueError> {
    let map = classify(records, red_party);
    if let Some(overlap) = map.overlaps().into_iter().next() {
        return Err(RedblueError::AffiliationOverlap {
            year: overlap.year,
            state: overlap.state,
        });
    }
    Ok(map)
}
