use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use chrono::NaiveDate;

use crate::dataset::{Dataset, DispatchRecord};
use crate::error::{RegopError, Result};
use crate::fmt::hour_interval;
use crate::names::Canonicalizer;

pub const HOURS_PER_DAY: u8 = 24;
pub const TOTAL_LABEL: &str = "TOTAL";

// ---------------------------------------------------------------------------
// Dataset summaries
// ---------------------------------------------------------------------------

/// Distinct parsed dates, ascending. Empty when no date parsed.
pub fn available_dates(ds: &Dataset) -> Vec<NaiveDate> {
    ds.records
        .iter()
        .filter_map(|r| r.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn destinations(ds: &Dataset) -> Vec<String> {
    ds.records
        .iter()
        .map(|r| r.destination.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn companies(ds: &Dataset) -> Vec<String> {
    ds.records
        .iter()
        .map(|r| r.company.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Filter {
    pub date: NaiveDate,
    pub destinations: BTreeSet<String>,
    /// Canonical company names, in the order reports are produced.
    pub companies: Vec<String>,
    pub hours: RangeInclusive<u8>,
}

impl Filter {
    /// Build a filter, canonicalizing the requested company names and
    /// validating the hour range.
    pub fn new(
        date: NaiveDate,
        destinations: impl IntoIterator<Item = String>,
        companies: impl IntoIterator<Item = String>,
        min_hour: u8,
        max_hour: u8,
        names: &Canonicalizer,
    ) -> Result<Self> {
        if max_hour >= HOURS_PER_DAY {
            return Err(RegopError::Filter(format!(
                "hour {max_hour} is out of range (0-23)"
            )));
        }
        if min_hour > max_hour {
            return Err(RegopError::Filter(format!(
                "start hour {min_hour} is after end hour {max_hour}"
            )));
        }
        let mut seen = BTreeSet::new();
        let companies = companies
            .into_iter()
            .map(|c| names.canonical(&c))
            .filter(|c| seen.insert(c.clone()))
            .collect();
        Ok(Self {
            date,
            destinations: destinations.into_iter().map(|d| d.trim().to_string()).collect(),
            companies,
            hours: min_hour..=max_hour,
        })
    }

    fn matches(&self, r: &DispatchRecord) -> bool {
        r.date == Some(self.date)
            && self.destinations.contains(&r.destination)
            && r.hour.is_some_and(|h| self.hours.contains(&h))
    }
}

// ---------------------------------------------------------------------------
// Per-company output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourCount {
    pub hour: u8,
    pub destination: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalRow {
    pub hour: u8,
    pub label: String,
    /// One count per matrix destination, same order.
    pub counts: Vec<u32>,
}

/// Hour-interval x destination counts with a trailing totals row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalMatrix {
    pub destinations: Vec<String>,
    pub rows: Vec<IntervalRow>,
    pub totals: Vec<u32>,
}

impl IntervalMatrix {
    fn build(destinations: &[String], series: &[HourCount]) -> Self {
        let col: BTreeMap<&str, usize> = destinations
            .iter()
            .enumerate()
            .map(|(i, d)| (d.as_str(), i))
            .collect();
        let mut rows: Vec<IntervalRow> = (0..HOURS_PER_DAY)
            .map(|hour| IntervalRow {
                hour,
                label: hour_interval(hour),
                counts: vec![0; destinations.len()],
            })
            .collect();
        for hc in series {
            if let Some(&c) = col.get(hc.destination.as_str()) {
                rows[hc.hour as usize].counts[c] += hc.count;
            }
        }
        let totals = (0..destinations.len())
            .map(|c| rows.iter().map(|r| r.counts[c]).sum())
            .collect();
        Self {
            destinations: destinations.to_vec(),
            rows,
            totals,
        }
    }

    /// Same matrix restricted to hour rows that hold at least one dispatch.
    /// The totals row is unchanged.
    pub fn trimmed(&self) -> Self {
        Self {
            destinations: self.destinations.clone(),
            rows: self
                .rows
                .iter()
                .filter(|r| r.counts.iter().any(|c| *c > 0))
                .cloned()
                .collect(),
            totals: self.totals.clone(),
        }
    }

    pub fn count(&self, hour: u8, destination: &str) -> Option<u32> {
        let c = self.destinations.iter().position(|d| d == destination)?;
        self.rows.iter().find(|r| r.hour == hour).map(|r| r.counts[c])
    }

    pub fn total(&self, destination: &str) -> Option<u32> {
        let c = self.destinations.iter().position(|d| d == destination)?;
        self.totals.get(c).copied()
    }

    pub fn grand_total(&self) -> u32 {
        self.totals.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyReport {
    pub company: String,
    /// Counts keyed by (hour, destination), sorted by hour then destination.
    pub series: Vec<HourCount>,
    pub matrix: IntervalMatrix,
}

impl CompanyReport {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// One report per filter company, in filter order. Companies with no
/// matching rows get an empty series and an all-zero matrix.
pub fn build_reports(ds: &Dataset, filter: &Filter) -> Vec<CompanyReport> {
    let matching: Vec<&DispatchRecord> = ds.records.iter().filter(|r| filter.matches(r)).collect();
    tracing::debug!(
        date = %filter.date,
        matching = matching.len(),
        companies = filter.companies.len(),
        "filter applied"
    );
    let destinations: Vec<String> = filter.destinations.iter().cloned().collect();

    filter
        .companies
        .iter()
        .map(|company| {
            let mut counts: BTreeMap<(u8, &str), u32> = BTreeMap::new();
            for r in matching.iter().filter(|r| &r.company == company) {
                if let Some(hour) = r.hour {
                    *counts.entry((hour, r.destination.as_str())).or_default() += 1;
                }
            }
            let series: Vec<HourCount> = counts
                .into_iter()
                .map(|((hour, destination), count)| HourCount {
                    hour,
                    destination: destination.to_string(),
                    count,
                })
                .collect();
            let matrix = IntervalMatrix::build(&destinations, &series);
            CompanyReport {
                company: company.clone(),
                series,
                matrix,
            }
        })
        .collect()
}
