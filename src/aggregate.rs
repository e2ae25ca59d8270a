//! Per-workflow daily success/failure series.
//!
//! Days are UTC calendar days. A series covers every day from the first run's
//! day through the last run's day, including days without runs.

use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::record::WorkflowRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub success: u32,
    pub failure: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowSeries {
    pub name: String,
    pub days: Vec<DayBucket>,
}

impl WorkflowSeries {
    pub fn labels(&self) -> Vec<String> {
        self.days.iter().map(|d| d.date.format("%Y-%m-%d").to_string()).collect()
    }

    pub fn success_counts(&self) -> Vec<u32> {
        self.days.iter().map(|d| d.success).collect()
    }

    pub fn failure_counts(&self) -> Vec<u32> {
        self.days.iter().map(|d| d.failure).collect()
    }
}

/// Half-open day range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `None` for an empty slice.
    pub fn of<'a, I>(records: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a WorkflowRecord>,
    {
        let mut iter = records.into_iter();
        let first = iter.next()?;
        let (min, max) = iter.fold((first.started_at, first.started_at), |(lo, hi), r| {
            (lo.min(r.started_at), hi.max(r.started_at))
        });
        let end = max.date_naive().checked_add_days(Days::new(1))?;
        Some(Self { start: min.date_naive(), end })
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d < end)
    }

    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

pub fn group_by_name(records: &[WorkflowRecord]) -> BTreeMap<&str, Vec<&WorkflowRecord>> {
    let mut groups: BTreeMap<&str, Vec<&WorkflowRecord>> = BTreeMap::new();
    for r in records {
        groups.entry(r.name.as_str()).or_default().push(r);
    }
    groups
}

fn series_for(name: &str, group: &[&WorkflowRecord]) -> Option<WorkflowSeries> {
    let range = DateRange::of(group.iter().copied())?;

    let mut counts: HashMap<NaiveDate, (u32, u32)> = HashMap::new();
    for r in group {
        let entry = counts.entry(r.day()).or_default();
        if r.is_success() {
            entry.0 += 1;
        } else if r.is_failure() {
            entry.1 += 1;
        }
    }

    let days = range
        .days()
        .map(|date| {
            let (success, failure) = counts.get(&date).copied().unwrap_or_default();
            DayBucket { date, success, failure }
        })
        .collect();
    Some(WorkflowSeries { name: name.to_string(), days })
}

/// Groups records by workflow name and buckets each group per UTC day.
pub fn aggregate(records: &[WorkflowRecord]) -> BTreeMap<String, WorkflowSeries> {
    group_by_name(records)
        .into_iter()
        .filter_map(|(name, group)| series_for(name, &group).map(|s| (name.to_string(), s)))
        .collect()
}

/// Summary line covering every record.
pub fn title(records: &[WorkflowRecord]) -> Option<String> {
    DateRange::of(records).map(|r| format!("From {} to {}", r.start, r.end))
}
