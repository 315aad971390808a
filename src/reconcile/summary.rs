//! Per-day and per-range attendance counts.
//!
//! "Present" has a single meaning everywhere: a non-leave attendance row whose
//! employee is not covered by an approved leave on that day. "Late" is the
//! late subset of present, "absent" counts employees covered by an approved
//! leave request on the day.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::attendance::AttendanceRecord;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::reconcile::ledger::{covering_days, is_absent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
pub struct DaySummary {
    #[schema(example = 12)]
    pub present: usize,
    #[schema(example = 2)]
    pub late: usize,
    #[schema(example = 1)]
    pub absent: usize,
}

/// Which list the daily drill-down shows. Chosen per request by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DetailKind {
    Present,
    Late,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DayBreakdown<'a> {
    pub present: Vec<&'a AttendanceRecord>,
    pub absent: Vec<&'a LeaveRequest>,
}

impl<'a> DayBreakdown<'a> {
    pub fn late(&self) -> impl Iterator<Item = &'a AttendanceRecord> + '_ {
        self.present.iter().copied().filter(|r| r.status.is_late())
    }

    pub fn summary(&self) -> DaySummary {
        DaySummary {
            present: self.present.len(),
            late: self.late().count(),
            absent: self.absent.len(),
        }
    }
}

fn breakdown<'a>(
    date: NaiveDate,
    records: impl IntoIterator<Item = &'a AttendanceRecord>,
    leaves: impl IntoIterator<Item = &'a LeaveRequest>,
) -> DayBreakdown<'a> {
    // one entry per employee, overlapping requests collapse to the first
    let mut on_leave: HashSet<&str> = HashSet::new();
    let absent: Vec<&LeaveRequest> = leaves
        .into_iter()
        .filter(|l| l.status == LeaveStatus::Approved && is_absent(l, date))
        .filter(|l| on_leave.insert(l.name.as_str()))
        .collect();

    let present = records
        .into_iter()
        .filter(|r| r.date == date && !r.status.is_leave())
        .filter(|r| !on_leave.contains(r.name.as_str()))
        .collect();

    DayBreakdown { present, absent }
}

pub fn daily_breakdown<'a>(
    date: NaiveDate,
    records: &'a [AttendanceRecord],
    leaves: &'a [LeaveRequest],
) -> DayBreakdown<'a> {
    breakdown(date, records, leaves)
}

pub fn daily_summary(
    date: NaiveDate,
    records: &[AttendanceRecord],
    leaves: &[LeaveRequest],
) -> DaySummary {
    breakdown(date, records, leaves).summary()
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CalendarEntry {
    #[schema(example = "2024-05-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub summary: DaySummary,
    /// Short label for the calendar cell.
    #[schema(example = "P:12 L:2 A:1")]
    pub title: String,
}

impl CalendarEntry {
    fn new(date: NaiveDate, summary: DaySummary) -> Self {
        Self {
            date,
            title: format!("P:{} L:{} A:{}", summary.present, summary.late, summary.absent),
            summary,
        }
    }
}

/// Counts for every day that has attendance rows or is covered by an approved
/// leave, optionally limited to `window` (inclusive), in date order.
pub fn calendar_feed(
    records: &[AttendanceRecord],
    leaves: &[LeaveRequest],
    window: Option<(NaiveDate, NaiveDate)>,
) -> Vec<CalendarEntry> {
    let in_window = |day: NaiveDate| window.is_none_or(|(from, to)| from <= day && day <= to);

    let mut rows_by_day: BTreeMap<NaiveDate, Vec<&AttendanceRecord>> = BTreeMap::new();
    for record in records.iter().filter(|r| in_window(r.date)) {
        rows_by_day.entry(record.date).or_default().push(record);
    }

    let mut leaves_by_day: BTreeMap<NaiveDate, Vec<&LeaveRequest>> = BTreeMap::new();
    for leave in leaves.iter().filter(|l| l.status == LeaveStatus::Approved) {
        let days = covering_days(leave);
        let days: Box<dyn Iterator<Item = NaiveDate>> = match window {
            Some((from, to)) => Box::new(
                days.skip_while(move |d| *d < from)
                    .take_while(move |d| *d <= to),
            ),
            None => Box::new(days),
        };
        for day in days {
            leaves_by_day.entry(day).or_default().push(leave);
        }
    }

    let domain: BTreeSet<NaiveDate> = rows_by_day
        .keys()
        .chain(leaves_by_day.keys())
        .copied()
        .collect();

    domain
        .into_iter()
        .map(|day| {
            let rows = rows_by_day.get(&day).into_iter().flatten().copied();
            let covering = leaves_by_day.get(&day).into_iter().flatten().copied();
            CalendarEntry::new(day, breakdown(day, rows, covering).summary())
        })
        .collect()
}
