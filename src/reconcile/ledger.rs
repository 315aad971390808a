use std::ops::RangeInclusive;

use chrono::{Days, NaiveDate};

use crate::model::attendance::{AttendanceStatus, NewAttendance};
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

/// Pending may move to either terminal state; nothing leaves a terminal state.
pub fn can_transition(from: LeaveStatus, to: LeaveStatus) -> bool {
    from == LeaveStatus::Pending && to.is_terminal()
}

/// Inclusive span of days a request covers: `start ..= start + duration - 1`.
/// `None` when the span cannot be represented.
pub fn coverage(request: &LeaveRequest) -> Option<RangeInclusive<NaiveDate>> {
    let last_offset = u64::from(request.duration.checked_sub(1)?);
    let end = request.start_date.checked_add_days(Days::new(last_offset))?;
    Some(request.start_date..=end)
}

pub fn is_absent(request: &LeaveRequest, date: NaiveDate) -> bool {
    coverage(request).is_some_and(|range| range.contains(&date))
}

pub fn covering_days(request: &LeaveRequest) -> impl Iterator<Item = NaiveDate> + use<> {
    coverage(request).into_iter().flat_map(|range| {
        let end = *range.end();
        range.start().iter_days().take_while(move |day| *day <= end)
    })
}

/// One absence row per covered day, punches left empty.
pub fn expand_to_attendance(request: &LeaveRequest) -> Vec<NewAttendance> {
    covering_days(request)
        .map(|date| NewAttendance {
            name: request.name.clone(),
            division: request.division.clone(),
            date,
            clock_in: None,
            clock_out: None,
            status: AttendanceStatus::from(request.leave_type),
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::leave_request::LeaveType;

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub(crate) fn request(name: &str, start: NaiveDate, duration: u32) -> LeaveRequest {
        LeaveRequest {
            id: 1,
            name: name.into(),
            division: "Research".into(),
            leave_type: LeaveType::AnnualLeave,
            submitted_on: start,
            start_date: start,
            duration,
            status: LeaveStatus::Approved,
            has_supporting_doc: false,
            has_approval_doc: false,
        }
    }

    #[test]
    fn expansion_covers_each_day_once() {
        let request = request("Budi", date(2024, 5, 1), 3);
        let rows = expand_to_attendance(&request);

        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![date(2024, 5, 1), date(2024, 5, 2), date(2024, 5, 3)]);
        for row in rows {
            assert_eq!(row.status, AttendanceStatus::Leave(LeaveType::AnnualLeave));
            assert_eq!(row.clock_in, None);
            assert_eq!(row.clock_out, None);
            assert_eq!(row.name, "Budi");
        }
    }

    #[test]
    fn expansion_crosses_month_end() {
        let request = request("Sari", date(2024, 2, 28), 3);
        let last = expand_to_attendance(&request).last().map(|r| r.date);
        assert_eq!(last, Some(date(2024, 3, 1)));
    }

    #[test]
    fn absence_boundaries_are_inclusive() {
        let request = request("Budi", date(2024, 5, 1), 3);
        assert!(!is_absent(&request, date(2024, 4, 30)));
        assert!(is_absent(&request, date(2024, 5, 1)));
        assert!(is_absent(&request, date(2024, 5, 3)));
        assert!(!is_absent(&request, date(2024, 5, 4)));
    }

    #[test]
    fn zero_duration_covers_nothing() {
        let request = request("Budi", date(2024, 5, 1), 0);
        assert_eq!(coverage(&request), None);
        assert!(!is_absent(&request, date(2024, 5, 1)));
        assert!(expand_to_attendance(&request).is_empty());
    }

    #[test]
    fn terminal_states_are_final() {
        assert!(can_transition(LeaveStatus::Pending, LeaveStatus::Approved));
        assert!(can_transition(LeaveStatus::Pending, LeaveStatus::Rejected));
        assert!(!can_transition(LeaveStatus::Pending, LeaveStatus::Pending));
        assert!(!can_transition(LeaveStatus::Approved, LeaveStatus::Rejected));
        assert!(!can_transition(LeaveStatus::Rejected, LeaveStatus::Approved));
        assert!(!can_transition(LeaveStatus::Approved, LeaveStatus::Approved));
    }
}
