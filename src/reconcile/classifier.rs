use chrono::NaiveTime;

use crate::model::attendance::AttendanceStatus;

pub const DEFAULT_CUTOFF: &str = "09:17";

const DEFAULT_CUTOFF_TIME: NaiveTime = match NaiveTime::from_hms_opt(9, 17, 0) {
    Some(time) => time,
    None => panic!("09:17 is a valid clock time"),
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punctuality {
    OnTime,
    Late,
    InvalidTime,
}

impl From<Punctuality> for AttendanceStatus {
    fn from(value: Punctuality) -> Self {
        match value {
            Punctuality::OnTime => AttendanceStatus::OnTime,
            Punctuality::Late => AttendanceStatus::Late,
            Punctuality::InvalidTime => AttendanceStatus::InvalidTime,
        }
    }
}

/// A clock-in as it arrives from the sheet: already a time, or raw cell text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchValue<'a> {
    Time(NaiveTime),
    Text(&'a str),
}

impl From<NaiveTime> for PunchValue<'_> {
    fn from(time: NaiveTime) -> Self {
        PunchValue::Time(time)
    }
}

impl<'a> From<&'a str> for PunchValue<'a> {
    fn from(text: &'a str) -> Self {
        PunchValue::Text(text)
    }
}

/// Parses an `HH:MM` wall-clock time. A single-digit hour is accepted.
pub fn parse_clock(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M").ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    cutoff: NaiveTime,
}

impl Classifier {
    pub fn new(cutoff: NaiveTime) -> Self {
        Self { cutoff }
    }

    pub fn cutoff(&self) -> NaiveTime {
        self.cutoff
    }

    /// Arrivals strictly after the cutoff are late; the cutoff minute itself is
    /// still on time.
    pub fn classify(&self, clock_in: Option<PunchValue<'_>>) -> Punctuality {
        let time = match clock_in {
            Some(PunchValue::Time(time)) => time,
            Some(PunchValue::Text(text)) => match parse_clock(text) {
                Some(time) => time,
                None => return Punctuality::InvalidTime,
            },
            None => return Punctuality::InvalidTime,
        };

        if time > self.cutoff {
            Punctuality::Late
        } else {
            Punctuality::OnTime
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_CUTOFF_TIME)
    }
}

/// Classifies against the default 09:17 cutoff.
pub fn classify(clock_in: Option<PunchValue<'_>>) -> Punctuality {
    Classifier::default().classify(clock_in)
}
