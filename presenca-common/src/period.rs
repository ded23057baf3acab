//! Attendance periods and the time-window policy
//!
//! Attendance is accepted in two daily windows, each a half-open range of
//! local wall-clock hours. Defaults: morning `[8, 12)`, afternoon `[13, 18)`.
//! Anything outside both windows (including exactly 12:00 and 18:00) is closed.
//!
//! No timezone normalization is performed: callers pass local time.

use crate::{Error, Result};
use chrono::Timelike;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A daily attendance period
///
/// Serialized with the backend's spelling (`manha` / `tarde`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttendancePeriod {
    #[serde(rename = "manha")]
    Morning,
    #[serde(rename = "tarde")]
    Afternoon,
}

impl AttendancePeriod {
    /// Value sent to the backend
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            AttendancePeriod::Morning => "manha",
            AttendancePeriod::Afternoon => "tarde",
        }
    }
}

impl fmt::Display for AttendancePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttendancePeriod::Morning => f.write_str("manhã"),
            AttendancePeriod::Afternoon => f.write_str("tarde"),
        }
    }
}

/// Half-open range of hours `[start_hour, end_hour)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl HourWindow {
    pub const fn new(start_hour: u32, end_hour: u32) -> Self {
        Self {
            start_hour,
            end_hour,
        }
    }

    pub fn contains(&self, hour: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }
}

impl fmt::Display for HourWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:00-{}:00", self.start_hour, self.end_hour)
    }
}

/// Maps a local timestamp to the active attendance period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindowPolicy {
    morning: HourWindow,
    afternoon: HourWindow,
}

impl Default for TimeWindowPolicy {
    fn default() -> Self {
        Self {
            morning: HourWindow::new(8, 12),
            afternoon: HourWindow::new(13, 18),
        }
    }
}

impl TimeWindowPolicy {
    /// Build a policy from explicit windows
    ///
    /// Each window must be non-empty and end no later than hour 24, and the
    /// morning window must end no later than the afternoon window starts.
    pub fn new(morning: HourWindow, afternoon: HourWindow) -> Result<Self> {
        for (name, window) in [("morning", morning), ("afternoon", afternoon)] {
            if window.start_hour >= window.end_hour || window.end_hour > 24 {
                return Err(Error::Config(format!(
                    "Invalid {} window {}: start must be before end and end at most 24",
                    name, window
                )));
            }
        }

        if morning.end_hour > afternoon.start_hour {
            return Err(Error::Config(format!(
                "Morning window {} overlaps afternoon window {}",
                morning, afternoon
            )));
        }

        Ok(Self { morning, afternoon })
    }

    /// Active period for `now`, or `None` when no window is open
    ///
    /// Pure: depends only on the hour of `now`.
    pub fn period_for<T: Timelike>(&self, now: &T) -> Option<AttendancePeriod> {
        let hour = now.hour();
        if self.morning.contains(hour) {
            Some(AttendancePeriod::Morning)
        } else if self.afternoon.contains(hour) {
            Some(AttendancePeriod::Afternoon)
        } else {
            None
        }
    }

    /// Human-readable window list, e.g. `8:00-12:00 ou 13:00-18:00`
    pub fn describe(&self) -> String {
        format!("{} ou {}", self.morning, self.afternoon)
    }
}
