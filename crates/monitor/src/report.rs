use chrono::{DateTime, Timelike, Utc};
use std::collections::HashSet;

/// Gates the periodic position report.
///
/// A report is allowed on wall-clock minutes divisible by `every_minutes`,
/// and each such minute is allowed once for the lifetime of the throttle.
#[derive(Debug)]
pub struct ReportThrottle {
    every_minutes: u32,
    reported: HashSet<i64>,
}

impl ReportThrottle {
    /// `every_minutes == 0` disables reporting.
    #[must_use]
    pub fn new(every_minutes: u32) -> Self {
        Self {
            every_minutes,
            reported: HashSet::new(),
        }
    }

    /// Returns true the first time it is called within an eligible minute.
    pub fn should_report(&mut self, now: DateTime<Utc>) -> bool {
        if self.every_minutes == 0 || now.minute() % self.every_minutes != 0 {
            return false;
        }
        self.reported.insert(now.timestamp().div_euclid(60))
    }
}
