// src/dag/schedule.rs
use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

/// Fixed-interval schedule.
///
/// The run with logical date `t` covers `[t, t + interval)` and becomes due
/// once that interval has ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub start_date: DateTime<Utc>,
    pub interval: Duration,
    /// Run every missed interval instead of jumping to the latest.
    pub catchup: bool,
}

impl Schedule {
    pub fn new(start_date: DateTime<Utc>, interval: Duration, catchup: bool) -> Self {
        Self {
            start_date,
            interval,
            catchup,
        }
    }

    fn step(&self) -> TimeDelta {
        let step = TimeDelta::from_std(self.interval).unwrap_or(TimeDelta::MAX);
        step.max(TimeDelta::milliseconds(1))
    }

    /// Logical date of the most recent interval that has fully ended by `now`.
    pub fn latest_complete(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let elapsed = (now - self.start_date).num_milliseconds();
        let step = self.step().num_milliseconds();
        if elapsed < step {
            return None;
        }
        let k = elapsed / step;
        Some(self.start_date + TimeDelta::milliseconds((k - 1) * step))
    }

    /// `None` when the next logical date falls off the calendar.
    fn candidate(&self, last: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
        match last {
            Some(l) => l.checked_add_signed(self.step()),
            None => Some(self.start_date),
        }
    }

    /// Next logical date to run given the last one that ran, or `None` when
    /// nothing is due yet.
    pub fn next_due(
        &self,
        last: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let latest = self.latest_complete(now)?;
        let candidate = self.candidate(last)?;
        let candidate = if self.catchup {
            candidate
        } else {
            candidate.max(latest)
        };
        (candidate <= latest).then_some(candidate)
    }

    /// Wall-clock time at which the next run becomes due, or `None` if no
    /// further interval can end.
    pub fn next_wakeup(
        &self,
        last: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        if self.next_due(last, now).is_some() {
            return Some(now);
        }
        self.candidate(last)?.checked_add_signed(self.step())
    }
}
