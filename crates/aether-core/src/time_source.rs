//! Wall-clock sources for real-time synchronization.
//!
//! The time clock reads the hour of day from a [`TimeSource`] whenever it
//! runs in [`AdvanceMode::RealTimeSync`]. Production code uses
//! [`SystemTimeSource`]; tests use [`ManualTimeSource`] to drive the wall
//! clock by hand.
//!
//! [`AdvanceMode::RealTimeSync`]: aether_types::AdvanceMode::RealTimeSync

use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::{FixedOffset, Local, NaiveTime, Timelike, Utc};

use aether_types::HOURS_PER_DAY;

/// Seconds in one hour.
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Provider of the current wall-clock hour.
pub trait TimeSource: Send + Debug {
    /// Current hour of day, `[0, 24)`.
    fn hour_of_day(&self) -> f32;
}

/// Reads the operating system clock through `chrono`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemTimeSource {
    /// Fixed offset from UTC. `None` uses the machine's local zone.
    offset: Option<FixedOffset>,
}

impl SystemTimeSource {
    /// Follow the machine's local time zone.
    pub const fn local() -> Self {
        Self { offset: None }
    }

    /// Follow UTC shifted by `hours`.
    ///
    /// Returns `None` if the offset is not finite or lies outside
    /// `(-24, 24)` hours.
    pub fn with_utc_offset(hours: f32) -> Option<Self> {
        if !hours.is_finite() {
            return None;
        }
        let seconds = (f64::from(hours) * SECONDS_PER_HOUR).round();
        let seconds = i32::try_from(seconds_to_i64(seconds)?).ok()?;
        FixedOffset::east_opt(seconds).map(|offset| Self {
            offset: Some(offset),
        })
    }

    /// The configured UTC offset, if any.
    pub const fn offset(&self) -> Option<FixedOffset> {
        self.offset
    }
}

impl TimeSource for SystemTimeSource {
    fn hour_of_day(&self) -> f32 {
        let now = self.offset.map_or_else(
            || Local::now().time(),
            |offset| Utc::now().with_timezone(&offset).time(),
        );
        hour_from_time(now)
    }
}

/// A hand-driven wall clock.
///
/// Clones share the same hour, so a test can keep one handle and move the
/// other into a time clock.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    bits: Arc<AtomicU32>,
}

impl ManualTimeSource {
    /// Create a source reporting `hour`, wrapped into `[0, 24)`.
    pub fn new(hour: f32) -> Self {
        let source = Self::default();
        source.set_hour(hour);
        source
    }

    /// Change the reported hour. Values wrap into `[0, 24)`.
    pub fn set_hour(&self, hour: f32) {
        self.bits
            .store(crate::clock::wrap_hour(hour).to_bits(), Ordering::Release);
    }
}

impl TimeSource for ManualTimeSource {
    fn hour_of_day(&self) -> f32 {
        f32::from_bits(self.bits.load(Ordering::Acquire))
    }
}

/// Fractional hour of a time of day.
#[allow(clippy::cast_possible_truncation)]
pub fn hour_from_time(time: NaiveTime) -> f32 {
    let seconds = f64::from(time.num_seconds_from_midnight())
        + f64::from(time.nanosecond().min(999_999_999)) / 1e9;
    let hour = (seconds / SECONDS_PER_HOUR) as f32;
    if hour >= HOURS_PER_DAY { 0.0 } else { hour }
}

#[allow(clippy::cast_possible_truncation)]
fn seconds_to_i64(seconds: f64) -> Option<i64> {
    let limit = f64::from(HOURS_PER_DAY) * SECONDS_PER_HOUR;
    (seconds.abs() < limit).then_some(seconds as i64)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn hour_from_time_is_fractional() {
        let time = NaiveTime::from_hms_opt(13, 30, 0).unwrap();
        assert_eq!(hour_from_time(time), 13.5);
        let time = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        assert_eq!(hour_from_time(time), 0.0);
        let late = NaiveTime::from_hms_opt(23, 59, 59).unwrap();
        assert!(hour_from_time(late) < HOURS_PER_DAY);
    }

    #[test]
    fn system_source_reports_hour_in_range() {
        let hour = SystemTimeSource::local().hour_of_day();
        assert!((0.0..HOURS_PER_DAY).contains(&hour));
        let shifted = SystemTimeSource::with_utc_offset(5.5).unwrap().hour_of_day();
        assert!((0.0..HOURS_PER_DAY).contains(&shifted));
    }

    #[test]
    fn utc_offset_bounds() {
        let source = SystemTimeSource::with_utc_offset(-3.0).unwrap();
        assert_eq!(source.offset().map(|o| o.local_minus_utc()), Some(-3 * 3600));
        assert!(SystemTimeSource::with_utc_offset(24.0).is_none());
        assert!(SystemTimeSource::with_utc_offset(f32::NAN).is_none());
    }

    #[test]
    fn manual_source_is_shared_between_clones() {
        let source = ManualTimeSource::new(6.0);
        let handle = source.clone();
        handle.set_hour(18.25);
        assert_eq!(source.hour_of_day(), 18.25);
        handle.set_hour(25.0);
        assert_eq!(source.hour_of_day(), 1.0);
    }
}
