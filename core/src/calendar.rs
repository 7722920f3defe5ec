// orderflow/src/calendar.rs

//! Time source and the store's business-day arithmetic.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use parking_lot::Mutex;

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
  pub fn new(start: DateTime<Utc>) -> Self {
    Self { now: Mutex::new(start) }
  }

  pub fn set(&self, to: DateTime<Utc>) {
    *self.now.lock() = to;
  }

  pub fn advance(&self, by: Duration) {
    let mut now = self.now.lock();
    *now += by;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock()
  }
}

/// Calendar of the store's reference timezone, modelled as a fixed UTC offset.
///
/// This is the only place a "day" is defined; every daily check goes through
/// [`BusinessCalendar::day_window`].
#[derive(Debug, Clone, Copy)]
pub struct BusinessCalendar {
  offset: FixedOffset,
}

impl BusinessCalendar {
  pub fn new(offset: FixedOffset) -> Self {
    Self { offset }
  }

  /// Builds the calendar from an offset in minutes east of UTC (negative for west).
  pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
    minutes.checked_mul(60).and_then(FixedOffset::east_opt).map(Self::new)
  }

  pub fn utc() -> Self {
    Self::new(Utc.fix())
  }

  pub fn offset(&self) -> FixedOffset {
    self.offset
  }

  /// Local calendar date of `instant`.
  pub fn business_day(&self, instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&self.offset).date_naive()
  }

  /// `[local midnight of instant's day, next local midnight)`, in UTC.
  pub fn day_window(&self, instant: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let day = self.business_day(instant);
    let start = self.local_midnight(day);
    (start, start + Duration::days(1))
  }

  fn local_midnight(&self, day: NaiveDate) -> DateTime<Utc> {
    let naive = day.and_hms_opt(0, 0, 0).unwrap_or_default();
    // A fixed offset has no gaps or folds, so the shift is exact.
    Utc.from_utc_datetime(&(naive - Duration::seconds(i64::from(self.offset.local_minus_utc()))))
  }
}

impl Default for BusinessCalendar {
  fn default() -> Self {
    Self::utc()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
  }

  #[test]
  fn window_follows_local_midnight() {
    let calendar = BusinessCalendar::from_offset_minutes(-180).unwrap();
    // 01:30 UTC on the 10th is still the 9th at UTC-3.
    let (start, end) = calendar.day_window(at("2026-03-10T01:30:00Z"));
    assert_eq!(start, at("2026-03-09T03:00:00Z"));
    assert_eq!(end, at("2026-03-10T03:00:00Z"));
    assert_eq!(
      calendar.business_day(at("2026-03-10T01:30:00Z")),
      NaiveDate::from_ymd_opt(2026, 3, 9).unwrap()
    );
  }

  #[test]
  fn utc_window_is_the_calendar_day() {
    let (start, end) = BusinessCalendar::utc().day_window(at("2026-03-10T23:59:59Z"));
    assert_eq!(start, at("2026-03-10T00:00:00Z"));
    assert_eq!(end, at("2026-03-11T00:00:00Z"));
  }

  #[test]
  fn manual_clock_advances() {
    let clock = ManualClock::new(at("2026-03-10T10:00:00Z"));
    clock.advance(Duration::hours(3));
    assert_eq!(clock.now(), at("2026-03-10T13:00:00Z"));
  }
}
