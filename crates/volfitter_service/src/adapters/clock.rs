//! Current-time suppliers.
//!
//! Live runs use wall-clock time. Sample data has to be fitted at the time it
//! was captured, so [`CyclingClock`] replays the snapshot dates instead.

use super::option_metrics::{parse_yyyymmdd, OptionRow, SNAPSHOT_HOUR};
use super::sample_data::SampleCsvSource;
use crate::error::ServiceError;
use crate::ports::CurrentTimeSupplier;
use chrono::NaiveDateTime;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl CurrentTimeSupplier for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Always the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl CurrentTimeSupplier for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Returns each of a fixed list of times in turn, wrapping after the last.
#[derive(Debug)]
pub struct CyclingClock {
    times: Vec<NaiveDateTime>,
    next: AtomicUsize,
}

impl CyclingClock {
    /// Create a clock over `times`.
    ///
    /// # Errors
    ///
    /// Fails if `times` is empty.
    pub fn new(times: Vec<NaiveDateTime>) -> Result<Self, ServiceError> {
        if times.is_empty() {
            return Err(ServiceError::data("Cycling clock needs at least one time"));
        }
        Ok(Self {
            times,
            next: AtomicUsize::new(0),
        })
    }

    /// Each distinct snapshot date in the option data, in order of first
    /// appearance, at market close.
    pub fn from_option_data(source: &SampleCsvSource<OptionRow>) -> Result<Self, ServiceError> {
        let mut dates: Vec<u32> = Vec::new();
        for row in source.rows()? {
            if !dates.contains(&row.date) {
                dates.push(row.date);
            }
        }

        let times = dates
            .into_iter()
            .map(|d| {
                parse_yyyymmdd(d)?
                    .and_hms_opt(SNAPSHOT_HOUR, 0, 0)
                    .ok_or_else(|| ServiceError::data(format!("Invalid snapshot time for {}", d)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(times)
    }

    /// Times replayed by this clock.
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }
}

impl CurrentTimeSupplier for CyclingClock {
    fn now(&self) -> NaiveDateTime {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.times.len();
        self.times[index]
    }
}
