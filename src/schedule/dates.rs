use chrono::{Duration, Months, NaiveDate};

use crate::errors::{EngineError, Result};
use crate::terms::PeriodFrequencyType;

/// advance a date by `count` units of the given frequency
///
/// months and years use calendar advancement with end-of-month clamping:
/// Jan 31 + 1 month = Feb 29 (leap) / Feb 28, Feb 29 + 1 year = Feb 28.
pub fn advance(date: NaiveDate, unit: PeriodFrequencyType, count: u32) -> Result<NaiveDate> {
    let out_of_range = || EngineError::Calculation {
        message: format!("date out of range advancing {} from {:?}", count, date),
    };
    match unit {
        PeriodFrequencyType::Days => date
            .checked_add_signed(Duration::days(count as i64))
            .ok_or_else(out_of_range),
        PeriodFrequencyType::Weeks => date
            .checked_add_signed(Duration::days(7 * count as i64))
            .ok_or_else(out_of_range),
        PeriodFrequencyType::Months => date
            .checked_add_months(Months::new(count))
            .ok_or_else(out_of_range),
        PeriodFrequencyType::Years => date
            .checked_add_months(Months::new(count * 12))
            .ok_or_else(out_of_range),
    }
}

/// coarse nominal loan term in days: months are approximated as 30 days,
/// years as 365; used only for the schedule-level term length, never for
/// per-period interest
pub fn nominal_term_in_days(frequency: u32, unit: PeriodFrequencyType) -> i64 {
    let frequency = frequency as i64;
    match unit {
        PeriodFrequencyType::Days => frequency,
        PeriodFrequencyType::Weeks => frequency * 7,
        PeriodFrequencyType::Months => frequency * 30,
        PeriodFrequencyType::Years => frequency * 365,
    }
}
