use crate::error::CollectorError;
use chrono::{Months, NaiveDate};

/// Expands an inclusive `YYYY-MM` range into the ordered list of months it
/// covers. Bounds are parsed strictly; an inverted range is caller error.
pub fn expand_period_range(start: &str, end: &str) -> Result<Vec<String>, CollectorError> {
    let first = parse_month(start)
        .ok_or_else(|| CollectorError::InvalidPeriod(format!("bad start month: {start:?}")))?;
    let last = parse_month(end)
        .ok_or_else(|| CollectorError::InvalidPeriod(format!("bad end month: {end:?}")))?;

    if first > last {
        return Err(CollectorError::InvalidPeriod(format!(
            "start {start} is after end {end}"
        )));
    }

    let mut months = Vec::new();
    let mut current = first;
    while current <= last {
        months.push(current.format("%Y-%m").to_string());
        current = current
            .checked_add_months(Months::new(1))
            .ok_or_else(|| CollectorError::InvalidPeriod("month range overflow".to_string()))?;
    }

    Ok(months)
}

fn parse_month(month: &str) -> Option<NaiveDate> {
    // Pin to the first of the month; only year and month matter.
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").ok()
}
