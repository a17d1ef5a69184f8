use chrono::{Datelike, Days, NaiveDate};

use crate::selection::Selection;

/// Candidate prefixes for one day (or month, or year), probed in order.
pub type PrefixGroup = Vec<String>;

/// Days back from today whose logs may still be unconsolidated.
const UNCONSOLIDATED_DAYS: u64 = 2;

/// `logs/<year>/<month>/log_<YYYY-MM-DD>`
pub fn consolidated(date: NaiveDate) -> String {
    format!("logs/{}/{}/log_{}", date.year(), date.month(), date)
}

/// `logs/<year>/<month>/<YYYY-MM-DD>`
pub fn unconsolidated(date: NaiveDate) -> String {
    format!("logs/{}/{}/{}", date.year(), date.month(), date)
}

pub fn month(year: i32, month: u32) -> String {
    format!("logs/{}/{}", year, month)
}

pub fn year(year: i32) -> String {
    format!("logs/{}", year)
}

/// Both layouts for a day, consolidated first.
pub fn day_prefixes(date: NaiveDate) -> PrefixGroup {
    vec![consolidated(date), unconsolidated(date)]
}

/// return the prefix groups to probe for a selection, one group per day or window
pub fn resolve(selection: &Selection, today: NaiveDate) -> Vec<PrefixGroup> {
    match *selection {
        Selection::RelativeDays(days) if days > 0 => (0..days.unsigned_abs())
            .map(|offset| {
                let date = today - Days::new(offset);
                if offset < UNCONSOLIDATED_DAYS {
                    day_prefixes(date)
                } else {
                    vec![consolidated(date)]
                }
            })
            .collect(),
        Selection::RelativeDays(days) => {
            vec![day_prefixes(today - Days::new(days.unsigned_abs()))]
        }
        // explicit dates always probe both layouts, however old they are
        Selection::Date(date) => vec![day_prefixes(date)],
        Selection::Month { year, month: m } => vec![vec![month(year, m)]],
        Selection::Year(y) => vec![vec![year(y)]],
    }
}
