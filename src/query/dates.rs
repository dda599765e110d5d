//! Date arguments for `since`, `until` and `on` clauses

use chrono::{Datelike, Duration, Local, Months, NaiveDate};

use super::model::DateArg;
use crate::error::QueryError;

/// Which end of a partial date (`2021`, `may 2021`) to pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePreference {
    First,
    Last,
}

const MONTHS: &[&str] = &[
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

fn month_number(word: &str) -> Option<u32> {
    let lower = word.to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| m.starts_with(&lower))
        .map(|i| i as u32 + 1)
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
}

fn month_bound(year: i32, month: u32, prefer: DatePreference) -> Option<NaiveDate> {
    match prefer {
        DatePreference::First => NaiveDate::from_ymd_opt(year, month, 1),
        DatePreference::Last => last_day_of_month(year, month),
    }
}

fn year_bound(year: i32, prefer: DatePreference) -> Option<NaiveDate> {
    match prefer {
        DatePreference::First => NaiveDate::from_ymd_opt(year, 1, 1),
        DatePreference::Last => NaiveDate::from_ymd_opt(year, 12, 31),
    }
}

/// Most recent past year in which `month` occurs, relative to `today`.
fn past_year_for_month(month: u32, today: NaiveDate) -> i32 {
    if month > today.month() {
        today.year() - 1
    } else {
        today.year()
    }
}

fn parse_relative(words: &[String], today: NaiveDate) -> Option<NaiveDate> {
    if words.len() != 3 || !words[2].eq_ignore_ascii_case("ago") {
        return None;
    }
    let count: u32 = words[0].parse().ok()?;
    let unit = words[1].to_lowercase();
    let unit = unit.trim_end_matches('s');
    match unit {
        "day" => today.checked_sub_signed(Duration::try_days(count.into())?),
        "week" => today.checked_sub_signed(Duration::try_weeks(count.into())?),
        "month" => today.checked_sub_months(Months::new(count)),
        "year" => today.checked_sub_months(Months::new(count.checked_mul(12)?)),
        _ => None,
    }
}

fn parse_numeric(text: &str, prefer: DatePreference) -> Option<NaiveDate> {
    let parts: Vec<&str> = text.split(|c: char| c == '-' || c == '/').collect();
    match parts.as_slice() {
        [year] if year.len() == 4 => year_bound(year.parse().ok()?, prefer),
        [year, month] if year.len() == 4 => {
            month_bound(year.parse().ok()?, month.parse().ok()?, prefer)
        }
        [year, month, day] if year.len() == 4 => {
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
        }
        _ => None,
    }
}

fn month_first(words: &[String], prefer: DatePreference, today: NaiveDate) -> Option<NaiveDate> {
    match words {
        [month] => {
            let month = month_number(month)?;
            month_bound(past_year_for_month(month, today), month, prefer)
        }
        [month, year] if year.len() == 4 => {
            month_bound(year.parse().ok()?, month_number(month)?, prefer)
        }
        [month, day] => {
            let month = month_number(month)?;
            NaiveDate::from_ymd_opt(past_year_for_month(month, today), month, day.parse().ok()?)
        }
        [month, day, year] => {
            NaiveDate::from_ymd_opt(year.parse().ok()?, month_number(month)?, day.parse().ok()?)
        }
        _ => None,
    }
}

fn day_first(words: &[String], today: NaiveDate) -> Option<NaiveDate> {
    match words {
        [day, month] => {
            let month = month_number(month)?;
            NaiveDate::from_ymd_opt(past_year_for_month(month, today), month, day.parse().ok()?)
        }
        [day, month, year] => {
            NaiveDate::from_ymd_opt(year.parse().ok()?, month_number(month)?, day.parse().ok()?)
        }
        _ => None,
    }
}

fn parse_named_month(
    words: &[String],
    prefer: DatePreference,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let cleaned: Vec<String> = words
        .iter()
        .map(|w| w.trim_end_matches(',').to_string())
        .collect();
    month_first(&cleaned, prefer, today).or_else(|| day_first(&cleaned, today))
}

/// Parse the words of a date clause relative to `today`.
pub fn parse_date_words(
    words: &[String],
    prefer: DatePreference,
    today: NaiveDate,
) -> Result<DateArg, QueryError> {
    let text = words.join(" ");
    let invalid = || QueryError::InvalidDate(text.clone());
    if words.is_empty() {
        return Err(invalid());
    }
    let lower = text.to_lowercase();
    let date = match lower.as_str() {
        "any" => return Ok(DateArg::Any),
        "today" => Some(today),
        "yesterday" => today.pred_opt(),
        _ if words.len() == 1 => parse_numeric(&lower, prefer)
            .or_else(|| parse_named_month(words, prefer, today)),
        _ => parse_relative(words, today).or_else(|| parse_named_month(words, prefer, today)),
    };
    date.map(DateArg::On).ok_or_else(invalid)
}

/// Parse the words of a date clause relative to the local date.
pub fn parse_date(words: &[String], prefer: DatePreference) -> Result<DateArg, QueryError> {
    parse_date_words(words, prefer, Local::now().date_naive())
}
