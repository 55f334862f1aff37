//! Domain rules applied to coerced values.

use chrono::{DateTime, Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::schema::Operator;
use crate::value::{timestamp_from_epoch, Value};

pub const SEX_MALE: &str = "m";
pub const SEX_FEMALE: &str = "f";
pub const SEXES: &[&str] = &[SEX_MALE, SEX_FEMALE];

pub const STATUS_FREE: &str = "свободны";
pub const STATUS_BUSY: &str = "заняты";
pub const STATUS_COMPLICATED: &str = "всё сложно";
pub const STATUSES: &[&str] = &[STATUS_FREE, STATUS_BUSY, STATUS_COMPLICATED];

pub const MAX_LEN_EMAIL: usize = 100;
pub const MAX_LEN_FIRSTNAME: usize = 50;
pub const MAX_LEN_SURNAME: usize = 50;
pub const MAX_LEN_PHONE: usize = 16;
pub const MAX_LEN_COUNTRY: usize = 50;
pub const MAX_LEN_CITY: usize = 50;
pub const MAX_LEN_INTEREST: usize = 100;

/// 1950-01-01T00:00:00Z ..= 2005-01-01T00:00:00Z
pub const BIRTH_WINDOW: TimestampWindow = TimestampWindow::new(-631_152_000, 1_104_537_600);
/// 2011-01-01T00:00:00Z ..= 2018-01-01T00:00:00Z
pub const JOINED_WINDOW: TimestampWindow = TimestampWindow::new(1_293_840_000, 1_514_764_800);
/// 2018-01-01T00:00:00Z ..= 2030-01-01T00:00:00Z
pub const PREMIUM_WINDOW: TimestampWindow = TimestampWindow::new(1_514_764_800, 1_893_456_000);

pub const EMAIL: Constraint = Constraint::Text {
    max_len: MAX_LEN_EMAIL,
    pattern: Some(Pattern::Email),
};
pub const FIRSTNAME: Constraint = Constraint::Text {
    max_len: MAX_LEN_FIRSTNAME,
    pattern: None,
};
pub const SURNAME: Constraint = Constraint::Text {
    max_len: MAX_LEN_SURNAME,
    pattern: None,
};
pub const PHONE: Constraint = Constraint::Text {
    max_len: MAX_LEN_PHONE,
    pattern: Some(Pattern::Phone),
};
pub const COUNTRY: Constraint = Constraint::Text {
    max_len: MAX_LEN_COUNTRY,
    pattern: None,
};
pub const CITY: Constraint = Constraint::Text {
    max_len: MAX_LEN_CITY,
    pattern: None,
};
pub const INTEREST: Constraint = Constraint::Text {
    max_len: MAX_LEN_INTEREST,
    pattern: None,
};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid regex"));
static PHONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d*\(\d+\)\d+$").expect("valid regex"));
static PHONE_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,5}$").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    Email,
    Phone,
}

impl Pattern {
    fn regex(self) -> &'static Regex {
        match self {
            Pattern::Email => &EMAIL_RE,
            Pattern::Phone => &PHONE_RE,
        }
    }
}

/// Inclusive window of Unix epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampWindow {
    pub min: i64,
    pub max: i64,
}

impl TimestampWindow {
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, ts: &DateTime<Utc>) -> bool {
        let secs = ts.timestamp();
        secs >= self.min && secs <= self.max
    }

    /// Calendar years (UTC) touched by the window.
    pub fn years(&self) -> (i32, i32) {
        let year = |secs| timestamp_from_epoch(secs).map_or(1970, |t| t.year());
        (year(self.min), year(self.max))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Value must be one of the listed tokens.
    OneOf(&'static [&'static str]),
    /// Bounded string; the pattern applies to complete values only.
    Text {
        max_len: usize,
        pattern: Option<Pattern>,
    },
    Window(TimestampWindow),
    /// Account id reference.
    Identifier,
}

impl Constraint {
    /// Check a coerced value used with `operator`.
    ///
    /// Operand fragments (`domain`, `starts`, `code`, ordering comparisons)
    /// are bounded by length but not matched against full-value patterns.
    pub fn check(&self, param: &str, operator: Operator, value: &Value) -> Result<()> {
        match value {
            Value::Boolean(false) if operator == Operator::Now => {
                Err(Error::out_of_range(param, "only 1 is accepted"))
            }
            Value::Boolean(_) => Ok(()),
            Value::String(s) => self.check_text(param, operator, s),
            Value::StringList(items) => items
                .iter()
                .try_for_each(|s| self.check_text(param, operator, s)),
            Value::Timestamp(ts) => match self {
                Constraint::Window(window) if !window.contains(ts) => Err(Error::out_of_range(
                    param,
                    format!("{} is outside [{}, {}]", ts.timestamp(), window.min, window.max),
                )),
                _ => Ok(()),
            },
            Value::Integer(year) if operator == Operator::Year => match self {
                Constraint::Window(window) => {
                    let (first, last) = window.years();
                    if *year < i64::from(first) || *year > i64::from(last) {
                        Err(Error::out_of_range(
                            param,
                            format!("year {year} is outside [{first}, {last}]"),
                        ))
                    } else {
                        Ok(())
                    }
                }
                _ => Ok(()),
            },
            Value::Integer(id) => self.check_id(param, *id),
            Value::IntegerList(ids) => ids.iter().try_for_each(|id| self.check_id(param, *id)),
        }
    }

    fn check_text(&self, param: &str, operator: Operator, s: &str) -> Result<()> {
        match self {
            Constraint::OneOf(allowed) => {
                if allowed.contains(&s) {
                    Ok(())
                } else {
                    Err(Error::out_of_range(
                        param,
                        format!("expected one of {}", allowed.join(", ")),
                    ))
                }
            }
            Constraint::Text { max_len, pattern } => {
                if s.chars().count() > *max_len {
                    return Err(Error::out_of_range(
                        param,
                        format!("longer than {max_len} characters"),
                    ));
                }
                let matches = match (operator, pattern) {
                    (Operator::Code, _) => PHONE_CODE_RE.is_match(s),
                    (Operator::Equal | Operator::NotEqual, Some(p)) => p.regex().is_match(s),
                    _ => true,
                };
                if matches {
                    Ok(())
                } else {
                    Err(Error::out_of_range(param, "malformed value"))
                }
            }
            Constraint::Window(_) | Constraint::Identifier => Ok(()),
        }
    }

    fn check_id(&self, param: &str, id: i64) -> Result<()> {
        match self {
            Constraint::Identifier if !(0..=i64::from(i32::MAX)).contains(&id) => {
                Err(Error::out_of_range(param, format!("id {id} is not valid")))
            }
            _ => Ok(()),
        }
    }
}
