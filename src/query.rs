use std::fmt;
use std::str::FromStr;

use jiff::civil::Date;

use crate::error::ValidationError;

const PARAMETER_COUNT: usize = 3;

/// Three-letter currency code as it appears in `<kod_waluty>`.
///
/// Matching against table contents is exact, so `eur` is accepted here but will not be found.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.chars().count() == 3 && value.chars().all(|ch| ch.is_ascii_alphabetic()) {
            Ok(Self(value.to_owned()))
        } else {
            Err(ValidationError::CurrencySymbol {
                value: value.to_owned(),
            })
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Inclusive range of calendar days, with `start` strictly before `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: Date,
    end: Date,
}

impl DateRange {
    pub fn new(start: Date, end: Date) -> Result<Self, ValidationError> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(ValidationError::DateOrder { start, end })
        }
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }

    /// Every day from `start` to `end`, both included. Each call starts over.
    pub fn days(&self) -> Days {
        Days {
            next: Some(self.start),
            end: self.end,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Days {
    next: Option<Date>,
    end: Date,
}

impl Iterator for Days {
    type Item = Date;

    fn next(&mut self) -> Option<Date> {
        let day = self.next.filter(|day| *day <= self.end)?;
        self.next = day.tomorrow().ok();
        Some(day)
    }
}

/// A validated request: which currency, over which days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub currency: CurrencyCode,
    pub range: DateRange,
}

impl Query {
    pub fn new(currency: CurrencyCode, start: Date, end: Date) -> Result<Self, ValidationError> {
        Ok(Self {
            currency,
            range: DateRange::new(start, end)?,
        })
    }
}

/// Validate raw run parameters `[CURRENCY, START_DATE, END_DATE]`, for callers that do not go
/// through the clap `Cli`.
///
/// Checks run in order: presence, no empty values, count, currency format, date format, date order.
pub fn validate<S: AsRef<str>>(args: Option<&[S]>) -> Result<Query, ValidationError> {
    let args = args
        .filter(|args| !args.is_empty())
        .ok_or(ValidationError::MissingParameters)?;

    if let Some(position) = args.iter().position(|arg| arg.as_ref().is_empty()) {
        return Err(ValidationError::EmptyParameter { position });
    }

    let [currency, start, end] = args else {
        return Err(ValidationError::ParameterCount {
            expected: PARAMETER_COUNT,
            actual: args.len(),
        });
    };

    let currency = currency.as_ref().parse()?;
    let start = parse_date("start date", start.as_ref())?;
    let end = parse_date("end date", end.as_ref())?;

    Query::new(currency, start, end)
}

fn parse_date(field: &'static str, value: &str) -> Result<Date, ValidationError> {
    value.parse().map_err(|e: jiff::Error| ValidationError::Date {
        field,
        value: value.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn test_validate_accepts_valid_parameters() {
        let query = validate(Some(&["EUR", "2013-01-28", "2013-01-31"][..])).unwrap();
        assert_eq!(query.currency.as_str(), "EUR");
        assert_eq!(query.range.start(), date(2013, 1, 28));
        assert_eq!(query.range.end(), date(2013, 1, 31));
    }

    #[test]
    fn test_validate_rejects_bad_parameters() {
        assert_eq!(
            validate::<&str>(None),
            Err(ValidationError::MissingParameters)
        );
        assert_eq!(
            validate::<&str>(Some(&[][..])),
            Err(ValidationError::MissingParameters)
        );
        assert_eq!(
            validate(Some(&["EUR", "", "2013-01-31"][..])),
            Err(ValidationError::EmptyParameter { position: 1 })
        );
        assert_eq!(
            validate(Some(&["EUR", "2013-01-28"][..])),
            Err(ValidationError::ParameterCount {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(
            validate(Some(&["D", "2013-01-28", "2013-01-31"][..])),
            Err(ValidationError::CurrencySymbol {
                value: "D".to_owned()
            })
        );
        assert_eq!(
            validate(Some(&["EUR", "2013-01-31", "2013-01-28"][..])),
            Err(ValidationError::DateOrder {
                start: date(2013, 1, 31),
                end: date(2013, 1, 28)
            })
        );
        // Equal dates are not a range
        assert!(matches!(
            validate(Some(&["EUR", "2013-01-28", "2013-01-28"][..])),
            Err(ValidationError::DateOrder { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_unparsable_dates() {
        match validate(Some(&["EUR", "2reree", "2013-01-31"][..])) {
            Err(ValidationError::Date { field, value, .. }) => {
                assert_eq!(field, "start date");
                assert_eq!(value, "2reree");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        match validate(Some(&["EUR", "2013-01-31", "2013-01-39"][..])) {
            Err(ValidationError::Date { field, value, .. }) => {
                assert_eq!(field, "end date");
                assert_eq!(value, "2013-01-39");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_currency_code_format() {
        assert!("usd".parse::<CurrencyCode>().is_ok());
        assert!("EU".parse::<CurrencyCode>().is_err());
        assert!("EURO".parse::<CurrencyCode>().is_err());
        assert!("E1R".parse::<CurrencyCode>().is_err());
        assert!(" EU".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_days_are_inclusive_and_restartable() {
        let range = DateRange::new(date(2013, 1, 30), date(2013, 2, 2)).unwrap();
        let expected = vec![
            date(2013, 1, 30),
            date(2013, 1, 31),
            date(2013, 2, 1),
            date(2013, 2, 2),
        ];
        assert_eq!(range.days().collect::<Vec<_>>(), expected);
        assert_eq!(range.days().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_days_across_year_end() {
        let range = DateRange::new(date(2012, 12, 30), date(2013, 1, 2)).unwrap();
        assert_eq!(range.days().count(), 4);
        assert_eq!(range.days().last(), Some(date(2013, 1, 2)));
    }
}
