use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::document::{NodeId, RateDocument};
use crate::error::{LookupError, ParseError};

const CURRENCY_CODE_TAG: &str = "kod_waluty";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateKind {
    Buy,
    Sell,
}

impl RateKind {
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Buy => "kurs_kupna",
            Self::Sell => "kurs_sprzedazy",
        }
    }
}

/// Separators used to write decimal numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLocale {
    pub decimal: char,
    /// Grouping characters skipped when parsing. The first one is used when formatting.
    pub grouping: &'static [char],
}

impl NumberLocale {
    /// Format of the values in NBP tables: `4,1234`, `1 234,50`.
    pub const FRENCH: Self = Self {
        decimal: ',',
        grouping: &['\u{202f}', '\u{a0}', ' '],
    };

    pub const ENGLISH: Self = Self {
        decimal: '.',
        grouping: &[','],
    };

    /// Parse the whole of `text` as a number. Anything besides a leading sign, digits,
    /// one decimal separator and grouping separators is rejected.
    pub fn parse(&self, text: &str) -> Option<Decimal> {
        let text = text.trim();
        let mut normalized = String::with_capacity(text.len());
        for (index, ch) in text.chars().enumerate() {
            match ch {
                '0'..='9' => normalized.push(ch),
                '-' | '+' if index == 0 => normalized.push(ch),
                ch if ch == self.decimal => normalized.push('.'),
                ch if self.grouping.contains(&ch) => {}
                _ => return None,
            }
        }
        Decimal::from_str(&normalized).ok()
    }

    /// `value` with `decimals` fraction digits and grouped thousands.
    pub fn format(&self, value: f64, decimals: usize) -> String {
        let digits = format!("{:.*}", decimals, value.abs());
        let (integer, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), ""));

        let mut out = String::with_capacity(digits.len() + integer.len() / 3 + 1);
        if value.is_sign_negative() && digits.chars().any(|ch| ch.is_ascii_digit() && ch != '0') {
            out.push('-');
        }
        for (index, ch) in integer.chars().enumerate() {
            if index > 0 && (integer.len() - index) % 3 == 0 {
                if let Some(grouping) = self.grouping.first() {
                    out.push(*grouping);
                }
            }
            out.push(ch);
        }
        if !fraction.is_empty() {
            out.push(self.decimal);
            out.push_str(fraction);
        }
        out
    }
}

/// One `<pozycja>` of a rate table.
#[derive(Debug, Clone, Copy)]
pub struct CurrencyRecord<'d> {
    doc: &'d RateDocument,
    node: NodeId,
    symbol: &'d str,
}

impl<'d> CurrencyRecord<'d> {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn symbol(&self) -> &'d str {
        self.symbol
    }
}

/// The record whose `<kod_waluty>` text is exactly `symbol`.
pub fn find_currency<'d>(
    doc: &'d RateDocument,
    symbol: &'d str,
) -> Result<CurrencyRecord<'d>, LookupError> {
    let mut codes = doc.elements_by_tag(CURRENCY_CODE_TAG).peekable();
    if codes.peek().is_none() {
        return Err(LookupError::TagMissing {
            tag: CURRENCY_CODE_TAG,
        });
    }

    codes
        .find(|code| doc.text_content(*code) == symbol)
        .and_then(|code| doc.parent(code))
        .map(|node| CurrencyRecord { doc, node, symbol })
        .ok_or_else(|| LookupError::Currency {
            tag: CURRENCY_CODE_TAG,
            symbol: symbol.to_owned(),
        })
}

/// Read the buy or sell rate of `record`, written in `locale`.
pub fn read_rate(
    record: &CurrencyRecord<'_>,
    kind: RateKind,
    locale: &NumberLocale,
) -> Result<f64, RateError> {
    let rate = read_rate_decimal(record, kind, locale)?;
    rate.to_f64().ok_or_else(|| {
        ParseError::Number {
            tag: kind.tag(),
            value: rate.to_string(),
        }
        .into()
    })
}

/// Same as [`read_rate`], keeping the exact decimal value from the table.
pub fn read_rate_decimal(
    record: &CurrencyRecord<'_>,
    kind: RateKind,
    locale: &NumberLocale,
) -> Result<Decimal, RateError> {
    let doc = record.doc;
    let node = doc
        .children(record.node)
        .find(|child| doc.tag(*child) == kind.tag())
        .ok_or_else(|| LookupError::Rate {
            tag: kind.tag(),
            symbol: record.symbol().to_owned(),
        })?;

    let value = doc.text_content(node);
    locale.parse(&value).ok_or_else(|| {
        ParseError::Number {
            tag: kind.tag(),
            value,
        }
        .into()
    })
}

/// Failure reading a single rate: missing tag or unreadable number.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RateError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl From<RateError> for crate::Error {
    fn from(error: RateError) -> Self {
        match error {
            RateError::Lookup(e) => e.into(),
            RateError::Parse(e) => e.into(),
        }
    }
}
