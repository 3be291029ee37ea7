use clap::Parser;
use jiff::civil::Date;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Serialize;
use tracing::{debug, info};

pub mod document;
pub mod error;
pub mod locator;
pub mod query;
pub mod rates;
pub mod source;
pub mod stats;
#[cfg(test)]
mod testing;

pub use document::{RateDocument, fetch_document, read_publication_date};
pub use error::{Error, FetchError, LookupError, ParseError, ValidationError};
pub use locator::{NBP_BASE_URL, SourceConfig, TableId, TableLocator};
pub use query::{CurrencyCode, DateRange, Query, validate};
pub use rates::{NumberLocale, RateKind, find_currency, read_rate, read_rate_decimal};
pub use source::{HttpSource, Source};
pub use stats::{RunningStats, Summary};

/// Decimal places of the printed statistics
pub const OUTPUT_PRECISION: u32 = 4;

/// Average buy rate and sell rate standard deviation of a currency from the National Bank of Poland.
///
/// Rates come from the daily buy/sell tables; days without a published table are skipped.
#[derive(Parser)]
pub struct Cli {
    /// Three-letter currency code, as written in the tables (e.g. EUR)
    #[arg(value_name = "CURRENCY")]
    pub currency: CurrencyCode,
    /// First day of the range (format: YYYY-MM-DD)
    #[arg(value_name = "DATE")]
    pub start_date: Date,
    /// Last day of the range, after the first (format: YYYY-MM-DD)
    #[arg(value_name = "DATE")]
    pub end_date: Date,

    /// Location of the `dir` indexes and daily tables
    #[arg(long, env = "NBP_BASE_URL", default_value = NBP_BASE_URL)]
    pub base_url: String,

    /// Only use tables of this series (e.g. `c` for buy/sell tables)
    #[arg(long, value_name = "LETTER")]
    pub series: Option<char>,

    /// Print a JSON report instead of two plain lines
    #[clap(short, long)]
    pub json: bool,
}

impl Cli {
    /// clap has already checked the argument count, currency format and dates; this adds the date order.
    pub fn query(&self) -> Result<Query, ValidationError> {
        Query::new(self.currency.clone(), self.start_date, self.end_date)
    }

    /// Source settings, treating `current_year` as the year published under `dir.txt`.
    pub fn source_config(&self, current_year: i16) -> SourceConfig {
        SourceConfig::new(&self.base_url, current_year).with_series(self.series)
    }
}

/// Walk every day of the query: locate the table, fetch it, read both rates and accumulate.
///
/// The first failure ends the run; there is no partial result.
pub fn compute<S: Source + ?Sized>(
    source: &S,
    config: &SourceConfig,
    locale: &NumberLocale,
    query: &Query,
) -> Result<Summary, Error> {
    let range = query.range;
    let symbol = query.currency.as_str();
    info!(currency = symbol, start = %range.start(), end = %range.end(), "computing statistics");

    let mut locator = TableLocator::new(source, config);
    let mut stats = RunningStats::default();

    for day in range.days() {
        let Some(table) = locator.resolve(day)? else {
            debug!(%day, "no table published, skipping");
            continue;
        };

        let doc = fetch_document(source, config, &table)?;
        let record = find_currency(&doc, symbol)?;
        let buy = read_rate_decimal(&record, RateKind::Buy, locale)?;
        let sell = read_rate_decimal(&record, RateKind::Sell, locale)?;
        debug!(%day, %table, %buy, %sell, "rates read");

        stats.push(buy, sell);
    }

    let summary = stats.summary().ok_or(Error::NoTables {
        start: range.start(),
        end: range.end(),
    })?;
    info!(days = summary.days, "statistics computed");
    Ok(summary)
}

/// Machine-readable result of a run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub currency: String,
    pub start_date: Date,
    pub end_date: Date,
    pub days: usize,
    pub mean_buy: Option<Decimal>,
    pub sell_std_dev: Option<Decimal>,
}

impl Report {
    pub fn new(query: &Query, summary: &Summary) -> Self {
        Self {
            currency: query.currency.to_string(),
            start_date: query.range.start(),
            end_date: query.range.end(),
            days: summary.days,
            mean_buy: rounded(summary.mean_buy),
            sell_std_dev: rounded(summary.sell_std_dev),
        }
    }
}

fn rounded(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value).map(|value| value.round_dp(OUTPUT_PRECISION))
}

/// The two output lines: mean buy rate, then sell rate standard deviation.
pub fn format_summary(summary: &Summary, locale: &NumberLocale) -> String {
    let precision = OUTPUT_PRECISION as usize;
    format!(
        "{}\n{}",
        locale.format(summary.mean_buy, precision),
        locale.format(summary.sell_std_dev, precision)
    )
}
