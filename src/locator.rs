use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use jiff::civil::Date;
use tracing::debug;

use crate::error::FetchError;
use crate::source::Source;

pub const NBP_BASE_URL: &str = "https://www.nbp.pl/kursy/xml";

/// Where tables are published and how to pick them from a year index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceConfig {
    pub base_url: String,
    /// The year whose index is published without a year suffix (`dir.txt`).
    pub current_year: i16,
    /// Only consider index lines starting with this table series letter.
    pub series: Option<char>,
}

impl SourceConfig {
    pub fn new(base_url: impl Into<String>, current_year: i16) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            current_year,
            series: None,
        }
    }

    pub fn with_series(mut self, series: Option<char>) -> Self {
        self.series = series;
        self
    }

    pub fn index_url(&self, year: i16) -> String {
        if year == self.current_year {
            format!("{}/dir.txt", self.base_url)
        } else {
            format!("{}/dir{year}.txt", self.base_url)
        }
    }
}

/// Name of one daily rate table, exactly as listed in the year index (e.g. `c019z130128`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableId(String);

impl TableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.trim_end_matches('\r'))
    }
}

/// Resolves calendar days to table identifiers using the yearly `dir` listings.
///
/// Each year index is downloaded once per locator and reused for later days of that year.
pub struct TableLocator<'a, S: ?Sized> {
    source: &'a S,
    config: &'a SourceConfig,
    indexes: HashMap<i16, String>,
}

impl<'a, S: Source + ?Sized> TableLocator<'a, S> {
    pub fn new(source: &'a S, config: &'a SourceConfig) -> Self {
        Self {
            source,
            config,
            indexes: HashMap::new(),
        }
    }

    /// First index line containing `date` as `yyMMdd`, or `None` if no table was published.
    pub fn resolve(&mut self, date: Date) -> Result<Option<TableId>, FetchError> {
        let token = date_token(date);
        let series = self.config.series;
        let index = self.index(date.year())?;

        let table = index
            .split('\n')
            .filter(|line| series.is_none_or(|series| line.starts_with(series)))
            .find(|line| line.contains(&token))
            .map(TableId::new);

        debug!(%date, table = table.as_ref().map(tracing::field::display), "resolved table");
        Ok(table)
    }

    fn index(&mut self, year: i16) -> Result<&str, FetchError> {
        let index = match self.indexes.entry(year) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let url = self.config.index_url(year);
                debug!(year, %url, "downloading table index");
                entry.insert(self.source.fetch(&url)?)
            }
        };
        Ok(index.as_str())
    }
}

/// `yyMMdd`, the date part of a table identifier.
pub fn date_token(date: Date) -> String {
    date.strftime("%y%m%d").to_string()
}
