//! Offline stand-in for the NBP server, serving files from `tests/fixtures`.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::error::FetchError;
use crate::source::{Source, decode_body};

pub(crate) const FIXTURE_BASE_URL: &str = "https://nbp.test/kursy/xml";

pub(crate) const DIR2013: &[u8] = include_bytes!("../tests/fixtures/dir2013.txt");
pub(crate) const B004Z060125: &[u8] = include_bytes!("../tests/fixtures/b004z060125.xml");
pub(crate) const C019Z130128: &[u8] = include_bytes!("../tests/fixtures/c019z130128.xml");

const FILES: &[(&str, &[u8])] = &[
    ("dir2013.txt", DIR2013),
    ("b004z060125.xml", B004Z060125),
    ("c018z130125.xml", include_bytes!("../tests/fixtures/c018z130125.xml")),
    ("c019z130128.xml", C019Z130128),
    ("c020z130129.xml", include_bytes!("../tests/fixtures/c020z130129.xml")),
    ("c021z130130.xml", include_bytes!("../tests/fixtures/c021z130130.xml")),
    ("c022z130131.xml", include_bytes!("../tests/fixtures/c022z130131.xml")),
    ("broken.xml", include_bytes!("../tests/fixtures/broken.xml")),
];

/// Serves fixture files by URL and records every requested URL.
pub(crate) struct FixtureSource {
    files: HashMap<String, &'static [u8]>,
    requests: RefCell<Vec<String>>,
}

impl FixtureSource {
    pub(crate) fn nbp() -> Self {
        Self {
            files: FILES
                .iter()
                .map(|(name, body)| (format!("{FIXTURE_BASE_URL}/{name}"), *body))
                .collect(),
            requests: RefCell::new(Vec::new()),
        }
    }

    /// Same files, with `dir2013.txt` also published as the current year's `dir.txt`.
    pub(crate) fn nbp_current_year() -> Self {
        let mut source = Self::nbp();
        source
            .files
            .insert(format!("{FIXTURE_BASE_URL}/dir.txt"), DIR2013);
        source
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Source for FixtureSource {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.borrow_mut().push(url.to_owned());
        let body = self.files.get(url).ok_or_else(|| FetchError::Status {
            url: url.to_owned(),
            status: 404,
        })?;
        decode_body(url, body)
    }
}
