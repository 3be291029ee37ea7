use encoding_rs::{Encoding, UTF_8};
use tracing::{debug, warn};

use crate::error::FetchError;

/// Blocking retrieval of a remote text resource.
pub trait Source {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP(S) source backed by a single `ureq` agent for the whole run.
pub struct HttpSource {
    agent: ureq::Agent,
}

impl HttpSource {
    pub fn new() -> Self {
        Self {
            agent: ureq::Agent::new_with_defaults(),
        }
    }
}

impl Default for HttpSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for HttpSource {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "GET");
        let mut resp = self.agent.get(url).call().map_err(|e| http_error(url, e))?;
        let body = resp
            .body_mut()
            .read_to_vec()
            .map_err(|e| http_error(url, e))?;
        decode_body(url, &body)
    }
}

fn http_error(url: &str, error: ureq::Error) -> FetchError {
    match error {
        ureq::Error::StatusCode(status) => FetchError::Status {
            url: url.to_owned(),
            status,
        },
        source => FetchError::Http {
            url: url.to_owned(),
            source,
        },
    }
}

/// Decode a response body using the `encoding` from its XML declaration, UTF-8 otherwise.
///
/// NBP tables are declared as ISO-8859-2; year indexes are plain ASCII.
pub fn decode_body(url: &str, body: &[u8]) -> Result<String, FetchError> {
    let encoding = match declared_encoding(body) {
        Some(label) => {
            Encoding::for_label(label.as_bytes()).ok_or_else(|| FetchError::Encoding {
                url: url.to_owned(),
                label,
            })?
        }
        None => UTF_8,
    };

    let (text, _, had_errors) = encoding.decode(body);
    if had_errors {
        warn!(url, encoding = encoding.name(), "body contained undecodable bytes");
    }
    Ok(text.into_owned())
}

fn declared_encoding(body: &[u8]) -> Option<String> {
    let head = &body[..body.len().min(256)];
    let head = String::from_utf8_lossy(head);
    let declaration = head.trim_start_matches('\u{feff}').strip_prefix("<?xml")?;
    let declaration = &declaration[..declaration.find("?>")?];

    let value = &declaration[declaration.find("encoding")? + "encoding".len()..];
    let value = value.trim_start().strip_prefix('=')?.trim_start();
    let quote = value.chars().next().filter(|ch| *ch == '"' || *ch == '\'')?;
    let value = &value[1..];
    Some(value[..value.find(quote)?].to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_latin2_table() {
        let body = b"<?xml version=\"1.0\" encoding=\"ISO-8859-2\"?>\n<nazwa>dolar ameryka\xf1ski</nazwa>";
        let text = decode_body("test", body).unwrap();
        assert!(text.ends_with("<nazwa>dolar ameryka\u{144}ski</nazwa>"));
    }

    #[test]
    fn test_decode_without_declaration_is_utf8() {
        let text = decode_body("test", b"c019z130128\r\nh019z130128\r\n").unwrap();
        assert_eq!(text, "c019z130128\r\nh019z130128\r\n");
    }

    #[test]
    fn test_declared_encoding_quotes() {
        assert_eq!(
            declared_encoding(b"<?xml version='1.0' encoding='windows-1250'?><a/>"),
            Some("windows-1250".to_owned())
        );
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><a/>"), None);
        assert_eq!(declared_encoding(b"<a encoding=\"x\"/>"), None);
    }

    #[test]
    fn test_http_error_mapping() {
        let url = "https://www.nbp.pl/kursy/xml/dir1990.txt";
        assert!(matches!(
            http_error(url, ureq::Error::StatusCode(404)),
            FetchError::Status { url: failed, status: 404 } if failed == url
        ));

        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let error = http_error(url, ureq::Error::Io(refused));
        assert!(matches!(error, FetchError::Http { .. }));
        assert_eq!(crate::Error::from(error).exit_code(), 3);
        assert_eq!(
            crate::Error::from(http_error(url, ureq::Error::StatusCode(500))).exit_code(),
            3
        );
    }

    #[test]
    fn test_unknown_encoding_is_fetch_error() {
        let body = b"<?xml version=\"1.0\" encoding=\"klingon\"?><a/>";
        assert!(matches!(
            decode_body("test", body),
            Err(FetchError::Encoding { label, .. }) if label == "klingon"
        ));
    }
}
