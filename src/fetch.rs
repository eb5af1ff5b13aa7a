//! HTTP-backed [`ThreadDirectory`] over the live board endpoints.
//!
//! Two endpoints back the two lookups:
//!
//! - thread ID lists come from raw dat files (`{dat_base}/{key}.dat`),
//!   plain text with one post per line carrying an `ID:...<>` token;
//! - posting histories come from the ID-search pages
//!   (`{search_base}?bs=hi&k={id}`), Shift_JIS HTML whose `<h2><a>` links
//!   carry the thread keys.
//!
//! An HTTP 404 on a dat file means "thread has no recorded data" and yields
//! an empty ID list; a search page listing zero threads yields
//! [`PostHistory::Unregistered`]. Only transport-level trouble and other
//! non-success statuses surface as [`LookupError`].

use std::io::Read;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use scraper::{Html, Selector};

use crate::error::LookupError;
use crate::expand::ThreadDirectory;
use crate::ident::{PostHistory, PosterId, ThreadKey};

/// `ID:{token}<>` as it appears in a dat line.
static RE_DAT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ID:([^<]+)<>").unwrap());

/// Thread key (digit run) inside a search-result href.
static RE_HREF_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/(\d+)/").unwrap());

/// Response bodies larger than this are refused (defensive cap on dat size).
const MAX_BODY_BYTES: u64 = 4 * 1024 * 1024;

/// Configuration for the live directory endpoints.
#[derive(Debug, Clone)]
pub struct HttpDirectoryConfig {
    /// Base URL for dat files, without trailing slash.
    pub dat_base: String,
    /// Base URL of the ID-search service, without trailing slash.
    pub search_base: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for HttpDirectoryConfig {
    fn default() -> Self {
        Self {
            dat_base: "https://bbs.eddibb.cc/liveedge/dat".into(),
            search_base: "https://www.kyodemo.net/sdemo/b/e_e_liveedge".into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// [`ThreadDirectory`] implementation over the live HTTP endpoints.
pub struct HttpDirectory {
    config: HttpDirectoryConfig,
    agent: ureq::Agent,
}

impl HttpDirectory {
    /// Create a directory with the given endpoint configuration.
    pub fn new(config: HttpDirectoryConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .build();
        Self { config, agent }
    }

    fn fetch_bytes(&self, url: &str) -> Result<Option<Vec<u8>>, LookupError> {
        match self.agent.get(url).call() {
            Ok(response) => {
                let mut body = Vec::new();
                response
                    .into_reader()
                    .take(MAX_BODY_BYTES)
                    .read_to_end(&mut body)
                    .map_err(|e| LookupError::Body {
                        url: url.into(),
                        message: e.to_string(),
                    })?;
                Ok(Some(body))
            }
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(ureq::Error::Status(status, _)) => Err(LookupError::Status {
                status,
                url: url.into(),
            }),
            Err(ureq::Error::Transport(transport)) => Err(LookupError::Transport {
                url: url.into(),
                message: transport.to_string(),
            }),
        }
    }
}

impl ThreadDirectory for HttpDirectory {
    fn ids_in_thread(&self, key: &ThreadKey) -> Result<Vec<PosterId>, LookupError> {
        let url = format!("{}/{}.dat", self.config.dat_base, key);
        let Some(body) = self.fetch_bytes(&url)? else {
            tracing::debug!(key = %key, "no dat file recorded for thread");
            return Ok(Vec::new());
        };
        // dat files on this board are served as UTF-8.
        let text = String::from_utf8_lossy(&body);
        Ok(parse_dat_ids(&text))
    }

    fn threads_posted_in(&self, id: &PosterId) -> Result<PostHistory, LookupError> {
        let url = format!(
            "{}/?bs=hi&k={}",
            self.config.search_base,
            urlencode(id.as_str())
        );
        let Some(body) = self.fetch_bytes(&url)? else {
            return Ok(PostHistory::Unregistered(
                "no posts recorded for this ID yet".into(),
            ));
        };

        // Search pages are served as Shift_JIS.
        let (text, _, _) = encoding_rs::SHIFT_JIS.decode(&body);
        let keys = parse_search_keys(&text);
        if keys.is_empty() {
            Ok(PostHistory::Unregistered(
                "no posts recorded for this ID yet".into(),
            ))
        } else {
            Ok(PostHistory::Known(keys))
        }
    }
}

/// Extract unique poster IDs from a dat body, first-seen order.
fn parse_dat_ids(text: &str) -> Vec<PosterId> {
    let mut seen = std::collections::HashSet::new();
    let mut ids = Vec::new();
    for line in text.lines() {
        if let Some(caps) = RE_DAT_ID.captures(line) {
            let token = &caps[1];
            if seen.insert(token.to_string()) {
                ids.push(PosterId::new(token));
            }
        }
    }
    ids
}

/// Extract thread keys from the `<h2><a href>` links of a search page.
fn parse_search_keys(html: &str) -> Vec<ThreadKey> {
    let document = Html::parse_document(html);
    let mut keys = Vec::new();
    if let Ok(selector) = Selector::parse("h2 a") {
        for element in document.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if let Some(caps) = RE_HREF_KEY.captures(href) {
                keys.push(ThreadKey::new(&caps[1]));
            }
        }
    }
    keys
}

/// Minimal percent-encoding for the ID query parameter (IDs may contain
/// `/` and `+`).
fn urlencode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dat_ids_are_deduped_in_first_seen_order() {
        let body = "name<>sage<>2025/08/30 ID:abc123<>first post<>thread\n\
                    name<>sage<>2025/08/30 ID:xyz789<>second<>\n\
                    name<>sage<>2025/08/30 ID:abc123<>third<>\n";
        let ids = parse_dat_ids(body);
        let tokens: Vec<&str> = ids.iter().map(PosterId::as_str).collect();
        assert_eq!(tokens, vec!["abc123", "xyz789"]);
    }

    #[test]
    fn dat_lines_without_id_token_are_ignored() {
        let body = "broken line\n\nname<>sage<>date no id here<>body<>\n";
        assert!(parse_dat_ids(body).is_empty());
    }

    #[test]
    fn search_page_keys_come_from_h2_links() {
        let html = r#"
            <html><body>
              <h2><a href="/sdemo/b/e_e_liveedge/1755000001/">thread one</a></h2>
              <h2><a href="/sdemo/b/e_e_liveedge/1755000002/">thread two</a></h2>
              <p><a href="/sdemo/b/other/9999/">unrelated link</a></p>
            </body></html>
        "#;
        let keys = parse_search_keys(html);
        let raw: Vec<&str> = keys.iter().map(ThreadKey::as_str).collect();
        assert_eq!(raw, vec!["1755000001", "1755000002"]);
    }

    #[test]
    fn page_without_links_yields_no_keys() {
        assert!(parse_search_keys("<html><body><p>empty</p></body></html>").is_empty());
    }

    #[test]
    fn urlencode_escapes_slash_and_plus() {
        assert_eq!(urlencode("Ab/3+z"), "Ab%2F3%2Bz");
        assert_eq!(urlencode("plain-ID_0.9~"), "plain-ID_0.9~");
    }
}
