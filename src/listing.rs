use std::sync::LazyLock;
use std::thread;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use scraper::{Html, Selector};

use crate::catalog::Event;
use crate::error::PhotoError;
use crate::index::ImageEntry;

pub const PHOTO_ANCHOR_SELECTOR: &str = "a.fotoCorredor";

static PHOTO_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"id/(\d+)/").expect("photo id pattern is valid"));

pub trait ListingClient: Send + Sync {
    fn fetch_listing(&self, url: &str) -> Result<String, PhotoError>;
}

#[derive(Clone)]
pub struct ListingHttpClient {
    client: Client,
}

impl ListingHttpClient {
    pub fn new() -> Result<Self, PhotoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("bibphotos/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PhotoError::ListingHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| PhotoError::ListingHttp(err.to_string()))?;
        Ok(Self { client })
    }

    fn send_with_retries(&self, url: &str) -> Result<reqwest::blocking::Response, PhotoError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(PhotoError::ListingHttp(err.to_string()));
                }
            }
        }
    }
}

impl ListingClient for ListingHttpClient {
    fn fetch_listing(&self, url: &str) -> Result<String, PhotoError> {
        let response = self.send_with_retries(url)?;
        if !response.status().is_success() {
            return Err(PhotoError::ListingStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        response
            .text()
            .map_err(|err| PhotoError::ListingHttp(err.to_string()))
    }
}

pub fn extract_entries(html: &str, event: &Event) -> Result<Vec<ImageEntry>, PhotoError> {
    let anchors = parse_selector(PHOTO_ANCHOR_SELECTOR)?;
    let thumbnail = parse_selector("img")?;
    let document = Html::parse_document(html);

    let mut entries = Vec::new();
    for anchor in document.select(&anchors) {
        let href = anchor
            .value()
            .attr("href")
            .ok_or_else(|| PhotoError::ListingParse("anchor without href".to_string()))?;
        let photo_id = PHOTO_ID
            .captures(href)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| PhotoError::ListingParse(format!("no photo id in href `{href}`")))?;
        let low_url = anchor
            .select(&thumbnail)
            .next()
            .ok_or_else(|| PhotoError::ListingParse(format!("anchor `{href}` has no image")))?
            .value()
            .attr("src")
            .ok_or_else(|| PhotoError::ListingParse(format!("image in `{href}` has no src")))?;

        let entry = ImageEntry::from_low(low_url.to_string(), event.high_url_for(photo_id))
            .ok_or_else(|| {
                PhotoError::ListingParse(format!("no file name in image url `{low_url}`"))
            })?;
        entries.push(entry);
    }
    Ok(entries)
}

fn parse_selector(css: &str) -> Result<Selector, PhotoError> {
    Selector::parse(css).map_err(|err| PhotoError::ListingParse(err.to_string()))
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::catalog::EventCatalog;

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(404));
    }

    #[test]
    fn anchor_without_image_is_malformed() {
        let catalog = EventCatalog::builtin();
        let event = catalog.resolve("bpc_conde").unwrap();
        let html = r#"<a class="fotoCorredor" href="/fotos/id/77/x">no image</a>"#;
        assert_matches!(extract_entries(html, event), Err(PhotoError::ListingParse(_)));
    }

    #[test]
    fn other_anchors_are_ignored() {
        let catalog = EventCatalog::builtin();
        let event = catalog.resolve("bpc_conde").unwrap();
        let html = r#"<a class="menu" href="/home"><img src="/logo.png"></a>"#;
        assert!(extract_entries(html, event).unwrap().is_empty());
    }
}
