use std::fs;
use std::path::PathBuf;

use engine_logging::engine_info;
use url::Url;

use crate::decode::{decode_text, DecodeError};
use crate::{FetchError, HttpClient, HttpRequest};

/// Snapshot of the page being harvested: its address and HTML source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub url: Url,
    pub html: String,
}

impl Page {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }

    /// Resolves an attribute value (absolute or relative) against the page URL.
    pub fn resolve_href(&self, href: &str) -> Option<Url> {
        let trimmed = href.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with('#') || lower.starts_with("javascript:") {
            return None;
        }
        match Url::parse(trimmed) {
            Ok(url) => Some(url),
            Err(_) => self.url.join(trimmed).ok(),
        }
    }
}

/// Where the page HTML comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    /// Fetched with a single GET on every load.
    Remote(Url),
    /// Read from disk; `base_url` stands in for the address the page was served from.
    File { path: PathBuf, base_url: Url },
}

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("failed to fetch page: {0}")]
    Fetch(#[from] FetchError),
    #[error("page request returned status {0}")]
    Status(u16),
    #[error("failed to read page file {path}: {message}")]
    Read { path: String, message: String },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub async fn load_page(source: &PageSource, client: &dyn HttpClient) -> Result<Page, PageError> {
    match source {
        PageSource::Remote(url) => {
            let response = client.send(HttpRequest::get(url.as_str())).await?;
            if !(200..300).contains(&response.status) {
                return Err(PageError::Status(response.status));
            }
            let page_url = Url::parse(&response.final_url).unwrap_or_else(|_| url.clone());
            engine_info!("Loaded page {} ({} bytes)", page_url, response.body.len());
            Ok(Page::new(page_url, response.body))
        }
        PageSource::File { path, base_url } => {
            let bytes = fs::read(path).map_err(|err| PageError::Read {
                path: path.display().to_string(),
                message: err.to_string(),
            })?;
            let decoded = decode_text(&bytes, None)?;
            engine_info!(
                "Loaded page file {:?} as {} ({})",
                path,
                base_url,
                decoded.encoding_label
            );
            Ok(Page::new(base_url.clone(), decoded.text))
        }
    }
}
