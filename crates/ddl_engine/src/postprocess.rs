//! Rewrites applied to resolved links before they are queued.

use std::sync::{Arc, LazyLock};

use engine_logging::{engine_debug, engine_warn};
use regex::Regex;

use crate::resolve::{compile_static_regex, unescape_slashes};
use crate::{FetchError, HttpClient, HttpRequest};

static DOCUMENT_VIEWER_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r"(?i)^https?://[^/]+/(?:viewer|docviewer|document/view)(?:[/?.#]|$)")
});

static DOCUMENT_URL_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#""(?:documentUrl|docUrl|fileUrl)"\s*:\s*"([^"]+)""#)
});

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("viewer page returned status {0}")]
    Status(u16),
}

#[async_trait::async_trait]
pub trait LinkTransform: Send + Sync {
    /// Returns the rewritten link, or `None` to keep the original.
    async fn transform(
        &self,
        url: &str,
        client: &dyn HttpClient,
    ) -> Result<Option<String>, TransformError>;
}

pub struct PostProcessRule {
    pub name: String,
    pub pattern: Regex,
    pub transform: Arc<dyn LinkTransform>,
}

/// Ordered post-processing rules; only the first matching rule applies.
#[derive(Clone, Default)]
pub struct PostProcessor {
    rules: Arc<Vec<PostProcessRule>>,
}

impl PostProcessor {
    pub fn new(rules: Vec<PostProcessRule>) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// The built-in rules: hosted document viewers.
    pub fn with_default_rules() -> Self {
        Self::new(vec![PostProcessRule {
            name: "document-viewer".to_string(),
            pattern: DOCUMENT_VIEWER_RE.clone(),
            transform: Arc::new(DocumentViewerTransform),
        }])
    }

    /// Never fails: no match, an empty result or a transform error all keep `url`.
    pub async fn process(&self, url: &str, client: &dyn HttpClient) -> String {
        let Some(rule) = self.rules.iter().find(|rule| rule.pattern.is_match(url)) else {
            return url.to_string();
        };

        match rule.transform.transform(url, client).await {
            Ok(Some(rewritten)) if !rewritten.trim().is_empty() => {
                engine_debug!("Post-process {} rewrote {} -> {}", rule.name, url, rewritten);
                rewritten
            }
            Ok(_) => url.to_string(),
            Err(err) => {
                engine_warn!("Post-process {} failed for {}: {}", rule.name, url, err);
                url.to_string()
            }
        }
    }
}

/// Fetches a document-viewer page and pulls the embedded file URL out of it.
pub struct DocumentViewerTransform;

#[async_trait::async_trait]
impl LinkTransform for DocumentViewerTransform {
    async fn transform(
        &self,
        url: &str,
        client: &dyn HttpClient,
    ) -> Result<Option<String>, TransformError> {
        let response = client.send(HttpRequest::get(url)).await?;
        if !(200..300).contains(&response.status) {
            return Err(TransformError::Status(response.status));
        }
        Ok(DOCUMENT_URL_FIELD_RE
            .captures(&response.body)
            .and_then(|caps| caps.get(1))
            .map(|m| unescape_slashes(m.as_str())))
    }
}
