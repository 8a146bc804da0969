//! Turning a candidate into final links through one HTTP round-trip.

use std::sync::LazyLock;

use engine_logging::{engine_debug, engine_warn};
use regex::Regex;
use serde_json::Value;
use url::Url;

use crate::rules::{Candidate, RequestSpec, ResponseParser, UrlSpec};
use crate::{HttpClient, HttpRequest, HttpResponse};

/// Compiles a regex at static init; panics on invalid pattern.
pub(crate) fn compile_static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid static regex '{pattern}': {e}"))
}

static META_REFRESH_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?is)<meta\s[^>]*http-equiv\s*=\s*["']?refresh["']?[^>]*\scontent\s*=\s*["'][^"'>]*?url\s*=\s*["']?([^"'>\s]+)"#,
    )
});

/// Same tag with `content` written before `http-equiv`.
static META_REFRESH_REVERSED_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(
        r#"(?is)<meta\s[^>]*content\s*=\s*["'][^"'>]*?url\s*=\s*["']?([^"'>\s]+?)["']?[\s;]*["'][^>]*http-equiv\s*=\s*["']?refresh"#,
    )
});

/// Character references that can appear inside a quoted attribute URL.
static ATTRIBUTE_ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| compile_static_regex(r"(?i)&(?:amp|#38|#x26|quot|#34|apos|#39);"));

/// Inline JSON field carrying a slash-escaped URL, e.g. `"url":"https:\/\/host\/f"`.
static ESCAPED_URL_FIELD_RE: LazyLock<Regex> = LazyLock::new(|| {
    compile_static_regex(r#""(?:url|link|target|destination)"\s*:\s*"(https?:\\/\\/[^"]+)""#)
});

/// Replaces JSON-escaped slashes (`\/` and `\u002F`) with `/`.
pub fn unescape_slashes(raw: &str) -> String {
    raw.replace("\\/", "/")
        .replace("\\u002F", "/")
        .replace("\\u002f", "/")
}

/// Builds the request for a candidate: URL, merged headers and body.
///
/// Returns `None` when the URL cannot be computed from the candidate.
pub fn build_request(
    spec: &RequestSpec,
    candidate: &Candidate,
    page_url: &Url,
) -> Option<HttpRequest> {
    let url = match &spec.url {
        UrlSpec::Literal(url) => url.clone(),
        UrlSpec::FromCandidate => candidate.value.clone(),
        UrlSpec::Computed(compute) => compute(&candidate.value, page_url)?,
    };
    let body = spec.body.and_then(|make_body| make_body(candidate));

    Some(HttpRequest {
        method: spec.method,
        url,
        headers: merge_headers(page_url, &spec.headers),
        body,
    })
}

/// Default `Referer` of the page URL, overridden by rule headers case-insensitively.
pub fn merge_headers(page_url: &Url, overrides: &[(String, String)]) -> Vec<(String, String)> {
    let mut merged = vec![("Referer".to_string(), page_url.to_string())];
    for (name, value) in overrides {
        match merged
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.clone(),
            None => merged.push((name.clone(), value.clone())),
        }
    }
    merged
}

/// Issues the single resolution request; transport failures yield no links.
pub async fn resolve_candidate(
    client: &dyn HttpClient,
    spec: &RequestSpec,
    candidate: &Candidate,
    page_url: &Url,
) -> Vec<String> {
    let Some(request) = build_request(spec, candidate, page_url) else {
        engine_debug!("No request URL for candidate {}", candidate.value);
        return Vec::new();
    };
    let literal_url = request.url.clone();

    match client.send(request).await {
        Ok(response) => {
            let links = spec.parser.parse(&response, &literal_url);
            engine_debug!(
                "{:?} resolved {} into {} link(s)",
                spec.parser,
                literal_url,
                links.len()
            );
            links
        }
        Err(err) => {
            engine_warn!("Resolution request for {} failed: {}", literal_url, err);
            Vec::new()
        }
    }
}

impl ResponseParser {
    /// Extracts zero or more links; `literal_url` is the request URL exactly as the rule built it.
    pub fn parse(&self, response: &HttpResponse, literal_url: &str) -> Vec<String> {
        match self {
            ResponseParser::AjaxJson => parse_ajax_json(&response.body),
            ResponseParser::Redirector { first_party_hosts } => {
                parse_redirector(response, literal_url, first_party_hosts)
            }
            ResponseParser::RedirectFollower => parse_redirect_follower(response),
            ResponseParser::MetaRefresh => parse_meta_refresh(&response.body),
        }
    }
}

/// Every string value of a JSON object (in document order) or array.
pub fn parse_ajax_json(body: &str) -> Vec<String> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(err) => {
            engine_debug!("AJAX response is not JSON: {}", err);
            return Vec::new();
        }
    };
    let values: Vec<&Value> = match &value {
        Value::Object(map) => map.values().collect(),
        Value::Array(items) => items.iter().collect(),
        _ => Vec::new(),
    };
    values
        .into_iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|link| !link.is_empty())
        .map(str::to_string)
        .collect()
}

/// Three ordered, independent checks:
/// 1. the server redirected: the final URL;
/// 2. the body embeds an escaped URL field: that URL, unescaped;
/// 3. the final host is off the first-party hosts and differs from the literal request URL.
pub fn parse_redirector(
    response: &HttpResponse,
    literal_url: &str,
    first_party_hosts: &[&str],
) -> Vec<String> {
    if response.was_redirected() {
        return vec![response.final_url.clone()];
    }

    if let Some(raw) = ESCAPED_URL_FIELD_RE
        .captures(&response.body)
        .and_then(|caps| caps.get(1))
    {
        return vec![unescape_slashes(raw.as_str())];
    }

    let final_host = Url::parse(&response.final_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string));
    let off_first_party = match final_host.as_deref() {
        Some(host) => {
            let host = host.trim_start_matches("www.");
            !first_party_hosts
                .iter()
                .any(|known| known.eq_ignore_ascii_case(host))
        }
        None => false,
    };
    if off_first_party && response.final_url != literal_url {
        return vec![response.final_url.clone()];
    }

    Vec::new()
}

pub fn parse_redirect_follower(response: &HttpResponse) -> Vec<String> {
    if response.was_redirected() {
        vec![response.final_url.clone()]
    } else {
        Vec::new()
    }
}

pub fn parse_meta_refresh(body: &str) -> Vec<String> {
    META_REFRESH_RE
        .captures(body)
        .or_else(|| META_REFRESH_REVERSED_RE.captures(body))
        .and_then(|caps| caps.get(1))
        .map(|m| vec![decode_attribute_entities(m.as_str().trim())])
        .unwrap_or_default()
}

/// Decodes `&amp;` and quote references in one pass, so `&amp;amp;` yields `&amp;`.
fn decode_attribute_entities(raw: &str) -> String {
    ATTRIBUTE_ENTITY_RE
        .replace_all(raw, |caps: &regex::Captures| {
            match caps[0].to_ascii_lowercase().as_str() {
                "&amp;" | "&#38;" | "&#x26;" => "&",
                "&quot;" | "&#34;" => "\"",
                _ => "'",
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://mag.example/issue/42").unwrap()
    }

    #[test]
    fn referer_defaults_to_page_url() {
        let merged = merge_headers(&page_url(), &[("Accept".into(), "*/*".into())]);
        assert_eq!(
            merged,
            vec![
                ("Referer".to_string(), "https://mag.example/issue/42".to_string()),
                ("Accept".to_string(), "*/*".to_string()),
            ]
        );
    }

    #[test]
    fn rule_referer_wins_case_insensitively() {
        let merged = merge_headers(&page_url(), &[("referer".into(), "https://other/".into())]);
        assert_eq!(
            merged,
            vec![("Referer".to_string(), "https://other/".to_string())]
        );
    }

    #[test]
    fn reversed_meta_refresh_is_recognized() {
        let body = r#"<meta content="5; URL='https://cdn.example/x.pdf'" http-equiv="refresh">"#;
        assert_eq!(parse_meta_refresh(body), vec!["https://cdn.example/x.pdf"]);
    }

    #[test]
    fn attribute_entities_decode_once() {
        assert_eq!(decode_attribute_entities("a=1&AMP;b=2&#x26;c=3"), "a=1&b=2&c=3");
        assert_eq!(decode_attribute_entities("q=&amp;amp;"), "q=&amp;");
        assert_eq!(decode_attribute_entities("plain&copy;"), "plain&copy;");
    }

    #[test]
    fn unescape_handles_both_slash_encodings() {
        assert_eq!(
            unescape_slashes(r"https:\/\/a.example/b/c"),
            "https://a.example/b/c"
        );
    }
}
