//! Site extraction rules: which page elements hold links and how to read them.
//!
//! Rules are evaluated in table order. Each DOM element is claimed by the first
//! rule whose selector set matches it; later rules never see it, even when the
//! claiming rule's extractor yields nothing.

use std::collections::HashSet;

use ego_tree::NodeId;
use engine_logging::engine_trace;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::{form_urlencoded, Url};

use crate::page::Page;
use crate::Method;

/// The two hosts operated by the ad-wall redirector service.
pub const FIRST_PARTY_REDIRECTOR_HOSTS: &[&str] = &["linkvault.cc", "linkvault.to"];

/// Upper bound on how far after the element id a script-embedded URL may appear.
const SCRIPT_SEARCH_WINDOW: usize = 400;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("rule {rule}: invalid selector `{selector}`: {message}")]
    InvalidSelector {
        rule: String,
        selector: String,
        message: String,
    },
    #[error("rule {0} has no selectors")]
    NoSelectors(String),
}

/// Raw value pulled from the page before any network resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub value: String,
    /// Serialized form fields for form-based rules.
    pub form_body: Option<String>,
}

impl Candidate {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            form_body: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    /// Looks the element's `id` up in inline script text and takes the URL its handler opens.
    ScriptRedirect,
    /// First present query parameter of the element's `href`, percent-decoded.
    QueryParam { keys: &'static [&'static str] },
    /// Trimmed value of an attribute.
    Attribute { name: &'static str },
    /// The element's `href`, resolved against the page URL.
    Href,
    /// Form action as the value, every named field serialized as the body.
    FormFields,
}

#[derive(Debug, Clone)]
pub enum UrlSpec {
    Literal(String),
    /// The candidate value is itself the request URL.
    FromCandidate,
    /// Built from the candidate value and the page URL.
    Computed(fn(&str, &Url) -> Option<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseParser {
    /// Body is a JSON object (or array) whose string values are links.
    AjaxJson,
    /// Redirect, embedded escaped URL, or automatic redirect off the first-party hosts.
    Redirector {
        first_party_hosts: &'static [&'static str],
    },
    /// The post-redirect URL, if the server redirected at all.
    RedirectFollower,
    /// Target of an HTML `<meta http-equiv="Refresh">` tag.
    MetaRefresh,
}

/// Secondary request turning a candidate into final links.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub url: UrlSpec,
    /// Merged over the default `Referer`; these win on collision.
    pub headers: Vec<(String, String)>,
    pub body: Option<fn(&Candidate) -> Option<String>>,
    pub parser: ResponseParser,
}

#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub name: String,
    selectors: Vec<String>,
    selector: Selector,
    pub extractor: Extractor,
    pub resolution: Option<RequestSpec>,
}

impl ExtractionRule {
    pub fn new(
        name: impl Into<String>,
        selectors: &[&str],
        extractor: Extractor,
        resolution: Option<RequestSpec>,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        if selectors.is_empty() {
            return Err(RuleError::NoSelectors(name));
        }
        // Validate individually so the error names the offending selector.
        for selector in selectors {
            parse_selector(&name, selector)?;
        }
        let joined = selectors.join(", ");
        let selector = parse_selector(&name, &joined)?;

        Ok(Self {
            name,
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            selector,
            extractor,
            resolution,
        })
    }

    pub fn selectors(&self) -> &[String] {
        &self.selectors
    }
}

fn parse_selector(rule: &str, selector: &str) -> Result<Selector, RuleError> {
    Selector::parse(selector).map_err(|err| RuleError::InvalidSelector {
        rule: rule.to_string(),
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

/// A candidate together with the index of the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch {
    pub rule_index: usize,
    pub candidate: Candidate,
}

/// Ordered rule list plus the helper selectors extraction needs.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<ExtractionRule>,
    inline_scripts: Selector,
    form_fields: Selector,
    options: Selector,
}

impl RuleTable {
    pub fn new(rules: Vec<ExtractionRule>) -> Result<Self, RuleError> {
        Ok(Self {
            rules,
            inline_scripts: parse_selector("internal", "script:not([src])")?,
            form_fields: parse_selector(
                "internal",
                "input[name], select[name], textarea[name]",
            )?,
            options: parse_selector("internal", "option")?,
        })
    }

    /// The built-in site rules in evaluation order.
    pub fn default_table() -> Result<Self, RuleError> {
        Self::new(default_rules()?)
    }

    pub fn rules(&self) -> &[ExtractionRule] {
        &self.rules
    }

    pub fn get(&self, index: usize) -> Option<&ExtractionRule> {
        self.rules.get(index)
    }

    /// Walks every rule over the page, in table order then document order.
    ///
    /// Empty extractions are dropped silently. Candidates are not deduplicated here.
    pub fn collect_candidates(&self, page: &Page) -> Vec<RuleMatch> {
        let document = Html::parse_document(&page.html);
        let scripts: Vec<String> = document
            .select(&self.inline_scripts)
            .map(|script| script.text().collect::<String>())
            .collect();

        let mut claimed: HashSet<NodeId> = HashSet::new();
        let mut matches = Vec::new();
        for (rule_index, rule) in self.rules.iter().enumerate() {
            for element in document.select(&rule.selector) {
                if !claimed.insert(element.id()) {
                    continue;
                }
                match self.extract(rule.extractor, element, page, &scripts) {
                    Some(candidate) if !candidate.value.trim().is_empty() => {
                        matches.push(RuleMatch {
                            rule_index,
                            candidate,
                        });
                    }
                    _ => engine_trace!(
                        "Rule {} matched <{}> but extracted nothing",
                        rule.name,
                        element.value().name()
                    ),
                }
            }
        }
        matches
    }

    fn extract(
        &self,
        extractor: Extractor,
        element: ElementRef,
        page: &Page,
        scripts: &[String],
    ) -> Option<Candidate> {
        match extractor {
            Extractor::ScriptRedirect => {
                let id = element.value().attr("id")?;
                find_script_redirect(id, scripts).map(Candidate::new)
            }
            Extractor::QueryParam { keys } => {
                let href = page.resolve_href(element.value().attr("href")?)?;
                query_param(&href, keys).map(Candidate::new)
            }
            Extractor::Attribute { name } => element
                .value()
                .attr(name)
                .map(str::trim)
                .map(Candidate::new),
            Extractor::Href => element
                .value()
                .attr("href")
                .and_then(|href| page.resolve_href(href))
                .map(|url| Candidate::new(url.to_string())),
            Extractor::FormFields => {
                let action = match element.value().attr("action") {
                    Some(action) if !action.trim().is_empty() => page.resolve_href(action)?,
                    _ => page.url.clone(),
                };
                Some(Candidate {
                    value: action.to_string(),
                    form_body: Some(self.serialize_form(element)),
                })
            }
        }
    }

    /// `application/x-www-form-urlencoded` body of every named field, in document order.
    ///
    /// Nothing is filtered by type or state: submit buttons, unchecked boxes and
    /// disabled fields are included.
    fn serialize_form(&self, form: ElementRef) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for field in form.select(&self.form_fields) {
            let element = field.value();
            let Some(name) = element.attr("name").filter(|name| !name.is_empty()) else {
                continue;
            };
            let value = match element.name() {
                "textarea" => field.text().collect::<String>(),
                "select" => self.selected_option(field),
                _ => match element.attr("type").map(str::to_ascii_lowercase).as_deref() {
                    Some("checkbox" | "radio") => element.attr("value").unwrap_or("on").to_string(),
                    _ => element.attr("value").unwrap_or_default().to_string(),
                },
            };
            serializer.append_pair(name, &value);
        }
        serializer.finish()
    }

    fn selected_option(&self, select: ElementRef) -> String {
        let mut options = select.select(&self.options);
        let first = options.next();
        let chosen = first
            .into_iter()
            .chain(options)
            .find(|option| option.value().attr("selected").is_some())
            .or(first);
        chosen
            .map(|option| match option.value().attr("value") {
                Some(value) => value.to_string(),
                None => option.text().collect::<String>().trim().to_string(),
            })
            .unwrap_or_default()
    }
}

/// Finds the URL opened by the click handler bound to `#id` in inline scripts.
fn find_script_redirect(id: &str, scripts: &[String]) -> Option<String> {
    let pattern = format!(
        r#"(?:#{id}["'\s,]|getElementById\(\s*["']{id}["'])[\s\S]{{0,{window}}}?["'](https?://[^"'\s]+)["']"#,
        id = regex::escape(id),
        window = SCRIPT_SEARCH_WINDOW
    );
    let regex = Regex::new(&pattern).ok()?;
    scripts.iter().find_map(|script| {
        regex
            .captures(script)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

fn query_param(url: &Url, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        url.query_pairs()
            .find(|(name, value)| name == key && !value.trim().is_empty())
            .map(|(_, value)| value.trim().to_string())
    })
}

fn ajax_endpoint(_candidate: &str, page_url: &Url) -> Option<String> {
    page_url.join("/ajax/download").ok().map(String::from)
}

fn ajax_body(candidate: &Candidate) -> Option<String> {
    Some(
        form_urlencoded::Serializer::new(String::new())
            .append_pair("id", &candidate.value)
            .finish(),
    )
}

fn form_body(candidate: &Candidate) -> Option<String> {
    candidate.form_body.clone()
}

fn headers(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// The built-in rule list, most specific first.
pub fn default_rules() -> Result<Vec<ExtractionRule>, RuleError> {
    const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

    Ok(vec![
        ExtractionRule::new(
            "script-redirect",
            &["a.download-button[id]", "a.dl-button[id]"],
            Extractor::ScriptRedirect,
            None,
        )?,
        ExtractionRule::new(
            "query-param",
            &[
                r#"a[href*="?url="]"#,
                r#"a[href*="&url="]"#,
                r#"a[href*="?link="]"#,
                r#"a[href*="&link="]"#,
            ],
            Extractor::QueryParam {
                keys: &["url", "link"],
            },
            None,
        )?,
        ExtractionRule::new(
            "ajax-json",
            &["[data-download-id]"],
            Extractor::Attribute {
                name: "data-download-id",
            },
            Some(RequestSpec {
                method: Method::Post,
                url: UrlSpec::Computed(ajax_endpoint),
                headers: headers(&[
                    ("X-Requested-With", "XMLHttpRequest"),
                    ("Content-Type", FORM_CONTENT_TYPE),
                ]),
                body: Some(ajax_body),
                parser: ResponseParser::AjaxJson,
            }),
        )?,
        ExtractionRule::new(
            "redirector",
            &[
                r#"a[href*="://linkvault.cc/"]"#,
                r#"a[href*="://linkvault.to/"]"#,
                r#"a[href*="://www.linkvault.cc/"]"#,
                r#"a[href*="://www.linkvault.to/"]"#,
            ],
            Extractor::Href,
            Some(RequestSpec {
                method: Method::Get,
                url: UrlSpec::FromCandidate,
                headers: headers(&[("Referer", "https://linkvault.cc/")]),
                body: None,
                parser: ResponseParser::Redirector {
                    first_party_hosts: FIRST_PARTY_REDIRECTOR_HOSTS,
                },
            }),
        )?,
        ExtractionRule::new(
            "meta-refresh-form",
            &["form.download-form", r#"form[action*="/download"]"#],
            Extractor::FormFields,
            Some(RequestSpec {
                method: Method::Post,
                url: UrlSpec::FromCandidate,
                headers: headers(&[("Content-Type", FORM_CONTENT_TYPE)]),
                body: Some(form_body),
                parser: ResponseParser::MetaRefresh,
            }),
        )?,
        ExtractionRule::new(
            "redirect-follower",
            &[
                r#"a[href*="/go/"]"#,
                r#"a[href*="/out/"]"#,
                r#"a[rel~="external"][href*="/r/"]"#,
            ],
            Extractor::Href,
            Some(RequestSpec {
                method: Method::Get,
                url: UrlSpec::FromCandidate,
                headers: Vec::new(),
                body: None,
                parser: ResponseParser::RedirectFollower,
            }),
        )?,
    ])
}
