use crate::http::{HttpClient, HttpResponse};
use crate::types::{Form, FormField, FormMethod, Target};
use crate::utils::urls::origin_of;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

lazy_static! {
    static ref FETCH_CALL: Regex =
        Regex::new(r#"fetch\(["'](.*?)["']\)"#).expect("fetch pattern is a valid regex");
}

const IGNORED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:"];

/// Insertion-ordered set of URLs, deduplicated by exact string equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct UrlSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl UrlSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the URL was already present.
    pub fn insert(&mut self, url: String) -> bool {
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.order.push(url);
        true
    }

    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl From<Vec<String>> for UrlSet {
    fn from(urls: Vec<String>) -> Self {
        urls.into_iter().collect()
    }
}

impl From<UrlSet> for Vec<String> {
    fn from(set: UrlSet) -> Self {
        set.order
    }
}

impl FromIterator<String> for UrlSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = UrlSet::new();
        for url in iter {
            set.insert(url);
        }
        set
    }
}

/// Everything one crawl pass discovered. Read-only once the crawl returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlResult {
    pub links: UrlSet,
    pub forms: Vec<Form>,
    pub endpoints: UrlSet,
    /// Set when the home page could not be fetched.
    pub fetch_error: Option<String>,
}

impl CrawlResult {
    /// Links followed by script endpoints not already among the links.
    pub fn urls(&self) -> impl Iterator<Item = &String> {
        self.links
            .iter()
            .chain(self.endpoints.iter().filter(move |e| !self.links.contains(e.as_str())))
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.forms.is_empty() && self.endpoints.is_empty()
    }
}

/// Single-level crawler: one fetch of the base URL, one parse.
#[derive(Debug, Clone, Default)]
pub struct SiteCrawler {
    strict_origin: bool,
}

impl SiteCrawler {
    pub fn new(strict_origin: bool) -> Self {
        Self { strict_origin }
    }

    /// Fetch the base URL and parse it. Never fails: a network error yields
    /// an empty result with `fetch_error` set.
    pub async fn crawl(&self, client: &dyn HttpClient, target: &Target) -> CrawlResult {
        info!("Crawling {} for links and forms", target.base_url());
        match client.get(target.base_url()).await {
            Ok(response) => self.crawl_response(&response, target),
            Err(e) => {
                warn!("Error during crawling of {}: {}", target.base_url(), e);
                CrawlResult {
                    fetch_error: Some(e.to_string()),
                    ..CrawlResult::default()
                }
            }
        }
    }

    /// Parse an already fetched home page.
    pub fn crawl_response(&self, response: &HttpResponse, target: &Target) -> CrawlResult {
        self.parse_page(&response.body, target)
    }

    /// Extract links, forms and script endpoints from `html`, resolving every
    /// reference against the target base URL.
    pub fn parse_page(&self, html: &str, target: &Target) -> CrawlResult {
        let mut result = CrawlResult::default();

        let base = match Url::parse(target.base_url()) {
            Ok(base) => base,
            Err(e) => {
                warn!("Cannot resolve links against {}: {}", target.base_url(), e);
                result.fetch_error = Some(e.to_string());
                return result;
            }
        };

        let document = Html::parse_document(html);

        if let Some(selector) = selector("a") {
            for anchor in document.select(&selector) {
                let Some(href) = anchor.value().attr("href") else { continue };
                let href = href.trim();
                let lowered = href.to_ascii_lowercase();
                if href.is_empty() || IGNORED_SCHEMES.iter().any(|s| lowered.starts_with(s)) {
                    continue;
                }
                let Ok(full_url) = base.join(href) else {
                    debug!("Skipping unresolvable href {}", href);
                    continue;
                };
                let full_url = full_url.to_string();
                if self.same_origin(&full_url, target) && result.links.insert(full_url.clone()) {
                    debug!("Found link: {}", full_url);
                }
            }
        }

        if let (Some(form_selector), Some(input_selector)) = (selector("form"), selector("input")) {
            for form in document.select(&form_selector) {
                let parsed = parse_form(form, &input_selector, &base, target);
                debug!("Found form: {} ({})", parsed.action, parsed.method);
                result.forms.push(parsed);
            }
        }

        if let Some(script_selector) = selector("script") {
            for script in document.select(&script_selector) {
                if script.value().attr("src").is_some() {
                    continue;
                }
                let code: String = script.text().collect();
                for capture in FETCH_CALL.captures_iter(&code) {
                    let Ok(endpoint) = base.join(&capture[1]) else { continue };
                    let endpoint = endpoint.to_string();
                    if result.endpoints.insert(endpoint.clone()) {
                        debug!("Found API endpoint: {}", endpoint);
                    }
                }
            }
        }

        info!(
            "Crawl found {} links, {} forms, {} endpoints",
            result.links.len(),
            result.forms.len(),
            result.endpoints.len()
        );
        result
    }

    fn same_origin(&self, url: &str, target: &Target) -> bool {
        if !self.strict_origin {
            return url.contains(target.base_url());
        }
        match (origin_of(url), origin_of(target.base_url())) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!("Invalid selector {}: {:?}", css, e);
            None
        }
    }
}

fn parse_form(form: ElementRef<'_>, inputs: &Selector, base: &Url, target: &Target) -> Form {
    let action = match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => base
            .join(action)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| target.base_url().to_string()),
        _ => target.base_url().to_string(),
    };

    let fields = form
        .select(inputs)
        .map(|input| {
            let element = input.value();
            FormField {
                name: element.attr("name").map(str::to_string),
                input_type: element.attr("type").unwrap_or("text").to_ascii_lowercase(),
                default_value: element.attr("value").unwrap_or("").to_string(),
            }
        })
        .collect();

    Form {
        action,
        method: FormMethod::parse(form.value().attr("method")),
        fields,
    }
}
