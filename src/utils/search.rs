//! Web search fallback for company domains.

use crate::core::config::Config;
use crate::core::error::{AppError, Result};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

static RESULT_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__a").expect("result link selector must parse"));
static ANY_LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("link selector must parse"));

/// Something that turns a query into result links, in page order.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<String>>;
}

/// Queries the DuckDuckGo HTML endpoint.
pub struct DuckDuckGoSearch {
    client: Client,
    endpoint: String,
}

impl DuckDuckGoSearch {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Initialization(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::new(client, config.search_url.clone()))
    }
}

#[async_trait]
impl WebSearch for DuckDuckGoSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let url = Url::parse_with_params(&self.endpoint, &[("q", query)])?;
        tracing::debug!(target: "domain_task", "Searching: {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;

        let links = extract_result_links(&body);
        tracing::debug!(target: "domain_task", "Search for '{}' returned {} links", query, links.len());
        Ok(links)
    }
}

/// Pulls result links out of a results page.
///
/// Prefers the organic result anchors; falls back to every link on the page
/// when the markup has none.
pub(crate) fn extract_result_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let mut hrefs: Vec<&str> = document
        .select(&RESULT_LINK_SELECTOR)
        .filter_map(|a| a.value().attr("href"))
        .collect();
    if hrefs.is_empty() {
        hrefs = document
            .select(&ANY_LINK_SELECTOR)
            .filter_map(|a| a.value().attr("href"))
            .collect();
    }

    hrefs.into_iter().filter_map(decode_result_link).collect()
}

/// Resolves a result href to the target URL.
///
/// DuckDuckGo wraps results as `//duckduckgo.com/l/?uddg=<encoded target>`.
/// Anything that is not http(s) after unwrapping is dropped.
pub(crate) fn decode_result_link(href: &str) -> Option<String> {
    let href = href.trim();
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with('/') {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    let url = Url::parse(&absolute).ok()?;
    let is_redirect = url
        .host_str()
        .is_some_and(|host| host.ends_with("duckduckgo.com"))
        && url.path().starts_with("/l/");
    if is_redirect {
        let target = url
            .query_pairs()
            .find(|(key, _)| key == "uddg")
            .map(|(_, value)| value.into_owned())?;
        return decode_result_link(&target);
    }

    match url.scheme() {
        "http" | "https" => Some(url.to_string()),
        _ => None,
    }
}
