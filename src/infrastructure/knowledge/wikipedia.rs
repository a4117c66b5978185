use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::{
    ports::{KnowledgeSource, Summary},
    DomainError,
};
use crate::infrastructure::config::ExternalConfig;

const API_PATH: &str = "/w/api.php";
const MAX_CANDIDATES: usize = 20;

/// MediaWiki action API client.
///
/// A lookup searches for the best-matching title first, so free-form
/// questions resolve to an article, then fetches the plain-text intro.
pub struct WikipediaClient {
    http: reqwest::Client,
    base_url: String,
    list_item: Regex,
    anchor: Regex,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    query: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    missing: bool,
    extract: Option<String>,
    pageprops: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: Option<ParsedPage>,
}

#[derive(Debug, Deserialize)]
struct ParsedPage {
    text: String,
}

impl WikipediaClient {
    pub fn new(config: &ExternalConfig) -> Result<Self, DomainError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        // Disambiguation pages list their targets as `<li>` entries whose
        // first article link names the candidate.
        let list_item = Regex::new(r#"(?s)<li(?:\s[^>]*)?>(.*?)</li>"#)
            .map_err(|e| DomainError::internal(e.to_string()))?;
        let anchor = Regex::new(r#"<a\s[^>]*?href="/wiki/[^"]*"[^>]*?title="([^"]+)""#)
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            list_item,
            anchor,
        })
    }

    /// Overrides the API host (for testing with wiremock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn call<T>(&self, action: &str, params: &[(&str, &str)]) -> Result<T, DomainError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .get(format!("{}{API_PATH}", self.base_url))
            .query(&[("action", action), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()
            .await
            .map_err(|e| DomainError::external(format!("wikipedia request failed: {e}")))?
            .error_for_status()
            .map_err(|e| DomainError::external(format!("wikipedia returned error: {e}")))?;

        response
            .json()
            .await
            .map_err(|e| DomainError::external(format!("wikipedia response malformed: {e}")))
    }

    async fn get<T>(&self, params: &[(&str, &str)]) -> Result<Option<T>, DomainError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let body: ApiResponse<T> = self.call("query", params).await?;
        Ok(body.query)
    }

    async fn best_title(&self, topic: &str) -> Result<Option<String>, DomainError> {
        let query: Option<SearchQuery> = self
            .get(&[("list", "search"), ("srsearch", topic), ("srlimit", "1")])
            .await?;
        Ok(query.and_then(|q| q.search.into_iter().next()).map(|hit| hit.title))
    }

    async fn page(&self, title: &str, sentences: usize) -> Result<Option<Page>, DomainError> {
        let sentences = sentences.to_string();
        let query: Option<PagesQuery> = self
            .get(&[
                ("prop", "extracts|pageprops"),
                ("titles", title),
                ("redirects", "1"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("exsentences", sentences.as_str()),
                ("ppprop", "disambiguation"),
            ])
            .await?;
        Ok(query.and_then(|q| q.pages.into_iter().next()))
    }

    /// Candidate titles of a disambiguation page, in the order the page
    /// lists them.
    async fn candidates(&self, title: &str) -> Result<Vec<String>, DomainError> {
        let body: ParseResponse = self
            .call(
                "parse",
                &[("page", title), ("prop", "text"), ("redirects", "1")],
            )
            .await?;
        Ok(body
            .parse
            .map(|page| self.list_titles(&page.text))
            .unwrap_or_default())
    }

    fn list_titles(&self, html: &str) -> Vec<String> {
        let mut titles: Vec<String> = Vec::new();
        for item in self.list_item.captures_iter(html) {
            if item[0].starts_with("<li class=\"toc") {
                continue;
            }
            let Some(link) = self.anchor.captures(&item[1]) else {
                continue;
            };
            let title = unescape(&link[1]);
            if !titles.contains(&title) {
                titles.push(title);
            }
            if titles.len() == MAX_CANDIDATES {
                break;
            }
        }
        titles
    }
}

fn unescape(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[async_trait]
impl KnowledgeSource for WikipediaClient {
    async fn summary(&self, topic: &str, sentences: usize) -> Result<Summary, DomainError> {
        let Some(title) = self.best_title(topic).await? else {
            debug!(topic, "no wikipedia search results");
            return Ok(Summary::Missing);
        };

        let Some(page) = self.page(&title, sentences).await? else {
            return Ok(Summary::Missing);
        };
        if page.missing {
            return Ok(Summary::Missing);
        }

        let is_disambiguation = page
            .pageprops
            .as_ref()
            .is_some_and(|props| props.get("disambiguation").is_some());
        if is_disambiguation {
            return Ok(Summary::Ambiguous(self.candidates(&title).await?));
        }

        match page.extract {
            Some(text) if !text.trim().is_empty() => Ok(Summary::Article(text.trim().to_string())),
            _ => Ok(Summary::Missing),
        }
    }
}
