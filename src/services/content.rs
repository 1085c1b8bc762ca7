// src/services/content.rs

//! Content search service.
//!
//! Queries the Guardian content API for recent articles and reduces each
//! result to the fields the stream carries.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::models::{ContentConfig, Record};
use crate::utils::http::create_async_client;

/// Source of raw content items.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Search for `term` published on or after `date_from` (`YYYY-MM-DD`).
    async fn fetch(&self, api_key: &str, term: &str, date_from: &str) -> Result<Vec<Value>>;
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    response: Option<SearchResponse>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Value>,
}

/// Extract the result items from a search response body.
///
/// A body without `response` or `results` yields no items.
pub fn parse_search_response(body: &str) -> Result<Vec<Value>> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let envelope: SearchEnvelope = serde_json::from_str(body)?;
    Ok(envelope.response.map(|r| r.results).unwrap_or_default())
}

/// Reduce raw items to [`Record`]s, keeping order and length.
///
/// Only string values of the whitelisted keys survive; anything else is
/// dropped silently.
pub fn filter_results(items: &[Value]) -> Vec<Record> {
    items
        .iter()
        .map(|item| {
            let field = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
            Record {
                web_publication_date: field("webPublicationDate"),
                web_title: field("webTitle"),
                web_url: field("webUrl"),
            }
        })
        .collect()
}

/// Guardian content API client.
pub struct GuardianClient {
    client: Client,
    base_url: String,
    page_size: u32,
}

impl GuardianClient {
    /// Create a client from content settings.
    pub fn new(config: &ContentConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            base_url: config.base_url.clone(),
            page_size: config.page_size,
        })
    }
}

#[async_trait]
impl ContentSource for GuardianClient {
    async fn fetch(&self, api_key: &str, term: &str, date_from: &str) -> Result<Vec<Value>> {
        let page_size = self.page_size.to_string();
        let show_fields = Record::FIELDS.join(",");

        debug!("Searching {} for '{}' from {}", self.base_url, term, date_from);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("api-key", api_key),
                ("q", term),
                ("from-date", date_from),
                ("page", "1"),
                ("page-size", page_size.as_str()),
                ("show-fields", show_fields.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ContentFetchHttp {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let items = parse_search_response(&body)?;
        info!("Content search for '{}' returned {} items", term, items.len());
        Ok(items)
    }
}
