//! SerpAPI Client
//!
//! Web search for the Legal Advisor's supplementary references, using the
//! SerpAPI DuckDuckGo engine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serpapi_search_rust::serp_api_search::SerpApiSearch;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("SerpAPI key not configured")]
    NoApiKey,

    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse search results: {0}")]
    ParseError(String),

    #[error("No results found for query")]
    NoResults,
}

/// One organic web result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResult {
    pub title: String,
    pub snippet: String,
    pub link: String,
    /// Source domain
    pub source: Option<String>,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebResult>, SearchError>;
}

/// SerpAPI client for web search
pub struct SerpApiClient {
    api_key: String,
    engine: String,
}

impl SerpApiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            engine: "duckduckgo".to_string(),
        }
    }

    /// Configure client from config; `None` when no key is set
    pub fn from_config(config: &crate::config::SearchConfig) -> Option<Self> {
        if config.serpapi_key.trim().is_empty() {
            return None;
        }
        Some(Self::new(config.serpapi_key.trim().to_string()))
    }
}

#[async_trait]
impl WebSearch for SerpApiClient {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<WebResult>, SearchError> {
        if self.api_key.is_empty() {
            return Err(SearchError::NoApiKey);
        }
        info!(query = %query, engine = %self.engine, "Searching the web via SerpAPI");

        let mut params = HashMap::<String, String>::new();
        params.insert("engine".to_string(), self.engine.clone());
        params.insert("q".to_string(), query.to_string());
        params.insert("kl".to_string(), "us-en".to_string());

        let search = SerpApiSearch::google(params, self.api_key.clone());
        let results = search
            .json()
            .await
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        debug!("Raw SerpAPI response received");
        let parsed = parse_organic_results(&results, max_results)?;
        info!(count = parsed.len(), "Web search completed");
        Ok(parsed)
    }
}

/// Extract `organic_results` from a SerpAPI response body
pub fn parse_organic_results(
    results: &serde_json::Value,
    max_results: usize,
) -> Result<Vec<WebResult>, SearchError> {
    if let Some(error) = results.get("error").and_then(|v| v.as_str()) {
        return Err(SearchError::RequestFailed(error.to_string()));
    }

    let organic_results = results.get("organic_results").ok_or(SearchError::NoResults)?;
    let results_array = organic_results
        .as_array()
        .ok_or_else(|| SearchError::ParseError("Expected array of results".to_string()))?;

    if results_array.is_empty() {
        return Err(SearchError::NoResults);
    }

    Ok(results_array
        .iter()
        .take(max_results)
        .map(|result| {
            let link = result
                .get("link")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            WebResult {
                title: result
                    .get("title")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Untitled")
                    .to_string(),
                snippet: result
                    .get("snippet")
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string(),
                source: result
                    .get("source")
                    .and_then(|v| v.as_str())
                    .map(String::from)
                    .or_else(|| link.split('/').nth(2).map(String::from)),
                link,
            }
        })
        .collect())
}
