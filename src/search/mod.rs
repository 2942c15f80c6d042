//! Search Module
//!
//! Web search used as an agent tool. Uses SerpAPI's DuckDuckGo engine as the backend.

pub mod serpapi;

pub use serpapi::{parse_organic_results, SearchError, SerpApiClient, WebResult, WebSearch};
