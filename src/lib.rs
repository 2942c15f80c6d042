// Legal Analyzer - multi-agent legal document analysis

pub mod config;
pub mod models;
pub mod types;
pub mod agents;
pub mod llm;
pub mod search;    // Web search (SerpAPI DuckDuckGo engine) for the legal advisor
pub mod embeddings;
pub mod routes;
pub mod middleware;
pub mod utils;
pub mod session;
pub mod analysis;

#[cfg(any(test, feature = "test-util"))]
#[doc(hidden)]
pub mod testing;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
