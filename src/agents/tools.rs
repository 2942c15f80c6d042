// Tools agents may call during a run

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::embeddings::KnowledgeBase;
use crate::search::WebSearch;
use crate::types::ToolDefinition;

pub const KNOWLEDGE_SEARCH_TOOL: &str = "search_knowledge_base";
pub const WEB_SEARCH_TOOL: &str = "duckduckgo_search";

#[derive(Clone)]
pub enum Tool {
    /// Search the uploaded document's chunks
    KnowledgeSearch(Arc<dyn KnowledgeBase>),
    /// Search the public web for legal references
    WebSearch {
        client: Arc<dyn WebSearch>,
        max_results: usize,
    },
}

#[derive(Debug, Deserialize)]
struct QueryArgs {
    query: String,
    #[serde(default)]
    max_results: Option<usize>,
}

#[derive(Serialize)]
struct KnowledgeHit<'a> {
    page: u32,
    content: &'a str,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::KnowledgeSearch(_) => KNOWLEDGE_SEARCH_TOOL,
            Tool::WebSearch { .. } => WEB_SEARCH_TOOL,
        }
    }

    pub fn definition(&self) -> ToolDefinition {
        match self {
            Tool::KnowledgeSearch(_) => ToolDefinition {
                name: KNOWLEDGE_SEARCH_TOOL.to_string(),
                description: "Use this function to search the knowledge base containing the uploaded \
                              legal document. Returns the most relevant passages with page numbers."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "Keywords or question to search for." }
                    },
                    "required": ["query"]
                }),
            },
            Tool::WebSearch { max_results, .. } => ToolDefinition {
                name: WEB_SEARCH_TOOL.to_string(),
                description: "Use this function to search the web (DuckDuckGo) for legal cases, \
                              regulations and citations."
                    .to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "The query to search for." },
                        "max_results": {
                            "type": "integer",
                            "description": format!("Number of results to return (default {}).", max_results)
                        }
                    },
                    "required": ["query"]
                }),
            },
        }
    }

    /// Run the tool. Failures come back as text for the model to read.
    pub async fn execute(&self, arguments: &str) -> String {
        let args: QueryArgs = match serde_json::from_str(arguments) {
            Ok(args) => args,
            Err(e) => {
                warn!(tool = self.name(), error = %e, "Malformed tool arguments");
                return format!("Invalid arguments for {}: {}", self.name(), e);
            }
        };

        match self {
            Tool::KnowledgeSearch(kb) => match kb.search(&args.query).await {
                Ok(chunks) if chunks.is_empty() => {
                    format!("No documents found in the knowledge base for '{}'.", args.query)
                }
                Ok(chunks) => {
                    let hits: Vec<KnowledgeHit<'_>> = chunks
                        .iter()
                        .map(|c| KnowledgeHit { page: c.page, content: &c.content })
                        .collect();
                    serde_json::to_string(&hits).unwrap_or_else(|e| format!("Could not encode results: {}", e))
                }
                Err(e) => {
                    warn!(error = %e, "Knowledge base search failed");
                    format!("Knowledge base search failed: {}", e)
                }
            },
            Tool::WebSearch { client, max_results } => {
                let limit = args.max_results.unwrap_or(*max_results).clamp(1, 10);
                match client.search(&args.query, limit).await {
                    Ok(results) => serde_json::to_string(&results)
                        .unwrap_or_else(|e| format!("Could not encode results: {}", e)),
                    Err(e) => {
                        warn!(error = %e, "Web search failed");
                        format!("Web search failed: {}", e)
                    }
                }
            }
        }
    }
}
