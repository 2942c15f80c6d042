//! Agent System
//!
//! The legal team that answers questions about an uploaded document:
//!
//! - **Legal Advisor**: finds relevant law, cases and citations (knowledge base + web search)
//! - **Contract Examiner**: key clauses, obligations and ambiguities (knowledge base)
//! - **Risk Assessor**: legal risks and strategy (knowledge base)
//! - **Analysis Coordinator**: merges the three into one report (no tools)
//!
//! ```text
//!   query ──┬──► Legal Advisor ─────┐
//!           ├──► Contract Examiner ─┼──► Analysis Coordinator ──► report
//!           └──► Risk Assessor ─────┘
//! ```
//!
//! The team is assembled once per ingested document and reused for every query.

pub mod agent;
pub mod roles;
pub mod tools;

pub use agent::{Agent, ModelSettings, RunResponse, ToolCallRecord};
pub use tools::Tool;

use std::sync::Arc;

use crate::embeddings::KnowledgeBase;
use crate::search::WebSearch;

/// What the factory needs besides the knowledge base
#[derive(Clone)]
pub struct TeamOptions {
    pub model: String,
    pub web_search: Option<Arc<dyn WebSearch>>,
    pub web_search_max_results: usize,
}

#[derive(Clone)]
pub struct AgentTeam {
    pub legal_advisor: Agent,
    pub contract_examiner: Agent,
    pub risk_assessor: Agent,
    pub coordinator: Agent,
}

impl AgentTeam {
    /// Build the four role descriptors around `knowledge`.
    ///
    /// Returns `None` when there is no knowledge base yet; callers must check this
    /// before running an analysis.
    pub fn assemble(knowledge: Option<Arc<dyn KnowledgeBase>>, options: &TeamOptions) -> Option<Self> {
        let knowledge = knowledge?;
        let web_tool = options.web_search.clone().map(|client| Tool::WebSearch {
            client,
            max_results: options.web_search_max_results,
        });

        Some(Self {
            legal_advisor: roles::legal_advisor(knowledge.clone(), web_tool, &options.model),
            contract_examiner: roles::contract_examiner(knowledge.clone(), &options.model),
            risk_assessor: roles::risk_assessor(knowledge, &options.model),
            coordinator: roles::analysis_coordinator(&options.model),
        })
    }

    /// Advisor, examiner and assessor, in invocation order
    pub fn specialists(&self) -> [&Agent; 3] {
        [&self.legal_advisor, &self.contract_examiner, &self.risk_assessor]
    }
}
