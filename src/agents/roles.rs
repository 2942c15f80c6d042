// Role definitions for the legal team

use std::sync::Arc;

use crate::agents::agent::Agent;
use crate::agents::tools::Tool;
use crate::embeddings::KnowledgeBase;

const KNOWLEDGE_ACCESS: &str = "IMPORTANT: You have access to a knowledge base containing the uploaded legal document. \
     Use the knowledge base search to access this content.";

const NOT_FOUND_POLICY: &str =
    "If you cannot find content, explicitly state what you searched for and what was found.";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn legal_advisor(knowledge: Arc<dyn KnowledgeBase>, web_search: Option<Tool>, model: &str) -> Agent {
    Agent {
        name: "LegalAdvisor".to_string(),
        model: model.to_string(),
        description: "AI Legal Advisor - Discovers and references relevant legal cases, regulations, and \
                      precedents using comprehensive document data."
            .to_string(),
        instructions: strings(&[
            KNOWLEDGE_ACCESS,
            "First, search the knowledge base for the document content using relevant keywords.",
            "Extract all available data from the knowledge base and search for legal cases, regulations, and citations.",
            "If needed, use DuckDuckGo for additional legal references.",
            "Always provide source references in your answers.",
            NOT_FOUND_POLICY,
        ]),
        tools: web_search.into_iter().collect(),
        knowledge: Some(knowledge),
        search_knowledge: true,
        show_tool_calls: true,
        markdown: true,
    }
}

pub fn contract_examiner(knowledge: Arc<dyn KnowledgeBase>, model: &str) -> Agent {
    Agent {
        name: "ContractExaminer".to_string(),
        model: model.to_string(),
        description: "AI Contract Examiner - Reviews contracts and identifies key clauses, risks, and \
                      obligations using comprehensive document data."
            .to_string(),
        instructions: strings(&[
            KNOWLEDGE_ACCESS,
            "First, search the knowledge base for the document content using relevant keywords like \
             'contract', 'agreement', 'terms', 'clauses'.",
            "Extract all available data from the knowledge base and analyze the contract for key clauses, \
             obligations, and potential ambiguities.",
            "Reference specific sections of the contract where possible.",
            NOT_FOUND_POLICY,
        ]),
        tools: Vec::new(),
        knowledge: Some(knowledge),
        search_knowledge: true,
        show_tool_calls: true,
        markdown: true,
    }
}

pub fn risk_assessor(knowledge: Arc<dyn KnowledgeBase>, model: &str) -> Agent {
    Agent {
        name: "RiskAssessor".to_string(),
        model: model.to_string(),
        description: "AI Risk Assessor - Provides comprehensive risk assessment and strategic recommendations \
                      based on comprehensive contract data."
            .to_string(),
        instructions: strings(&[
            KNOWLEDGE_ACCESS,
            "First, search the knowledge base for the document content using relevant keywords like \
             'risk', 'liability', 'obligation', 'compliance'.",
            "Using all data from the knowledge base, assess the contract for legal risks and opportunities.",
            "Provide actionable recommendations and ensure compliance with applicable laws.",
            NOT_FOUND_POLICY,
        ]),
        tools: Vec::new(),
        knowledge: Some(knowledge),
        search_knowledge: true,
        show_tool_calls: true,
        markdown: true,
    }
}

/// The coordinator only sees what the specialists hand it
pub fn analysis_coordinator(model: &str) -> Agent {
    Agent {
        name: "AnalysisCoordinator".to_string(),
        model: model.to_string(),
        description: "AI Analysis Coordinator - Integrates responses from the Legal Advisor, Contract Examiner, \
                      and Risk Assessor into a comprehensive report."
            .to_string(),
        instructions: strings(&[
            "Combine and summarize all insights provided by the Legal Advisor, Contract Examiner, and Risk Assessor.",
            "Ensure the final report includes references to all relevant sections from the document.",
        ]),
        tools: Vec::new(),
        knowledge: None,
        search_knowledge: false,
        show_tool_calls: true,
        markdown: true,
    }
}
