//! Analysis Orchestrator
//!
//! Turns a query into a three-part report: the specialists answer first, their
//! answers are cut to an excerpt budget and handed to the coordinator, and the
//! coordinator's report is then mined for key points and recommendations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::agents::{Agent, AgentTeam, ModelSettings, RunResponse};
use crate::config::AnalysisConfig;
use crate::llm::LLMAdapter;
use crate::types::{AppError, AppResult};
use crate::utils::truncate_chars;

pub const EMPTY_QUERY_MESSAGE: &str = "Please enter a query.";
const NO_ANALYSIS: &str = "No response generated.";
const NO_KEY_POINTS: &str = "No summary generated.";
const NO_RECOMMENDATIONS: &str = "No recommendations generated.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    ContractReview,
    LegalResearch,
    RiskAssessment,
    ComplianceCheck,
    CustomQuery,
}

impl AnalysisType {
    pub const ALL: [AnalysisType; 5] = [
        AnalysisType::ContractReview,
        AnalysisType::LegalResearch,
        AnalysisType::RiskAssessment,
        AnalysisType::ComplianceCheck,
        AnalysisType::CustomQuery,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AnalysisType::ContractReview => "Contract Review",
            AnalysisType::LegalResearch => "Legal Research",
            AnalysisType::RiskAssessment => "Risk Assessment",
            AnalysisType::ComplianceCheck => "Compliance Check",
            AnalysisType::CustomQuery => "Custom Query",
        }
    }

    pub fn preset_query(&self) -> Option<&'static str> {
        match self {
            AnalysisType::ContractReview => Some(
                "Analyze this document, contract, or agreement using all available data from the knowledge base. \
                 Identify key terms, obligations, and risks in detail.",
            ),
            AnalysisType::LegalResearch => Some(
                "Using all available data from the knowledge base, find relevant legal cases and precedents related \
                 to this document, contract, or agreement. Provide detailed references and sources.",
            ),
            AnalysisType::RiskAssessment => Some(
                "Extract all data from the knowledge base and identify potential legal risks in this document, \
                 contract, or agreement. Detail specific risk areas and reference sections of the text.",
            ),
            AnalysisType::ComplianceCheck => Some(
                "Evaluate this document, contract, or agreement for compliance with legal regulations using all \
                 available data from the knowledge base. Highlight any areas of concern and suggest corrective actions.",
            ),
            AnalysisType::CustomQuery => None,
        }
    }
}

/// The query text for an analysis type; custom queries must not be blank
pub fn resolve_query(kind: AnalysisType, custom: Option<&str>) -> AppResult<String> {
    let query = match kind.preset_query() {
        Some(preset) => preset,
        None => custom.unwrap_or(""),
    };
    if query.trim().is_empty() {
        return Err(AppError::InvalidRequest(EMPTY_QUERY_MESSAGE.to_string()));
    }
    Ok(query.to_string())
}

/// Specialist answers plus the coordinator's report
#[derive(Debug, Clone, Serialize)]
pub struct TeamAnalysis {
    pub specialists: Vec<RunResponse>,
    pub report: RunResponse,
}

/// The three tabs shown to the user
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analysis_type: AnalysisType,
    pub query: String,
    pub analysis: String,
    pub key_points: String,
    pub recommendations: String,
    pub specialists: Vec<RunResponse>,
    pub generated_at: DateTime<Utc>,
}

pub fn coordinator_prompt(research: &str, contract: &str, strategy: &str, excerpt_chars: usize) -> String {
    format!(
        "Create a concise legal analysis report covering:\n\
         1. Key findings from research\n\
         2. Contract analysis highlights\n\
         3. Risk assessment summary\n\
         4. Strategic recommendations\n\n\
         Research: {}...\n\
         Contract: {}...\n\
         Strategy: {}...",
        truncate_chars(research, excerpt_chars),
        truncate_chars(contract, excerpt_chars),
        truncate_chars(strategy, excerpt_chars),
    )
}

pub struct Orchestrator<'a> {
    llm: &'a dyn LLMAdapter,
    settings: &'a ModelSettings,
    options: &'a AnalysisConfig,
}

impl<'a> Orchestrator<'a> {
    pub fn new(llm: &'a dyn LLMAdapter, settings: &'a ModelSettings, options: &'a AnalysisConfig) -> Self {
        Self { llm, settings, options }
    }

    async fn run(&self, agent: &Agent, prompt: &str) -> AppResult<RunResponse> {
        agent.run(self.llm, self.settings, prompt).await
    }

    /// Specialists, then the coordinator over their truncated answers
    pub async fn generate_team_analysis(&self, team: Option<&AgentTeam>, query: &str) -> AppResult<TeamAnalysis> {
        let team = team.ok_or(AppError::AgentsNotInitialized)?;

        let research_prompt = format!("Research legal aspects of: {}", query);
        let contract_prompt = format!("Analyze contract for: {}", query);
        let strategy_prompt = format!("Assess risks and strategy for: {}", query);

        let (research, contract, strategy) = if self.options.parallel_specialists {
            info!("Running specialists concurrently");
            futures::try_join!(
                self.run(&team.legal_advisor, &research_prompt),
                self.run(&team.contract_examiner, &contract_prompt),
                self.run(&team.risk_assessor, &strategy_prompt),
            )?
        } else {
            let research = self.run(&team.legal_advisor, &research_prompt).await?;
            let contract = self.run(&team.contract_examiner, &contract_prompt).await?;
            let strategy = self.run(&team.risk_assessor, &strategy_prompt).await?;
            (research, contract, strategy)
        };

        let prompt = coordinator_prompt(
            research.text(),
            contract.text(),
            strategy.text(),
            self.options.specialist_excerpt_chars,
        );
        let report = self.run(&team.coordinator, &prompt).await?;

        Ok(TeamAnalysis {
            specialists: vec![research, contract, strategy],
            report,
        })
    }

    pub async fn extract_key_points(&self, team: &AgentTeam, analysis: &str) -> AppResult<RunResponse> {
        let prompt = format!(
            "Extract 5 key legal points from: {}...",
            truncate_chars(analysis, self.options.summary_excerpt_chars)
        );
        self.run(&team.coordinator, &prompt).await
    }

    pub async fn extract_recommendations(&self, team: &AgentTeam, analysis: &str) -> AppResult<RunResponse> {
        let prompt = format!(
            "Provide 3 specific legal recommendations from: {}...",
            truncate_chars(analysis, self.options.summary_excerpt_chars)
        );
        self.run(&team.coordinator, &prompt).await
    }

    /// Full report for one request.
    ///
    /// Failures in the key-point or recommendation passes are shown in their tab
    /// rather than failing the whole report.
    pub async fn run_full_analysis(
        &self,
        team: Option<&AgentTeam>,
        analysis_type: AnalysisType,
        query: &str,
    ) -> AppResult<AnalysisReport> {
        info!(analysis_type = analysis_type.label(), query_len = query.len(), "Starting team analysis");
        let team_analysis = self.generate_team_analysis(team, query).await?;
        let team = team.ok_or(AppError::AgentsNotInitialized)?;

        let analysis_text = team_analysis.report.content.clone();
        let analysis = analysis_text.clone().unwrap_or_else(|| NO_ANALYSIS.to_string());
        // follow-up prompts see the raw content, empty when the coordinator said nothing
        let source = analysis_text.unwrap_or_default();

        let key_points = match self.extract_key_points(team, &source).await {
            Ok(run) => run.content.unwrap_or_else(|| NO_KEY_POINTS.to_string()),
            Err(e) => {
                warn!(error = %e, "Key point extraction failed");
                format!("Could not generate key points: {}", e)
            }
        };
        let recommendations = match self.extract_recommendations(team, &source).await {
            Ok(run) => run.content.unwrap_or_else(|| NO_RECOMMENDATIONS.to_string()),
            Err(e) => {
                warn!(error = %e, "Recommendation extraction failed");
                format!("Could not generate recommendations: {}", e)
            }
        };

        info!(analysis_len = analysis.len(), "Team analysis complete");
        Ok(AnalysisReport {
            analysis_type,
            query: query.to_string(),
            analysis,
            key_points,
            recommendations,
            specialists: team_analysis.specialists,
            generated_at: Utc::now(),
        })
    }
}
