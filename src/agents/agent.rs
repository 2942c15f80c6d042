//! Agent
//!
//! A role-configured wrapper around a chat model: name, instructions, optional
//! knowledge base and tools. Descriptors are immutable once built; a run is a
//! bounded loop of completions and tool calls.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::agents::tools::Tool;
use crate::config::Config;
use crate::embeddings::KnowledgeBase;
use crate::llm::LLMAdapter;
use crate::types::{AppResult, LLMMessage, LLMRequest, TokenUsage};

/// Model parameters shared by every agent of a run
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub provider: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Completions that may request tools before the agent must answer
    pub max_tool_rounds: usize,
}

impl ModelSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider: config.llm.default_provider.clone(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            max_tool_rounds: config.analysis.max_tool_rounds,
        }
    }
}

/// A tool invocation made during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub agent: String,
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub usage: TokenUsage,
}

impl RunResponse {
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }
}

#[derive(Clone)]
pub struct Agent {
    pub name: String,
    pub model: String,
    pub description: String,
    pub instructions: Vec<String>,
    pub tools: Vec<Tool>,
    pub knowledge: Option<Arc<dyn KnowledgeBase>>,
    /// Give the agent a search tool over `knowledge`
    pub search_knowledge: bool,
    /// Prefix the answer with the tool calls that produced it
    pub show_tool_calls: bool,
    pub markdown: bool,
}

impl Agent {
    /// Tools offered to the model, including knowledge search when enabled
    pub fn available_tools(&self) -> Vec<Tool> {
        let mut tools = Vec::with_capacity(self.tools.len() + 1);
        if self.search_knowledge {
            if let Some(kb) = &self.knowledge {
                tools.push(Tool::KnowledgeSearch(kb.clone()));
            }
        }
        tools.extend(self.tools.iter().cloned());
        tools
    }

    pub fn system_prompt(&self) -> String {
        let mut prompt = self.description.clone();

        let mut instructions = self.instructions.clone();
        if self.search_knowledge && self.knowledge.is_some() {
            instructions.push(
                "Search your knowledge base with the `search_knowledge_base` tool before answering."
                    .to_string(),
            );
        }
        if self.markdown {
            instructions.push("Use markdown to format your answers.".to_string());
        }

        if !instructions.is_empty() {
            prompt.push_str("\n\n## Instructions\n");
            for instruction in &instructions {
                prompt.push_str("- ");
                prompt.push_str(instruction);
                prompt.push('\n');
            }
        }
        prompt
    }

    pub async fn run(
        &self,
        llm: &dyn LLMAdapter,
        settings: &ModelSettings,
        prompt: &str,
    ) -> AppResult<RunResponse> {
        info!(agent = %self.name, prompt_len = prompt.len(), "Agent run started");

        let tools = self.available_tools();
        let definitions: Vec<_> = tools.iter().map(Tool::definition).collect();
        let system = self.system_prompt();

        let mut messages = vec![LLMMessage::user(prompt)];
        let mut records = Vec::new();
        let mut usage = TokenUsage::default();
        let mut rounds = 0;

        let answer = loop {
            let offer_tools = !definitions.is_empty() && rounds < settings.max_tool_rounds;
            let request = LLMRequest {
                provider: settings.provider.clone(),
                model: self.model.clone(),
                messages: messages.clone(),
                max_tokens: Some(settings.max_tokens),
                temperature: Some(settings.temperature),
                system_instruction: Some(system.clone()),
                tools: if offer_tools { definitions.clone() } else { Vec::new() },
            };

            let response = llm.create_chat_completion(&request).await?;
            usage.prompt_tokens += response.usage.prompt_tokens;
            usage.completion_tokens += response.usage.completion_tokens;
            usage.total_tokens += response.usage.total_tokens;

            if response.tool_calls.is_empty() || !offer_tools {
                break response.content;
            }

            rounds += 1;
            messages.push(LLMMessage::assistant_with_tool_calls(
                response.content.clone(),
                response.tool_calls.clone(),
            ));

            for call in response.tool_calls {
                let output = match tools.iter().find(|t| t.name() == call.name) {
                    Some(tool) => tool.execute(&call.arguments).await,
                    None => {
                        warn!(agent = %self.name, tool = %call.name, "Model requested unknown tool");
                        format!("Unknown tool: {}", call.name)
                    }
                };
                debug!(agent = %self.name, tool = %call.name, output_len = output.len(), "Tool call finished");
                records.push(ToolCallRecord {
                    name: call.name,
                    arguments: call.arguments,
                });
                messages.push(LLMMessage::tool(call.id, output));
            }
        };

        let content = self.render_content(answer, &records);
        info!(
            agent = %self.name,
            tool_calls = records.len(),
            content_len = content.as_ref().map(|c| c.len()).unwrap_or(0),
            "Agent run finished"
        );

        Ok(RunResponse {
            agent: self.name.clone(),
            content,
            tool_calls: records,
            usage,
        })
    }

    fn render_content(&self, answer: String, records: &[ToolCallRecord]) -> Option<String> {
        let answer = answer.trim();
        if answer.is_empty() {
            return None;
        }
        if !self.show_tool_calls || records.is_empty() {
            return Some(answer.to_string());
        }
        let mut rendered = String::from("Running:\n");
        for record in records {
            rendered.push_str(&format!(" - {}({})\n", record.name, record.arguments));
        }
        rendered.push('\n');
        rendered.push_str(answer);
        Some(rendered)
    }
}
