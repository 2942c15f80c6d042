// Test doubles shared by the unit tests

use std::collections::VecDeque;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tempfile::TempPath;

use crate::embeddings::{Chunk, Embedder, HashingEmbedder, KnowledgeBase, LoadSummary};
use crate::llm::{LLMAdapter, ModelBackend};
use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage, ToolCall};

/// A PDF with one text line per entry, one page per slice
pub fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        let mut y: i64 = 800;
        for line in lines.iter() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
            ));
            operations.push(Operation::new("Td", vec![Object::Integer(50), Object::Integer(y)]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("ET", vec![]));
            y -= 14;
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(595), Object::Integer(842)],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub fn write_temp_pdf(bytes: &[u8]) -> TempPath {
    let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file.into_temp_path()
}

/// Knowledge base that returns the same chunks for every query
pub struct StaticKnowledgeBase {
    chunks: Vec<Chunk>,
}

impl StaticKnowledgeBase {
    pub fn new(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }
}

#[async_trait]
impl KnowledgeBase for StaticKnowledgeBase {
    async fn load(&self, _recreate: bool, _upsert: bool) -> AppResult<LoadSummary> {
        Ok(LoadSummary {
            pages: 1,
            chunks: self.chunks.len(),
            written: self.chunks.len(),
        })
    }

    async fn search(&self, _query: &str) -> AppResult<Vec<Chunk>> {
        Ok(self.chunks.clone())
    }

    async fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn source(&self) -> &str {
        "static.pdf"
    }
}

pub enum ScriptedReply {
    Text(String),
    ToolCall { name: String, arguments: String },
    Error(String),
}

impl ScriptedReply {
    pub fn text(content: &str) -> Self {
        ScriptedReply::Text(content.to_string())
    }

    pub fn tool_call(name: &str, arguments: &str) -> Self {
        ScriptedReply::ToolCall {
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    pub fn error(message: &str) -> Self {
        ScriptedReply::Error(message.to_string())
    }
}

/// Chat model that plays back a script, then echoes the last user message
#[derive(Default)]
pub struct ScriptedLlm {
    script: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<LLMRequest>>,
}

impl ScriptedLlm {
    pub fn new(script: Vec<ScriptedReply>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn echo() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn response(content: String, tool_calls: Vec<ToolCall>) -> LLMResponse {
    LLMResponse {
        content,
        finish_reason: if tool_calls.is_empty() { "stop" } else { "tool_calls" }.to_string(),
        tool_calls,
        usage: TokenUsage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        },
    }
}

#[async_trait]
impl LLMAdapter for ScriptedLlm {
    async fn create_chat_completion(&self, request: &LLMRequest) -> AppResult<LLMResponse> {
        let call_index = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };
        let next = self.script.lock().unwrap().pop_front();

        match next {
            Some(ScriptedReply::Text(content)) => Ok(response(content, vec![])),
            Some(ScriptedReply::ToolCall { name, arguments }) => Ok(response(
                String::new(),
                vec![ToolCall {
                    id: format!("call_{}", call_index),
                    name,
                    arguments,
                }],
            )),
            Some(ScriptedReply::Error(message)) => Err(AppError::LLMApi(message)),
            None => {
                let last_user = request
                    .messages
                    .iter()
                    .rev()
                    .find(|m| m.role == "user")
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                Ok(response(format!("ECHO: {}", last_user), vec![]))
            }
        }
    }
}

/// Embedder that answers a fixed number of calls, then fails every later one
pub struct FlakyEmbedder {
    inner: HashingEmbedder,
    remaining: AtomicUsize,
}

impl FlakyEmbedder {
    pub fn failing_after(calls: usize) -> Self {
        Self {
            inner: HashingEmbedder::default(),
            remaining: AtomicUsize::new(calls),
        }
    }
}

#[async_trait]
impl Embedder for FlakyEmbedder {
    async fn embed(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let allowed = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if allowed {
            self.inner.embed(texts).await
        } else {
            Err(AppError::Embedding("embedding service unavailable".to_string()))
        }
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Backend handing out one shared scripted model and a fixed embedder
pub struct FakeBackend {
    pub llm: Arc<ScriptedLlm>,
    pub keys: Mutex<Vec<String>>,
    embedder: Arc<dyn Embedder>,
}

impl FakeBackend {
    pub fn new(llm: ScriptedLlm) -> Self {
        Self {
            llm: Arc::new(llm),
            keys: Mutex::new(Vec::new()),
            embedder: Arc::new(HashingEmbedder::default()),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = embedder;
        self
    }
}

impl ModelBackend for FakeBackend {
    fn chat(&self, api_key: &str) -> AppResult<Arc<dyn LLMAdapter>> {
        self.keys.lock().unwrap().push(api_key.to_string());
        Ok(self.llm.clone())
    }

    fn embedder(&self, _api_key: Option<&str>) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }
}
