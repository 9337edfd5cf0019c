//! LLM client for intent classification and answer rephrasing.
//!
//! Speaks the OpenAI-compatible chat-completions protocol. The collaborator
//! is only active when both a base URL and a key are configured; otherwise
//! [`DisabledLlm`] stands in and every call reports `Unavailable`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lexicon_core::config::LlmConfig;
use lexicon_core::error::LexiconError;
use lexicon_core::types::IntentKind;
use serde::Deserialize;
use serde_json::Value;

use crate::error::LlmError;

const CLASSIFY_SYSTEM_PROMPT: &str = "You classify messages sent to a data catalog assistant. \
Reply with a single JSON object and nothing else: \
{\"intent\": \"define_term|find_assets|list_terms|request_chart|clarify|unknown\", \
\"entities\": [\"full term name\"], \"confidence\": 0.0-1.0}. \
define_term: the user wants the meaning of a glossary term. \
find_assets: the user wants the assets linked to a term. \
list_terms: the user wants to browse the glossary. \
request_chart: the user wants a chart of the assets linked to a term. \
clarify: the request is ambiguous. unknown: none of the above. \
Extract the full term name as one entity (\"Customer Acquisition Cost\", not three words); \
keep abbreviations such as \"CAC\" as written.";

const REPHRASE_SYSTEM_PROMPT: &str = "You improve the readability of answers from a data catalog assistant. \
Keep every fact, name, number and definition exactly as given. \
Do not add definitions or information that is not in the original answer. \
You may only reorder, reformat or rephrase for clarity.";

/// One prior turn as seen by the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub utterance: String,
    pub intent: IntentKind,
    pub term: Option<String>,
}

/// An intent label plus how sure the model is about it.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmClassification {
    pub intent: IntentKind,
    pub confidence: f32,
    /// First entity the model extracted, if any.
    pub term: Option<String>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn classify_intent(
        &self,
        utterance: &str,
        history: &[HistoryEntry],
    ) -> Result<LlmClassification, LlmError>;

    /// Rewrite a rendered answer for readability without changing its facts.
    async fn rephrase(&self, answer: &str, utterance: &str) -> Result<String, LlmError>;
}

/// Build the LLM collaborator for this process.
pub fn build_llm(config: &LlmConfig) -> lexicon_core::Result<Arc<dyn LlmClient>> {
    if config.is_configured() {
        Ok(Arc::new(HttpLlmClient::new(config)?))
    } else {
        Ok(Arc::new(DisabledLlm))
    }
}

/// LLM that is permanently unavailable.
pub struct DisabledLlm;

#[async_trait]
impl LlmClient for DisabledLlm {
    async fn classify_intent(
        &self,
        _utterance: &str,
        _history: &[HistoryEntry],
    ) -> Result<LlmClassification, LlmError> {
        Err(LlmError::Unavailable("LLM endpoint not configured".to_string()))
    }

    async fn rephrase(&self, _answer: &str, _utterance: &str) -> Result<String, LlmError> {
        Err(LlmError::Unavailable("LLM endpoint not configured".to_string()))
    }
}

// =============================================================================
// HTTP implementation
// =============================================================================

/// reqwest-backed chat-completions client.
#[derive(Clone)]
pub struct HttpLlmClient {
    client: reqwest::Client,
    completions_url: String,
    api_key: String,
    model: String,
}

impl HttpLlmClient {
    pub fn new(config: &LlmConfig) -> lexicon_core::Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| LexiconError::Http(e.to_string()))?;
        Ok(Self {
            client,
            completions_url: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let body = serde_json::json!({
            "model": &self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": 0.1,
            "max_tokens": max_tokens
        });

        let response = self
            .client
            .post(&self.completions_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::Unavailable(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }

        #[derive(Deserialize)]
        struct Message {
            content: Option<String>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }
        #[derive(Deserialize)]
        struct ApiResponse {
            choices: Vec<Choice>,
        }

        let api_response: ApiResponse = response.json().await?;
        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| LlmError::Unavailable("empty completion".to_string()))
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn classify_intent(
        &self,
        utterance: &str,
        history: &[HistoryEntry],
    ) -> Result<LlmClassification, LlmError> {
        let prompt = classification_prompt(utterance, history);
        let content = self.complete(CLASSIFY_SYSTEM_PROMPT, &prompt, 200).await?;
        parse_classification(&content)
    }

    async fn rephrase(&self, answer: &str, utterance: &str) -> Result<String, LlmError> {
        let prompt = format!(
            "User question: {}\n\nOriginal answer:\n{}",
            utterance, answer
        );
        self.complete(REPHRASE_SYSTEM_PROMPT, &prompt, 600).await
    }
}

fn classification_prompt(utterance: &str, history: &[HistoryEntry]) -> String {
    let mut prompt = String::new();
    if !history.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for entry in history {
            prompt.push_str(&format!("- user: {} [{}", entry.utterance, entry.intent));
            if let Some(ref term) = entry.term {
                prompt.push_str(&format!(", term: {}", term));
            }
            prompt.push_str("]\n");
        }
        prompt.push('\n');
    }
    prompt.push_str(&format!("Message: \"{}\"", utterance));
    prompt
}

/// Parse the model's JSON reply. Tolerates code fences and surrounding prose.
fn parse_classification(content: &str) -> Result<LlmClassification, LlmError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &content[s..=e],
        _ => return Err(LlmError::Unavailable("reply is not JSON".to_string())),
    };

    #[derive(Deserialize)]
    struct RawClassification {
        intent: String,
        #[serde(default)]
        entities: Vec<Value>,
        #[serde(default)]
        confidence: Value,
    }

    let raw: RawClassification = serde_json::from_str(json)
        .map_err(|e| LlmError::Unavailable(format!("malformed classification: {}", e)))?;
    let intent = IntentKind::from_label(&raw.intent).ok_or_else(|| {
        LlmError::Unavailable(format!("unrecognised intent label: {}", raw.intent))
    })?;
    let term = raw
        .entities
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|t| !t.is_empty())
        .map(str::to_string);

    Ok(LlmClassification {
        intent,
        confidence: confidence_value(&raw.confidence),
        term,
    })
}

/// Numeric confidences are clamped to [0, 1]; the qualitative labels some
/// models return are mapped onto fixed values.
/// Non-finite values count as zero confidence.
fn confidence_value(value: &Value) -> f32 {
    let raw = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0) as f32,
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "high" => 0.9,
            "medium" => 0.6,
            "low" => 0.3,
            other => other.parse::<f32>().unwrap_or(0.0),
        },
        _ => 0.0,
    };
    if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
