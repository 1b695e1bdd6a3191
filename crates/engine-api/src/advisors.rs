//! LLM advisor transport.
//!
//! Model-agnostic HTTP client speaking either the Anthropic messages API or
//! an OpenAI-compatible chat API, detected from the configured URL. Each
//! stage sends its system prompt plus the marshaled tick input and must come
//! back with bare JSON; the wrapping parser strips code fences and treats the
//! literal text `null` as a successful null response.

use contracts::AdvisorStage;
use engine_core::{AdvisorError, AdvisorSuite};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const MAX_OUTPUT_TOKENS: u32 = 4_096;

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl AdvisorConfig {
    /// Read `ADVISOR_API_KEY` / `ADVISOR_API_URL` / `ADVISOR_MODEL` /
    /// `ADVISOR_TIMEOUT_MS`. `None` when no key is configured; the server
    /// then runs every stage on its fallback.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("ADVISOR_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())?;
        let api_url =
            std::env::var("ADVISOR_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let model = std::env::var("ADVISOR_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout_ms = std::env::var("ADVISOR_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        Some(Self {
            api_key,
            api_url,
            model,
            timeout_ms,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiFormat {
    Anthropic,
    OpenAi,
}

fn detect_api_format(url: &str) -> ApiFormat {
    if url.contains("anthropic.com") {
        ApiFormat::Anthropic
    } else {
        ApiFormat::OpenAi
    }
}

/// Blocking completion client driven by a private current-thread runtime, so
/// the synchronous [`AdvisorSuite`] seam stays free of async plumbing. Calls
/// are made from `spawn_blocking` tick execution, never from a runtime
/// worker thread.
pub struct LlmAdvisorSuite {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
    config: AdvisorConfig,
    format: ApiFormat,
}

impl std::fmt::Debug for LlmAdvisorSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAdvisorSuite")
            .field("api_url", &self.config.api_url)
            .field("model", &self.config.model)
            .finish()
    }
}

impl LlmAdvisorSuite {
    pub fn from_config(config: AdvisorConfig) -> Result<Self, AdvisorError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| AdvisorError::Transport(format!("runtime build failed: {err}")))?;
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms.max(1)))
            .build()
            .map_err(|err| AdvisorError::Transport(format!("client build failed: {err}")))?;
        let format = detect_api_format(&config.api_url);
        Ok(Self {
            client,
            runtime,
            config,
            format,
        })
    }

    fn complete(&self, system: &str, user: &str) -> Result<String, AdvisorError> {
        match self.format {
            ApiFormat::Anthropic => self.runtime.block_on(self.complete_anthropic(system, user)),
            ApiFormat::OpenAi => self.runtime.block_on(self.complete_openai(system, user)),
        }
    }

    async fn complete_anthropic(&self, system: &str, user: &str) -> Result<String, AdvisorError> {
        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: MAX_OUTPUT_TOKENS,
            system: system.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|err| AdvisorError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Transport(format!("status {status}: {body}")));
        }

        let completion: AnthropicResponse = response
            .json()
            .await
            .map_err(|err| AdvisorError::Transport(err.to_string()))?;
        completion
            .content
            .first()
            .map(|block| block.text.clone())
            .ok_or_else(|| AdvisorError::Transport("empty completion content".to_string()))
    }

    async fn complete_openai(&self, system: &str, user: &str) -> Result<String, AdvisorError> {
        let request = OpenAiRequest {
            model: self.config.model.clone(),
            max_tokens: MAX_OUTPUT_TOKENS,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|err| AdvisorError::Transport(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisorError::Transport(format!("status {status}: {body}")));
        }

        let completion: OpenAiResponse = response
            .json()
            .await
            .map_err(|err| AdvisorError::Transport(err.to_string()))?;
        completion
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| AdvisorError::Transport("empty completion choice".to_string()))
    }
}

impl AdvisorSuite for LlmAdvisorSuite {
    fn consult(&self, stage: AdvisorStage, input: &Value) -> Result<Option<Value>, AdvisorError> {
        let user = format!(
            "TICK INPUT DATA:\n{}\n\nAnalyze and respond with valid JSON only.",
            serde_json::to_string_pretty(input)
                .map_err(|err| AdvisorError::Parse(err.to_string()))?
        );
        let text = self.complete(stage_system_prompt(stage), &user)?;
        parse_advisor_response(&text)
    }
}

/// Strip an optional triple-backtick fence (with an optional language tag)
/// and parse. The literal text `null` is a successful null response; whether
/// the stage accepts it is the pipeline's decision.
pub(crate) fn parse_advisor_response(text: &str) -> Result<Option<Value>, AdvisorError> {
    let stripped = strip_code_fences(text);
    if stripped == "null" {
        return Ok(None);
    }
    serde_json::from_str::<Value>(stripped)
        .map(Some)
        .map_err(|err| AdvisorError::Parse(err.to_string()))
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = match rest.find('\n') {
        // First fence line may carry a language tag; drop the whole line.
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn stage_system_prompt(stage: AdvisorStage) -> &'static str {
    match stage {
        AdvisorStage::Analyst => ANALYST_PROMPT,
        AdvisorStage::Judiciary => JUDICIARY_PROMPT,
        AdvisorStage::Media => MEDIA_PROMPT,
        AdvisorStage::Reaction => REACTION_PROMPT,
        AdvisorStage::Crisis => CRISIS_PROMPT,
        AdvisorStage::Historian => HISTORIAN_PROMPT,
    }
}

const ANALYST_PROMPT: &str = r#"You are the state analyst of a simulated nation.
Given the tick input data, produce a sober quantitative reading of the economy and society.

OUTPUT FORMAT (JSON only, no explanation):
{
  "trends": ["short observed trend", ...],
  "risks": ["short named risk", ...],
  "projections": { "gdp": number, "inflation": number, "unemployment": number },
  "confidence": 0.0-1.0
}"#;

const JUDICIARY_PROMPT: &str = r#"You are the constitutional court of a simulated nation.
You receive one newly enacted law as free text plus the list of addressable state variables.
Translate the law into a concrete implementation of numeric modifiers. Only use variables
from addressable_variables; operations are "set", "add", "multiply", "clamp".

OUTPUT FORMAT (JSON only, no explanation):
{
  "law_id": "the id you were given",
  "interpretation": "what the law means operationally",
  "ambiguities": ["unresolved wording", ...],
  "implementation": {
    "affected_variables": ["economy.tax_rate", ...],
    "modifiers": [ { "variable": "economy.tax_rate", "operation": "add", "value": 1.0 } ]
  }
}"#;

const MEDIA_PROMPT: &str = r#"You are the national press corps of a simulated nation.
Turn the tick's events and trends into headlines, at most one article, and plausible rumors.
truth_score and credibility are 0.0-1.0.

OUTPUT FORMAT (JSON only, no explanation):
{
  "headlines": [ { "text": "...", "truth_score": 0.9 } ],
  "articles": [ { "title": "...", "body": "...", "truth_score": 0.8 } ],
  "rumors": [ { "text": "...", "credibility": 0.3 } ]
}"#;

const REACTION_PROMPT: &str = r#"You are the political street of a simulated nation.
Given approvals, social indicators, and current movements, decide how the public shifts.
approval_delta values are small (-5 to 5); protest_prob is 0.0-1.0. Movement actions are
"create", "strengthen", "dissolve".

OUTPUT FORMAT (JSON only, no explanation):
{
  "approval_delta": { "overall": 0.0, "economic": 0.0, "social": 0.0, "security": 0.0 },
  "protest_prob": 0.0-1.0,
  "movements": [ { "action": "create", "name": "...", "movement_type": "labor", "strength_delta": 0.2, "demands": ["..."] } ],
  "suppressed_warnings": []
}"#;

const CRISIS_PROMPT: &str = r#"You are the crisis generator of a simulated nation.
Given recent stability and GDP history, decide whether a crisis erupts this tick.
Most ticks nothing happens: respond with the literal text null.
When a crisis does erupt, severity is 1-5 and modifiers address numeric state variables.

OUTPUT FORMAT (JSON only, or the literal text null):
{
  "event_type": "short_snake_case_type",
  "severity": 1-5,
  "modifiers": [ { "variable": "economy.gdp", "operation": "multiply", "value": 0.95 } ],
  "narrative_hook": "one vivid sentence",
  "duration_ticks": 3
}"#;

const HISTORIAN_PROMPT: &str = r#"You are the court historian of a simulated nation.
Summarize the tick and decide whether an era has ended. Era transitions are rare.

OUTPUT FORMAT (JSON only, no explanation):
{
  "era_transition": null or { "name": "...", "summary": "..." },
  "summary": "one paragraph of history",
  "player_reputations": { "player_id": { "summary": "...", "score": -100 to 100 } }
}"#;

// Anthropic messages API.
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: String,
}

// OpenAI-compatible chat API.
#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_json_parses() {
        let parsed = parse_advisor_response(r#"{"trends": []}"#).unwrap();
        assert!(parsed.unwrap().get("trends").is_some());
    }

    #[test]
    fn fenced_json_with_language_tag_parses() {
        let response = "```json\n{\"severity\": 3}\n```";
        let parsed = parse_advisor_response(response).unwrap().unwrap();
        assert_eq!(parsed["severity"], 3);
    }

    #[test]
    fn fenced_json_without_tag_parses() {
        let response = "```\n{\"severity\": 2}\n```";
        let parsed = parse_advisor_response(response).unwrap().unwrap();
        assert_eq!(parsed["severity"], 2);
    }

    #[test]
    fn literal_null_is_a_successful_null() {
        assert!(parse_advisor_response("null").unwrap().is_none());
        assert!(parse_advisor_response("```\nnull\n```").unwrap().is_none());
    }

    #[test]
    fn prose_is_a_parse_error() {
        let err = parse_advisor_response("I cannot answer that").unwrap_err();
        assert!(matches!(err, AdvisorError::Parse(_)));
    }

    #[test]
    fn format_detection_prefers_anthropic_for_its_domain() {
        assert_eq!(
            detect_api_format("https://api.anthropic.com/v1/messages"),
            ApiFormat::Anthropic
        );
        assert_eq!(
            detect_api_format("https://api.deepseek.com/chat/completions"),
            ApiFormat::OpenAi
        );
    }
}
