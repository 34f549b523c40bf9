//! Language-model backed provider.
//!
//! `ollama:<model>` talks to a local Ollama server; any other model id goes
//! to an OpenAI-compatible chat completions endpoint.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{SpecProvider, parse_spec};
use crate::error::{Error, Result};
use crate::schema::{DiagramKind, DiagramSpec};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const OLLAMA_PREFIX: &str = "ollama:";
const OLLAMA_GENERATE_URL: &str = "http://localhost:11434/api/generate";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 900;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Backend {
    Ollama { model: String },
    OpenAi { model: String, base_url: String },
}

pub struct LlmProvider {
    backend: Backend,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl LlmProvider {
    /// Picks the backend from the model id. OpenAI settings come from
    /// `OPENAI_API_KEY` and `OPENAI_BASE_URL`.
    pub fn new(model: &str) -> Self {
        Self::with_openai_settings(
            model,
            env::var("OPENAI_API_KEY").ok(),
            env::var("OPENAI_BASE_URL").ok(),
        )
    }

    fn with_openai_settings(
        model: &str,
        api_key: Option<String>,
        base_url: Option<String>,
    ) -> Self {
        let backend = match model.strip_prefix(OLLAMA_PREFIX) {
            Some(local) => Backend::Ollama {
                model: local.to_string(),
            },
            None => Backend::OpenAi {
                model: model.to_string(),
                base_url: base_url
                    .filter(|url| !url.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
        };
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            backend,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            agent,
        }
    }

    fn complete(&self, system: &str, user: &str) -> Result<String> {
        match &self.backend {
            Backend::Ollama { model } => {
                let body = OllamaRequest {
                    model,
                    prompt: format!("{system}\n\n{user}"),
                    stream: false,
                    options: OllamaOptions { temperature: 0.0 },
                };
                let reply: OllamaResponse = self.post_json(OLLAMA_GENERATE_URL, None, &body)?;
                Ok(reply.response)
            }
            Backend::OpenAi { model, base_url } => {
                let api_key = self.api_key.as_deref().ok_or_else(|| {
                    Error::config("OPENAI_API_KEY is not set; set it or use --model ollama:<model>")
                })?;
                let body = ChatRequest {
                    model,
                    temperature: 0.0,
                    messages: vec![
                        ChatMessage {
                            role: "system",
                            content: system,
                        },
                        ChatMessage {
                            role: "user",
                            content: user,
                        },
                    ],
                };
                let url = format!("{base_url}/chat/completions");
                let reply: ChatResponse = self.post_json(&url, Some(api_key), &body)?;
                Ok(reply
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.message.content)
                    .unwrap_or_default())
            }
        }
    }

    fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<R> {
        let payload = serde_json::to_string(body)
            .map_err(|e| Error::Provider(format!("Failed to encode request: {e}")))?;

        let mut request = self
            .agent
            .post(url)
            .header("Content-Type", "application/json");
        if let Some(key) = bearer {
            request = request.header("Authorization", &format!("Bearer {key}"));
        }

        log::debug!(url; "Sending provider request");
        let mut response = request
            .send(payload.as_str())
            .map_err(|e| Error::Provider(format!("Request to {url} failed: {e}")))?;
        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Error::Provider(format!("Failed to read reply from {url}: {e}")))?;

        if !(200..300).contains(&status) {
            return Err(Error::Provider(format!(
                "{url} returned HTTP {status}: {}",
                truncate(&text, 300)
            )));
        }
        serde_json::from_str(&text)
            .map_err(|e| Error::Provider(format!("Unexpected reply from {url}: {e}")))
    }
}

impl SpecProvider for LlmProvider {
    fn provide(&self, prompt: &str, kind: DiagramKind) -> Result<DiagramSpec> {
        log::info!(kind = kind.as_str(), backend:? = self.backend; "Requesting specification");
        let reply = self.complete(kind.schema_prompt(), prompt)?;
        log::trace!(reply; "Provider reply");
        parse_spec(kind, &reply)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Deserialize)]
struct ChatReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_prefix_selects_local_backend() {
        let provider = LlmProvider::with_openai_settings("ollama:gpt-oss:20b", None, None);
        assert_eq!(
            provider.backend,
            Backend::Ollama {
                model: "gpt-oss:20b".to_string()
            }
        );
    }

    #[test]
    fn test_openai_base_url_defaults_and_trims() {
        let provider = LlmProvider::with_openai_settings("gpt-4o", None, None);
        assert_eq!(
            provider.backend,
            Backend::OpenAi {
                model: "gpt-4o".to_string(),
                base_url: DEFAULT_OPENAI_BASE_URL.to_string()
            }
        );

        let provider = LlmProvider::with_openai_settings(
            "gpt-4o",
            None,
            Some("http://proxy.local/v1/".to_string()),
        );
        let Backend::OpenAi { base_url, .. } = provider.backend else {
            panic!("Expected OpenAI backend");
        };
        assert_eq!(base_url, "http://proxy.local/v1");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let provider = LlmProvider::with_openai_settings("gpt-4o-mini", Some("  ".to_string()), None);
        let err = provider.provide("ERD", DiagramKind::Er).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "got {err:?}");
    }

    #[test]
    fn test_chat_reply_decoding() {
        let reply: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{\"nodes\": []}"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            reply.choices[0].message.content.as_deref(),
            Some("{\"nodes\": []}")
        );
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("ação", 2), "aç...");
        assert_eq!(truncate("short", 10), "short");
    }
}
