//! Client for an OpenAI-compatible chat-completions gateway.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{
  Advisor, Error, Result,
  prompt,
  types::{ChatReply, ChatRequest, RiskAssessment, RiskQuestionnaire},
};

/// Gateway connection settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
  pub base_url:        String,
  /// Requests fail with [`Error::NotConfigured`] while this is unset.
  pub api_key:         Option<String>,
  pub model:           String,
  pub temperature:     f32,
  pub chat_max_tokens: u32,
  pub timeout_secs:    u64,
}

impl Default for AdvisorConfig {
  fn default() -> Self {
    Self {
      base_url:        "https://ai.gateway.lovable.dev/v1".to_owned(),
      api_key:         None,
      model:           "google/gemini-2.5-flash".to_owned(),
      temperature:     0.7,
      chat_max_tokens: 1000,
      timeout_secs:    60,
    }
  }
}

/// [`Advisor`] backed by a remote model. Cheap to clone.
#[derive(Debug, Clone)]
pub struct GatewayAdvisor {
  client: Client,
  config: AdvisorConfig,
}

#[derive(Deserialize)]
struct Completion {
  #[serde(default)]
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
  #[serde(default)]
  content: Option<String>,
}

impl GatewayAdvisor {
  pub fn new(config: AdvisorConfig) -> Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &AdvisorConfig { &self.config }

  fn endpoint(&self) -> String {
    format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
  }

  /// POST one completion request and return the first choice's text.
  async fn complete(&self, body: Value) -> Result<String> {
    let key = self.config.api_key.as_deref().filter(|k| !k.is_empty()).ok_or(Error::NotConfigured)?;

    let resp = self.client.post(self.endpoint()).bearer_auth(key).json(&body).send().await?;

    let status = resp.status();
    if !status.is_success() {
      return Err(match status {
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited,
        StatusCode::PAYMENT_REQUIRED => Error::PaymentRequired,
        _ => {
          let body = resp.text().await.unwrap_or_default();
          warn!(status = status.as_u16(), %body, "advisory gateway error");
          Error::Upstream { status: status.as_u16(), body }
        }
      });
    }

    let completion: Completion = resp.json().await?;
    let content = completion
      .choices
      .into_iter()
      .next()
      .and_then(|c| c.message.content)
      .ok_or_else(|| Error::Decode("response has no message content".into()))?;
    debug!(chars = content.len(), "advisory completion received");
    Ok(content)
  }

  fn system_message(content: &str) -> Value { json!({ "role": "system", "content": content }) }
}

impl Advisor for GatewayAdvisor {
  async fn assess_risk(&self, questionnaire: RiskQuestionnaire) -> Result<RiskAssessment> {
    questionnaire.validate()?;
    let lang = questionnaire.language;

    let body = json!({
      "model": self.config.model,
      "messages": [
        Self::system_message(prompt::risk_system(lang)),
        { "role": "user", "content": prompt::risk_user(&questionnaire) },
      ],
      "temperature": self.config.temperature,
      "response_format": { "type": "json_object" },
    });

    let content = self.complete(body).await?;
    serde_json::from_str(strip_code_fence(&content)).map_err(|e| Error::Decode(e.to_string()))
  }

  async fn chat(&self, request: ChatRequest) -> Result<ChatReply> {
    request.validate()?;

    let mut messages = vec![Self::system_message(prompt::chat_system(request.language))];
    for message in &request.messages {
      messages.push(json!({ "role": message.role, "content": message.content }));
    }

    let body = json!({
      "model": self.config.model,
      "messages": messages,
      "temperature": self.config.temperature,
      "max_tokens": self.config.chat_max_tokens,
    });

    let response = self.complete(body).await?;
    Ok(ChatReply { response })
  }
}

/// Models sometimes wrap JSON in a Markdown fence.
fn strip_code_fence(text: &str) -> &str {
  let text = text.trim();
  let Some(rest) = text.strip_prefix("```") else {
    return text;
  };
  // Drop the info string ("json") on the opening line.
  let rest = rest.split_once('\n').map_or("", |(_, body)| body);
  rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
