use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use log::{debug, trace, error};

use crate::config::{ClientConfig, PricingTable};
use crate::error::Error;
use crate::request::{Completion, CompletionRequest};

// ===== Message Types =====

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage
{   pub role: String
  , pub content: String
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest
{   pub model: String
  , pub messages: Vec<ChatMessage>
  , pub temperature: f32
  , pub max_tokens: u32
}

impl From<&CompletionRequest> for ChatCompletionRequest
{   fn from(request: &CompletionRequest) -> Self
    {   ChatCompletionRequest
        {   model: request.model.clone()
          , messages: vec![
              ChatMessage
              {   role: "system".to_string()
                , content: request.system_prompt.clone()
              }
            , ChatMessage
              {   role: "user".to_string()
                , content: request.user_message.clone()
              }
            ]
          , temperature: request.temperature
          , max_tokens: request.max_tokens
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse
{   pub choices: Vec<Choice>
  , #[serde(default)]
    pub usage: Option<Usage>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice
{   pub message: ResponseMessage
  , #[serde(default)]
    pub finish_reason: Option<String>
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage
{   #[serde(default)]
    pub content: Option<String>
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Usage
{   #[serde(default)]
    pub prompt_tokens: u64
  , #[serde(default)]
    pub completion_tokens: u64
  , #[serde(default)]
    pub total_tokens: Option<u64>
}

// ===== OpenRouter Client =====

/// Stateless client for the OpenRouter chat-completions endpoint.
///
/// Cloning is cheap and clones share the underlying connection pool.
/// Every call is independent: one HTTP request, no retry.
#[derive(Debug, Clone)]
pub struct OpenRouterClient
{   config: ClientConfig
  , pricing: PricingTable
  , http_client: reqwest::Client
}

impl OpenRouterClient
{   /// Fails with `MissingApiKey` when the configured key is empty.
    pub fn new(config: ClientConfig)
      -> Result<Self, Error>
    {   debug!("Creating OpenRouterClient for {}", config.api_base);

        if config.api_key.trim().is_empty()
        {   error!("No OpenRouter API key configured");
            return Err(Error::MissingApiKey(
              crate::config::API_KEY_ENV.to_string()
            ));
        }
        if config.timeout_secs == 0
        {   return Err(Error::InvalidConfiguration(
              "timeout_secs must be positive".to_string()
            ));
        }

        let http_client = reqwest::Client::builder()
          .timeout(Duration::from_secs(config.timeout_secs))
          .build()
          .map_err(|e| {
            error!("Failed to build HTTP client: {}", e);
            Error::InvalidConfiguration(e.to_string())
          })?;

        Ok(OpenRouterClient
        {   config
          , pricing: PricingTable::default()
          , http_client
        })
    }

    /// Replace the default pricing table
    pub fn with_pricing(mut self, pricing: PricingTable) -> Self
    {   self.pricing = pricing;
        self
    }

    pub fn config(&self) -> &ClientConfig
    {   &self.config
    }

    pub fn pricing(&self) -> &PricingTable
    {   &self.pricing
    }

    fn endpoint(&self) -> String
    {   format!(
          "{}/chat/completions",
          self.config.api_base.trim_end_matches('/')
        )
    }

    /// Send one completion request on behalf of `agent`.
    pub async fn complete(
      &self
    , agent: &str
    , request: &CompletionRequest
    ) -> Result<Completion, Error>
    {   debug!("[{}] Calling {}", agent, request.model);
        request.validate().map_err(|e| {
          error!("[{}] Invalid request: {}", agent, e);
          e
        })?;

        let body = ChatCompletionRequest::from(request);
        trace!("[{}] OpenRouter request: {:?}", agent, body);

        let started = Instant::now();

        let response = self.http_client
          .post(self.endpoint())
          .header("Authorization", format!("Bearer {}", self.config.api_key))
          .header("HTTP-Referer", &self.config.app_url)
          .header("X-Title", &self.config.app_title)
          .header("Content-Type", "application/json")
          .json(&body)
          .send()
          .await
          .map_err(|e| transport_error(agent, e))?;

        let status = response.status();
        trace!("[{}] OpenRouter response status: {}", agent, status);

        let text = response.text().await
          .map_err(|e| transport_error(agent, e))?;

        if !status.is_success()
        {   let body = crate::parse::preview(&text);
            error!(
              "[{}] HTTP error calling LLM: {} {}",
              agent, status, body
            );
            return Err(Error::ApiError
            {   status: status.as_u16()
              , body
            });
        }

        let chat_response: ChatCompletionResponse
          = serde_json::from_str(&text).map_err(|e| {
            error!("[{}] Error calling LLM: {}", agent, e);
            Error::ParseError(e.to_string())
          })?;

        let latency_ms = started.elapsed().as_millis() as u64;

        let content = chat_response.choices
          .into_iter()
          .next()
          .map(|c| c.message.content.unwrap_or_default())
          .ok_or_else(|| {
            error!("[{}] No choices in response", agent);
            Error::NoChoicesInResponse
          })?;

        let usage = chat_response.usage.unwrap_or_default();
        let total_tokens = usage.total_tokens
          .unwrap_or(usage.prompt_tokens + usage.completion_tokens);
        let estimated_cost_usd = self.pricing.estimate(
          &request.model,
          usage.prompt_tokens,
          usage.completion_tokens
        );

        debug!(
          "[{}] {} tokens in {} ms, ~${}",
          agent, total_tokens, latency_ms, estimated_cost_usd
        );

        Ok(Completion
        {   content
          , model: request.model.clone()
          , estimated_cost_usd
          , total_tokens
          , prompt_tokens: usage.prompt_tokens
          , completion_tokens: usage.completion_tokens
          , latency_ms
          , timestamp: chrono::Utc::now()
        })
    }

    /// Parse the JSON payload of a reply, see [`crate::parse`]
    pub fn parse_json_response(
      &self
    , agent: &str
    , content: &str
    ) -> Result<serde_json::Value, Error>
    {   crate::parse::parse_json_response(agent, content)
    }
}

fn transport_error(agent: &str, e: reqwest::Error) -> Error
{   if e.is_timeout()
    {   error!("[{}] LLM call timed out: {}", agent, e);
        Error::Timeout
    } else
    {   error!("[{}] HTTP error calling LLM: {}", agent, e);
        Error::HttpError(e.to_string())
    }
}
