//! Request and response types shared by the client and the agents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completion request: a system prompt and a user message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest
{   /// Model identifier, e.g. `anthropic/claude-3.5-sonnet`
    pub model: String
  , pub system_prompt: String
  , pub user_message: String
  , /// Sampling temperature, 0.0 to 2.0
    pub temperature: f32
  , /// Max tokens to generate
    pub max_tokens: u32
}

impl CompletionRequest
{   /// Reject requests the API would refuse anyway
    pub fn validate(&self) -> crate::error::Result<()>
    {   if self.model.trim().is_empty()
        {   return Err(crate::error::Error::InvalidRequest(
              "model must not be empty".to_string()
            ));
        }
        if self.system_prompt.trim().is_empty()
        {   return Err(crate::error::Error::InvalidRequest(
              "system prompt must not be empty".to_string()
            ));
        }
        if self.user_message.trim().is_empty()
        {   return Err(crate::error::Error::InvalidRequest(
              "user message must not be empty".to_string()
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature)
        {   return Err(crate::error::Error::InvalidRequest(
              format!(
                "temperature {} outside 0.0..=2.0",
                self.temperature
              )
            ));
        }
        if self.max_tokens == 0
        {   return Err(crate::error::Error::InvalidRequest(
              "max_tokens must be positive".to_string()
            ));
        }
        Ok(())
    }
}

/// Normalized result of one successful completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion
{   /// Generated text
    pub content: String
  , /// Model that was asked
    pub model: String
  , /// Estimate from the pricing table, not a billed amount
    pub estimated_cost_usd: f64
  , pub total_tokens: u64
  , pub prompt_tokens: u64
  , pub completion_tokens: u64
  , pub latency_ms: u64
  , pub timestamp: DateTime<Utc>
}
