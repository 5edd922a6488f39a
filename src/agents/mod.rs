//! Task-specific agents built on the OpenRouter client.
//!
//! Every agent formats a user message, sends one completion request with
//! its own system prompt, decodes the JSON reply into a typed report and
//! returns it with call metadata. The agents differ in prompt text,
//! sampling defaults and in what happens when the reply is unusable
//! (see [`ParseFailurePolicy`]).

pub mod community_manager;
pub mod compliance;
pub mod crisis_manager;
pub mod seo_aio;
pub mod trend_scout;

pub use community_manager::CommunityManagerAgent;
pub use compliance::ComplianceAgent;
pub use crisis_manager::CrisisManagerAgent;
pub use seo_aio::SeoAioAgent;
pub use trend_scout::TrendScoutAgent;

use log::{debug, error, info, warn};
use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{AgentProfile, ParseFailurePolicy};
use crate::error::{Error, Result};
use crate::providers::OpenRouterClient;
use crate::request::{Completion, CompletionRequest};

/// Typed shape of an agent's JSON reply.
///
/// Reports carry the keys they do not model in a flattened `extra` map,
/// so the enriched mapping keeps everything the model sent.
pub trait Report: Serialize + DeserializeOwned + Sized
{   /// Structural checks serde cannot express
    fn validate(&self) -> std::result::Result<(), String>
    {   Ok(())
    }

    /// Conservative stand-in used when the reply is unusable
    fn fallback(reason: &str) -> Self;
}

/// Standard metadata added to every agent result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallMetadata
{   pub model_used: String
  , pub cost: f64
  , pub latency_ms: u64
  , /// Set when the report is a fallback
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub error: bool
}

impl CallMetadata
{   fn from_completion(completion: &Completion, error: bool) -> Self
    {   CallMetadata
        {   model_used: completion.model.clone()
          , cost: completion.estimated_cost_usd
          , latency_ms: completion.latency_ms
          , error
        }
    }
}

/// Report plus echoed inputs plus call metadata.
///
/// Serializes to one flat mapping, e.g. a comment analysis gains
/// `platform`, `model_used`, `cost` and `latency_ms` keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentOutput<R, P>
{   #[serde(flatten)]
    pub report: R
  , #[serde(flatten)]
    pub params: P
  , #[serde(flatten)]
    pub meta: CallMetadata
}

impl<R: Serialize, P: Serialize> AgentOutput<R, P>
{   /// True when `report` is the agent's fallback
    pub fn is_degraded(&self) -> bool
    {   self.meta.error
    }

    pub fn to_mapping(&self) -> Result<Map<String, Value>>
    {   match serde_json::to_value(self)
        {   Ok(Value::Object(map)) => Ok(map)
          , Ok(other) => Err(Error::Other(format!(
              "agent output serialized to non-object: {}", other
            )))
          , Err(e) => Err(Error::Other(e.to_string()))
        }
    }
}

/// Shared plumbing of all agents: profile plus client
#[derive(Debug, Clone)]
pub struct BaseAgent
{   profile: AgentProfile
  , client: OpenRouterClient
}

impl BaseAgent
{   pub fn new(client: OpenRouterClient, profile: AgentProfile) -> Self
    {   debug!(
          "Creating agent {} on {}",
          profile.name, profile.model
        );
        BaseAgent
        {   profile
          , client
        }
    }

    pub fn name(&self) -> &str
    {   &self.profile.name
    }

    pub fn profile(&self) -> &AgentProfile
    {   &self.profile
    }

    pub(crate) fn with_model(mut self, model: impl Into<String>) -> Self
    {   self.profile.model = model.into();
        self
    }

    pub(crate) fn with_parse_failure_policy(
      mut self
    , policy: ParseFailurePolicy
    ) -> Self
    {   self.profile.on_parse_failure = policy;
        self
    }

    /// One completion with the profile's model; `None` keeps the default
    pub async fn call_llm(
      &self
    , system_prompt: &str
    , user_message: &str
    , temperature: Option<f32>
    , max_tokens: Option<u32>
    ) -> Result<Completion>
    {   let request = CompletionRequest
        {   model: self.profile.model.clone()
          , system_prompt: system_prompt.to_string()
          , user_message: user_message.to_string()
          , temperature: temperature.unwrap_or(self.profile.temperature)
          , max_tokens: max_tokens.unwrap_or(self.profile.max_tokens)
        };
        self.client.complete(&self.profile.name, &request).await
    }

    pub fn parse_json_response(&self, content: &str) -> Result<Value>
    {   self.client.parse_json_response(&self.profile.name, content)
    }

    /// Extract, decode and validate a report from raw reply text
    pub fn decode_report<R: Report>(&self, content: &str) -> Result<R>
    {   let value = self.parse_json_response(content)?;
        let report: R = serde_json::from_value(value)
          .map_err(|e| self.schema_violation(e.to_string()))?;
        report.validate()
          .map_err(|reason| self.schema_violation(reason))?;
        Ok(report)
    }

    fn schema_violation(&self, reason: String) -> Error
    {   warn!("[{}] Reply does not match schema: {}", self.name(), reason);
        Error::SchemaViolation
        {   agent: self.profile.name.clone()
          , reason
        }
    }

    /// Call, decode, then apply the parse-failure policy.
    ///
    /// Transport and call errors always reach the caller; only
    /// response-shape errors may be degraded.
    pub async fn run_report<R: Report, P>(
      &self
    , system_prompt: &str
    , user_message: &str
    , params: P
    ) -> Result<AgentOutput<R, P>>
    {   let completion = self
          .call_llm(system_prompt, user_message, None, None)
          .await?;

        match self.decode_report::<R>(&completion.content)
        {   Ok(report) => {
              info!(
                "[{}] Report ready ({} tokens, ${})",
                self.name(),
                completion.total_tokens,
                completion.estimated_cost_usd
              );
              Ok(AgentOutput
              {   report
                , params
                , meta: CallMetadata::from_completion(&completion, false)
              })
            }
          , Err(e) if e.is_response_shape()
              && self.profile.on_parse_failure
                == ParseFailurePolicy::Degrade => {
              warn!(
                "[{}] Error parsing response, using fallback: {}",
                self.name(), e
              );
              Ok(AgentOutput
              {   report: R::fallback(&e.to_string())
                , params
                , meta: CallMetadata::from_completion(&completion, true)
              })
            }
          , Err(e) => {
              error!("[{}] Error parsing response: {}", self.name(), e);
              Err(e)
            }
        }
    }
}

/// Models send `null` for fields that do not apply; read it as the default
pub(crate) fn null_as_default<'de, D, T>(
  deserializer: D
) -> std::result::Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>
{   Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Scores exchanged with the model are percentages
pub(crate) fn check_score(
  field: &str
, value: f64
) -> std::result::Result<(), String>
{   if (0.0..=100.0).contains(&value)
    {   Ok(())
    } else
    {   Err(format!("{} = {} is outside 0..=100", field, value))
    }
}

