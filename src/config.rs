//! Configuration for the OpenRouter client, token pricing and agent profiles

use std::collections::HashMap;
use std::fmt;
use serde::{Deserialize, Serialize};
use log::debug;

pub const OPENROUTER_API_BASE: &str
  = "https://openrouter.ai/api/v1";

/// Environment variable holding the OpenRouter credential
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
/// Environment variable holding the referer / application URL
pub const APP_URL_ENV: &str = "APP_URL";

pub const DEFAULT_APP_URL: &str = "http://localhost:8000";
pub const DEFAULT_APP_TITLE: &str = "AstroMedia";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn default_api_base() -> String { OPENROUTER_API_BASE.to_string() }
fn default_app_url() -> String { DEFAULT_APP_URL.to_string() }
fn default_app_title() -> String { DEFAULT_APP_TITLE.to_string() }
fn default_timeout_secs() -> u64 { DEFAULT_TIMEOUT_SECS }

/// Client configuration, resolved by the application before construction
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig
{   /// Bearer credential
    pub api_key: String
  , /// API base URL, without the trailing `/chat/completions`
    #[serde(default = "default_api_base")]
    pub api_base: String
  , /// Sent as `HTTP-Referer`
    #[serde(default = "default_app_url")]
    pub app_url: String
  , /// Sent as `X-Title`
    #[serde(default = "default_app_title")]
    pub app_title: String
  , /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64
}

impl ClientConfig
{   pub fn new(api_key: impl Into<String>) -> Self
    {   ClientConfig
        {   api_key: api_key.into()
          , api_base: default_api_base()
          , app_url: default_app_url()
          , app_title: default_app_title()
          , timeout_secs: default_timeout_secs()
        }
    }

    /// Resolve `OPENROUTER_API_KEY` and `APP_URL` from the process
    /// environment. Meant for the application edge; the client itself
    /// never reads the environment.
    pub fn from_env() -> crate::error::Result<Self>
    {   let api_key = std::env::var(API_KEY_ENV)
          .ok()
          .filter(|k| !k.trim().is_empty())
          .ok_or_else(|| {
            crate::error::Error::MissingApiKey(
              API_KEY_ENV.to_string()
            )
          })?;

        let mut config = ClientConfig::new(api_key);
        if let Ok(url) = std::env::var(APP_URL_ENV)
        {   debug!("Using {} from environment", APP_URL_ENV);
            config.app_url = url;
        }
        Ok(config)
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self
    {   self.api_base = api_base.into();
        self
    }

    pub fn with_app_url(mut self, app_url: impl Into<String>) -> Self
    {   self.app_url = app_url.into();
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self
    {   self.timeout_secs = timeout_secs;
        self
    }
}

impl fmt::Debug for ClientConfig
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("ClientConfig")
          .field("api_key", &"<redacted>")
          .field("api_base", &self.api_base)
          .field("app_url", &self.app_url)
          .field("app_title", &self.app_title)
          .field("timeout_secs", &self.timeout_secs)
          .finish()
    }
}

/// USD price per million tokens for one model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenRate
{   pub input_per_million: f64
  , pub output_per_million: f64
}

impl TokenRate
{   pub const fn new(
      input_per_million: f64
    , output_per_million: f64
    ) -> Self
    {   TokenRate
        {   input_per_million
          , output_per_million
        }
    }
}

/// Claude 3.5 Sonnet list price, also used for models missing from the table
pub const DEFAULT_TOKEN_RATE: TokenRate = TokenRate::new(3.0, 15.0);

/// Per-model token prices used to estimate request cost.
///
/// These are list prices captured by hand, not billed amounts; the
/// provider is never queried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTable
{   pub rates: HashMap<String, TokenRate>
  , pub default_rate: TokenRate
}

impl PricingTable
{   /// Empty table that prices every model at `default_rate`
    pub fn flat(default_rate: TokenRate) -> Self
    {   PricingTable
        {   rates: HashMap::new()
          , default_rate
        }
    }

    pub fn with_rate(
      mut self
    , model: impl Into<String>
    , rate: TokenRate
    ) -> Self
    {   self.rates.insert(model.into(), rate);
        self
    }

    pub fn rate_for(&self, model: &str) -> TokenRate
    {   match self.rates.get(model)
        {   Some(rate) => *rate
          , None => {
              debug!(
                "No price for {}, using default rate", model
              );
              self.default_rate
            }
        }
    }

    /// Estimated USD cost, rounded to 6 decimals
    pub fn estimate(
      &self
    , model: &str
    , prompt_tokens: u64
    , completion_tokens: u64
    ) -> f64
    {   let rate = self.rate_for(model);
        let cost
          = prompt_tokens as f64 * rate.input_per_million / 1_000_000.0
          + completion_tokens as f64 * rate.output_per_million / 1_000_000.0;
        round_to_micros(cost)
    }
}

impl Default for PricingTable
{   fn default() -> Self
    {   PricingTable::flat(DEFAULT_TOKEN_RATE)
          .with_rate("anthropic/claude-3.5-sonnet", DEFAULT_TOKEN_RATE)
          .with_rate("openai/gpt-4o-mini", TokenRate::new(0.15, 0.60))
          .with_rate(
            "perplexity/llama-3.1-sonar-huge-128k-online"
          , TokenRate::new(5.0, 5.0)
          )
    }
}

fn round_to_micros(value: f64) -> f64
{   (value * 1_000_000.0).round() / 1_000_000.0
}

/// What an agent does when the model's reply cannot be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseFailurePolicy
{   /// Return the agent's conservative fallback report, flagged `error`
    Degrade
  , /// Hand the error to the caller
    Propagate
}

/// Fixed identity and sampling defaults of one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile
{   pub name: String
  , pub model: String
  , pub temperature: f32
  , pub max_tokens: u32
  , pub on_parse_failure: ParseFailurePolicy
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn sonnet_cost_matches_per_token_rates()
    {   let pricing = PricingTable::default();
        // 1000 * 0.000003 + 500 * 0.000015
        let cost = pricing.estimate(
          "anthropic/claude-3.5-sonnet", 1000, 500
        );
        assert!((cost - 0.0105).abs() < 1e-12);
    }

    #[test]
    fn unknown_model_falls_back_to_default_rate()
    {   let pricing = PricingTable::default();
        assert_eq!(
          pricing.rate_for("mistralai/mistral-large")
        , DEFAULT_TOKEN_RATE
        );
    }

    #[test]
    fn estimate_rounds_to_six_decimals()
    {   let pricing = PricingTable::flat(TokenRate::new(0.7, 0.2));
        // 0.0000007 rounds up, 0.0000002 rounds down
        assert_eq!(pricing.estimate("any", 1, 0), 0.000001);
        assert_eq!(pricing.estimate("any", 0, 1), 0.0);
    }

    #[test]
    fn overridden_rate_wins()
    {   let pricing = PricingTable::default()
          .with_rate("openai/gpt-4o-mini", TokenRate::new(1.0, 2.0));
        let cost = pricing.estimate("openai/gpt-4o-mini", 1_000_000, 0);
        assert!((cost - 1.0).abs() < 1e-12);
    }

    #[test]
    fn config_debug_hides_key()
    {   let config = ClientConfig::new("sk-or-secret");
        let shown = format!("{:?}", config);
        assert!(!shown.contains("sk-or-secret"));
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.app_url, DEFAULT_APP_URL);
    }

    #[test]
    fn config_deserializes_with_defaults()
    {   let config: ClientConfig = serde_json::from_str(
          r#"{"api_key": "k", "timeout_secs": 5}"#
        ).unwrap();
        assert_eq!(config.api_base, OPENROUTER_API_BASE);
        assert_eq!(config.app_title, DEFAULT_APP_TITLE);
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn from_env_requires_api_key()
    {   std::env::remove_var(API_KEY_ENV);
        assert_eq!(
          ClientConfig::from_env().unwrap_err()
        , crate::error::Error::MissingApiKey(API_KEY_ENV.to_string())
        );

        std::env::set_var(API_KEY_ENV, "sk-or-test");
        let config = ClientConfig::from_env().unwrap();
        assert_eq!(config.api_key, "sk-or-test");
        std::env::remove_var(API_KEY_ENV);
    }
}
