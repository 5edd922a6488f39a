pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod parse;
pub mod agents;

/*

agentmedia: async-only marketing agents over OpenRouter.

one thin client sends a system prompt + user message to the
chat-completions endpoint and hands back the text with token counts,
latency and an estimated cost. five agents sit on top of it, each with
its own prompt, sampling defaults and typed JSON report.

agentmedia/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports
│   ├── error.rs        # Error type and taxonomy
│   ├── config.rs       # Client config, pricing table, agent profiles
│   ├── request.rs      # Completion request and envelope
│   ├── parse.rs        # Fenced-JSON extraction
│   ├── providers/
│   │   ├── mod.rs
│   │   └── openrouter.rs
│   └── agents/
│       ├── mod.rs      # BaseAgent, Report, AgentOutput
│       ├── community_manager.rs
│       ├── seo_aio.rs
│       ├── compliance.rs
│       ├── trend_scout.rs
│       └── crisis_manager.rs
└── tests/

no retries, no caching, no shared state between calls.

*/

pub use error::{Error, ErrorKind, Result};
pub use config::{
  AgentProfile, ClientConfig, ParseFailurePolicy, PricingTable, TokenRate
};
pub use providers::OpenRouterClient;
pub use request::{Completion, CompletionRequest};
pub use parse::parse_json_response;
pub use agents::{
  AgentOutput, CallMetadata, CommunityManagerAgent, ComplianceAgent,
  CrisisManagerAgent, Report, SeoAioAgent, TrendScoutAgent
};
