//! Social-media comment triage and reply drafting

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{null_as_default, AgentOutput, BaseAgent, Report};
use crate::config::{AgentProfile, ParseFailurePolicy};
use crate::error::Result;
use crate::providers::OpenRouterClient;

pub const AGENT_NAME: &str = "CommunityManager";
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

/// Only the most recent turns of a thread are sent
pub const HISTORY_TURNS: usize = 3;

const FALLBACK_REPLY: &str
  = "Merci pour votre message! Notre équipe reviendra vers vous rapidement.";

/// Brand voice injected into the system prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandContext
{   pub brand_name: String
  , pub industry: String
  , pub tone: String
  , pub language: String
}

impl Default for BrandContext
{   fn default() -> Self
    {   BrandContext
        {   brand_name: "la marque".to_string()
          , industry: String::new()
          , tone: "friendly, professional".to_string()
          , language: "fr".to_string()
        }
    }
}

/// One earlier message of the comment thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn
{   #[serde(default = "default_role")]
    pub role: String
  , #[serde(default)]
    pub text: String
}

fn default_role() -> String { "user".to_string() }

impl ConversationTurn
{   pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self
    {   ConversationTurn
        {   role: role.into()
          , text: text.into()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment
{   Positive
  , Neutral
  , Negative
  , Spam
  , Toxic
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentCategory
{   Question
  , Complaint
  , Compliment
  , Spam
  , Other
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency
{   Low
  , Medium
  , High
  , Critical
}

/// Model's reading of one comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentAnalysis
{   pub sentiment: Sentiment
  , pub category: CommentCategory
  , pub urgency: Urgency
  , #[serde(default, deserialize_with = "null_as_default")]
    pub suggested_response: String
  , pub requires_human: bool
  , #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub internal_notes: String
  , #[serde(flatten)]
    pub extra: Map<String, Value>
}

impl Report for CommentAnalysis
{   fn validate(&self) -> std::result::Result<(), String>
    {   if self.suggested_response.trim().is_empty() && !self.requires_human
        {   return Err(
              "empty suggested_response without human review".to_string()
            );
        }
        Ok(())
    }

    fn fallback(reason: &str) -> Self
    {   CommentAnalysis
        {   sentiment: Sentiment::Neutral
          , category: CommentCategory::Other
          , urgency: Urgency::Low
          , suggested_response: FALLBACK_REPLY.to_string()
          , requires_human: true
          , tags: vec!["parse_error".to_string()]
          , internal_notes: format!("Error parsing AI response: {}", reason)
          , extra: Map::new()
        }
    }
}

/// Inputs echoed back next to the analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentParams
{   pub platform: String
}

pub type CommentReply = AgentOutput<CommentAnalysis, CommentParams>;

/// Reads a comment, classifies it and drafts an on-brand answer.
///
/// Parse failures degrade to a canned reply flagged for a human,
/// since a community manager always has to answer something.
#[derive(Debug, Clone)]
pub struct CommunityManagerAgent
{   base: BaseAgent
}

impl CommunityManagerAgent
{   pub fn new(client: OpenRouterClient) -> Self
    {   CommunityManagerAgent
        {   base: BaseAgent::new(client, AgentProfile
            {   name: AGENT_NAME.to_string()
              , model: DEFAULT_MODEL.to_string()
              , temperature: 0.8
              , max_tokens: 500
              , on_parse_failure: ParseFailurePolicy::Degrade
            })
        }
    }

    pub fn with_model(self, model: impl Into<String>) -> Self
    {   CommunityManagerAgent { base: self.base.with_model(model) }
    }

    pub fn with_parse_failure_policy(self, policy: ParseFailurePolicy) -> Self
    {   CommunityManagerAgent
        {   base: self.base.with_parse_failure_policy(policy)
        }
    }

    pub fn profile(&self) -> &AgentProfile
    {   self.base.profile()
    }

    /// Analyze `comment` posted on `platform` and suggest a reply.
    pub async fn run(
      &self
    , comment: &str
    , platform: &str
    , brand: &BrandContext
    , history: &[ConversationTurn]
    ) -> Result<CommentReply>
    {   info!("[{}] Analyzing comment on {}", AGENT_NAME, platform);

        let system_prompt = build_system_prompt(brand);
        let user_message = build_user_message(comment, platform, history);

        self.base.run_report(
          &system_prompt,
          &user_message,
          CommentParams { platform: platform.to_string() }
        ).await
    }
}

fn build_system_prompt(brand: &BrandContext) -> String
{   format!(
r#"Tu es le Community Manager AI pour {brand_name}, une entreprise {industry}.

TON RÔLE:
- Analyser les commentaires sur les réseaux sociaux
- Générer des réponses contextuelles et engageantes
- Maintenir une voix de marque cohérente
- Détecter et signaler les contenus problématiques

TON DE COMMUNICATION:
{tone}

LANGUE PRINCIPALE: {language}

DIRECTIVES:
1. Réponds TOUJOURS dans la même langue que le commentaire
2. Sois empathique et à l'écoute
3. Pour les commentaires négatifs: reconnais le problème, excuse-toi si nécessaire, propose une solution
4. Pour les questions: fournis des réponses précises et utiles
5. Pour les compliments: remercie chaleureusement
6. Utilise des émojis avec modération (max 2 par réponse)
7. Garde les réponses courtes (50-150 mots)
8. Ne fais jamais de promesses que tu ne peux pas tenir
9. Signale immédiatement: spam, contenu haineux, trolls

RÉPONSE FORMAT (JSON):
{{
  "sentiment": "positive|neutral|negative|spam|toxic",
  "category": "question|complaint|compliment|spam|other",
  "urgency": "low|medium|high|critical",
  "suggested_response": "Ta réponse ici",
  "requires_human": true|false,
  "tags": ["tag1", "tag2"],
  "internal_notes": "Notes pour l'équipe"
}}
"#,
      brand_name = brand.brand_name,
      industry = brand.industry,
      tone = brand.tone,
      language = brand.language.to_uppercase(),
    )
}

fn build_user_message(
  comment: &str
, platform: &str
, history: &[ConversationTurn]
) -> String
{   let mut message = format!(
      "PLATEFORME: {}\n\nCOMMENTAIRE À ANALYSER:\n\"{}\"\n",
      platform.to_uppercase(),
      comment
    );

    if !history.is_empty()
    {   message.push_str("\n\nHISTORIQUE CONVERSATION:\n");
        let skip = history.len().saturating_sub(HISTORY_TURNS);
        for turn in &history[skip..]
        {   message.push_str(&format!("[{}]: {}\n", turn.role, turn.text));
        }
    }

    message.push_str("\n\nGénère l'analyse complète au format JSON.");
    message
}
