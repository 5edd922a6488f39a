//! Emerging trend and viral opportunity scouting

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{check_score, null_as_default, AgentOutput, BaseAgent, Report};
use crate::config::{AgentProfile, ParseFailurePolicy};
use crate::error::Result;
use crate::providers::OpenRouterClient;

pub const AGENT_NAME: &str = "TrendScout";
/// Perplexity models browse the web, which this agent relies on
pub const DEFAULT_MODEL: &str = "perplexity/llama-3.1-sonar-huge-128k-online";

const SYSTEM_PROMPT: &str
  = r##"Tu es le Trend Scout d'AstroMedia, expert en détection de tendances marketing.

# Ton Rôle
Tu surveilles le web en continu pour identifier tendances émergentes et opportunités virales.

# Capacités

## 1. DÉTECTION TENDANCES
- Hashtags émergents (+500%/jour)
- Sujets viraux explosifs
- Nouveaux formats populaires
- Événements pertinents
- Innovations qui buzzent

## 2. SOURCES
- Twitter/X: trending hashtags
- LinkedIn: sujets hot professionnels
- TikTok: challenges viraux
- Reddit: discussions émergentes
- Google Trends: recherches en hausse
- News: actualités pertinentes

## 3. SCORING VIRALITÉ
- **Vélocité**: mentions/heure
- **Volume**: total mentions
- **Engagement**: ratio likes/shares
- **Durabilité**: éphémère vs durable
- **Relevance**: pertinence industrie (0-100)

## 4. OPPORTUNITÉS
- Angle unique pour se démarquer
- Timing optimal
- Format recommandé
- Reach estimé
- Call-to-action

# Critères Qualité

✅ BON SIGNAL:
- Croissance +300%/jour min
- Engagement >5%
- Alignement marque
- Fenêtre >24h
- Reach >100K

❌ FAUX SIGNAL:
- Bots/artificiel
- Déjà saturé
- Incompatible marque
- Durée <6h
- Reach <10K

# Format Sortie (JSON)
{
  "trends": [
    {
      "title": "Nom tendance",
      "description": "Description",
      "source": "twitter|linkedin|tiktok|google_trends|news",
      "hashtags": ["#tag1", "#tag2"],
      "virality_score": 0-100,
      "velocity": "mentions/h",
      "volume": "total mentions",
      "engagement_rate": "%",
      "durability": "ephemeral|short-term|long-term",
      "relevance_score": 0-100,
      "opportunity": {
        "angle": "Comment capitaliser",
        "format": "video|carousel|thread|article",
        "timing": "now|today|this_week",
        "estimated_reach": "10K|100K|1M+",
        "difficulty": "easy|medium|hard"
      },
      "risks": ["Risque 1", ...],
      "examples": ["URL 1", ...]
    }
  ],
  "top_recommendation": {
    "trend_index": 0,
    "reasoning": "Pourquoi cette tendance"
  },
  "industry_insights": "Vue d'ensemble",
  "competitive_analysis": "Ce que font concurrents"
}
"##;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity
{   #[serde(default, deserialize_with = "null_as_default")]
    pub angle: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub format: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub timing: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub estimated_reach: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub difficulty: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend
{   pub title: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub description: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub source: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub hashtags: Vec<String>
  , pub virality_score: f64
  , /// Free-form, models send numbers or prose
    #[serde(default)]
    pub velocity: Option<Value>
  , #[serde(default)]
    pub volume: Option<Value>
  , #[serde(default)]
    pub engagement_rate: Option<Value>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub durability: String
  , pub relevance_score: f64
  , #[serde(default)]
    pub opportunity: Option<Opportunity>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub risks: Vec<String>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub examples: Vec<String>
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopRecommendation
{   pub trend_index: usize
  , #[serde(default, deserialize_with = "null_as_default")]
    pub reasoning: String
}

/// Trend scan returned by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendScan
{   pub trends: Vec<Trend>
  , #[serde(default)]
    pub top_recommendation: Option<TopRecommendation>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub industry_insights: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub competitive_analysis: String
  , #[serde(flatten)]
    pub extra: Map<String, Value>
}

impl TrendScan
{   /// The trend the model recommends acting on, if any
    pub fn recommended(&self) -> Option<&Trend>
    {   self.top_recommendation
          .as_ref()
          .and_then(|r| self.trends.get(r.trend_index))
    }
}

impl Report for TrendScan
{   fn validate(&self) -> std::result::Result<(), String>
    {   for trend in &self.trends
        {   check_score("virality_score", trend.virality_score)?;
            check_score("relevance_score", trend.relevance_score)?;
        }
        if let Some(top) = &self.top_recommendation
        {   if top.trend_index >= self.trends.len()
            {   return Err(format!(
                  "top_recommendation.trend_index {} with {} trends",
                  top.trend_index, self.trends.len()
                ));
            }
        }
        Ok(())
    }

    fn fallback(reason: &str) -> Self
    {   TrendScan
        {   trends: vec![]
          , top_recommendation: None
          , industry_insights: format!("Error parsing AI response: {}", reason)
          , competitive_analysis: String::new()
          , extra: Map::new()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRequest
{   pub industry: String
  , #[serde(default)]
    pub keywords: Vec<String>
  , /// 24h, 7d, 30d
    pub timeframe: String
  , /// Passed to the model as an instruction, not filtered locally
    pub min_relevance: u8
}

impl TrendRequest
{   pub fn new(industry: impl Into<String>) -> Self
    {   TrendRequest
        {   industry: industry.into()
          , keywords: vec![]
          , timeframe: "24h".to_string()
          , min_relevance: 70
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self
    {   self.keywords = keywords;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendParams
{   pub industry: String
  , pub timeframe: String
}

pub type TrendReport = AgentOutput<TrendScan, TrendParams>;

/// Looks for trends an industry could ride in the coming days.
#[derive(Debug, Clone)]
pub struct TrendScoutAgent
{   base: BaseAgent
}

impl TrendScoutAgent
{   pub fn new(client: OpenRouterClient) -> Self
    {   TrendScoutAgent
        {   base: BaseAgent::new(client, AgentProfile
            {   name: AGENT_NAME.to_string()
              , model: DEFAULT_MODEL.to_string()
              , temperature: 0.6
              , max_tokens: 3000
              , on_parse_failure: ParseFailurePolicy::Propagate
            })
        }
    }

    pub fn with_model(self, model: impl Into<String>) -> Self
    {   TrendScoutAgent { base: self.base.with_model(model) }
    }

    pub fn with_parse_failure_policy(self, policy: ParseFailurePolicy) -> Self
    {   TrendScoutAgent
        {   base: self.base.with_parse_failure_policy(policy)
        }
    }

    pub fn profile(&self) -> &AgentProfile
    {   self.base.profile()
    }

    pub async fn run(&self, request: &TrendRequest) -> Result<TrendReport>
    {   info!("[{}] Scanning trends for {}", AGENT_NAME, request.industry);

        self.base.run_report(
          SYSTEM_PROMPT,
          &build_user_message(request),
          TrendParams
          {   industry: request.industry.clone()
            , timeframe: request.timeframe.clone()
          }
        ).await
    }
}

fn build_user_message(request: &TrendRequest) -> String
{   let keywords = if request.keywords.is_empty()
    {   "tous".to_string()
    } else
    {   request.keywords.join(", ")
    };

    format!(
      "Scan et analyse les tendances actuelles.\n\n\
       INDUSTRIE: {}\n\
       KEYWORDS: {}\n\
       PÉRIODE: dernières {}\n\
       RELEVANCE MIN: {}/100\n\n\
       Recherche sur:\n\
       - Twitter/X trending\n\
       - LinkedIn top posts\n\
       - Google Trends\n\
       - News récentes\n\n\
       Identifie 3-5 meilleures opportunités et retourne JSON complet.",
      request.industry,
      keywords,
      request.timeframe,
      request.min_relevance
    )
}
