//! Content optimization for classic search (SEO) and AI answers (AIO)

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{check_score, null_as_default, AgentOutput, BaseAgent, Report};
use crate::config::{AgentProfile, ParseFailurePolicy};
use crate::error::Result;
use crate::providers::OpenRouterClient;

pub const AGENT_NAME: &str = "SEO_AIO";
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

const SYSTEM_PROMPT: &str
  = r#"Tu es un expert en SEO moderne ET en AI Overview Optimization (AIO).

TON RÔLE:
- Optimiser le contenu pour les moteurs de recherche traditionnels (Google SEO)
- Optimiser pour les résultats d'IA (ChatGPT, Claude, Perplexity, Google AI Overviews)
- Maximiser la citation-readiness pour les LLMs
- Garantir factual accuracy et authority signals

DOUBLE OPTIMISATION:

📊 **SEO CLASSIQUE:**
1. Keywords primaires et secondaires
2. Meta title (50-60 chars)
3. Meta description (150-160 chars)
4. Headers structure (H1, H2, H3)
5. URL slug
6. Alt text images
7. Internal linking suggestions

🤖 **AIO MODERNE:**
1. Citation-ready facts (sources, dates, chiffres)
2. Structured answers (Q&A format)
3. Entity optimization (personnes, lieux, organisations)
4. Factual accuracy score
5. Authority signals (E-E-A-T)
6. Conversational query optimization
7. Schema.org structured data

DIRECTIVES:
- Priorise TOUJOURS la factual accuracy
- Chaque fait doit être citable
- Utilise des chiffres et dates précis
- Optimise pour featured snippets
- Pense voice search + conversational queries
- Applique E-E-A-T (Experience, Expertise, Authoritativeness, Trustworthiness)

RÉPONSE FORMAT (JSON):
{
  "seo": {
    "primary_keywords": ["keyword1", "keyword2"],
    "secondary_keywords": ["keyword3", "keyword4"],
    "meta_title": "Title optimisé (50-60 chars)",
    "meta_description": "Description optimisée (150-160 chars)",
    "url_slug": "optimized-url-slug",
    "h1": "H1 principal",
    "h2_structure": ["H2 #1", "H2 #2", "H2 #3"],
    "internal_links": [
      {"anchor": "texte", "target": "/url"}
    ],
    "image_alt_texts": ["Alt text 1", "Alt text 2"]
  },
  "aio": {
    "citation_ready_facts": [
      {
        "fact": "Fait précis avec source",
        "source": "Source URL ou nom",
        "date": "2025-01-01"
      }
    ],
    "qa_pairs": [
      {
        "question": "Question conversationnelle",
        "answer": "Réponse concise et factuelle"
      }
    ],
    "entities": {
      "people": ["Personne 1"],
      "organizations": ["Organisation 1"],
      "locations": ["Lieu 1"]
    },
    "factual_accuracy_score": 95,
    "authority_signals": {
      "experience": "Démonstration expérience",
      "expertise": "Démonstration expertise",
      "authoritativeness": "Signaux autorité",
      "trustworthiness": "Signaux confiance"
    },
    "schema_suggestions": [
      {
        "type": "Article",
        "properties": {
          "headline": "...",
          "author": "...",
          "datePublished": "..."
        }
      }
    ]
  },
  "voice_search_optimization": [
    "Question voice search 1?",
    "Question voice search 2?"
  ],
  "featured_snippet_target": "Texte optimisé pour featured snippet",
  "overall_score": 88,
  "recommendations": [
    "Recommendation 1",
    "Recommendation 2"
  ]
}
"#;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InternalLink
{   pub anchor: String
  , pub target: String
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoSection
{   #[serde(default, deserialize_with = "null_as_default")]
    pub primary_keywords: Vec<String>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub secondary_keywords: Vec<String>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub meta_title: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub meta_description: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub url_slug: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub h1: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub h2_structure: Vec<String>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub internal_links: Vec<InternalLink>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub image_alt_texts: Vec<String>
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitationFact
{   pub fact: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub source: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub date: String
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QaPair
{   pub question: String
  , pub answer: String
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities
{   #[serde(default, deserialize_with = "null_as_default")]
    pub people: Vec<String>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub organizations: Vec<String>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub locations: Vec<String>
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthoritySignals
{   #[serde(default, deserialize_with = "null_as_default")]
    pub experience: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub expertise: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub authoritativeness: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub trustworthiness: String
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AioSection
{   #[serde(default, deserialize_with = "null_as_default")]
    pub citation_ready_facts: Vec<CitationFact>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub qa_pairs: Vec<QaPair>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub entities: Entities
  , #[serde(default)]
    pub factual_accuracy_score: Option<f64>
  , #[serde(default)]
    pub authority_signals: Option<AuthoritySignals>
  , /// schema.org snippets, kept as-is
    #[serde(default, deserialize_with = "null_as_default")]
    pub schema_suggestions: Vec<Value>
}

/// SEO/AIO optimization plan returned by the model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoOptimization
{   pub seo: SeoSection
  , pub aio: AioSection
  , #[serde(default, deserialize_with = "null_as_default")]
    pub voice_search_optimization: Vec<String>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub featured_snippet_target: String
  , #[serde(default)]
    pub overall_score: Option<f64>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: Vec<String>
  , #[serde(flatten)]
    pub extra: Map<String, Value>
}

impl Report for SeoOptimization
{   fn validate(&self) -> std::result::Result<(), String>
    {   if let Some(score) = self.overall_score
        {   check_score("overall_score", score)?;
        }
        if let Some(score) = self.aio.factual_accuracy_score
        {   check_score("aio.factual_accuracy_score", score)?;
        }
        Ok(())
    }

    fn fallback(reason: &str) -> Self
    {   SeoOptimization
        {   recommendations: vec![
              format!("Error parsing AI response: {}", reason)
            ]
          , ..SeoOptimization::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoRequest
{   pub content: String
  , #[serde(default)]
    pub target_keywords: Vec<String>
  , pub language: String
  , /// blog_post, product_page, landing_page
    pub content_type: String
}

impl SeoRequest
{   pub fn new(content: impl Into<String>) -> Self
    {   SeoRequest
        {   content: content.into()
          , target_keywords: vec![]
          , language: "fr".to_string()
          , content_type: "blog_post".to_string()
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self
    {   self.target_keywords = keywords;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeoParams
{   pub language: String
  , pub content_type: String
}

pub type SeoReport = AgentOutput<SeoOptimization, SeoParams>;

/// Optimizes a piece of content for search engines and AI overviews.
#[derive(Debug, Clone)]
pub struct SeoAioAgent
{   base: BaseAgent
}

impl SeoAioAgent
{   pub fn new(client: OpenRouterClient) -> Self
    {   SeoAioAgent
        {   base: BaseAgent::new(client, AgentProfile
            {   name: AGENT_NAME.to_string()
              , model: DEFAULT_MODEL.to_string()
              , temperature: 0.3
              , max_tokens: 3000
              , on_parse_failure: ParseFailurePolicy::Propagate
            })
        }
    }

    pub fn with_model(self, model: impl Into<String>) -> Self
    {   SeoAioAgent { base: self.base.with_model(model) }
    }

    pub fn with_parse_failure_policy(self, policy: ParseFailurePolicy) -> Self
    {   SeoAioAgent
        {   base: self.base.with_parse_failure_policy(policy)
        }
    }

    pub fn profile(&self) -> &AgentProfile
    {   self.base.profile()
    }

    pub async fn run(&self, request: &SeoRequest) -> Result<SeoReport>
    {   info!(
          "[{}] Optimizing {} in {}",
          AGENT_NAME, request.content_type, request.language
        );

        self.base.run_report(
          SYSTEM_PROMPT,
          &build_user_message(request),
          SeoParams
          {   language: request.language.clone()
            , content_type: request.content_type.clone()
          }
        ).await
    }
}

fn build_user_message(request: &SeoRequest) -> String
{   let mut message = format!(
      "LANGUE: {}\nTYPE DE CONTENU: {}\n",
      request.language.to_uppercase(),
      request.content_type
    );

    if !request.target_keywords.is_empty()
    {   message.push_str(&format!(
          "\nMOTS-CLÉS CIBLES: {}\n",
          request.target_keywords.join(", ")
        ));
    }

    message.push_str(&format!(
      "\nCONTENU À OPTIMISER:\n---\n{}\n---\n\n\
       Génère l'analyse SEO/AIO complète au format JSON.\n\
       Assure-toi que TOUS les faits sont citables et vérifiables.\n",
      request.content
    ));
    message
}
