//! Reputation crisis detection over a batch of brand mentions

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{check_score, null_as_default, AgentOutput, BaseAgent, Report};
use crate::config::{AgentProfile, ParseFailurePolicy};
use crate::error::Result;
use crate::providers::OpenRouterClient;

pub const AGENT_NAME: &str = "CrisisManager";
pub const DEFAULT_MODEL: &str = "anthropic/claude-3.5-sonnet";

const SYSTEM_PROMPT: &str
  = r#"Tu es le Crisis Manager d'AstroMedia, expert en gestion de crise de réputation.

# Ton Rôle
Tu surveilles la réputation et détectes/gères les crises AVANT qu'elles explosent.

# Définition Crise

## 🟢 NORMAL (0-30)
- Mentions négatives <5/jour
- Sentiment positif/neutre
- Pas de viralité négative
**Action**: Monitoring routine

## 🟡 WATCH (31-50)
- Mentions négatives 5-20/jour
- Sentiment négatif croissant
- Quelques commentaires viraux
**Action**: Surveillance rapprochée

## 🟠 ALERTE (51-75)
- Spike négatif 20-100/jour
- Hashtag négatif émergent
- Couverture médias possible
**Action**: Protocole crise activé

## 🔴 CRISE (76-100)
- Explosion >100/jour
- Tendance négative
- Médias actifs
- Dommages durables
**Action**: Intervention CEO

# Facteurs Aggravants
- x1.5: Influenceur impliqué
- x1.3: Vidéo/preuve visuelle
- x1.2: Médias mainstream
- x2.0: Sécurité/santé publique
- x1.5: Violations éthiques/légales

# Process Gestion

## PHASE 1: DÉTECTION (0-1h)
1. Analyse contenu négatif
2. Classification type crise
3. Scoring sévérité
4. Identification amplificateurs
5. Alerte si score >50

## PHASE 2: CONTAINMENT (1-4h)
1. Pause posts joyeux
2. Monitoring 15min
3. Statement initial
4. Réponses individuelles
5. Brief équipe

## PHASE 3: RESOLUTION (4-48h)
1. Root cause analysis
2. Mesures correctives
3. Communication transparente
4. Compensation si nécessaire
5. Media outreach

## PHASE 4: RECOVERY (48h-30j)
1. Monitoring post-crise
2. Content positif
3. Re-engagement
4. Lessons learned
5. Reputation repair

# Stratégies Réponse

✅ À FAIRE:
- Reconnaître rapidement
- Empathie et accountability
- Faits vérifiés uniquement
- Transparence
- Solutions concrètes
- Updates réguliers

❌ NE PAS:
- Ignorer/supprimer
- Être défensif
- Blâmer clients
- Info non vérifiée
- Fausses promesses
- Disparaître

# Format Sortie (JSON)
{
  "crisis_detected": true|false,
  "crisis_score": 0-100,
  "severity": "normal|watch|alert|crisis",
  "crisis_type": "product|service|employee|security|advertising|other",
  "sentiment_analysis": {
    "positive": 0-100,
    "neutral": 0-100,
    "negative": 0-100,
    "trend": "improving|stable|worsening"
  },
  "key_issues": ["Issue 1", ...],
  "amplifiers": [
    {
      "type": "influencer|media|hashtag",
      "name": "Nom",
      "reach": "Portée",
      "sentiment": "negative"
    }
  ],
  "recommended_actions": [
    {
      "priority": "immediate|high|medium",
      "action": "Description",
      "owner": "team|ceo|legal|pr",
      "deadline": "Timeframe"
    }
  ],
  "statement_draft": "Statement si crise",
  "escalation_required": true|false,
  "estimated_impact": {
    "reputation_damage": "low|medium|high|severe",
    "financial_risk": "low|medium|high",
    "recovery_time": "days|weeks|months"
  },
  "monitoring_plan": {
    "frequency": "15min|1h|4h|daily",
    "platforms": ["twitter", ...],
    "keywords": ["keyword1", ...]
  }
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisSeverity
{   Normal
  , Watch
  , Alert
  , Crisis
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisType
{   Product
  , Service
  , Employee
  , Security
  , Advertising
  , #[default]
    Other
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentTrend
{   Improving
  , Stable
  , Worsening
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentBreakdown
{   pub positive: f64
  , pub neutral: f64
  , pub negative: f64
  , pub trend: SentimentTrend
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amplifier
{   #[serde(rename = "type")]
    pub kind: String
  , pub name: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub reach: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub sentiment: String
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPriority
{   Immediate
  , High
  , Medium
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAction
{   pub priority: ActionPriority
  , pub action: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub owner: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub deadline: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedImpact
{   pub reputation_damage: String
  , pub financial_risk: String
  , pub recovery_time: String
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringPlan
{   pub frequency: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub platforms: Vec<String>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: Vec<String>
}

/// Crisis assessment returned by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisAssessment
{   pub crisis_detected: bool
  , pub crisis_score: f64
  , pub severity: CrisisSeverity
  , #[serde(default, deserialize_with = "null_as_default")]
    pub crisis_type: CrisisType
  , pub sentiment_analysis: SentimentBreakdown
  , #[serde(default, deserialize_with = "null_as_default")]
    pub key_issues: Vec<String>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub amplifiers: Vec<Amplifier>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub recommended_actions: Vec<RecommendedAction>
  , #[serde(default)]
    pub statement_draft: Option<String>
  , pub escalation_required: bool
  , #[serde(default)]
    pub estimated_impact: Option<EstimatedImpact>
  , #[serde(default)]
    pub monitoring_plan: Option<MonitoringPlan>
  , /// Why the assessment could not be read, only set on fallbacks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment_error: Option<String>
  , #[serde(flatten)]
    pub extra: Map<String, Value>
}

impl Report for CrisisAssessment
{   fn validate(&self) -> std::result::Result<(), String>
    {   check_score("crisis_score", self.crisis_score)?;
        let s = &self.sentiment_analysis;
        check_score("sentiment_analysis.positive", s.positive)?;
        check_score("sentiment_analysis.neutral", s.neutral)?;
        check_score("sentiment_analysis.negative", s.negative)?;
        Ok(())
    }

    /// No verdict: kept under watch and escalated to a human
    fn fallback(reason: &str) -> Self
    {   CrisisAssessment
        {   crisis_detected: false
          , crisis_score: 0.0
          , severity: CrisisSeverity::Watch
          , crisis_type: CrisisType::Other
          , sentiment_analysis: SentimentBreakdown
            {   positive: 0.0
              , neutral: 0.0
              , negative: 0.0
              , trend: SentimentTrend::Stable
            }
          , key_issues: vec![]
          , amplifiers: vec![]
          , recommended_actions: vec![]
          , statement_draft: None
          , escalation_required: true
          , estimated_impact: None
          , monitoring_plan: None
          , assessment_error: Some(reason.to_string())
          , extra: Map::new()
        }
    }
}

/// One brand mention picked up by monitoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention
{   #[serde(default = "unknown_platform")]
    pub platform: String
  , #[serde(default)]
    pub text: String
}

fn unknown_platform() -> String { "unknown".to_string() }

impl Mention
{   pub fn new(platform: impl Into<String>, text: impl Into<String>) -> Self
    {   Mention
        {   platform: platform.into()
          , text: text.into()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisRequest
{   pub brand_name: String
  , #[serde(default)]
    pub mentions: Vec<Mention>
  , /// 1h, 4h, 24h
    pub monitoring_period: String
  , /// Usual share of negative mentions, in percent
    pub baseline_negative_pct: f64
}

impl CrisisRequest
{   pub fn new(brand_name: impl Into<String>, mentions: Vec<Mention>) -> Self
    {   CrisisRequest
        {   brand_name: brand_name.into()
          , mentions
          , monitoring_period: "24h".to_string()
          , baseline_negative_pct: 10.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrisisParams
{   pub brand_name: String
  , pub monitoring_period: String
  , pub mentions_analyzed: usize
}

pub type CrisisReport = AgentOutput<CrisisAssessment, CrisisParams>;

/// Scores a batch of mentions for crisis risk and drafts a response plan.
#[derive(Debug, Clone)]
pub struct CrisisManagerAgent
{   base: BaseAgent
}

impl CrisisManagerAgent
{   pub fn new(client: OpenRouterClient) -> Self
    {   CrisisManagerAgent
        {   base: BaseAgent::new(client, AgentProfile
            {   name: AGENT_NAME.to_string()
              , model: DEFAULT_MODEL.to_string()
              , temperature: 0.4
              , max_tokens: 2500
              , on_parse_failure: ParseFailurePolicy::Propagate
            })
        }
    }

    pub fn with_model(self, model: impl Into<String>) -> Self
    {   CrisisManagerAgent { base: self.base.with_model(model) }
    }

    pub fn with_parse_failure_policy(self, policy: ParseFailurePolicy) -> Self
    {   CrisisManagerAgent
        {   base: self.base.with_parse_failure_policy(policy)
        }
    }

    pub fn profile(&self) -> &AgentProfile
    {   self.base.profile()
    }

    pub async fn run(&self, request: &CrisisRequest) -> Result<CrisisReport>
    {   info!(
          "[{}] Analyzing {} mentions for {}",
          AGENT_NAME, request.mentions.len(), request.brand_name
        );

        let user_message = build_user_message(request);

        self.base.run_report(
          SYSTEM_PROMPT,
          &user_message,
          CrisisParams
          {   brand_name: request.brand_name.clone()
            , monitoring_period: request.monitoring_period.clone()
            , mentions_analyzed: request.mentions.len()
          }
        ).await
    }
}

fn build_user_message(request: &CrisisRequest) -> String
{   let mentions_text = if request.mentions.is_empty()
    {   "Aucune mention".to_string()
    } else
    {   request.mentions
          .iter()
          .map(|m| format!("- [{}] {}", m.platform, m.text))
          .collect::<Vec<_>>()
          .join("\n")
    };

    format!(
      "Analyse mentions et détecte crise potentielle.\n\n\
       MARQUE: {}\n\
       PÉRIODE: dernières {}\n\
       SENTIMENT NORMAL: {}% négatif\n\n\
       MENTIONS ({} total):\n{}\n\n\
       Effectue analyse complète et retourne JSON crisis management.",
      request.brand_name,
      request.monitoring_period,
      request.baseline_negative_pct,
      request.mentions.len(),
      mentions_text
    )
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn mentions_are_listed_with_platform()
    {   let request = CrisisRequest::new("AstroMedia", vec![
          Mention::new("twitter", "Service horrible"),
          Mention::new("reddit", "Jamais plus"),
        ]);
        let message = build_user_message(&request);
        assert!(message.contains("MENTIONS (2 total):\n- [twitter] Service horrible\n- [reddit] Jamais plus"));
        assert!(message.contains("SENTIMENT NORMAL: 10% négatif"));
        assert!(message.contains("PÉRIODE: dernières 24h"));
    }

    #[test]
    fn no_mentions_is_spelled_out()
    {   let message = build_user_message(&CrisisRequest::new("X", vec![]));
        assert!(message.contains("MENTIONS (0 total):\nAucune mention"));
    }

    #[test]
    fn mention_platform_defaults_to_unknown()
    {   let mention: Mention = serde_json::from_str(r#"{"text": "bof"}"#)
          .unwrap();
        assert_eq!(mention.platform, "unknown");
    }

    #[test]
    fn out_of_range_score_is_rejected()
    {   let mut assessment = CrisisAssessment::fallback("x");
        assessment.crisis_score = 140.0;
        assert!(assessment.validate().is_err());
    }

    #[test]
    fn fallback_is_never_an_all_clear()
    {   let assessment = CrisisAssessment::fallback("bad json");
        assert_eq!(assessment.severity, CrisisSeverity::Watch);
        assert!(assessment.escalation_required);
        assert!(assessment.key_issues.is_empty());
        assert_eq!(assessment.assessment_error.as_deref(), Some("bad json"));
        assert!(assessment.validate().is_ok());
    }

    #[test]
    fn nulls_and_unknown_keys_survive_decoding()
    {   let assessment: CrisisAssessment = serde_json::from_value(serde_json::json!({
          "crisis_detected": false,
          "crisis_score": 5,
          "severity": "normal",
          "crisis_type": null,
          "sentiment_analysis": {
            "positive": 70, "neutral": 25, "negative": 5, "trend": "stable"
          },
          "key_issues": null,
          "amplifiers": [{"type": "media", "name": "La Presse", "reach": null}],
          "statement_draft": null,
          "escalation_required": false,
          "confidence": 0.9
        })).unwrap();
        assert_eq!(assessment.crisis_type, CrisisType::Other);
        assert!(assessment.key_issues.is_empty());
        assert_eq!(assessment.amplifiers[0].reach, "");
        assert_eq!(assessment.extra["confidence"], 0.9);
        assert!(assessment.assessment_error.is_none());
    }
}
