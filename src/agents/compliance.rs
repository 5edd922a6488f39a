//! Legal compliance audit of marketing content before publication

use log::info;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{null_as_default, AgentOutput, BaseAgent, Report};
use crate::config::{AgentProfile, ParseFailurePolicy};
use crate::error::Result;
use crate::providers::OpenRouterClient;

pub const AGENT_NAME: &str = "Compliance";
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_REGION: &str = "CA";

const SYSTEM_PROMPT: &str
  = r#"Tu es l'Agent Compliance d'AstroMedia, expert en conformité légale marketing.

# Ton Rôle
Tu audites tous les contenus marketing pour garantir conformité légale AVANT publication.

# Lois et Règlements

## 1. CASL (Loi canadienne anti-pourriel)
Obligations:
- ✅ Consentement explicite avant envoi emails commerciaux
- ✅ Identification claire expéditeur
- ✅ Mécanisme opt-out visible
- ✅ Adresse postale dans footer
Amendes: jusqu'à 10M$ CAD

## 2. RGPD (Règlement européen)
Obligations:
- ✅ Base légale traitement données
- ✅ Transparence utilisation données
- ✅ Droits accès/rectification/suppression
- ✅ Privacy by design
Amendes: jusqu'à 4% revenus annuels

## 3. Droits d'auteur
Vérifications:
- Images: licence commerciale
- Textes: pas de plagiat
- Marques: usage autorisé
- Citations: attribution correcte

## 4. Publicité trompeuse
Interdictions:
- Fausses promesses
- Témoignages fabriqués
- Prix trompeurs
- Omissions matérielles

# Classification Sévérité
🔴 CRITIQUE: Blocage publication (risque légal élevé)
🟠 MAJEUR: Correction requise
🟡 MINEUR: Amélioration recommandée
🟢 CONFORME: Aucun problème

# Format de Sortie (JSON)
{
  "compliance_status": "compliant|minor_issues|major_issues|critical",
  "overall_risk": "low|medium|high|critical",
  "checks_performed": ["CASL", "RGPD", "Copyright", ...],
  "violations": [
    {
      "severity": "critical|major|minor",
      "law": "CASL|RGPD|Copyright|FTC",
      "issue": "Description",
      "article": "Article de loi",
      "recommendation": "Correction proposée",
      "risk": "Conséquence si non corrigé"
    }
  ],
  "required_mentions": ["Mention 1", ...],
  "safe_to_publish": true|false,
  "corrected_version": "Version corrigée si applicable"
}
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus
{   Compliant
  , MinorIssues
  , MajorIssues
  , Critical
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel
{   Low
  , Medium
  , High
  , Critical
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity
{   Critical
  , Major
  , Minor
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation
{   pub severity: ViolationSeverity
  , pub law: String
  , pub issue: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub article: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub recommendation: String
  , #[serde(default, deserialize_with = "null_as_default")]
    pub risk: String
}

/// Audit verdict returned by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceAudit
{   pub compliance_status: ComplianceStatus
  , pub overall_risk: RiskLevel
  , #[serde(default, deserialize_with = "null_as_default")]
    pub checks_performed: Vec<String>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub violations: Vec<Violation>
  , #[serde(default, deserialize_with = "null_as_default")]
    pub required_mentions: Vec<String>
  , pub safe_to_publish: bool
  , #[serde(default)]
    pub corrected_version: Option<String>
  , /// Why the audit could not be read, only set on fallbacks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_error: Option<String>
  , #[serde(flatten)]
    pub extra: Map<String, Value>
}

impl ComplianceAudit
{   pub fn has_critical_violation(&self) -> bool
    {   self.compliance_status == ComplianceStatus::Critical
          || self.violations
            .iter()
            .any(|v| v.severity == ViolationSeverity::Critical)
    }
}

impl Report for ComplianceAudit
{   fn validate(&self) -> std::result::Result<(), String>
    {   if self.safe_to_publish && self.has_critical_violation()
        {   return Err(
              "safe_to_publish set despite a critical violation".to_string()
            );
        }
        Ok(())
    }

    /// Blocks publication: an unreadable audit is never a green light
    fn fallback(reason: &str) -> Self
    {   ComplianceAudit
        {   compliance_status: ComplianceStatus::Critical
          , overall_risk: RiskLevel::High
          , checks_performed: vec![]
          , violations: vec![]
          , required_mentions: vec![]
          , safe_to_publish: false
          , corrected_version: None
          , audit_error: Some(reason.to_string())
          , extra: Map::new()
        }
    }
}

/// What to audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRequest
{   pub content: String
  , /// email, post, landing_page, ad
    pub content_type: String
  , /// Empty means Canada only
    #[serde(default)]
    pub target_regions: Vec<String>
  , #[serde(default)]
    pub contains_images: bool
  , /// Health or guarantee claims
    #[serde(default)]
    pub contains_claims: bool
}

impl ComplianceRequest
{   pub fn new(
      content: impl Into<String>
    , content_type: impl Into<String>
    ) -> Self
    {   ComplianceRequest
        {   content: content.into()
          , content_type: content_type.into()
          , target_regions: vec![]
          , contains_images: false
          , contains_claims: false
        }
    }

    fn regions(&self) -> Vec<String>
    {   if self.target_regions.is_empty()
        {   vec![DEFAULT_REGION.to_string()]
        } else
        {   self.target_regions.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceParams
{   pub content_type: String
  , pub target_regions: Vec<String>
}

pub type ComplianceReport = AgentOutput<ComplianceAudit, ComplianceParams>;

/// Audits content against CASL, GDPR, copyright and advertising rules.
/// Unreadable audits are returned as errors by default.
#[derive(Debug, Clone)]
pub struct ComplianceAgent
{   base: BaseAgent
}

impl ComplianceAgent
{   pub fn new(client: OpenRouterClient) -> Self
    {   ComplianceAgent
        {   base: BaseAgent::new(client, AgentProfile
            {   name: AGENT_NAME.to_string()
              , model: DEFAULT_MODEL.to_string()
              , temperature: 0.3
              , max_tokens: 2000
              , on_parse_failure: ParseFailurePolicy::Propagate
            })
        }
    }

    pub fn with_model(self, model: impl Into<String>) -> Self
    {   ComplianceAgent { base: self.base.with_model(model) }
    }

    pub fn with_parse_failure_policy(self, policy: ParseFailurePolicy) -> Self
    {   ComplianceAgent
        {   base: self.base.with_parse_failure_policy(policy)
        }
    }

    pub fn profile(&self) -> &AgentProfile
    {   self.base.profile()
    }

    pub async fn run(
      &self
    , request: &ComplianceRequest
    ) -> Result<ComplianceReport>
    {   let regions = request.regions();
        info!(
          "[{}] Auditing {} for {:?}",
          AGENT_NAME, request.content_type, regions
        );

        let user_message = build_user_message(request, &regions);

        self.base.run_report(
          SYSTEM_PROMPT,
          &user_message,
          ComplianceParams
          {   content_type: request.content_type.clone()
            , target_regions: regions
          }
        ).await
    }
}

fn build_user_message(
  request: &ComplianceRequest
, regions: &[String]
) -> String
{   format!(
      "Audit de conformité légale.\n\n\
       TYPE: {}\n\
       RÉGIONS CIBLÉES: {}\n\
       CONTIENT IMAGES: {}\n\
       CONTIENT CLAIMS: {}\n\n\
       CONTENU:\n{}\n\n\
       Effectue un audit complet et retourne le JSON de compliance.",
      request.content_type,
      regions.join(", "),
      request.contains_images,
      request.contains_claims,
      request.content
    )
}
