use serde::{Deserialize, Serialize};

/// A rankable item. `description` only contributes when non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The text that is actually embedded for this candidate.
    pub fn composite_text(&self) -> String {
        match self.description.as_deref() {
            Some(d) if !d.is_empty() => format!("{} {}", self.name, d),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    pub id: String,
    pub name: String,
    pub score: f32,
}

/// Response shape for search: the ranked hits and how many there are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub results: Vec<RankedResult>,
    pub count: usize,
}

impl From<Vec<RankedResult>> for SearchResults {
    fn from(results: Vec<RankedResult>) -> Self {
        Self {
            count: results.len(),
            results,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingOutput {
    pub embedding: Vec<f32>,
    pub dimensions: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    PersonName,
    Organization,
    Location,
    Email,
    Phone,
    Ssn,
    CreditCard,
    IpAddress,
    DateOfBirth,
}

impl FindingCategory {
    /// Entity categories that are blanked out by redaction.
    pub fn is_redacted_entity(&self) -> bool {
        matches!(self, FindingCategory::PersonName | FindingCategory::Organization)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    #[serde(rename = "type")]
    pub category: FindingCategory,
    pub value: String,
    /// Character offsets into the analysed text, half-open.
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

/// Entity counts are distinct values; pattern counts are raw matches.
/// Dates of birth are reported as findings but not counted here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PiiSummary {
    pub person_names: usize,
    pub organizations: usize,
    pub locations: usize,
    pub emails: usize,
    pub phones: usize,
    pub ssns: usize,
    pub credit_cards: usize,
    pub ip_addresses: usize,
}

impl PiiSummary {
    pub fn total(&self) -> usize {
        self.person_names
            + self.organizations
            + self.locations
            + self.emails
            + self.phones
            + self.ssns
            + self.credit_cards
            + self.ip_addresses
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingsReport {
    pub has_pii: bool,
    pub risk_level: RiskLevel,
    pub entities: Vec<Finding>,
    pub patterns: Vec<Finding>,
    pub summary: PiiSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionOutput {
    pub original_length: usize,
    pub redacted_text: String,
    pub findings: FindingsReport,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitivityAssessment {
    pub is_sensitive: bool,
    pub risk_level: RiskLevel,
    pub should_encrypt: bool,
    pub requires_access_control: bool,
    pub recommendations: Vec<String>,
}
