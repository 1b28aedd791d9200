use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssessmentId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for AssessmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of organizational unit being assessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Hospital,
    HealthOffice,
}

impl UnitKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Hospital => "Hospital",
            Self::HealthOffice => "Health Office",
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Hospital => "hospital",
            Self::HealthOffice => "health_office",
        }
    }
}

/// Identity of a hospital or health office.
///
/// Both kinds share one report space, so the kind is part of the key and equal
/// codes of different kinds never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId {
    pub kind: UnitKind,
    pub code: String,
}

impl UnitId {
    pub fn hospital(code: impl Into<String>) -> Self {
        Self {
            kind: UnitKind::Hospital,
            code: code.into(),
        }
    }

    pub fn health_office(code: impl Into<String>) -> Self {
        Self {
            kind: UnitKind::HealthOffice,
            code: code.into(),
        }
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.key(), self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidUnitId(pub String);

impl fmt::Display for InvalidUnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a unit id (expected hospital:<code> or health_office:<code>)",
            self.0
        )
    }
}

impl std::error::Error for InvalidUnitId {}

impl FromStr for UnitId {
    type Err = InvalidUnitId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, code) = value
            .trim()
            .split_once(':')
            .ok_or_else(|| InvalidUnitId(value.to_string()))?;
        let code = code.trim();
        if code.is_empty() {
            return Err(InvalidUnitId(value.to_string()));
        }

        match kind.trim().to_ascii_lowercase().as_str() {
            "hospital" => Ok(Self::hospital(code)),
            "health_office" | "healthoffice" => Ok(Self::health_office(code)),
            _ => Err(InvalidUnitId(value.to_string())),
        }
    }
}

/// One of the fixed assessment criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub code: String,
    pub order_number: u32,
    pub name_th: String,
    pub name_en: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[serde(alias = "passed")]
    Pass,
    Partial,
    #[serde(alias = "failed")]
    Fail,
}

impl ItemStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Partial => "Partial",
            Self::Fail => "Fail",
        }
    }
}

/// Status vocabulary and weight table used by an assessment scheme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusScheme {
    /// Binary vocabulary. A stray `partial` status earns no credit.
    PassFail,
    PassPartialFail { partial_weight: f64 },
}

impl StatusScheme {
    pub const STANDARD_PARTIAL_WEIGHT: f64 = 0.5;

    pub const fn pass_partial_fail() -> Self {
        Self::PassPartialFail {
            partial_weight: Self::STANDARD_PARTIAL_WEIGHT,
        }
    }

    pub fn weight(self, status: ItemStatus) -> f64 {
        match (self, status) {
            (_, ItemStatus::Pass) => 1.0,
            (Self::PassPartialFail { partial_weight }, ItemStatus::Partial) => partial_weight,
            _ => 0.0,
        }
    }

    pub fn partial_weight(self) -> f64 {
        self.weight(ItemStatus::Partial)
    }

    pub fn recognizes_partial(self) -> bool {
        matches!(self, Self::PassPartialFail { .. })
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::PassFail => "pass/fail",
            Self::PassPartialFail { .. } => "pass/partial/fail",
        }
    }
}

impl Default for StatusScheme {
    fn default() -> Self {
        Self::pass_partial_fail()
    }
}

/// Result for one category within one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentItem {
    pub id: ItemId,
    pub assessment_id: AssessmentId,
    pub category_id: CategoryId,
    pub status: ItemStatus,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub score: Option<f64>,
}

impl AssessmentItem {
    /// Stored score, or the scheme weight when the store left it blank.
    pub fn weight(&self, scheme: StatusScheme) -> f64 {
        self.score.unwrap_or_else(|| scheme.weight(self.status))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: AssessmentId,
    pub unit: UnitId,
    pub status: String,
    pub fiscal_year: i32,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub quantitative_score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Leadership and sustainability scores on a 0–15 raw scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitativeScore {
    pub assessment_id: AssessmentId,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub leadership_score: Option<f64>,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub sustainable_score: Option<f64>,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub total_score: Option<f64>,
}

impl QualitativeScore {
    pub fn effective_total(&self) -> f64 {
        self.total_score.unwrap_or_else(|| {
            self.leadership_score.unwrap_or(0.0) + self.sustainable_score.unwrap_or(0.0)
        })
    }
}

pub const IMPACT_FULL_CREDIT: f64 = 15.0;

/// Incident and data-breach deductions on a 0–15 raw scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactScore {
    pub assessment_id: AssessmentId,
    #[serde(default)]
    pub had_incident: bool,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub incident_score: Option<f64>,
    #[serde(default)]
    pub had_data_breach: bool,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub breach_score: Option<f64>,
    #[serde(default, deserialize_with = "numeric::optional_number")]
    pub total_score: Option<f64>,
}

impl ImpactScore {
    /// Stored total, otherwise full credit less any recorded deductions.
    pub fn effective_total(&self) -> f64 {
        if let Some(total) = self.total_score {
            return total;
        }

        let mut total = IMPACT_FULL_CREDIT;
        if self.had_incident {
            total += self.incident_score.unwrap_or(0.0).min(0.0);
        }
        if self.had_data_breach {
            total += self.breach_score.unwrap_or(0.0).min(0.0);
        }
        total.clamp(0.0, IMPACT_FULL_CREDIT)
    }
}

/// Set of assessment statuses treated as approved for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalPolicy {
    statuses: Vec<String>,
}

impl ApprovalPolicy {
    pub fn new<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = statuses
            .into_iter()
            .map(|status| status.as_ref().trim().to_ascii_lowercase())
            .filter(|status| !status.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();
        Self {
            statuses: normalized,
        }
    }

    pub fn standard() -> Self {
        Self::new(["approved"])
    }

    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }

    pub fn is_approved(&self, status: &str) -> bool {
        let status = status.trim();
        self.statuses
            .iter()
            .any(|approved| approved.eq_ignore_ascii_case(status))
    }
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Province {
    pub code: String,
    pub name: String,
    pub region_code: String,
}

/// Leaf of the organizational hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgUnit {
    pub id: UnitId,
    pub name: String,
    pub province_code: String,
}

/// Coercion for numeric columns the record store hands back as text.
pub mod numeric {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    pub fn parse_number(raw: &str) -> Result<Option<f64>, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            _ => Err(format!("'{trimmed}' is not a number")),
        }
    }

    pub fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<NumberOrText>::deserialize(deserializer)? {
            None => Ok(None),
            Some(NumberOrText::Number(value)) => Ok(Some(value)),
            Some(NumberOrText::Text(text)) => parse_number(&text).map_err(D::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unit_id_parses_both_kinds() {
        assert_eq!(
            "hospital:10669".parse::<UnitId>().expect("hospital id"),
            UnitId::hospital("10669")
        );
        assert_eq!(
            " Health_Office : 00012 ".parse::<UnitId>().expect("office id"),
            UnitId::health_office("00012")
        );
        assert!("clinic:1".parse::<UnitId>().is_err());
        assert!("hospital:".parse::<UnitId>().is_err());
    }

    #[test]
    fn item_score_accepts_numeric_text() {
        let item: AssessmentItem = serde_json::from_value(json!({
            "id": "i-1",
            "assessment_id": "a-1",
            "category_id": "c-1",
            "status": "partial",
            "score": " 0.5 ",
        }))
        .expect("item deserializes");
        assert_eq!(item.score, Some(0.5));

        let item: AssessmentItem = serde_json::from_value(json!({
            "id": "i-2",
            "assessment_id": "a-1",
            "category_id": "c-1",
            "status": "passed",
            "score": "",
        }))
        .expect("item deserializes");
        assert_eq!(item.score, None);
        assert_eq!(item.status, ItemStatus::Pass);
        assert_eq!(item.weight(StatusScheme::default()), 1.0);
    }

    #[test]
    fn binary_scheme_gives_partial_no_credit() {
        assert_eq!(StatusScheme::PassFail.weight(ItemStatus::Partial), 0.0);
        assert_eq!(StatusScheme::default().weight(ItemStatus::Partial), 0.5);
        assert!(!StatusScheme::PassFail.recognizes_partial());
    }

    #[test]
    fn impact_total_falls_back_to_deductions() {
        let impact = ImpactScore {
            assessment_id: AssessmentId("a-1".to_string()),
            had_incident: true,
            incident_score: Some(-3.0),
            had_data_breach: false,
            breach_score: Some(-5.0),
            total_score: None,
        };
        assert_eq!(impact.effective_total(), 12.0);

        let stored = ImpactScore {
            total_score: Some(9.0),
            ..impact
        };
        assert_eq!(stored.effective_total(), 9.0);
    }

    #[test]
    fn approval_policy_matches_case_insensitively() {
        let policy = ApprovalPolicy::new(["Approved", " completed ", ""]);
        assert_eq!(policy.statuses(), ["approved", "completed"]);
        assert!(policy.is_approved("APPROVED"));
        assert!(policy.is_approved("completed"));
        assert!(!policy.is_approved("under_review"));
    }
}
