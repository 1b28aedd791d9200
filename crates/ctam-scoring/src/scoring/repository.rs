use super::aggregation::OrganizationDirectory;
use super::domain::{
    Assessment, AssessmentId, AssessmentItem, Category, ImpactScore, QualitativeScore,
};

/// Read-only view of the hosted record store.
pub trait AssessmentRepository: Send + Sync {
    fn categories(&self) -> Result<Vec<Category>, RepositoryError>;
    fn directory(&self) -> Result<OrganizationDirectory, RepositoryError>;
    /// All assessments, ascending by creation time.
    fn assessments(&self) -> Result<Vec<Assessment>, RepositoryError>;
    fn assessment(&self, id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError>;
    fn items(&self) -> Result<Vec<AssessmentItem>, RepositoryError>;
    fn items_for(&self, id: &AssessmentId) -> Result<Vec<AssessmentItem>, RepositoryError>;
    fn qualitative_score(
        &self,
        id: &AssessmentId,
    ) -> Result<Option<QualitativeScore>, RepositoryError>;
    fn impact_score(&self, id: &AssessmentId) -> Result<Option<ImpactScore>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}
