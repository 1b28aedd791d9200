//! CSV exports of the hosted record store.
//!
//! The store hands numeric columns back as text, so every numeric field is
//! coerced here before it reaches the scoring code.

mod normalizer;
mod parser;

use crate::scoring::aggregation::OrganizationDirectory;
use crate::scoring::domain::{
    Assessment, AssessmentId, AssessmentItem, Category, ImpactScore, OrgUnit, Province,
    QualitativeScore, Region,
};
use crate::scoring::repository::{AssessmentRepository, RepositoryError};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug)]
pub enum SnapshotImportError {
    Io(std::io::Error),
    Csv {
        file: &'static str,
        source: csv::Error,
    },
    InvalidRecord {
        file: &'static str,
        line: usize,
        message: String,
    },
}

impl std::fmt::Display for SnapshotImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotImportError::Io(err) => write!(f, "failed to read snapshot: {}", err),
            SnapshotImportError::Csv { file, source } => {
                write!(f, "invalid CSV data in {}: {}", file, source)
            }
            SnapshotImportError::InvalidRecord {
                file,
                line,
                message,
            } => write!(f, "{} line {}: {}", file, line, message),
        }
    }
}

impl std::error::Error for SnapshotImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SnapshotImportError::Io(err) => Some(err),
            SnapshotImportError::Csv { source, .. } => Some(source),
            SnapshotImportError::InvalidRecord { .. } => None,
        }
    }
}

impl From<std::io::Error> for SnapshotImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Every record the scoring service reads, loaded into memory.
#[derive(Debug, Clone, Default)]
pub struct ScoringSnapshot {
    categories: Vec<Category>,
    directory: OrganizationDirectory,
    assessments: Vec<Assessment>,
    items: Vec<AssessmentItem>,
    qualitative: HashMap<AssessmentId, QualitativeScore>,
    impact: HashMap<AssessmentId, ImpactScore>,
}

impl ScoringSnapshot {
    /// Builds a snapshot, ordering assessments by creation time.
    ///
    /// The sort is stable and places undated records first, so equal
    /// timestamps keep their export order.
    pub fn new(
        categories: Vec<Category>,
        directory: OrganizationDirectory,
        mut assessments: Vec<Assessment>,
        items: Vec<AssessmentItem>,
        qualitative: Vec<QualitativeScore>,
        impact: Vec<ImpactScore>,
    ) -> Self {
        assessments.sort_by_key(|assessment| assessment.created_at);

        Self {
            categories,
            directory,
            assessments,
            items,
            qualitative: qualitative
                .into_iter()
                .map(|score| (score.assessment_id.clone(), score))
                .collect(),
            impact: impact
                .into_iter()
                .map(|score| (score.assessment_id.clone(), score))
                .collect(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn directory(&self) -> &OrganizationDirectory {
        &self.directory
    }

    pub fn assessments(&self) -> &[Assessment] {
        &self.assessments
    }

    pub fn items(&self) -> &[AssessmentItem] {
        &self.items
    }
}

impl AssessmentRepository for ScoringSnapshot {
    fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        Ok(self.categories.clone())
    }

    fn directory(&self) -> Result<OrganizationDirectory, RepositoryError> {
        Ok(self.directory.clone())
    }

    fn assessments(&self) -> Result<Vec<Assessment>, RepositoryError> {
        Ok(self.assessments.clone())
    }

    fn assessment(&self, id: &AssessmentId) -> Result<Option<Assessment>, RepositoryError> {
        Ok(self
            .assessments
            .iter()
            .find(|assessment| &assessment.id == id)
            .cloned())
    }

    fn items(&self) -> Result<Vec<AssessmentItem>, RepositoryError> {
        Ok(self.items.clone())
    }

    fn items_for(&self, id: &AssessmentId) -> Result<Vec<AssessmentItem>, RepositoryError> {
        Ok(self
            .items
            .iter()
            .filter(|item| &item.assessment_id == id)
            .cloned()
            .collect())
    }

    fn qualitative_score(
        &self,
        id: &AssessmentId,
    ) -> Result<Option<QualitativeScore>, RepositoryError> {
        Ok(self.qualitative.get(id).cloned())
    }

    fn impact_score(&self, id: &AssessmentId) -> Result<Option<ImpactScore>, RepositoryError> {
        Ok(self.impact.get(id).cloned())
    }
}

pub struct SnapshotImporter;

impl SnapshotImporter {
    /// Loads a snapshot directory.
    ///
    /// `categories.csv`, `assessments.csv` and `assessment_items.csv` are
    /// required; the directory and score files are optional.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<ScoringSnapshot, SnapshotImportError> {
        let dir = dir.as_ref();

        let categories = parser::parse_categories(File::open(dir.join(parser::CATEGORIES))?)?;
        let assessments = parser::parse_assessments(File::open(dir.join(parser::ASSESSMENTS))?)?;
        let items = parser::parse_items(File::open(dir.join(parser::ITEMS))?)?;

        let regions = optional(dir, parser::REGIONS, parser::parse_regions)?;
        let provinces = optional(dir, parser::PROVINCES, parser::parse_provinces)?;
        let units = optional(dir, parser::UNITS, parser::parse_units)?;
        let qualitative = optional(dir, parser::QUALITATIVE, parser::parse_qualitative)?;
        let impact = optional(dir, parser::IMPACT, parser::parse_impact)?;

        info!(
            path = %dir.display(),
            categories = categories.len(),
            units = units.len(),
            assessments = assessments.len(),
            items = items.len(),
            "loaded scoring snapshot"
        );

        Ok(ScoringSnapshot::new(
            categories,
            OrganizationDirectory::new(regions, provinces, units),
            assessments,
            items,
            qualitative,
            impact,
        ))
    }

    pub fn categories_from_reader<R: Read>(reader: R) -> Result<Vec<Category>, SnapshotImportError> {
        parser::parse_categories(reader)
    }

    pub fn regions_from_reader<R: Read>(reader: R) -> Result<Vec<Region>, SnapshotImportError> {
        parser::parse_regions(reader)
    }

    pub fn provinces_from_reader<R: Read>(reader: R) -> Result<Vec<Province>, SnapshotImportError> {
        parser::parse_provinces(reader)
    }

    pub fn units_from_reader<R: Read>(reader: R) -> Result<Vec<OrgUnit>, SnapshotImportError> {
        parser::parse_units(reader)
    }

    /// Assessments in file order; [`ScoringSnapshot::new`] sorts them.
    pub fn assessments_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<Assessment>, SnapshotImportError> {
        parser::parse_assessments(reader)
    }

    pub fn items_from_reader<R: Read>(reader: R) -> Result<Vec<AssessmentItem>, SnapshotImportError> {
        parser::parse_items(reader)
    }

    pub fn qualitative_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<QualitativeScore>, SnapshotImportError> {
        parser::parse_qualitative(reader)
    }

    pub fn impact_from_reader<R: Read>(reader: R) -> Result<Vec<ImpactScore>, SnapshotImportError> {
        parser::parse_impact(reader)
    }
}

fn optional<T>(
    dir: &Path,
    file: &'static str,
    parse: fn(File) -> Result<Vec<T>, SnapshotImportError>,
) -> Result<Vec<T>, SnapshotImportError> {
    let path = dir.join(file);
    if !path.exists() {
        debug!(file, "optional snapshot file missing");
        return Ok(Vec::new());
    }
    parse(File::open(path)?)
}
