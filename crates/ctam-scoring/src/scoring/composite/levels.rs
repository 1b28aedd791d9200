use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityLevel {
    Critical,
    Developing,
    Fair,
    Good,
    Excellent,
}

impl QualityLevel {
    /// Highest band first.
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Excellent,
            Self::Good,
            Self::Fair,
            Self::Developing,
            Self::Critical,
        ]
    }

    pub const fn rank(self) -> u8 {
        match self {
            Self::Excellent => 5,
            Self::Good => 4,
            Self::Fair => 3,
            Self::Developing => 2,
            Self::Critical => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::Fair => "Fair",
            Self::Developing => "Developing",
            Self::Critical => "Critical",
        }
    }

    pub const fn label_th(self) -> &'static str {
        match self {
            Self::Excellent => "ดีเยี่ยม",
            Self::Good => "ดี",
            Self::Fair => "พอใช้",
            Self::Developing => "ต้องพัฒนา",
            Self::Critical => "วิกฤต",
        }
    }
}

/// Score scale a level table is expressed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScale {
    /// Composite total, 0–10.
    Composite,
    /// Quantitative-only percentage, 0–100.
    Percentage,
}

impl ScoreScale {
    pub const fn max(self) -> f64 {
        match self {
            Self::Composite => 10.0,
            Self::Percentage => 100.0,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Composite => "composite",
            Self::Percentage => "percentage",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityBand {
    pub level: QualityLevel,
    pub min_score: f64,
    pub max_score: f64,
    pub description: String,
}

/// Canonical, versioned band table shared by every report.
///
/// Bands are closed ranges written on a one-decimal (or whole-percent) grid.
/// A score between two written ranges, such as 4.05, belongs to the lower
/// band: each band effectively covers `[min, next.min)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityLevelTable {
    pub version: String,
    pub scale: ScoreScale,
    pub bands: Vec<QualityBand>,
}

impl QualityLevelTable {
    pub const STANDARD_VERSION: &'static str = "ctam-plus-v1";

    pub fn standard() -> Self {
        Self::from_bounds(
            ScoreScale::Composite,
            [(8.6, 10.0), (7.1, 8.5), (5.6, 7.0), (4.1, 5.5), (0.0, 4.0)],
        )
    }

    pub fn percentage() -> Self {
        Self::from_bounds(
            ScoreScale::Percentage,
            [(86.0, 100.0), (71.0, 85.0), (56.0, 70.0), (41.0, 55.0), (0.0, 40.0)],
        )
    }

    fn from_bounds(scale: ScoreScale, bounds: [(f64, f64); 5]) -> Self {
        let bands = QualityLevel::ordered()
            .into_iter()
            .zip(bounds)
            .map(|(level, (min_score, max_score))| QualityBand {
                level,
                min_score,
                max_score,
                description: default_description(level).to_string(),
            })
            .collect();

        Self {
            version: Self::STANDARD_VERSION.to_string(),
            scale,
            bands,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, QualityTableError> {
        let table: Self =
            serde_json::from_str(raw).map_err(|err| QualityTableError::Parse(err.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    /// Checks the table partitions its scale from 0 to the maximum.
    pub fn validate(&self) -> Result<(), QualityTableError> {
        if self.bands.len() != QualityLevel::ordered().len() {
            return Err(QualityTableError::BandCount(self.bands.len()));
        }

        for (band, expected) in self.bands.iter().zip(QualityLevel::ordered()) {
            if band.level != expected {
                return Err(QualityTableError::Order(band.level));
            }
            if band.min_score > band.max_score {
                return Err(QualityTableError::InvertedRange(band.level));
            }
        }

        for pair in self.bands.windows(2) {
            let (upper, lower) = (&pair[0], &pair[1]);
            if lower.max_score >= upper.min_score {
                return Err(QualityTableError::Overlap(lower.level, upper.level));
            }
            if upper.min_score - lower.max_score > self.grid_step() + f64::EPSILON {
                return Err(QualityTableError::Gap(lower.level, upper.level));
            }
        }

        let top = &self.bands[0];
        let bottom = &self.bands[self.bands.len() - 1];
        if bottom.min_score != 0.0 || top.max_score != self.scale.max() {
            return Err(QualityTableError::Coverage(self.scale));
        }

        Ok(())
    }

    /// Rejects a table written for a different scale than its caller bands.
    pub fn require_scale(&self, expected: ScoreScale) -> Result<(), QualityTableError> {
        if self.scale != expected {
            return Err(QualityTableError::Scale {
                expected,
                found: self.scale,
            });
        }
        Ok(())
    }

    fn grid_step(&self) -> f64 {
        match self.scale {
            ScoreScale::Composite => 0.1,
            ScoreScale::Percentage => 1.0,
        }
    }

    /// Resolves a score, falling back to the lowest band when it lies outside
    /// the scale.
    pub fn resolve(&self, score: f64) -> &QualityBand {
        match self.try_resolve(score) {
            Ok(band) => band,
            Err(_) => {
                warn!(
                    score,
                    scale = ?self.scale,
                    version = %self.version,
                    "score outside level table; banding as lowest level"
                );
                self.lowest()
            }
        }
    }

    pub fn try_resolve(&self, score: f64) -> Result<&QualityBand, QualityTableError> {
        if !score.is_finite() || score < 0.0 || score > self.scale.max() {
            return Err(QualityTableError::OutOfRange {
                score,
                scale: self.scale,
            });
        }

        self.bands
            .iter()
            .find(|band| score >= band.min_score)
            .ok_or(QualityTableError::OutOfRange {
                score,
                scale: self.scale,
            })
    }

    pub fn level(&self, score: f64) -> QualityLevel {
        self.resolve(score).level
    }

    pub fn band(&self, level: QualityLevel) -> Option<&QualityBand> {
        self.bands.iter().find(|band| band.level == level)
    }

    fn lowest(&self) -> &QualityBand {
        self.bands
            .iter()
            .min_by_key(|band| band.level)
            .unwrap_or(&FALLBACK_BAND)
    }
}

impl Default for QualityLevelTable {
    fn default() -> Self {
        Self::standard()
    }
}

static FALLBACK_BAND: QualityBand = QualityBand {
    level: QualityLevel::Critical,
    min_score: 0.0,
    max_score: 0.0,
    description: String::new(),
};

fn default_description(level: QualityLevel) -> &'static str {
    match level {
        QualityLevel::Excellent => {
            "Controls are mature across every category and sustained by leadership"
        }
        QualityLevel::Good => "Most controls are in place with minor gaps to close",
        QualityLevel::Fair => "Core controls exist but several categories need remediation",
        QualityLevel::Developing => "Significant gaps remain; an improvement plan is required",
        QualityLevel::Critical => "Basic controls are missing; urgent intervention is required",
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QualityTableError {
    Parse(String),
    BandCount(usize),
    Order(QualityLevel),
    InvertedRange(QualityLevel),
    Overlap(QualityLevel, QualityLevel),
    Gap(QualityLevel, QualityLevel),
    Coverage(ScoreScale),
    Scale { expected: ScoreScale, found: ScoreScale },
    OutOfRange { score: f64, scale: ScoreScale },
}

impl fmt::Display for QualityTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityTableError::Parse(err) => write!(f, "invalid level table: {err}"),
            QualityTableError::BandCount(count) => {
                write!(f, "level table must define 5 bands, found {count}")
            }
            QualityTableError::Order(level) => {
                write!(f, "band {} is out of order", level.label())
            }
            QualityTableError::InvertedRange(level) => {
                write!(f, "band {} has min above max", level.label())
            }
            QualityTableError::Overlap(lower, upper) => write!(
                f,
                "bands {} and {} overlap",
                lower.label(),
                upper.label()
            ),
            QualityTableError::Gap(lower, upper) => write!(
                f,
                "gap between bands {} and {}",
                lower.label(),
                upper.label()
            ),
            QualityTableError::Coverage(scale) => {
                write!(f, "bands must cover 0 to {}", scale.max())
            }
            QualityTableError::Scale { expected, found } => write!(
                f,
                "level table is on the {} scale, expected {}",
                found.label(),
                expected.label()
            ),
            QualityTableError::OutOfRange { score, scale } => {
                write!(f, "score {score} is outside 0 to {}", scale.max())
            }
        }
    }
}

impl std::error::Error for QualityTableError {}
