use super::normalizer::{clean_text, flag, item_status, status_key};
use super::SnapshotImportError;
use crate::scoring::domain::numeric::parse_number;
use crate::scoring::domain::{
    Assessment, AssessmentId, AssessmentItem, Category, CategoryId, ImpactScore, ItemId, OrgUnit,
    Province, QualitativeScore, Region, UnitId, UnitKind,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Read;

pub(crate) const CATEGORIES: &str = "categories.csv";
pub(crate) const REGIONS: &str = "regions.csv";
pub(crate) const PROVINCES: &str = "provinces.csv";
pub(crate) const UNITS: &str = "units.csv";
pub(crate) const ASSESSMENTS: &str = "assessments.csv";
pub(crate) const ITEMS: &str = "assessment_items.csv";
pub(crate) const QUALITATIVE: &str = "qualitative_scores.csv";
pub(crate) const IMPACT: &str = "impact_scores.csv";

fn rows<R: Read, T: DeserializeOwned>(
    reader: R,
    file: &'static str,
) -> Result<Vec<T>, SnapshotImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    csv_reader
        .deserialize::<T>()
        .map(|row| row.map_err(|source| SnapshotImportError::Csv { file, source }))
        .collect()
}

/// Header is line 1, so the first data row is line 2.
fn line_of(index: usize) -> usize {
    index + 2
}

fn number(
    raw: Option<&str>,
    file: &'static str,
    index: usize,
    column: &str,
) -> Result<Option<f64>, SnapshotImportError> {
    match raw {
        None => Ok(None),
        Some(raw) => parse_number(raw).map_err(|message| SnapshotImportError::InvalidRecord {
            file,
            line: line_of(index),
            message: format!("{column}: {message}"),
        }),
    }
}

fn required_text(
    raw: &str,
    file: &'static str,
    index: usize,
    column: &str,
) -> Result<String, SnapshotImportError> {
    let cleaned = clean_text(raw);
    if cleaned.is_empty() {
        return Err(SnapshotImportError::InvalidRecord {
            file,
            line: line_of(index),
            message: format!("{column} is required"),
        });
    }
    Ok(cleaned)
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    id: String,
    code: String,
    #[serde(default)]
    order_number: Option<String>,
    #[serde(default)]
    name_th: Option<String>,
    #[serde(default)]
    name_en: Option<String>,
}

pub(crate) fn parse_categories<R: Read>(reader: R) -> Result<Vec<Category>, SnapshotImportError> {
    let file = CATEGORIES;
    rows::<_, CategoryRow>(reader, file)?
        .into_iter()
        .enumerate()
        .map(|(index, row)| -> Result<Category, SnapshotImportError> {
            let order_number = number(row.order_number.as_deref(), file, index, "order_number")?
                .map(|value| value.max(0.0) as u32)
                .unwrap_or((index + 1) as u32);

            Ok(Category {
                id: CategoryId(required_text(&row.id, file, index, "id")?),
                code: clean_text(&row.code),
                order_number,
                name_th: row.name_th.as_deref().map(clean_text).unwrap_or_default(),
                name_en: row.name_en.as_deref().map(clean_text).unwrap_or_default(),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct RegionRow {
    code: String,
    #[serde(default)]
    name: Option<String>,
}

pub(crate) fn parse_regions<R: Read>(reader: R) -> Result<Vec<Region>, SnapshotImportError> {
    let file = REGIONS;
    rows::<_, RegionRow>(reader, file)?
        .into_iter()
        .enumerate()
        .map(|(index, row)| -> Result<Region, SnapshotImportError> {
            let code = required_text(&row.code, file, index, "code")?;
            Ok(Region {
                name: row
                    .name
                    .as_deref()
                    .map(clean_text)
                    .unwrap_or_else(|| code.clone()),
                code,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ProvinceRow {
    code: String,
    #[serde(default)]
    name: Option<String>,
    region_code: String,
}

pub(crate) fn parse_provinces<R: Read>(reader: R) -> Result<Vec<Province>, SnapshotImportError> {
    let file = PROVINCES;
    rows::<_, ProvinceRow>(reader, file)?
        .into_iter()
        .enumerate()
        .map(|(index, row)| -> Result<Province, SnapshotImportError> {
            let code = required_text(&row.code, file, index, "code")?;
            Ok(Province {
                name: row
                    .name
                    .as_deref()
                    .map(clean_text)
                    .unwrap_or_else(|| code.clone()),
                region_code: required_text(&row.region_code, file, index, "region_code")?,
                code,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct UnitRow {
    kind: String,
    code: String,
    #[serde(default)]
    name: Option<String>,
    province_code: String,
}

pub(crate) fn parse_units<R: Read>(reader: R) -> Result<Vec<OrgUnit>, SnapshotImportError> {
    let file = UNITS;
    rows::<_, UnitRow>(reader, file)?
        .into_iter()
        .enumerate()
        .map(|(index, row)| -> Result<OrgUnit, SnapshotImportError> {
            let kind = match status_key(&row.kind).as_str() {
                "hospital" => UnitKind::Hospital,
                "health_office" | "healthoffice" => UnitKind::HealthOffice,
                other => {
                    return Err(SnapshotImportError::InvalidRecord {
                        file,
                        line: line_of(index),
                        message: format!("unknown unit kind '{other}'"),
                    })
                }
            };
            let code = required_text(&row.code, file, index, "code")?;

            Ok(OrgUnit {
                name: row
                    .name
                    .as_deref()
                    .map(clean_text)
                    .unwrap_or_else(|| code.clone()),
                id: UnitId { kind, code },
                province_code: required_text(&row.province_code, file, index, "province_code")?,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct AssessmentRow {
    id: String,
    #[serde(default)]
    hospital_id: Option<String>,
    #[serde(default)]
    health_office_id: Option<String>,
    status: String,
    fiscal_year: String,
    #[serde(default)]
    quantitative_score: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

pub(crate) fn parse_assessments<R: Read>(
    reader: R,
) -> Result<Vec<Assessment>, SnapshotImportError> {
    let file = ASSESSMENTS;
    rows::<_, AssessmentRow>(reader, file)?
        .into_iter()
        .enumerate()
        .map(|(index, row)| -> Result<Assessment, SnapshotImportError> {
            let invalid = |message: String| SnapshotImportError::InvalidRecord {
                file,
                line: line_of(index),
                message,
            };

            let hospital = row.hospital_id.as_deref().map(clean_text).filter(|id| !id.is_empty());
            let office = row
                .health_office_id
                .as_deref()
                .map(clean_text)
                .filter(|id| !id.is_empty());
            let unit = match (hospital, office) {
                (Some(code), None) => UnitId::hospital(code),
                (None, Some(code)) => UnitId::health_office(code),
                (Some(_), Some(_)) => {
                    return Err(invalid(
                        "hospital_id and health_office_id are both set".to_string(),
                    ))
                }
                (None, None) => {
                    return Err(invalid(
                        "one of hospital_id or health_office_id is required".to_string(),
                    ))
                }
            };

            let fiscal_year = clean_text(&row.fiscal_year)
                .parse::<i32>()
                .map_err(|_| invalid(format!("fiscal_year '{}' is not a year", row.fiscal_year)))?;

            let created_at = match row.created_at.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(raw) => Some(
                    parse_datetime(raw)
                        .ok_or_else(|| invalid(format!("created_at '{raw}' is not a timestamp")))?,
                ),
            };

            Ok(Assessment {
                id: AssessmentId(required_text(&row.id, file, index, "id")?),
                unit,
                status: status_key(&row.status),
                fiscal_year,
                quantitative_score: number(
                    row.quantitative_score.as_deref(),
                    file,
                    index,
                    "quantitative_score",
                )?,
                created_at,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ItemRow {
    id: String,
    assessment_id: String,
    category_id: String,
    status: String,
    #[serde(default)]
    score: Option<String>,
}

pub(crate) fn parse_items<R: Read>(reader: R) -> Result<Vec<AssessmentItem>, SnapshotImportError> {
    let file = ITEMS;
    rows::<_, ItemRow>(reader, file)?
        .into_iter()
        .enumerate()
        .map(|(index, row)| -> Result<AssessmentItem, SnapshotImportError> {
            let status =
                item_status(&row.status).ok_or_else(|| SnapshotImportError::InvalidRecord {
                    file,
                    line: line_of(index),
                    message: format!("unknown item status '{}'", row.status),
                })?;

            Ok(AssessmentItem {
                id: ItemId(required_text(&row.id, file, index, "id")?),
                assessment_id: AssessmentId(required_text(
                    &row.assessment_id,
                    file,
                    index,
                    "assessment_id",
                )?),
                category_id: CategoryId(required_text(&row.category_id, file, index, "category_id")?),
                status,
                score: number(row.score.as_deref(), file, index, "score")?,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct QualitativeRow {
    assessment_id: String,
    #[serde(default)]
    leadership_score: Option<String>,
    #[serde(default)]
    sustainable_score: Option<String>,
    #[serde(default)]
    total_score: Option<String>,
}

pub(crate) fn parse_qualitative<R: Read>(
    reader: R,
) -> Result<Vec<QualitativeScore>, SnapshotImportError> {
    let file = QUALITATIVE;
    rows::<_, QualitativeRow>(reader, file)?
        .into_iter()
        .enumerate()
        .map(|(index, row)| -> Result<QualitativeScore, SnapshotImportError> {
            Ok(QualitativeScore {
                assessment_id: AssessmentId(required_text(
                    &row.assessment_id,
                    file,
                    index,
                    "assessment_id",
                )?),
                leadership_score: number(row.leadership_score.as_deref(), file, index, "leadership_score")?,
                sustainable_score: number(
                    row.sustainable_score.as_deref(),
                    file,
                    index,
                    "sustainable_score",
                )?,
                total_score: number(row.total_score.as_deref(), file, index, "total_score")?,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct ImpactRow {
    assessment_id: String,
    #[serde(default)]
    had_incident: Option<String>,
    #[serde(default)]
    incident_score: Option<String>,
    #[serde(default)]
    had_data_breach: Option<String>,
    #[serde(default)]
    breach_score: Option<String>,
    #[serde(default)]
    total_score: Option<String>,
}

pub(crate) fn parse_impact<R: Read>(reader: R) -> Result<Vec<ImpactScore>, SnapshotImportError> {
    let file = IMPACT;
    rows::<_, ImpactRow>(reader, file)?
        .into_iter()
        .enumerate()
        .map(|(index, row)| -> Result<ImpactScore, SnapshotImportError> {
            let boolean = |raw: Option<&str>, column: &str| {
                flag(raw.unwrap_or("")).ok_or_else(|| SnapshotImportError::InvalidRecord {
                    file,
                    line: line_of(index),
                    message: format!("{column} must be true or false"),
                })
            };

            Ok(ImpactScore {
                assessment_id: AssessmentId(required_text(
                    &row.assessment_id,
                    file,
                    index,
                    "assessment_id",
                )?),
                had_incident: boolean(row.had_incident.as_deref(), "had_incident")?,
                incident_score: number(row.incident_score.as_deref(), file, index, "incident_score")?,
                had_data_breach: boolean(row.had_data_breach.as_deref(), "had_data_breach")?,
                breach_score: number(row.breach_score.as_deref(), file, index, "breach_score")?,
                total_score: number(row.total_score.as_deref(), file, index, "total_score")?,
            })
        })
        .collect()
}

fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }

    if let Ok(dt) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(dt.naive_utc());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    None
}

#[cfg(test)]
pub(crate) fn parse_datetime_for_tests(value: &str) -> Option<NaiveDateTime> {
    parse_datetime(value)
}
