use crate::infra::parse_fiscal_year;
use chrono::Local;
use clap::{Args, ValueEnum};
use ctam_scoring::config::AppConfig;
use ctam_scoring::error::AppError;
use ctam_scoring::scoring::report::views::{AreaDrillDown, AreaReportRow, UnitReportRow};
use ctam_scoring::scoring::report::{write_area_csv, write_unit_csv};
use ctam_scoring::scoring::{AssessmentId, AssessmentScorecard, ReportScope, ScoringService};
use ctam_scoring::snapshot::{ScoringSnapshot, SnapshotImporter};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReportFormat {
    Text,
    Json,
    Csv,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Directory holding the CSV snapshot export
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Fiscal year to report (defaults to CTAM_FISCAL_YEAR, then every year)
    #[arg(long, value_parser = parse_fiscal_year)]
    pub(crate) fiscal_year: Option<i32>,
    /// Drill into one region by code
    #[arg(long, conflicts_with = "province")]
    pub(crate) region: Option<String>,
    /// Drill into one province by code, listing its units
    #[arg(long)]
    pub(crate) province: Option<String>,
    /// Output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub(crate) format: ReportFormat,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Directory holding the CSV snapshot export
    #[arg(long)]
    pub(crate) snapshot: PathBuf,
    /// Assessment identifier to score
    #[arg(long)]
    pub(crate) assessment: String,
    /// Print the scorecard as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        snapshot,
        fiscal_year,
        region,
        province,
        format,
    } = args;

    let service = snapshot_service(&snapshot)?;
    let scope = ReportScope {
        fiscal_year,
        visible_units: None,
    };

    let report = match (region, province) {
        (_, Some(code)) => service.province_report(&code, &scope)?,
        (Some(code), None) => service.region_report(&code, &scope)?,
        (None, None) => service.country_report(&scope)?,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        ReportFormat::Text => render_area_report(&mut out, &report)?,
        ReportFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &report).map_err(io::Error::from)?;
            writeln!(out)?;
        }
        ReportFormat::Csv => {
            if report.units.is_empty() {
                let mut rows = vec![report.area.clone()];
                rows.extend(report.children.iter().cloned());
                write_area_csv(&mut out, &rows)?;
            } else {
                write_unit_csv(&mut out, &report.units)?;
            }
        }
    }

    Ok(())
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let ScoreArgs {
        snapshot,
        assessment,
        json,
    } = args;

    let service = snapshot_service(&snapshot)?;
    let scorecard = service.scorecard(&AssessmentId(assessment))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &scorecard).map_err(io::Error::from)?;
        writeln!(out)?;
    } else {
        render_scorecard(&mut out, &scorecard)?;
    }

    Ok(())
}

fn snapshot_service(dir: &Path) -> Result<ScoringService<ScoringSnapshot>, AppError> {
    let config = AppConfig::load()?;
    let snapshot = SnapshotImporter::from_dir(dir)?;
    Ok(
        ScoringService::new(Arc::new(snapshot), config.scoring.rules)
            .with_default_fiscal_year(config.scoring.default_fiscal_year),
    )
}

fn percent(value: Option<f64>) -> String {
    value
        .map(|value| format!("{value:.2}%"))
        .unwrap_or_else(|| "n/a".to_string())
}

fn render_area_row<W: Write>(out: &mut W, row: &AreaReportRow, indent: &str) -> io::Result<()> {
    let label = match &row.code {
        Some(code) => format!("{} {} ({})", row.level_label, row.name, code),
        None => format!("{} {}", row.level_label, row.name),
    };
    writeln!(
        out,
        "{indent}{label}: {} units | {} assessed ({}) | {} not assessed | {} passed all ({})",
        row.total_units,
        row.units_assessed,
        percent(row.assessed_percentage),
        row.not_assessed,
        row.units_passed_all,
        percent(row.passed_all_percentage),
    )
}

pub(crate) fn render_area_report<W: Write>(out: &mut W, report: &AreaDrillDown) -> io::Result<()> {
    writeln!(out, "CTAM+ assessment report")?;
    writeln!(out, "Generated {}", Local::now().format("%Y-%m-%d %H:%M"))?;
    render_area_row(out, &report.area, "")?;

    if !report.area.categories.is_empty() {
        writeln!(out, "Category pass rates:")?;
        for category in &report.area.categories {
            writeln!(
                out,
                "  - {} {}: {}/{} ({})",
                category.code,
                category.name_en,
                category.passed_units,
                category.total_units,
                percent(category.pass_percentage),
            )?;
        }
    }

    if !report.children.is_empty() {
        writeln!(out, "Breakdown:")?;
        for child in &report.children {
            render_area_row(out, child, "  - ")?;
        }
    }

    if !report.units.is_empty() {
        writeln!(out, "Units:")?;
        for unit in &report.units {
            render_unit_row(out, unit)?;
        }
    }

    Ok(())
}

fn render_unit_row<W: Write>(out: &mut W, unit: &UnitReportRow) -> io::Result<()> {
    match &unit.assessment_id {
        Some(assessment_id) => writeln!(
            out,
            "  - [{}] {} ({}): {}/{} categories ({:.2}%){} via {}",
            unit.kind_label,
            unit.name,
            unit.unit_id,
            unit.passed_count,
            unit.total_categories,
            unit.percentage,
            if unit.passed_all { ", passed all" } else { "" },
            assessment_id.0,
        ),
        None => writeln!(
            out,
            "  - [{}] {} ({}): {}",
            unit.kind_label, unit.name, unit.unit_id, unit.state_label
        ),
    }
}

pub(crate) fn render_scorecard<W: Write>(
    out: &mut W,
    scorecard: &AssessmentScorecard,
) -> io::Result<()> {
    let unit = scorecard
        .unit_name
        .clone()
        .unwrap_or_else(|| scorecard.assessment.unit.to_string());
    writeln!(
        out,
        "Assessment {} | {} | fiscal year {} | status {}{}",
        scorecard.assessment.id.0,
        unit,
        scorecard.assessment.fiscal_year,
        scorecard.assessment.status,
        if scorecard.approved { "" } else { " (not approved)" },
    )?;
    writeln!(
        out,
        "- Categories passed: {}/{} ({:.2}%) under {} scoring",
        scorecard.evaluation.passed_count,
        scorecard.evaluation.total_categories,
        scorecard.display.percentage,
        scorecard.scheme,
    )?;
    writeln!(
        out,
        "- Quantitative {:.2}/7 | Qualitative {:.2}/1.5 | Impact {:.2}/1.5",
        scorecard.display.quantitative, scorecard.display.qualitative, scorecard.display.impact,
    )?;
    writeln!(
        out,
        "- Total {:.2}/10: {} ({}) [{}]",
        scorecard.display.total,
        scorecard.level_label,
        scorecard.level_label_th,
        scorecard.composite.table_version,
    )?;
    writeln!(out, "  {}", scorecard.level_description)?;

    writeln!(out, "Categories:")?;
    for category in &scorecard.categories {
        writeln!(
            out,
            "  - {} {}: {}",
            category.code,
            category.name_en,
            if category.passed { "Pass" } else { "Not passed" },
        )?;
    }

    Ok(())
}
