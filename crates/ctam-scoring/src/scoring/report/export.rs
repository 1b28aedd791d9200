use super::views::{AreaReportRow, UnitReportRow};
use std::io::Write;

const AREA_COLUMNS: [&str; 9] = [
    "level",
    "code",
    "name",
    "total_units",
    "units_assessed",
    "not_assessed",
    "units_passed_all",
    "assessed_pct",
    "passed_all_pct",
];

/// Writes area rows as CSV with one pass-percentage column per category.
///
/// Category columns follow the first row; rows are expected to share a
/// category list.
pub fn write_area_csv<W: Write>(writer: W, rows: &[AreaReportRow]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let category_codes: Vec<String> = rows
        .first()
        .map(|row| {
            row.categories
                .iter()
                .map(|category| category.code.clone())
                .collect()
        })
        .unwrap_or_default();

    let mut header: Vec<String> = AREA_COLUMNS.iter().map(|column| column.to_string()).collect();
    header.extend(category_codes.iter().map(|code| format!("{code}_pct")));
    csv_writer.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.level_label.to_string(),
            row.code.clone().unwrap_or_default(),
            row.name.clone(),
            row.total_units.to_string(),
            row.units_assessed.to_string(),
            row.not_assessed.to_string(),
            row.units_passed_all.to_string(),
            optional_pct(row.assessed_percentage),
            optional_pct(row.passed_all_percentage),
        ];
        record.extend(
            row.categories
                .iter()
                .map(|category| optional_pct(category.pass_percentage)),
        );
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_unit_csv<W: Write>(writer: W, rows: &[UnitReportRow]) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record([
        "unit_id",
        "kind",
        "name",
        "province_code",
        "state",
        "assessment_id",
        "fiscal_year",
        "passed_count",
        "total_categories",
        "percentage",
        "passed_all",
    ])?;

    for row in rows {
        csv_writer.write_record([
            row.unit_id.to_string(),
            row.kind_label.to_string(),
            row.name.clone(),
            row.province_code.clone(),
            row.state_label.to_string(),
            row.assessment_id
                .as_ref()
                .map(|id| id.0.clone())
                .unwrap_or_default(),
            row.fiscal_year
                .map(|year| year.to_string())
                .unwrap_or_default(),
            row.passed_count.to_string(),
            row.total_categories.to_string(),
            format!("{:.2}", row.percentage),
            row.passed_all.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn optional_pct(value: Option<f64>) -> String {
    value.map(|value| format!("{value:.2}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::domain::CategoryId;
    use crate::scoring::report::views::{AreaCategoryView, AreaLevel};

    fn row(name: &str, pass_percentage: Option<f64>) -> AreaReportRow {
        AreaReportRow {
            level: AreaLevel::Province,
            level_label: AreaLevel::Province.label(),
            code: Some("10".to_string()),
            name: name.to_string(),
            total_units: 4,
            units_assessed: 3,
            not_assessed: 1,
            units_passed_all: 1,
            assessed_percentage: Some(75.0),
            passed_all_percentage: Some(25.0),
            categories: vec![AreaCategoryView {
                category_id: CategoryId("cat-01".to_string()),
                code: "C01".to_string(),
                name_th: String::new(),
                name_en: "Governance".to_string(),
                passed_units: 2,
                total_units: 4,
                pass_percentage,
            }],
        }
    }

    #[test]
    fn area_csv_has_category_columns_and_blank_for_no_data() {
        let mut buffer = Vec::new();
        write_area_csv(&mut buffer, &[row("Bangkok", Some(50.0)), row("Empty", None)])
            .expect("csv written");
        let output = String::from_utf8(buffer).expect("utf8");
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(
            lines[0],
            "level,code,name,total_units,units_assessed,not_assessed,units_passed_all,assessed_pct,passed_all_pct,C01_pct"
        );
        assert_eq!(lines[1], "Province,10,Bangkok,4,3,1,1,75.00,25.00,50.00");
        assert!(lines[2].ends_with(",25.00,"));
    }
}
