//! Conversion of enriched rows and summaries into plain tables that the
//! Excel and CSV writers can materialise.

use std::collections::HashSet;
use std::fmt::{self, Write};

use num_format::{Locale, ToFormattedString};

use crate::distribution::aggregate::{MetricTotals, Summaries};
use crate::distribution::model::{CellValue, EnrichedRecord, LocationField};

pub const EXTRACTED_SHEET: &str = "Extracted Data";
pub const OVERALL_SHEET: &str = "Overall Summary";
pub const DISTRICT_SHEET: &str = "District Summary";
pub const CHIEFDOM_SHEET: &str = "Chiefdom Summary";

const METRIC_HEADERS: [&str; 7] = [
    "Enrollment",
    "Boys",
    "Girls",
    "ITNs Distributed",
    "ITNs Remaining",
    "Coverage (%)",
    "Gender Ratio (girls per 100 boys)",
];

/// A single output cell. Numbers stay numeric so spreadsheets can sum them.
#[derive(Debug, Clone, PartialEq)]
pub enum TableCell {
    Text(String),
    Number(f64),
    Blank,
}

impl From<&CellValue> for TableCell {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Number(number) => TableCell::Number(*number),
            CellValue::Empty => TableCell::Blank,
            other => TableCell::Text(other.to_string()),
        }
    }
}

impl From<Option<&str>> for TableCell {
    fn from(value: Option<&str>) -> Self {
        value.map_or(TableCell::Blank, |text| TableCell::Text(text.to_string()))
    }
}

impl fmt::Display for TableCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableCell::Text(text) => f.write_str(text),
            TableCell::Number(number) => write!(f, "{number}"),
            TableCell::Blank => Ok(()),
        }
    }
}

/// A table that will be materialised as an Excel sheet or a CSV file.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<TableCell>>,
}

/// Represents all tables required to materialise the report workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

/// Lays out enriched rows: the five location columns first, then every other
/// column in the order it was first seen.
pub fn records_table(records: &[EnrichedRecord]) -> SheetTable {
    let mut seen = HashSet::new();
    let mut extra_columns: Vec<String> = Vec::new();
    for record in records {
        for (name, _) in &record.cells {
            if seen.insert(name.as_str()) {
                extra_columns.push(name.clone());
            }
        }
    }

    let mut columns: Vec<String> = LocationField::ALL
        .iter()
        .map(|field| field.header().to_string())
        .collect();
    columns.extend(extra_columns.iter().cloned());

    let rows = records
        .iter()
        .map(|record| {
            let mut cells: Vec<TableCell> = LocationField::ALL
                .iter()
                .map(|field| TableCell::from(record.location.get(*field)))
                .collect();
            cells.extend(
                extra_columns
                    .iter()
                    .map(|name| record.cell(name).map_or(TableCell::Blank, TableCell::from)),
            );
            cells
        })
        .collect();

    SheetTable {
        sheet_name: EXTRACTED_SHEET.to_string(),
        columns,
        rows,
    }
}

pub fn overall_table(summaries: &Summaries) -> SheetTable {
    let overall = &summaries.overall;
    let mut columns = headers(&["Schools", "Districts", "Chiefdoms"]);
    columns.extend(headers(&METRIC_HEADERS));
    let mut row = vec![
        count(overall.schools),
        count(overall.districts),
        count(overall.chiefdoms),
    ];
    row.extend(metric_cells(&overall.totals));
    SheetTable {
        sheet_name: OVERALL_SHEET.to_string(),
        columns,
        rows: vec![row],
    }
}

pub fn district_table(summaries: &Summaries) -> SheetTable {
    let mut columns = headers(&["District", "Schools", "Chiefdoms"]);
    columns.extend(headers(&METRIC_HEADERS));
    let rows = summaries
        .districts
        .iter()
        .map(|district| {
            let mut row = vec![
                TableCell::Text(district.district.clone()),
                count(district.schools),
                count(district.chiefdoms),
            ];
            row.extend(metric_cells(&district.totals));
            row
        })
        .collect();
    SheetTable {
        sheet_name: DISTRICT_SHEET.to_string(),
        columns,
        rows,
    }
}

pub fn chiefdom_table(summaries: &Summaries) -> SheetTable {
    let mut columns = headers(&["District", "Chiefdom", "Schools"]);
    columns.extend(headers(&METRIC_HEADERS));
    let rows = summaries
        .chiefdoms
        .iter()
        .map(|chiefdom| {
            let mut row = vec![
                TableCell::Text(chiefdom.district.clone()),
                TableCell::Text(chiefdom.chiefdom.clone()),
                count(chiefdom.schools),
            ];
            row.extend(metric_cells(&chiefdom.totals));
            row
        })
        .collect();
    SheetTable {
        sheet_name: CHIEFDOM_SHEET.to_string(),
        columns,
        rows,
    }
}

/// Builds the full report: extracted rows followed by the three summary views.
pub fn build_workbook(records: &[EnrichedRecord], summaries: &Summaries) -> WorkbookData {
    WorkbookData {
        tables: vec![
            records_table(records),
            overall_table(summaries),
            district_table(summaries),
            chiefdom_table(summaries),
        ],
    }
}

/// Plain-text overview of the summaries, as printed by the CLI.
pub fn render_overview(summaries: &Summaries) -> String {
    let overall = &summaries.overall;
    let mut out = String::new();
    let _ = writeln!(out, "Overall Summary");
    let _ = writeln!(out, "  Schools:    {}", overall.schools.to_formatted_string(&Locale::en));
    let _ = writeln!(out, "  Districts:  {}", overall.districts);
    let _ = writeln!(out, "  Chiefdoms:  {}", overall.chiefdoms);
    write_totals(&mut out, "  ", &overall.totals);

    if !summaries.districts.is_empty() {
        let _ = writeln!(out, "\nDistricts");
        for district in &summaries.districts {
            let _ = writeln!(
                out,
                "  {} ({} schools, {} chiefdoms)",
                district.district,
                district.schools.to_formatted_string(&Locale::en),
                district.chiefdoms
            );
            write_totals(&mut out, "    ", &district.totals);
        }
    }

    if !summaries.chiefdoms.is_empty() {
        let _ = writeln!(out, "\nChiefdoms");
        for chiefdom in &summaries.chiefdoms {
            let _ = writeln!(
                out,
                "  {} / {} ({} schools)",
                chiefdom.district,
                chiefdom.chiefdom,
                chiefdom.schools.to_formatted_string(&Locale::en)
            );
            write_totals(&mut out, "    ", &chiefdom.totals);
        }
    }
    out
}

fn write_totals(out: &mut String, indent: &str, totals: &MetricTotals) {
    let _ = writeln!(
        out,
        "{indent}Students: {}  ITNs: {}  Remaining: {}  Coverage: {:.1}%",
        totals.enrollment.to_formatted_string(&Locale::en),
        totals.itn.to_formatted_string(&Locale::en),
        totals.itn_remaining.to_formatted_string(&Locale::en),
        totals.coverage_pct
    );
    let _ = writeln!(
        out,
        "{indent}Boys: {}  Girls: {}  Girls per 100 boys: {:.1}",
        totals.boys.to_formatted_string(&Locale::en),
        totals.girls.to_formatted_string(&Locale::en),
        totals.gender_ratio_pct
    );
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn count(value: usize) -> TableCell {
    TableCell::Number(value as f64)
}

fn metric_cells(totals: &MetricTotals) -> Vec<TableCell> {
    vec![
        TableCell::Number(totals.enrollment as f64),
        TableCell::Number(totals.boys as f64),
        TableCell::Number(totals.girls as f64),
        TableCell::Number(totals.itn as f64),
        TableCell::Number(totals.itn_remaining as f64),
        TableCell::Number(round2(totals.coverage_pct)),
        TableCell::Number(round2(totals.gender_ratio_pct)),
    ]
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::aggregate::summarize;
    use crate::distribution::model::ExtractedLocation;

    fn record(district: Option<&str>, cells: Vec<(&str, CellValue)>) -> EnrichedRecord {
        EnrichedRecord {
            location: ExtractedLocation {
                district: district.map(str::to_string),
                ..ExtractedLocation::default()
            },
            cells: cells
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    #[test]
    fn records_table_puts_location_first_and_unions_columns() {
        let records = vec![
            record(Some("Bo"), vec![("GPS Location", CellValue::Text("7.9,-11.7".into()))]),
            record(None, vec![("Number of boys in class 1", CellValue::Number(3.0))]),
        ];
        let table = records_table(&records);
        assert_eq!(
            table.columns,
            [
                "District",
                "Chiefdom",
                "PHU Name",
                "Community Name",
                "School Name",
                "GPS Location",
                "Number of boys in class 1"
            ]
        );
        assert_eq!(table.rows[0][0], TableCell::Text("Bo".into()));
        assert_eq!(table.rows[0][6], TableCell::Blank);
        assert_eq!(table.rows[1][0], TableCell::Blank);
        assert_eq!(table.rows[1][6], TableCell::Number(3.0));
    }

    #[test]
    fn summary_tables_match_summaries() {
        let records = vec![
            record(Some("Bo"), vec![
                ("Number of enrollments in class 1", CellValue::Number(3.0)),
                ("Number of boys in class 1", CellValue::Number(1.0)),
                ("Number of girls in class 1", CellValue::Number(1.0)),
            ]),
        ];
        let summaries = summarize(&records);
        let workbook = build_workbook(&records, &summaries);
        let names: Vec<&str> = workbook
            .tables
            .iter()
            .map(|table| table.sheet_name.as_str())
            .collect();
        assert_eq!(names, [EXTRACTED_SHEET, OVERALL_SHEET, DISTRICT_SHEET, CHIEFDOM_SHEET]);

        let district = &workbook.tables[2];
        assert_eq!(district.rows.len(), 1);
        assert_eq!(district.rows[0][0], TableCell::Text("Bo".into()));
        assert_eq!(district.rows[0][6], TableCell::Number(2.0));
        assert_eq!(district.rows[0][8], TableCell::Number(66.67));
        assert!(workbook.tables[3].rows.is_empty());
    }

    #[test]
    fn overview_formats_counts_with_separators() {
        let records = vec![record(Some("Bo"), vec![
            ("Number of enrollments in class 1", CellValue::Number(2500.0)),
            ("Number of boys in class 1", CellValue::Number(1000.0)),
            ("Number of girls in class 1", CellValue::Number(1250.0)),
        ])];
        let text = render_overview(&summarize(&records));
        assert!(text.contains("Students: 2,500  ITNs: 2,250  Remaining: 250  Coverage: 90.0%"));
        assert!(text.contains("Girls per 100 boys: 125.0"));
        assert!(text.contains("Bo (1 schools, 0 chiefdoms)"));
        assert!(!text.contains("Chiefdoms\n"));
    }
}
