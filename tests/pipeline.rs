use std::fs;
use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use itn_tools::ItnError;
use itn_tools::filter::LocationFilter;
use itn_tools::model::{CellValue, ColumnScheme, LocationField};
use itn_tools::pipeline::{self, InputOptions};
use itn_tools::tabulate::{CHIEFDOM_SHEET, DISTRICT_SHEET, EXTRACTED_SHEET, OVERALL_SHEET};
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

const HEADER: [&str; 8] = [
    "Scan QR code",
    "GPS Location",
    "Number of enrollments in class 1",
    "Number of boys in class 1",
    "Number of girls in class 1",
    "Number of enrollments in class 2",
    "Number of boys in class 2",
    "Number of girls in class 2",
];

fn write_input_workbook(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Distribution").expect("sheet named");
    for (col, header) in HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).expect("header written");
    }

    let rows: [(&str, [f64; 6]); 4] = [
        (
            "District: Bo\nChiefdom: Kakua\nPHU name: Bo Govt Hospital\nCommunity name: Nyandeyama\nName of school: Bo Model School",
            [60.0, 28.0, 30.0, 40.0, 20.0, 18.0],
        ),
        (
            "District: Bo\nChiefdom: Tikonko\nName of school: Tikonko RC",
            [30.0, 15.0, 14.0, 0.0, 0.0, 0.0],
        ),
        (
            "District: Bombali\nChiefdom: Kakua\nName of school: Makeni Primary",
            [50.0, 25.0, 25.0, 10.0, 4.0, 5.0],
        ),
        ("", [20.0, 10.0, 10.0, 0.0, 0.0, 0.0]),
    ];
    for (idx, (payload, counts)) in rows.iter().enumerate() {
        let row = (idx + 1) as u32;
        if !payload.is_empty() {
            sheet.write_string(row, 0, *payload).expect("payload written");
        }
        sheet.write_string(row, 1, "7.96,-11.74").expect("gps written");
        for (offset, value) in counts.iter().enumerate() {
            sheet
                .write_number(row, (offset + 2) as u16, *value)
                .expect("count written");
        }
    }
    workbook.save(path).expect("input workbook saved");
}

#[test]
fn excel_input_is_extracted_and_summarised() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = temp_dir.path().join("input.xlsx");
    write_input_workbook(&input);

    let analysis = pipeline::analyse(&input, &InputOptions::default(), &LocationFilter::new())
        .expect("analysis");

    assert_eq!(analysis.records.len(), 4);
    assert!(analysis.extraction_issues.is_empty());
    let first = &analysis.records[0].location;
    assert_eq!(first.district.as_deref(), Some("Bo"));
    assert_eq!(first.phu_name.as_deref(), Some("Bo Govt Hospital"));
    assert_eq!(first.school_name.as_deref(), Some("Bo Model School"));
    assert_eq!(analysis.records[1].location.phu_name, None);
    assert_eq!(analysis.records[3].location.district, None);
    assert_eq!(
        analysis.records[0].cell("GPS Location"),
        Some(&CellValue::Text("7.96,-11.74".into()))
    );

    let summaries = &analysis.summaries;
    assert_eq!(summaries.overall.schools, 4);
    assert_eq!(summaries.overall.districts, 2);
    assert_eq!(summaries.overall.chiefdoms, 2);
    assert_eq!(summaries.overall.totals.enrollment, 210);
    assert_eq!(summaries.overall.totals.itn, 204);

    let bo = summaries.district("Bo").expect("Bo summarised");
    assert_eq!(bo.schools, 2);
    assert_eq!(bo.chiefdoms, 2);
    assert_eq!(bo.totals.enrollment, 130);
    assert_eq!(bo.totals.boys, 63);
    assert_eq!(bo.totals.girls, 62);

    let district_total: i64 = summaries
        .districts
        .iter()
        .map(|row| row.totals.enrollment)
        .sum();
    assert_eq!(district_total + 20, summaries.overall.totals.enrollment);

    assert_eq!(summaries.chiefdoms.len(), 3);
    let bombali_kakua = summaries.chiefdom("Bombali", "Kakua").expect("Bombali/Kakua");
    assert_eq!(bombali_kakua.schools, 1);
    assert_eq!(bombali_kakua.totals.itn, 59);
}

#[test]
fn filter_narrows_summaries() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = temp_dir.path().join("input.xlsx");
    write_input_workbook(&input);

    let filter = LocationFilter::new()
        .select(LocationField::District, "Bo")
        .select(LocationField::Chiefdom, "Kakua");
    let analysis = pipeline::analyse(&input, &InputOptions::default(), &filter).expect("analysis");

    assert_eq!(analysis.records.len(), 1);
    assert_eq!(analysis.summaries.overall.schools, 1);
    assert_eq!(analysis.summaries.overall.totals.enrollment, 100);
    assert_eq!(analysis.summaries.chiefdoms.len(), 1);
}

#[test]
fn level_options_follow_the_hierarchy_path() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = temp_dir.path().join("input.xlsx");
    write_input_workbook(&input);
    let options = InputOptions::default();

    let districts =
        pipeline::level_options(&input, &options, LocationField::District, &LocationFilter::new())
            .expect("district options");
    assert_eq!(districts, ["Bo", "Bombali"]);

    let in_bo = LocationFilter::new()
        .select(LocationField::District, "Bo")
        .select(LocationField::SchoolName, "Makeni Primary");
    let chiefdoms = pipeline::level_options(&input, &options, LocationField::Chiefdom, &in_bo)
        .expect("chiefdom options");
    assert_eq!(chiefdoms, ["Kakua", "Tikonko"]);

    let in_bombali_kakua = LocationFilter::new()
        .select(LocationField::District, "Bombali")
        .select(LocationField::Chiefdom, "Kakua");
    let schools =
        pipeline::level_options(&input, &options, LocationField::SchoolName, &in_bombali_kakua)
            .expect("school options");
    assert_eq!(schools, ["Makeni Primary"]);

    let phus = pipeline::level_options(&input, &options, LocationField::PhuName, &in_bombali_kakua)
        .expect("phu options");
    assert!(phus.is_empty());
}

#[test]
fn csv_input_tolerates_messy_cells() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = temp_dir.path().join("input.csv");
    fs::write(
        &input,
        "QR,Number of enrollments in class 1,Number of boys in class 1,Number of girls in class 1\n\
         \"District: Kenema\nChiefdom: Nongowa\",40,n/a,22\n\
         \"District: Kenema\",,10,\n",
    )
    .expect("csv written");

    let options = InputOptions {
        sheet: None,
        scheme: ColumnScheme::with_scan_column("QR"),
    };
    let analysis = pipeline::analyse(&input, &options, &LocationFilter::new()).expect("analysis");

    let kenema = analysis.summaries.district("Kenema").expect("Kenema summarised");
    assert_eq!(kenema.schools, 2);
    assert_eq!(kenema.chiefdoms, 1);
    assert_eq!(kenema.totals.enrollment, 40);
    assert_eq!(kenema.totals.boys, 10);
    assert_eq!(kenema.totals.girls, 22);
    assert_eq!(kenema.totals.itn, 32);
    assert!((kenema.totals.coverage_pct - 80.0).abs() < 1e-9);
    assert!(!analysis.summaries.issues.is_empty());
}

#[test]
fn missing_payload_column_is_reported() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = temp_dir.path().join("input.csv");
    fs::write(&input, "District,Chiefdom\nBo,Kakua\n").expect("csv written");

    let error = pipeline::analyse(&input, &InputOptions::default(), &LocationFilter::new())
        .expect_err("payload column required");
    assert!(matches!(error, ItnError::MissingColumn { .. }));
}

#[test]
fn unknown_worksheet_lists_available_sheets() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = temp_dir.path().join("input.xlsx");
    write_input_workbook(&input);
    let options = InputOptions {
        sheet: Some("Schools".into()),
        scheme: ColumnScheme::default(),
    };

    let error = pipeline::load_records(&input, &options).expect_err("sheet must exist");
    assert!(matches!(
        error,
        ItnError::InvalidWorkbook(ref message)
            if message.contains("'Schools'") && message.contains("Distribution")
    ));

    let named = InputOptions {
        sheet: Some("Distribution".into()),
        scheme: ColumnScheme::default(),
    };
    let extraction = pipeline::load_records(&input, &named).expect("named sheet read");
    assert_eq!(extraction.records.len(), 4);
}

#[test]
fn missing_input_file_is_reported() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = temp_dir.path().join("absent.xlsx");
    let error = pipeline::load_records(&input, &InputOptions::default())
        .expect_err("input must exist");
    assert!(matches!(error, ItnError::MissingInput(_)));
}

#[test]
fn extract_writes_location_columns_first() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = temp_dir.path().join("input.xlsx");
    write_input_workbook(&input);
    let output = temp_dir.path().join("extracted.csv");

    let extraction = pipeline::extract_to_file(&input, &output, &InputOptions::default())
        .expect("extraction written");
    assert_eq!(extraction.records.len(), 4);

    let mut reader = csv::Reader::from_path(&output).expect("csv opened");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(&headers[0], "District");
    assert_eq!(&headers[4], "School Name");
    assert_eq!(&headers[5], "GPS Location");
    assert!(headers.iter().all(|header| header != "Scan QR code"));

    let rows: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .expect("rows read");
    assert_eq!(rows.len(), 4);
    assert_eq!(&rows[1][1], "Tikonko");
    assert_eq!(&rows[3][0], "");
    assert_eq!(&rows[0][6], "60");
}

#[test]
fn report_workbook_and_json_are_written() {
    let temp_dir = tempdir().expect("temporary directory");
    let input = temp_dir.path().join("input.xlsx");
    write_input_workbook(&input);
    let analysis = pipeline::analyse(&input, &InputOptions::default(), &LocationFilter::new())
        .expect("analysis");

    let report = temp_dir.path().join("report.xlsx");
    pipeline::write_report_workbook(&report, &analysis).expect("report written");
    let mut workbook: Xlsx<_> = open_workbook(&report).expect("report opened");
    assert_eq!(
        workbook.sheet_names(),
        vec![EXTRACTED_SHEET, OVERALL_SHEET, DISTRICT_SHEET, CHIEFDOM_SHEET]
    );
    let districts = workbook
        .worksheet_range(DISTRICT_SHEET)
        .expect("district sheet")
        .expect("district range");
    assert_eq!(districts.get_value((1, 0)), Some(&DataType::String("Bo".into())));
    assert_eq!(districts.get_value((1, 3)), Some(&DataType::Float(130.0)));

    let json_path = temp_dir.path().join("summary.json");
    pipeline::write_summary_json(&json_path, &analysis.summaries).expect("json written");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_path).expect("json read"))
            .expect("json parsed");
    assert_eq!(json["overall"]["schools"], 4);
    assert_eq!(json["districts"][0]["district"], "Bo");
    assert_eq!(json["chiefdoms"][2]["chiefdom"], "Kakua");
    assert_eq!(json["chiefdoms"][2]["district"], "Bombali");
}
