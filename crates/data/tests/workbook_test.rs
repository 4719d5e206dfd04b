use fx_options_core::Instrument;
use fx_options_data::{
    Cell, FormatNormalizer, OptionsPipeline, PositionsProcessor, RegionLocator, Worksheet,
};
use rust_decimal::Decimal;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

enum Value<'a> {
    Text(&'a str),
    Number(f64),
}

/// `(cell reference, value)` pairs of one worksheet, in row-major order.
type SheetCells<'a> = Vec<(String, Value<'a>)>;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

fn column_letters(mut col: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + u8::try_from(col % 26).unwrap());
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap()
}

/// `A1`-style reference for a 1-based row and 0-based column.
fn cell_ref(row: usize, col: usize) -> String {
    format!("{}{row}", column_letters(col))
}

fn sheet_xml(cells: &SheetCells<'_>) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    let mut open_row: Option<String> = None;
    for (reference, value) in cells {
        let row: String = reference.chars().filter(char::is_ascii_digit).collect();
        if open_row.as_deref() != Some(row.as_str()) {
            if open_row.is_some() {
                xml.push_str("</row>");
            }
            xml.push_str(&format!(r#"<row r="{row}">"#));
            open_row = Some(row);
        }
        match value {
            Value::Text(text) => xml.push_str(&format!(
                r#"<c r="{reference}" t="inlineStr"><is><t>{text}</t></is></c>"#
            )),
            Value::Number(number) => {
                xml.push_str(&format!(r#"<c r="{reference}"><v>{number}</v></c>"#));
            }
        }
    }
    if open_row.is_some() {
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData></worksheet>");
    xml
}

fn write_xlsx(path: &Path, sheets: &[(&str, SheetCells<'_>)]) {
    let mut workbook = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>"#,
    );
    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for (i, (name, _)) in sheets.iter().enumerate() {
        let n = i + 1;
        workbook.push_str(&format!(
            r#"<sheet name="{name}" sheetId="{n}" r:id="rId{n}"/>"#
        ));
        rels.push_str(&format!(
            r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
        ));
    }
    workbook.push_str("</sheets></workbook>");
    rels.push_str("</Relationships>");

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    let mut add = |name: &str, content: &str| {
        writer.start_file(name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    };
    add("[Content_Types].xml", CONTENT_TYPES);
    add("_rels/.rels", ROOT_RELS);
    add("xl/workbook.xml", &workbook);
    add("xl/_rels/workbook.xml.rels", &rels);
    for (i, (_, cells)) in sheets.iter().enumerate() {
        add(&format!("xl/worksheets/sheet{}.xml", i + 1), &sheet_xml(cells));
    }

    let bytes = writer.finish().unwrap().into_inner();
    std::fs::write(path, bytes).unwrap();
}

/// Exchange-style report whose first used cell is `B2`: titles in column B, the
/// strike table in the report's A/I/J columns starting at row 4.
fn eur_report() -> SheetCells<'static> {
    let mut cells = vec![
        (cell_ref(2, 1), Value::Text("Euro FX Options")),
        (cell_ref(3, 1), Value::Text("OPTION TYPE: Monthly Options")),
        (cell_ref(4, 1), Value::Text("CALLS")),
    ];
    let mut table_row = |row: usize, strike: Value<'static>, at_close: f64, change: f64| {
        cells.push((cell_ref(row, 0), strike));
        cells.push((cell_ref(row, 8), Value::Number(at_close)));
        cells.push((cell_ref(row, 9), Value::Number(change)));
    };
    table_row(6, Value::Number(10800.0), 10.0, 2.0);
    table_row(7, Value::Number(10850.0), 5.0, -1.0);
    table_row(8, Value::Text("TOTALS"), 15.0, 1.0);
    table_row(9, Value::Text("Strike"), 0.0, 0.0);
    table_row(10, Value::Number(10900.0), 8.0, 3.0);
    table_row(11, Value::Text("TOTALS"), 8.0, 3.0);
    cells
}

#[test]
fn test_workbook_cells_keep_sheet_coordinates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("EUR.xlsx");
    write_xlsx(
        &path,
        &[(
            "Report",
            vec![
                (cell_ref(3, 1), Value::Text("CALLS")),
                (cell_ref(4, 2), Value::Number(12.5)),
            ],
        )],
    );

    let sheets = Worksheet::open_all(&path).unwrap();

    assert_eq!(sheets.len(), 1);
    let sheet = &sheets[0];
    assert_eq!(sheet.name(), "Report");
    assert_eq!(sheet.row_count(), 4);
    assert_eq!(sheet.cell(1, 0), &Cell::Empty);
    assert_eq!(sheet.cell(3, 0), &Cell::Empty);
    assert_eq!(sheet.cell(3, 1).text(), Some("CALLS"));
    assert_eq!(sheet.cell(4, 2), &Cell::Number(12.5));
}

#[test]
fn test_convert_writes_grid_and_removes_workbook() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("EUR.xlsx");
    let target = dir.path().join("EUR.csv");
    write_xlsx(&source, &[("Report", eur_report())]);
    std::fs::write(&target, "sheet from an earlier run\n").unwrap();

    FormatNormalizer::convert(&source, &target).unwrap();

    assert!(!source.exists());
    let sheet = Worksheet::read_csv(&target).unwrap();
    assert_eq!(sheet.cell(3, 1).text(), Some("OPTION TYPE: Monthly Options"));
    assert_eq!(sheet.cell(6, 0), &Cell::Number(10800.0));
    assert_eq!(sheet.cell(7, 9), &Cell::Number(-1.0));

    let ranges = RegionLocator::locate(&sheet, Instrument::Eur.header_label()).unwrap();
    assert_eq!((ranges.calls.start_row, ranges.calls.stop_row), (6, 7));
    assert_eq!((ranges.puts.start_row, ranges.puts.stop_row), (10, 10));
}

#[test]
fn test_normalized_workbook_feeds_the_pipeline() {
    let root = TempDir::new().unwrap();
    let legacy = root.path().join("old version");
    let normalized = root.path().join("new version");
    let output = root.path().join("output");
    std::fs::create_dir_all(&legacy).unwrap();
    write_xlsx(&legacy.join("EUR.xlsx"), &[("Report", eur_report())]);

    let report = FormatNormalizer::normalize_dir(&legacy, &normalized).unwrap();
    assert_eq!(report.converted, vec![normalized.join("EUR.csv")]);

    let date = chrono::NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
    let (path, skipped) = OptionsPipeline::new(&normalized, &output)
        .process_instrument(Instrument::Eur, Decimal::from(10850), date)
        .unwrap();

    assert_eq!(skipped, 0);
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(doc["fob"]["opt_in_money_call_i"], 10);
    assert_eq!(doc["fob"]["opt_in_money_put_i"], 8);
}

#[test]
fn test_positions_workbook_is_summarized_and_removed() {
    let work = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let workbook = work.path().join("FinFut25.xlsx");

    let position_row = |row: usize, market: &'static str, date: f64, long: f64, short: f64| {
        vec![
            (cell_ref(row, 0), Value::Text(market)),
            (cell_ref(row, 1), Value::Number(date)),
            (cell_ref(row, 8), Value::Number(long)),
            (cell_ref(row, 9), Value::Number(short)),
        ]
    };
    let mut cells = vec![
        (cell_ref(1, 0), Value::Text("Market_and_Exchange_Names")),
        (cell_ref(1, 1), Value::Text("As_of_Date_In_Form_YYMMDD")),
        (cell_ref(1, 8), Value::Text("Long")),
        (cell_ref(1, 9), Value::Text("Short")),
    ];
    cells.extend(position_row(
        2,
        "EURO FX - CHICAGO MERCANTILE EXCHANGE",
        250_107.0,
        123_456.0,
        98_765.0,
    ));
    cells.extend(position_row(
        3,
        "BITCOIN - CHICAGO MERCANTILE EXCHANGE",
        250_107.0,
        1.0,
        2.0,
    ));
    cells.extend(position_row(
        4,
        "JAPANESE YEN - CHICAGO MERCANTILE EXCHANGE",
        241_231.0,
        4_500.0,
        700.0,
    ));
    write_xlsx(&workbook, &[("XLS", cells)]);

    let written = PositionsProcessor::process(work.path(), output.path()).unwrap();

    assert_eq!(written, output.path().join("FinFut.json"));
    assert!(!workbook.exists());
    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&written).unwrap()).unwrap();
    assert_eq!(
        doc,
        serde_json::json!([
            {"currency": "EUR", "date": "2025.01.07", "long": 123456, "short": 98765},
            {"currency": "JPY", "date": "2024.12.31", "long": 4500, "short": 700},
        ])
    );
}
