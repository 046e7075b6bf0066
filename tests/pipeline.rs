//! Pipeline Integration Tests
//!
//! Runs the full pipeline over temporary input directories and reads the
//! outputs back. Verifies ingest → decode → match → sanitize → export.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use coinbase_pool_tagger::export::{EXPORT_HEADERS, SHEET_NAME};
use coinbase_pool_tagger::ingest::IngestWarning;
use coinbase_pool_tagger::sanitize::MAX_CELL_CHARS;
use coinbase_pool_tagger::{run, PipelineConfig, PipelineError, SanitizeMode};

const HEADER: &str = "Input script,TX hash,Timestamp,Date\n";

const TAGS: &str = r#"{
    "coinbase_tags": {
        "Pool Tag": { "name": "Tag Pool", "link": "https://tagpool.example" },
        "/ViaBTC/": { "name": "ViaBTC", "link": "https://viabtc.com" },
        "Mined by AntPool": { "name": "AntPool", "link": "https://www.antpool.com" }
    }
}"#;

/// Temporary workspace laid out like a real run
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new(tags: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("input")).unwrap();
        fs::write(dir.path().join("tags.json"), tags).unwrap();
        Self { dir }
    }

    fn add_input(&self, name: &str, contents: &str) {
        fs::write(self.dir.path().join("input").join(name), contents).unwrap();
    }

    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            input_dir: self.dir.path().join("input"),
            tags_path: self.dir.path().join("tags.json"),
            output_dir: self.dir.path().join("Export"),
            ..Default::default()
        }
    }
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

fn read_xlsx_rows(path: &Path) -> Vec<Vec<String>> {
    use calamine::{open_workbook, Reader, Xlsx};

    let mut workbook: Xlsx<_> = open_workbook(path).unwrap();
    let range = workbook.worksheet_range(SHEET_NAME).unwrap();
    range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect()
}

fn hex(text: &str) -> String {
    hex::encode(text.as_bytes())
}

// ==================== End-to-end tests ====================

#[test]
fn test_two_files_without_matches() {
    let fixture = Fixture::new(TAGS);
    fixture.add_input("a.csv", &format!("{}68656c6c6f,abc123,2023-10-01,2023-10-01\n", HEADER));
    fixture.add_input("b.csv", &format!("{}74657374,def456,2023-10-02,2023-10-02\n", HEADER));
    let config = fixture.config();

    let summary = run(&config).unwrap();

    assert_eq!(summary.records, 2);
    assert_eq!(summary.files_read, 2);
    assert_eq!(summary.matched, 0);
    assert_eq!(summary.export.rows, 2);
    assert!(!summary.export.any_failed());

    let rows = read_rows(&config.csv_path());
    assert_eq!(
        rows,
        vec![
            EXPORT_HEADERS.iter().map(|h| h.to_string()).collect::<Vec<_>>(),
            vec!["", "", "abc123", "2023-10-01", "2023-10-01"]
                .into_iter()
                .map(String::from)
                .collect(),
            vec!["", "", "def456", "2023-10-02", "2023-10-02"]
                .into_iter()
                .map(String::from)
                .collect(),
        ]
    );
    assert!(config.xlsx_path().exists());
}

#[test]
fn test_matches_pools_in_dictionary_order() {
    let fixture = Fixture::new(TAGS);
    // Height push, then miner text containing two known tags
    let script = format!("03a08601{}", hex("/ViaBTC/Mined by AntPool/"));
    fixture.add_input(
        "2020.csv",
        &format!(
            "{}{},h1,t1,d1\n{},h2,t2,d2\n{},h3,t3,d3\n",
            HEADER,
            script,
            hex("xx Pool Tag xx"),
            hex("nothing here")
        ),
    );
    let config = fixture.config();

    let summary = run(&config).unwrap();

    assert_eq!(summary.matched, 2);
    assert_eq!(
        summary.pool_counts,
        vec![("Tag Pool".to_string(), 1), ("ViaBTC".to_string(), 1)]
    );

    let rows = read_rows(&config.csv_path());
    assert_eq!(rows[1][..2], ["ViaBTC".to_string(), "https://viabtc.com".to_string()]);
    assert_eq!(rows[2][..2], ["Tag Pool".to_string(), "https://tagpool.example".to_string()]);
    assert_eq!(rows[3][..2], [String::new(), String::new()]);
}

#[test]
fn test_file_missing_tx_hash_contributes_no_rows() {
    let fixture = Fixture::new(TAGS);
    fixture.add_input("good.csv", &format!("{}68656c6c6f,abc123,t,d\n", HEADER));
    fixture.add_input("missing.csv", "Input script,Timestamp,Date\n68656c6c6f,t,d\n74657374,t,d\n");

    let summary = run(&fixture.config()).unwrap();

    assert_eq!(summary.records, 1);
    assert_eq!(summary.files_skipped, 1);
    assert_eq!(
        summary.warnings,
        vec![IngestWarning::MissingColumn {
            file: "missing.csv".to_string(),
            column: "TX hash".to_string(),
        }]
    );
}

#[test]
fn test_malformed_hex_does_not_stop_the_batch() {
    let fixture = Fixture::new(TAGS);
    fixture.add_input(
        "mixed.csv",
        &format!("{}abc,odd,t,d\nzz,bad,t,d\n,empty,t,d\n{},ok,t,d\n", HEADER, hex("/ViaBTC/")),
    );
    let config = fixture.config();

    let summary = run(&config).unwrap();

    assert_eq!(summary.records, 4);
    assert_eq!(summary.decode_failures, 2);
    assert_eq!(summary.matched, 1);

    let hashes: Vec<String> = read_rows(&config.csv_path())
        .into_iter()
        .skip(1)
        .map(|row| row[2].clone())
        .collect();
    assert_eq!(hashes, vec!["odd", "bad", "empty", "ok"]);
}

#[test]
fn test_spreadsheet_and_csv_outputs_agree() {
    let fixture = Fixture::new(TAGS);
    fixture.add_input(
        "2019.csv",
        &format!(
            "{}{},h1,t1,d1\n{},h2,t2,d2\nzz,h3,t3,d3\n",
            HEADER,
            hex("/ViaBTC/"),
            hex("unknown miner")
        ),
    );
    fixture.add_input("2020.csv", &format!("{}{},h4,t4,d4\n", HEADER, hex("Mined by AntPool")));
    let config = fixture.config();

    let summary = run(&config).unwrap();
    assert!(!summary.export.any_failed());

    let xlsx_rows = read_xlsx_rows(&config.xlsx_path());
    let csv_rows = read_rows(&config.csv_path());
    assert_eq!(xlsx_rows.len(), 5);
    assert_eq!(xlsx_rows, csv_rows);
}

#[test]
fn test_overlong_field_truncated_in_both_outputs() {
    let fixture = Fixture::new(TAGS);
    let long_hash = "z".repeat(40_000);
    fixture.add_input("long.csv", &format!("{}00,{},t,d\n", HEADER, long_hash));
    let config = fixture.config();

    let summary = run(&config).unwrap();
    assert!(summary.export.xlsx.is_ok());
    assert!(summary.export.csv.is_ok());

    let xlsx_rows = read_xlsx_rows(&config.xlsx_path());
    let csv_rows = read_rows(&config.csv_path());
    assert_eq!(csv_rows[1][2], "z".repeat(MAX_CELL_CHARS));
    assert_eq!(xlsx_rows, csv_rows);
}

#[test]
fn test_control_characters_sanitized_in_output() {
    let fixture = Fixture::new(TAGS);
    fixture.add_input("ctl.csv", &format!("{}00,h\u{1}1,t\u{7},d\n", HEADER));
    let config = fixture.config();

    run(&config).unwrap();

    let rows = read_rows(&config.csv_path());
    assert_eq!(rows[1], vec!["", "", "h1", "t", "d"]);
}

#[test]
fn test_ascii_only_mode() {
    let fixture = Fixture::new(
        r#"{"coinbase_tags": {"/七彩/": {"name": "七彩神仙鱼", "link": "https://7pool.example"}}}"#,
    );
    fixture.add_input("u.csv", &format!("{}{},h,t,d\n", HEADER, hex("/七彩/")));
    let mut config = fixture.config();
    config.sanitize_mode = SanitizeMode::PrintableAscii;

    let summary = run(&config).unwrap();

    assert_eq!(summary.matched, 1);
    let rows = read_rows(&config.csv_path());
    assert_eq!(rows[1][0], "");
    assert_eq!(rows[1][1], "https://7pool.example");
}

#[test]
fn test_record_limit() {
    let fixture = Fixture::new(TAGS);
    fixture.add_input("a.csv", &format!("{}00,h1,t,d\n00,h2,t,d\n00,h3,t,d\n", HEADER));
    let mut config = fixture.config();
    config.max_records = Some(2);

    let summary = run(&config).unwrap();

    assert_eq!(summary.records, 2);
    assert_eq!(read_rows(&config.csv_path()).len(), 3);
}

#[test]
fn test_output_directory_created() {
    let fixture = Fixture::new(TAGS);
    let mut config = fixture.config();
    config.output_dir = fixture.dir.path().join("deep").join("Export");

    let summary = run(&config).unwrap();

    assert_eq!(summary.records, 0);
    assert!(config.output_dir.is_dir());
    assert_eq!(read_rows(&config.csv_path()).len(), 1);
}

// ==================== Fatal errors ====================

#[test]
fn test_missing_tag_file_aborts() {
    let fixture = Fixture::new(TAGS);
    let mut config = fixture.config();
    config.tags_path = fixture.dir.path().join("missing.json");

    let result = run(&config);

    assert!(matches!(result, Err(PipelineError::Config(_))));
    assert!(!config.csv_path().exists());
}

#[test]
fn test_tag_file_without_key_aborts() {
    let fixture = Fixture::new(r#"{"pools": {}}"#);
    assert!(matches!(run(&fixture.config()), Err(PipelineError::Config(_))));
}

#[test]
fn test_missing_input_directory_aborts() {
    let fixture = Fixture::new(TAGS);
    let mut config = fixture.config();
    config.input_dir = fixture.dir.path().join("nope");

    assert!(matches!(run(&config), Err(PipelineError::Ingest(_))));
}
