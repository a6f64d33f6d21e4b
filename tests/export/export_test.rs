//! End-to-end export tests against the in-memory server.

use std::io::Read;
use std::sync::Arc;

use cubeport::cell::CellValue;
use cubeport::export::{CursorState, ExportCursor, ExportOptions, ProgressPolicy, ValueFilter};
use cubeport::transport::{MemoryServer, ScriptedTransport};
use cubeport::{Area, AreaBuilder, Cube, CubeError, CubeResult};

/// 250 products x 100 stores, every cell filled.
fn large_cube() -> Cube<MemoryServer> {
    let products: Vec<String> = (0..250).map(|i| format!("P{:03}", i)).collect();
    let stores: Vec<String> = (0..100).map(|i| format!("S{:03}", i)).collect();
    let products: Vec<&str> = products.iter().map(String::as_str).collect();
    let stores: Vec<&str> = stores.iter().map(String::as_str).collect();

    let mut server = MemoryServer::new("Retail")
        .dimension("Product", &products)
        .dimension("Store", &stores)
        .cube("Stock", &["Product", "Store"]);
    for p in 0..250u64 {
        for s in 0..100u64 {
            server
                .set_path("Stock", vec![p, s], CellValue::Number((p * 100 + s) as f64))
                .unwrap();
        }
    }
    Cube::open(Arc::new(server), "Retail", "Stock").unwrap()
}

fn small_cube() -> Cube<MemoryServer> {
    let mut server = MemoryServer::new("Demo")
        .dimension("Year", &["2020", "2021"])
        .dimension("Region", &["North", "South", "East"])
        .cube("Sales", &["Year", "Region"]);
    server.set_number("Sales", &["2020", "North"], 1.5).unwrap();
    server.set_number("Sales", &["2020", "East"], -3.0).unwrap();
    server.set_text("Sales", &["2021", "South"], "line one\nline\ttwo").unwrap();
    server.set_number("Sales", &["2021", "East"], 42.0).unwrap();
    Cube::open(Arc::new(server), "Demo", "Sales").unwrap()
}

#[test]
fn test_25k_cells_in_three_pages() {
    let cube = large_cube();
    let area = cube.full_area();
    let options = ExportOptions::default();

    let mut rows = cube.export(&area, &options);
    let mut count = 0usize;
    let mut last = None;
    for row in rows.by_ref() {
        last = Some(row.unwrap());
        count += 1;
    }

    assert_eq!(count, 25_001);
    assert_eq!(last.unwrap(), vec!["P249", "S099", "24999"]);
    assert!(rows.is_complete());
    assert_eq!(rows.cursor().fetches(), 3);
    assert_eq!(rows.cursor().rows(), 25_000);
    assert_eq!(cube.transport().count("/cell/export"), 3);
}

#[test]
fn test_25k_cells_spooled_to_disk() {
    let cube = large_cube();
    let options = ExportOptions::default().with_spool_threshold(64 * 1024);
    let mut file = cube.export_to_spool(&cube.full_area(), &options).unwrap();
    assert!(file.is_rolled());

    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("Product,Store,#VALUE"));
    assert_eq!(lines.next(), Some("P000,S000,0"));
    assert_eq!(text.lines().count(), 25_001);
    assert_eq!(text.matches("#VALUE").count(), 1);
}

#[test]
fn test_resumed_requests_carry_last_path() {
    let cube = large_cube();
    let options = ExportOptions::default();
    let area = cube.full_area();
    cube.export(&area, &options).for_each(|row| {
        row.unwrap();
    });

    let requests = cube.transport().requests();
    let pages: Vec<_> = requests
        .iter()
        .filter(|d| d.path() == "/cell/export")
        .collect();
    assert_eq!(pages[0].get("path"), None);
    assert_eq!(pages[1].get("path"), Some("99,99"));
    assert_eq!(pages[2].get("path"), Some("199,99"));
    assert!(pages.iter().all(|d| d.get("area").is_none()));
}

#[test]
fn test_export_csv_snapshot() {
    let cube = small_cube();
    let options = ExportOptions::default()
        .with_blocksize(2)
        .with_sanitize_values(true);
    let mut file = cube.export_to_spool(&cube.full_area(), &options).unwrap();
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();

    insta::assert_snapshot!(text, @r"
    Year,Region,#VALUE
    2020,North,1.5
    2020,East,-3
    2021,South,line one line two
    2021,East,42
    ");
}

#[test]
fn test_unsanitized_values_are_quoted() {
    let cube = small_cube();
    let area = cube
        .build_area(&AreaBuilder::new().add_elements("Region", &["South"]))
        .unwrap();
    let mut file = cube
        .export_to_spool(&area, &ExportOptions::default())
        .unwrap();
    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    assert_eq!(
        text,
        "Year,Region,#VALUE\n2021,South,\"line one\nline\ttwo\"\n"
    );
}

#[test]
fn test_area_and_filters_reach_the_server() {
    let cube = small_cube();
    let area = cube
        .build_area(&AreaBuilder::new().all_except("Region", &["North"]))
        .unwrap();
    let options = ExportOptions::default().with_value_filter(ValueFilter::Numeric);
    let rows: Vec<Vec<String>> = cube
        .export(&area, &options)
        .collect::<CubeResult<_>>()
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1], vec!["2020", "East", "-3"]);
    assert_eq!(rows[2], vec!["2021", "East", "42"]);

    let requests = cube.transport().requests();
    let request = requests
        .iter()
        .rev()
        .find(|d| d.path() == "/cell/export")
        .unwrap();
    assert_eq!(request.get("area"), Some("*,1:2"));
    assert_eq!(request.get("type"), Some("1"));
    assert_eq!(request.get("skip_empty"), Some("1"));
}

#[test]
fn test_dense_export_includes_empty_cells() {
    let cube = small_cube();
    let area = cube
        .build_area(&AreaBuilder::new().add_elements("Year", &["2020"]))
        .unwrap();
    let options = ExportOptions::default().with_skip_empty(false);
    let rows: Vec<Vec<String>> = cube
        .export(&area, &options)
        .collect::<CubeResult<_>>()
        .unwrap();
    assert_eq!(
        rows[1..],
        [
            vec!["2020", "North", "1.5"],
            vec!["2020", "South", ""],
            vec!["2020", "East", "-3"],
        ]
    );
}

#[test]
fn test_empty_area_export_has_only_header() {
    let server = MemoryServer::new("Demo")
        .dimension("Year", &["2020"])
        .cube("Plan", &["Year"]);
    let cube = Cube::open(Arc::new(server), "Demo", "Plan").unwrap();

    let area = cube.full_area();
    let options = ExportOptions::default();
    let rows: Vec<Vec<String>> = cube
        .export(&area, &options)
        .collect::<CubeResult<_>>()
        .unwrap();
    assert_eq!(rows, vec![vec!["Year", "#VALUE"]]);
    assert_eq!(cube.transport().count("/cell/export"), 1);
}

#[test]
fn test_page_failure_ends_iteration() {
    let cube = large_cube();
    cube.transport().fail_after("/cell/export", 1);
    let area = cube.full_area();
    let options = ExportOptions::default();

    let results: Vec<CubeResult<Vec<String>>> = cube.export(&area, &options).collect();
    assert_eq!(results.len(), 10_002);
    assert!(results[..10_001].iter().all(Result::is_ok));
    assert!(matches!(results[10_001], Err(CubeError::Transport(_))));
    assert_eq!(cube.transport().count("/cell/export"), 2);
}

#[test]
fn test_dropping_rows_stops_fetching() {
    let cube = large_cube();
    let area = cube.full_area();
    let options = ExportOptions::default();
    let first: Vec<_> = cube.export(&area, &options).take(5).collect();
    assert_eq!(first.len(), 5);
    assert_eq!(cube.transport().count("/cell/export"), 1);
}

fn scripted_cursor_fetches(first_page: &str, later: &[&str]) -> (usize, Vec<Option<String>>) {
    let transport = ScriptedTransport::new();
    transport.push_body(first_page);
    for body in later {
        transport.push_body(*body);
    }
    let area = Area::all(&["Year".to_string(), "Region".to_string()]);
    let options = ExportOptions::default();
    let mut cursor = ExportCursor::new(&transport, "Demo", "Sales", &area, &options);
    while cursor.next_record().unwrap().is_some() {}
    assert_eq!(cursor.state(), CursorState::Complete);
    let paths = transport
        .requests()
        .iter()
        .map(|d| d.get("path").map(str::to_string))
        .collect();
    (cursor.fetches(), paths)
}

#[test]
fn test_progress_short_of_total_fetches_once_more() {
    let (fetches, paths) =
        scripted_cursor_fetches("1;1;1;0,0;\n1;1;2;3,7;\n9000;10000\n", &["1;1;3;4,0;\n10000;10000\n"]);
    assert_eq!(fetches, 2);
    assert_eq!(paths, vec![None, Some("3,7".to_string())]);
}

#[test]
fn test_progress_at_total_fetches_nothing_more() {
    let (fetches, _) = scripted_cursor_fetches("1;1;1;0,0;\n1;1;2;3,7;\n10000;10000\n", &[]);
    assert_eq!(fetches, 1);
}

#[test]
fn test_assume_complete_policy_on_truncated_page() {
    let transport = ScriptedTransport::new();
    transport.push_body("1;1;1;0,0;\n1;1;2;0,1;\n");
    let area = Area::all(&["Year".to_string(), "Region".to_string()]);
    let options = ExportOptions::default().with_progress_policy(ProgressPolicy::AssumeComplete);
    let records: Vec<_> = ExportCursor::new(&transport, "Demo", "Sales", &area, &options)
        .collect::<CubeResult<_>>()
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].value, "2");
}
