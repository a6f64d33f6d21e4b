//! Page stitching properties.

use std::sync::Arc;

use cubeport::cell::CellValue;
use cubeport::export::{ExportCursor, ExportOptions};
use cubeport::transport::{MemoryServer, ScriptedTransport};
use cubeport::{Area, Cube, CubeResult};
use proptest::prelude::*;

fn data_row(i: usize) -> String {
    format!("1;1;{};{},{};\n", i, i / 10, i % 10)
}

fn path(i: usize) -> String {
    format!("{},{}", i / 10, i % 10)
}

/// Split `0..n` at the given cut points into non-empty pages.
fn pages(n: usize, cuts: &[usize]) -> Vec<(usize, usize)> {
    let mut bounds: Vec<usize> = cuts.iter().map(|c| c % n).filter(|c| *c > 0).collect();
    bounds.sort_unstable();
    bounds.dedup();
    bounds.push(n);
    let mut start = 0;
    bounds
        .into_iter()
        .map(|end| {
            let page = (start, end);
            start = end;
            page
        })
        .collect()
}

proptest! {
    #[test]
    fn prop_any_split_yields_each_row_once(
        n in 1usize..120,
        cuts in prop::collection::vec(0usize..1000, 0..8),
        repeats in prop::collection::vec(any::<bool>(), 8),
    ) {
        let pages = pages(n, &cuts);
        let transport = ScriptedTransport::new();
        for (k, (start, end)) in pages.iter().enumerate() {
            let mut body = String::new();
            if *start > 0 && repeats[k % repeats.len()] {
                body.push_str(&data_row(start - 1));
            }
            for i in *start..*end {
                body.push_str(&data_row(i));
            }
            body.push_str(&format!("{};{}\n", end, n));
            transport.push_body(body);
        }

        let area = Area::all(&["A".to_string(), "B".to_string()]);
        let options = ExportOptions::default();
        let mut cursor = ExportCursor::new(&transport, "Demo", "Sales", &area, &options);
        let mut seen = Vec::new();
        while let Some(record) = cursor.next_record().unwrap() {
            seen.push(record.path);
        }

        let expected: Vec<String> = (0..n).map(path).collect();
        prop_assert_eq!(seen, expected);
        prop_assert_eq!(cursor.fetches(), pages.len());
        prop_assert_eq!(transport.remaining(), 0);

        let requests = transport.requests();
        for (k, (start, _)) in pages.iter().enumerate().skip(1) {
            let boundary = path(start - 1);
            prop_assert_eq!(requests[k].get("path"), Some(boundary.as_str()));
        }
    }

    #[test]
    fn prop_memory_server_pages(
        filled in prop::collection::btree_set((0u64..6, 0u64..7), 0..42),
        blocksize in 1usize..15,
    ) {
        let years: Vec<String> = (0..6).map(|i| format!("Y{}", i)).collect();
        let months: Vec<String> = (0..7).map(|i| format!("M{}", i)).collect();
        let years: Vec<&str> = years.iter().map(String::as_str).collect();
        let months: Vec<&str> = months.iter().map(String::as_str).collect();
        let mut server = MemoryServer::new("Demo")
            .dimension("Year", &years)
            .dimension("Month", &months)
            .cube("Plan", &["Year", "Month"]);
        for (y, m) in &filled {
            server
                .set_path("Plan", vec![*y, *m], CellValue::Number((y * 10 + m) as f64))
                .unwrap();
        }
        let cube = Cube::open(Arc::new(server), "Demo", "Plan").unwrap();

        let area = cube.full_area();
        let options = ExportOptions::default().with_blocksize(blocksize);
        let rows: Vec<Vec<String>> = cube
            .export(&area, &options)
            .collect::<CubeResult<_>>()
            .unwrap();

        let expected: Vec<Vec<String>> = filled
            .iter()
            .map(|(y, m)| vec![format!("Y{}", y), format!("M{}", m), (y * 10 + m).to_string()])
            .collect();
        prop_assert_eq!(&rows[1..], expected.as_slice());

        let fetches = filled.len().div_ceil(blocksize).max(1);
        prop_assert_eq!(cube.transport().count("/cell/export"), fetches);
    }
}
