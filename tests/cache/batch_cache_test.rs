//! Batch value cache behaviour.

use std::sync::Arc;

use cubeport::cube::CubeSchema;
use cubeport::transport::{MemoryServer, ScriptedTransport};
use cubeport::{CellValue, Coordinates, Cube};
use proptest::prelude::*;

fn cube() -> Cube<MemoryServer> {
    let mut server = MemoryServer::new("Demo")
        .dimension("Year", &["2020", "2021", "2022"])
        .dimension("Region", &["North", "South"])
        .cube("Sales", &["Year", "Region"]);
    server.set_number("Sales", &["2020", "North"], 1.0).unwrap();
    server.set_number("Sales", &["2021", "North"], 2.0).unwrap();
    server.set_number("Sales", &["2022", "South"], 3.5).unwrap();
    Cube::open(Arc::new(server), "Demo", "Sales").unwrap()
}

#[test]
fn test_one_round_trip_for_many_lookups() {
    let cube = cube();
    let mut cache = cube.batch();
    cache.start_collecting(false);
    for year in ["2020", "2021", "2022"] {
        for region in ["North", "South"] {
            assert_eq!(
                cache.request(&Coordinates::positional(&[year, region])).unwrap(),
                CellValue::Pending
            );
        }
    }
    assert_eq!(cache.flush().unwrap(), 6);
    assert_eq!(cube.transport().count("/cell/values"), 1);

    let request = cube
        .transport()
        .requests()
        .into_iter()
        .find(|d| d.path() == "/cell/values")
        .unwrap();
    assert_eq!(request.get("paths"), Some("0,0:0,1:1,0:1,1:2,0:2,1"));

    let south_2022 = cache
        .request(&Coordinates::positional(&["2022", "South"]))
        .unwrap();
    assert_eq!(south_2022, CellValue::Number(3.5));
    let south_2020 = cache
        .request(&Coordinates::positional(&["2020", "South"]))
        .unwrap();
    assert_eq!(south_2020, CellValue::Unavailable);
}

#[test]
fn test_keyed_and_positional_share_a_slot() {
    let cube = cube();
    let mut cache = cube.batch();
    cache.start_collecting(false);
    cache
        .request(&Coordinates::positional(&["2021", "North"]))
        .unwrap();
    cache
        .request(&Coordinates::keyed(&[("region", "NORTH"), ("Year", "2021")]))
        .unwrap();
    assert_eq!(cache.pending_len(), 1);
}

#[test]
fn test_values_survive_next_cycle_unless_reset() {
    let cube = cube();
    let mut cache = cube.batch();
    let north = Coordinates::positional(&["2020", "North"]);

    cache.start_collecting(false);
    cache.request(&north).unwrap();
    cache.flush().unwrap();

    cache.start_collecting(false);
    cache.flush().unwrap();
    assert_eq!(cache.request(&north).unwrap(), CellValue::Number(1.0));

    cache.start_collecting(true);
    cache.flush().unwrap();
    assert_eq!(cache.request(&north).unwrap(), CellValue::Unavailable);
    assert_eq!(cube.transport().count("/cell/values"), 1);
}

#[test]
fn test_short_and_error_responses() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_body("0;2020;0;0;1;0;1;0;;0;;;\n1;2021;1;0;1;0;1;0;;0;;;\n2;2022;2;0;1;0;1;0;;0;;;\n");
    transport.push_body("99;0;invalid path;\n2;1;\"a;b\";\n");
    let schema = CubeSchema::new("Plan", vec!["Year".to_string()]);
    let cube = Cube::with_schema(transport, "Demo", schema);

    let mut cache = cube.batch();
    cache.start_collecting(false);
    for year in ["2020", "2021", "2022"] {
        cache.request(&Coordinates::positional(&[year])).unwrap();
    }
    assert_eq!(cache.flush().unwrap(), 3);

    let value = |cache: &mut cubeport::cache::BatchValueCache<'_, ScriptedTransport>, year| {
        cache.request(&Coordinates::positional(&[year])).unwrap()
    };
    assert_eq!(value(&mut cache, "2020"), CellValue::Unavailable);
    assert_eq!(value(&mut cache, "2021"), CellValue::Text("a;b".to_string()));
    assert_eq!(value(&mut cache, "2022"), CellValue::Unavailable);
    assert_eq!(cube.transport().remaining(), 0);
}

#[test]
fn test_large_queue_keeps_first_request_order() {
    let items: Vec<String> = (0..400).map(|i| format!("item {}", i)).collect();
    let stores: Vec<String> = (0..50).map(|i| format!("store {}", i)).collect();
    let item_names: Vec<&str> = items.iter().map(String::as_str).collect();
    let store_names: Vec<&str> = stores.iter().map(String::as_str).collect();
    let mut server = MemoryServer::new("Demo")
        .dimension("Item", &item_names)
        .dimension("Store", &store_names)
        .cube("Stock", &["Item", "Store"]);
    server.set_number("Stock", &["item 399", "store 0"], 12.0).unwrap();
    let cube = Cube::open(Arc::new(server), "Demo", "Stock").unwrap();

    let mut cache = cube.batch();
    cache.start_collecting(false);
    for round in 0..2 {
        for store in store_names.iter().rev() {
            for item in &item_names {
                cache.request(&Coordinates::positional(&[*item, *store])).unwrap();
            }
        }
        assert_eq!(cache.pending_len(), 20_000, "round {}", round);
    }

    assert_eq!(cache.flush().unwrap(), 20_000);
    assert_eq!(cube.transport().count("/cell/values"), 1);
    let request = cube
        .transport()
        .requests()
        .into_iter()
        .find(|d| d.path() == "/cell/values")
        .unwrap();
    assert!(request.get("paths").unwrap().starts_with("0,49:1,49:"));

    let stocked = cache
        .request(&Coordinates::positional(&["item 399", "store 0"]))
        .unwrap();
    assert_eq!(stocked, CellValue::Number(12.0));
}

proptest! {
    #[test]
    fn prop_duplicates_collapse(picks in prop::collection::vec((0usize..3, 0usize..2), 1..30)) {
        let years = ["2020", "2021", "2022"];
        let regions = ["North", "South"];
        let cube = cube();
        let mut cache = cube.batch();
        cache.start_collecting(false);

        let mut distinct = std::collections::HashSet::new();
        for (y, r) in &picks {
            cache
                .request(&Coordinates::positional(&[years[*y], regions[*r]]))
                .unwrap();
            distinct.insert((*y, *r));
        }
        prop_assert_eq!(cache.pending_len(), distinct.len());
        prop_assert_eq!(cache.flush().unwrap(), distinct.len());
        prop_assert_eq!(cache.resolved_len(), distinct.len());
        prop_assert_eq!(cube.transport().count("/cell/values"), 1);
    }
}
