//! Name/id resolution over real-looking element listings.

use std::collections::BTreeSet;
use std::sync::Arc;

use cubeport::cube::CubeSchema;
use cubeport::dimension::{CoordinateResolver, ElementType};
use cubeport::transport::{MemoryServer, ScriptedTransport};
use cubeport::{Coordinates, CubeError};
use proptest::prelude::*;

const REGION_LISTING: &str = "\
0;North;0;0;1;1;1;1;3;0;;;\n\
1;South;1;0;1;1;1;1;3;0;;;\n\
2;\"East; Coast\";2;0;1;1;2;1;3;0;;;\n\
3;All Regions;3;1;0;0;4;0;;3;0,1,2;1,1,0.5;\n";

fn scripted_resolver() -> (Arc<ScriptedTransport>, CoordinateResolver<ScriptedTransport>) {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_body(REGION_LISTING);
    let schema = CubeSchema::new("Sales", vec!["Region".to_string()]);
    let resolver = CoordinateResolver::new(transport.clone(), "Demo", schema);
    (transport, resolver)
}

#[test]
fn test_listing_with_consolidation_and_quoting() {
    let (transport, resolver) = scripted_resolver();
    let table = resolver.table("Region").unwrap();
    assert_eq!(table.len(), 4);

    let east = resolver.id_from_name("Region", "east; coast").unwrap();
    assert_eq!(resolver.name_from_id("Region", east).unwrap(), "East; Coast");
    assert_eq!(table.get(east).unwrap().element_type, ElementType::String);

    let total = table.get(3).unwrap();
    assert_eq!(total.element_type, ElementType::Consolidated);
    assert_eq!(total.children, vec![0, 1, 2]);
    assert_eq!(total.weights, vec![1.0, 1.0, 0.5]);

    let request = &transport.requests()[0];
    assert_eq!(request.path(), "/dimension/elements");
    assert_eq!(request.get("name_dimension"), Some("Region"));
}

#[test]
fn test_listing_failure_is_not_cached() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_error(cubeport::transport::TransportError::Timeout(1));
    transport.push_body(REGION_LISTING);
    let schema = CubeSchema::new("Sales", vec!["Region".to_string()]);
    let resolver = CoordinateResolver::new(transport, "Demo", schema);

    assert!(matches!(
        resolver.id_from_name("Region", "North"),
        Err(CubeError::Transport(_))
    ));
    assert!(!resolver.is_loaded("Region"));
    assert_eq!(resolver.id_from_name("Region", "North").unwrap(), 0);
}

#[test]
fn test_malformed_listing_is_protocol_error() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_body("0;North;zero;0;1;1;1;0;;0;;;\n");
    let schema = CubeSchema::new("Sales", vec!["Region".to_string()]);
    let resolver = CoordinateResolver::new(transport, "Demo", schema);
    assert!(matches!(
        resolver.table("Region"),
        Err(CubeError::Protocol(_))
    ));
}

#[test]
fn test_schema_load_keeps_cube_order() {
    let server = MemoryServer::new("Demo")
        .dimension("Measure", &["Units"])
        .dimension("Year", &["2021"])
        .dimension("Region", &["North"])
        .cube("Sales", &["Region", "Year", "Measure"]);
    let schema = CubeSchema::load(&server, "Demo", "Sales").unwrap();
    assert_eq!(schema.dimensions(), ["Region", "Year", "Measure"]);
    assert!(matches!(
        CubeSchema::load(&server, "Other", "Sales"),
        Err(CubeError::Transport(_))
    ));
}

#[test]
fn test_positional_arity_checked() {
    let server = Arc::new(
        MemoryServer::new("Demo")
            .dimension("Year", &["2021"])
            .dimension("Region", &["North"])
            .cube("Sales", &["Year", "Region"]),
    );
    let schema = CubeSchema::load(&*server, "Demo", "Sales").unwrap();
    let resolver = CoordinateResolver::new(server, "Demo", schema);
    assert!(matches!(
        resolver.build_path(&Coordinates::positional(&["2021"])),
        Err(CubeError::MissingCoordinate(_))
    ));
    assert!(resolver
        .build_path(&Coordinates::positional(&["2021", "North", "x"]))
        .is_err());
}

proptest! {
    #[test]
    fn prop_name_id_bijection(names in prop::collection::btree_set("[a-z][a-z0-9 ]{0,8}", 1..40)) {
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let server = Arc::new(
            MemoryServer::new("Demo")
                .dimension("Item", &names)
                .cube("Stock", &["Item"]),
        );
        let schema = CubeSchema::load(&*server, "Demo", "Stock").unwrap();
        let resolver = CoordinateResolver::new(server.clone(), "Demo", schema);

        let mut ids = BTreeSet::new();
        for name in &names {
            let id = resolver.id_from_name("Item", name).unwrap();
            prop_assert_eq!(resolver.name_from_id("Item", id).unwrap(), *name);
            prop_assert_eq!(resolver.id_from_name("Item", &name.to_uppercase()).unwrap(), id);
            ids.insert(id);
        }
        prop_assert_eq!(ids.len(), names.len());
        prop_assert_eq!(server.count("/dimension/elements"), 1);
    }
}
