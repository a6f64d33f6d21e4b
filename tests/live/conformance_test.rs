//! Checks against a real cube server.
//!
//! Ignored by default. Run with:
//!
//! ```text
//! CUBEPORT_LIVE_URL=http://localhost:7777 CUBEPORT_LIVE_DATABASE=Demo \
//! CUBEPORT_LIVE_CUBE=Sales CUBEPORT_LIVE_SESSION=<sid> \
//!     cargo test --test conformance_test -- --ignored
//! ```

use std::env;
use std::sync::Arc;

use cubeport::export::{ExportCursor, ExportOptions};
use cubeport::transport::{HttpTransport, Transport};
use cubeport::{Cube, CubeResult};

fn live_cube() -> Option<Cube<HttpTransport>> {
    let url = env::var("CUBEPORT_LIVE_URL").ok()?;
    let database = env::var("CUBEPORT_LIVE_DATABASE").unwrap_or_else(|_| "Demo".to_string());
    let cube = env::var("CUBEPORT_LIVE_CUBE").unwrap_or_else(|_| "Sales".to_string());
    let mut transport = HttpTransport::new(url).unwrap();
    if let Ok(session) = env::var("CUBEPORT_LIVE_SESSION") {
        transport = transport.with_session(session);
    }
    Some(Cube::open(Arc::new(transport), database, &cube).unwrap())
}

/// The resumption boundary is exclusive: a page requested from a path
/// must not start with that path.
#[test]
#[ignore]
fn test_resumption_boundary_is_exclusive() {
    let Some(cube) = live_cube() else {
        eprintln!("CUBEPORT_LIVE_URL not set, skipping");
        return;
    };
    let area = cube.full_area();
    let options = ExportOptions::default().with_blocksize(2);

    let mut cursor = ExportCursor::new(
        cube.transport(),
        cube.database(),
        cube.name(),
        &area,
        &options,
    );
    let first = cursor.next_record().unwrap();
    let second = cursor.next_record().unwrap();
    let (Some(_), Some(second)) = (first, second) else {
        eprintln!("cube has fewer than 2 cells, nothing to check");
        return;
    };

    let descriptor = options.page_descriptor(cube.database(), cube.name(), &area, Some(&second.path));
    let rows = cube.transport().send(&descriptor).unwrap();
    if rows.len() > 1 {
        assert_ne!(rows[0].get(3), Some(&second.path));
    }
}

#[test]
#[ignore]
fn test_export_runs_to_progress_total() {
    let Some(cube) = live_cube() else {
        eprintln!("CUBEPORT_LIVE_URL not set, skipping");
        return;
    };
    let area = cube.full_area();
    let options = ExportOptions::default().with_blocksize(500);
    let mut rows = cube.export(&area, &options);
    let count = rows.by_ref().collect::<CubeResult<Vec<_>>>().unwrap().len();

    let progress = rows.cursor().progress().unwrap();
    assert!(progress.is_complete());
    assert!((count - 1) as u64 <= progress.total);
}
