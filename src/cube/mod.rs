//! One cube of one database, behind one transport.
//!
//! [`Cube`] ties the schema, the coordinate resolver, bulk export and the
//! batch value cache together:
//!
//! ```text
//!              ┌──────────── Cube<T> ────────────┐
//!              │ CubeSchema   CoordinateResolver │
//!              └───┬──────────────┬──────────┬───┘
//!        build_area│        export│     batch│  value
//!                  ▼              ▼          ▼
//!               Area        ExportRows   BatchValueCache
//! ```

mod area;
mod schema;

pub use area::{Area, AreaBuilder, Selection};
pub use schema::CubeSchema;

use std::sync::Arc;

use tempfile::SpooledTempFile;

use crate::cache::BatchValueCache;
use crate::cell::CellValue;
use crate::dimension::{render_path, CoordinateResolver, Coordinates};
use crate::error::{CubeError, CubeResult};
use crate::export::{spool_rows, ExportCursor, ExportOptions, ExportRows, RowTranslator};
use crate::transport::{Descriptor, Transport};

/// Client-side handle to a cube.
///
/// # Example
///
/// ```ignore
/// let cube = Cube::open(Arc::new(transport), "Demo", "Sales")?;
/// let area = cube.build_area(&AreaBuilder::new().add_elements("Year", &["2021"]))?;
/// for row in cube.export(&area, &ExportOptions::default()) {
///     println!("{}", row?.join(","));
/// }
/// ```
pub struct Cube<T: Transport> {
    transport: Arc<T>,
    database: String,
    resolver: CoordinateResolver<T>,
}

impl<T: Transport> Cube<T> {
    /// Load the cube's dimension order and return a handle.
    pub fn open(transport: Arc<T>, database: impl Into<String>, cube: &str) -> CubeResult<Self> {
        let database = database.into();
        let schema = CubeSchema::load(&*transport, &database, cube)?;
        Ok(Self::with_schema(transport, database, schema))
    }

    /// A handle for a cube whose dimension order is already known.
    pub fn with_schema(transport: Arc<T>, database: impl Into<String>, schema: CubeSchema) -> Self {
        let database = database.into();
        let resolver = CoordinateResolver::new(transport.clone(), database.clone(), schema);
        Self {
            transport,
            database,
            resolver,
        }
    }

    pub fn name(&self) -> &str {
        self.schema().name()
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn schema(&self) -> &CubeSchema {
        self.resolver.schema()
    }

    pub fn resolver(&self) -> &CoordinateResolver<T> {
        &self.resolver
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// An empty area builder.
    pub fn area(&self) -> AreaBuilder {
        AreaBuilder::new()
    }

    /// Resolve a builder against this cube.
    pub fn build_area(&self, builder: &AreaBuilder) -> CubeResult<Area> {
        builder.build_subcube(&self.resolver)
    }

    /// The whole cube.
    pub fn full_area(&self) -> Area {
        Area::all(self.schema().dimensions())
    }

    /// Export an area lazily: a header row, then one named row per cell.
    pub fn export<'c>(&'c self, area: &'c Area, options: &'c ExportOptions) -> ExportRows<'c, T> {
        let cursor = ExportCursor::new(
            &*self.transport,
            &self.database,
            self.schema().name(),
            area,
            options,
        );
        let translator = RowTranslator::new(&self.resolver, options.sanitize_values);
        ExportRows::new(cursor, translator)
    }

    /// Export an area into comma separated CSV, spooled to disk past
    /// `options.spool_threshold_bytes` and rewound for reading.
    pub fn export_to_spool(&self, area: &Area, options: &ExportOptions) -> CubeResult<SpooledTempFile> {
        spool_rows(self.export(area, options), options.spool_threshold_bytes)
    }

    /// Read one cell, uncached.
    pub fn value(&self, coords: &Coordinates<'_>) -> CubeResult<CellValue> {
        let path = self.resolver.build_path(coords)?;
        let rows = self.transport.send(
            &Descriptor::new("/cell/value")
                .param("name_database", &self.database)
                .param("name_cube", self.name())
                .param("path", render_path(&path)),
        )?;
        rows.first()
            .map(|row| CellValue::from_row(row))
            .ok_or_else(|| CubeError::Protocol("empty /cell/value response".to_string()))
    }

    /// A batch cache for point lookups against this cube.
    pub fn batch(&self) -> BatchValueCache<'_, T> {
        BatchValueCache::new(self)
    }

    /// Forget all element listings; they are requested again on next use.
    pub fn reload(&mut self) {
        self.resolver.reload();
    }
}
