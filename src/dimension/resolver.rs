//! Element name/id resolution across all dimensions of a cube.

use std::sync::Arc;

use once_cell::unsync::OnceCell;

use super::element::{list_elements, ElementId, ElementRecord};
use super::table::DimensionTable;
use crate::cube::CubeSchema;
use crate::error::{CubeError, CubeResult};
use crate::transport::Transport;

/// Element names addressing one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coordinates<'a> {
    /// `(dimension, element)` pairs in any order; every cube dimension must
    /// appear.
    Keyed(Vec<(&'a str, &'a str)>),
    /// Element names already in cube dimension order. The order is the
    /// caller's contract and is not checked against dimension names.
    Positional(Vec<&'a str>),
}

impl<'a> Coordinates<'a> {
    pub fn keyed(pairs: &[(&'a str, &'a str)]) -> Self {
        Coordinates::Keyed(pairs.to_vec())
    }

    pub fn positional(names: &[&'a str]) -> Self {
        Coordinates::Positional(names.to_vec())
    }
}

/// Resolves element names to ids and back for every dimension of one cube.
///
/// Each dimension's table is built from one full `/dimension/elements`
/// listing the first time that dimension is touched, and kept until
/// [`CoordinateResolver::reload`] or [`CoordinateResolver::reload_dimension`].
///
/// # Example
///
/// ```ignore
/// let resolver = CoordinateResolver::new(transport, "Demo", schema);
/// let id = resolver.id_from_name("Year", "2021")?;
/// assert_eq!(resolver.name_from_id("Year", id)?, "2021");
/// ```
pub struct CoordinateResolver<T> {
    transport: Arc<T>,
    database: String,
    schema: CubeSchema,
    tables: Vec<OnceCell<DimensionTable>>,
}

impl<T: Transport> CoordinateResolver<T> {
    pub fn new(transport: Arc<T>, database: impl Into<String>, schema: CubeSchema) -> Self {
        let tables = (0..schema.len()).map(|_| OnceCell::new()).collect();
        Self {
            transport,
            database: database.into(),
            schema,
            tables,
        }
    }

    pub fn schema(&self) -> &CubeSchema {
        &self.schema
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Lookup table for a dimension, listing it on first use.
    pub fn table(&self, dimension: &str) -> CubeResult<&DimensionTable> {
        let idx = self.schema.require(dimension)?;
        self.table_at(idx)
    }

    /// Lookup table for the dimension at a cube position.
    pub fn table_at(&self, idx: usize) -> CubeResult<&DimensionTable> {
        let name = self
            .schema
            .dimensions()
            .get(idx)
            .ok_or_else(|| CubeError::unknown_dimension(self.schema.name(), &format!("#{}", idx)))?;

        self.tables[idx].get_or_try_init(|| {
            let records = list_elements(&*self.transport, &self.database, name)?;
            Ok(DimensionTable::from_records(name.clone(), records))
        })
    }

    /// Whether a dimension's table has been listed yet.
    pub fn is_loaded(&self, dimension: &str) -> bool {
        self.schema
            .position(dimension)
            .is_some_and(|idx| self.tables[idx].get().is_some())
    }

    pub fn id_from_name(&self, dimension: &str, element: &str) -> CubeResult<ElementId> {
        self.table(dimension)?.id_of(element)
    }

    pub fn name_from_id(&self, dimension: &str, id: ElementId) -> CubeResult<&str> {
        self.table(dimension)?.name_of(id)
    }

    /// Full listing of a dimension in position order.
    pub fn elements(&self, dimension: &str) -> CubeResult<impl Iterator<Item = &ElementRecord>> {
        Ok(self.table(dimension)?.elements())
    }

    /// Element names in cube order, without touching the server.
    pub fn ordered<'c>(&self, coords: &Coordinates<'c>) -> CubeResult<Vec<&'c str>> {
        let dims = self.schema.dimensions();
        match coords {
            Coordinates::Positional(names) => {
                if names.len() < dims.len() {
                    return Err(CubeError::MissingCoordinate(dims[names.len()].clone()));
                }
                if names.len() > dims.len() {
                    return Err(CubeError::unknown_dimension(
                        self.schema.name(),
                        &format!("#{}", dims.len()),
                    ));
                }
                Ok(names.clone())
            }
            Coordinates::Keyed(pairs) => {
                let mut slots: Vec<Option<&'c str>> = vec![None; dims.len()];
                for (dimension, element) in pairs {
                    let idx = self.schema.require(dimension)?;
                    slots[idx] = Some(*element);
                }
                slots
                    .into_iter()
                    .enumerate()
                    .map(|(idx, slot)| {
                        slot.ok_or_else(|| CubeError::MissingCoordinate(dims[idx].clone()))
                    })
                    .collect()
            }
        }
    }

    /// Resolve coordinates into an id path in cube order.
    pub fn build_path(&self, coords: &Coordinates<'_>) -> CubeResult<Vec<ElementId>> {
        self.ordered(coords)?
            .into_iter()
            .enumerate()
            .map(|(idx, element)| self.table_at(idx)?.id_of(element))
            .collect()
    }

    /// Resolve an id path back into element names.
    pub fn names_for_path(&self, path: &[ElementId]) -> CubeResult<Vec<&str>> {
        if path.len() != self.schema.len() {
            return Err(CubeError::Protocol(format!(
                "path has {} coordinates, cube '{}' has {} dimensions",
                path.len(),
                self.schema.name(),
                self.schema.len()
            )));
        }
        path.iter()
            .enumerate()
            .map(|(idx, id)| self.table_at(idx)?.name_of(*id))
            .collect()
    }

    /// List every dimension now instead of on first use.
    pub fn preload(&self) -> CubeResult<()> {
        for idx in 0..self.schema.len() {
            self.table_at(idx)?;
        }
        Ok(())
    }

    /// Drop every table; each is listed again on next use.
    pub fn reload(&mut self) {
        for table in &mut self.tables {
            table.take();
        }
    }

    /// Drop one dimension's table.
    pub fn reload_dimension(&mut self, dimension: &str) -> CubeResult<()> {
        let idx = self.schema.require(dimension)?;
        self.tables[idx].take();
        Ok(())
    }
}

/// Render an id path in wire form.
pub fn render_path(path: &[ElementId]) -> String {
    path.iter()
        .map(ElementId::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
