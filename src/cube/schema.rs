//! Cube dimension order.

use std::collections::HashMap;

use crate::error::{CubeError, CubeResult};
use crate::transport::{Descriptor, Transport};

/// A cube's name and its dimensions in the cube's fixed order.
///
/// Coordinate paths, areas and export rows are all laid out in this order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubeSchema {
    name: String,
    dimensions: Vec<String>,
}

impl CubeSchema {
    pub fn new(name: impl Into<String>, dimensions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            dimensions,
        }
    }

    /// Load the dimension order of a cube from the server.
    ///
    /// `/cube/info` lists dimension ids in cube order; `/database/dimensions`
    /// maps those ids to names.
    pub fn load<T: Transport + ?Sized>(
        transport: &T,
        database: &str,
        cube: &str,
    ) -> CubeResult<Self> {
        let info = transport.send(
            &Descriptor::new("/cube/info")
                .param("name_database", database)
                .param("name_cube", cube),
        )?;
        let info = info
            .first()
            .filter(|row| row.len() >= 4)
            .ok_or_else(|| CubeError::Protocol(format!("empty cube info for '{}'", cube)))?;
        let dimension_ids: Vec<&str> = info[3].split(',').filter(|s| !s.is_empty()).collect();

        let listing = transport
            .send(&Descriptor::new("/database/dimensions").param("name_database", database))?;
        let names: HashMap<&str, &str> = listing
            .iter()
            .filter(|row| row.len() >= 2)
            .map(|row| (row[0].as_str(), row[1].as_str()))
            .collect();

        let dimensions = dimension_ids
            .iter()
            .map(|id| {
                names.get(id).map(|name| name.to_string()).ok_or_else(|| {
                    CubeError::Protocol(format!(
                        "cube '{}' references unknown dimension id {}",
                        cube, id
                    ))
                })
            })
            .collect::<CubeResult<Vec<_>>>()?;

        log::debug!("cube '{}': dimensions {:?}", cube, dimensions);
        Ok(Self::new(info[1].clone(), dimensions))
    }

    /// Cube name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dimension names in cube order.
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Position of a dimension (case-insensitive).
    pub fn position(&self, dimension: &str) -> Option<usize> {
        self.dimensions
            .iter()
            .position(|d| d.eq_ignore_ascii_case(dimension))
    }

    /// Position of a dimension, failing with `UnknownDimension`.
    pub fn require(&self, dimension: &str) -> CubeResult<usize> {
        self.position(dimension)
            .ok_or_else(|| CubeError::unknown_dimension(&self.name, dimension))
    }
}
