//! Bidirectional name/id lookup for one dimension.

use std::collections::HashMap;

use super::element::{ElementId, ElementRecord};
use crate::error::{CubeError, CubeResult};

/// Lookup table built from one full element listing.
///
/// Names are matched case-insensitively; [`DimensionTable::name_of`] returns
/// the casing the server reported.
#[derive(Debug, Clone)]
pub struct DimensionTable {
    name: String,
    records: Vec<ElementRecord>,
    by_id: HashMap<ElementId, usize>,
    by_name: HashMap<String, usize>,
}

impl DimensionTable {
    /// Build a table from a listing. Records are kept in position order.
    pub fn from_records(name: impl Into<String>, mut records: Vec<ElementRecord>) -> Self {
        records.sort_by_key(|r| r.position);

        let mut by_id = HashMap::with_capacity(records.len());
        let mut by_name = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            by_id.insert(record.id, idx);
            by_name.insert(record.name.to_lowercase(), idx);
        }

        Self {
            name: name.into(),
            records,
            by_id,
            by_name,
        }
    }

    /// Dimension name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve an element name to its id.
    pub fn id_of(&self, element: &str) -> CubeResult<ElementId> {
        self.by_name
            .get(&element.to_lowercase())
            .map(|&idx| self.records[idx].id)
            .ok_or_else(|| CubeError::unknown_element(&self.name, element))
    }

    /// Resolve an element id to its name.
    pub fn name_of(&self, id: ElementId) -> CubeResult<&str> {
        self.get(id)
            .map(|r| r.name.as_str())
            .ok_or_else(|| CubeError::unknown_element(&self.name, id))
    }

    /// Full record for an id.
    pub fn get(&self, id: ElementId) -> Option<&ElementRecord> {
        self.by_id.get(&id).map(|&idx| &self.records[idx])
    }

    pub fn contains_name(&self, element: &str) -> bool {
        self.by_name.contains_key(&element.to_lowercase())
    }

    /// All elements in position order.
    pub fn elements(&self) -> impl Iterator<Item = &ElementRecord> {
        self.records.iter()
    }
}
