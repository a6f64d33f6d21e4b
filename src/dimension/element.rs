//! Element records as listed by `/dimension/elements`.

use crate::error::{CubeError, CubeResult};
use crate::transport::{Descriptor, Transport};

/// Numeric element identifier, unique within one dimension.
pub type ElementId = u64;

/// Element kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Numeric,
    String,
    Consolidated,
}

impl ElementType {
    /// Decode the wire type flag (`1`, `2`, `4`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "1" => Some(ElementType::Numeric),
            "2" => Some(ElementType::String),
            "4" => Some(ElementType::Consolidated),
            _ => None,
        }
    }

    /// The wire type flag.
    pub fn code(&self) -> &'static str {
        match self {
            ElementType::Numeric => "1",
            ElementType::String => "2",
            ElementType::Consolidated => "4",
        }
    }

    pub fn is_base(&self) -> bool {
        !matches!(self, ElementType::Consolidated)
    }
}

/// One row of a dimension listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementRecord {
    pub id: ElementId,
    pub name: String,
    pub position: u64,
    pub level: u32,
    pub indent: u32,
    pub depth: u32,
    pub element_type: ElementType,
    pub parents: Vec<ElementId>,
    pub children: Vec<ElementId>,
    /// Consolidation weight of each child, parallel to `children`.
    pub weights: Vec<f64>,
}

impl ElementRecord {
    /// Create a base numeric element with no parents.
    pub fn base(id: ElementId, name: impl Into<String>, position: u64) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            level: 0,
            indent: 1,
            depth: 0,
            element_type: ElementType::Numeric,
            parents: Vec::new(),
            children: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Parse a listing row:
    /// `id;name;position;level;indent;depth;type;n_parents;parents;n_children;children;weights`.
    pub fn from_row(dimension: &str, fields: &[String]) -> CubeResult<Self> {
        let bad = |what: &str| {
            CubeError::Protocol(format!(
                "dimension '{}': bad {} in element row {:?}",
                dimension, what, fields
            ))
        };

        if fields.len() < 7 {
            return Err(bad("field count"));
        }

        let number = |idx: usize, what: &str| -> CubeResult<u64> {
            fields[idx].parse::<u64>().map_err(|_| bad(what))
        };

        let small = |idx: usize, what: &str| -> CubeResult<u32> {
            fields[idx].parse::<u32>().map_err(|_| bad(what))
        };

        let id = number(0, "id")?;
        let position = number(2, "position")?;
        let level = small(3, "level")?;
        let indent = small(4, "indent")?;
        let depth = small(5, "depth")?;
        let element_type = ElementType::from_code(&fields[6]).ok_or_else(|| bad("type"))?;

        let field = |idx: usize| fields.get(idx).map(String::as_str).unwrap_or("");
        let parents = parse_id_list(field(8)).ok_or_else(|| bad("parents"))?;
        let children = parse_id_list(field(10)).ok_or_else(|| bad("children"))?;
        let weights = field(11)
            .split(',')
            .filter(|w| !w.is_empty())
            .map(|w| w.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| bad("weights"))?;

        Ok(Self {
            id,
            name: fields[1].clone(),
            position,
            level,
            indent,
            depth,
            element_type,
            parents,
            children,
            weights,
        })
    }

    /// Render the record as a listing row (inverse of [`ElementRecord::from_row`]).
    pub fn to_row(&self) -> Vec<String> {
        let join = |ids: &[ElementId]| {
            ids.iter()
                .map(ElementId::to_string)
                .collect::<Vec<_>>()
                .join(",")
        };
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.position.to_string(),
            self.level.to_string(),
            self.indent.to_string(),
            self.depth.to_string(),
            self.element_type.code().to_string(),
            self.parents.len().to_string(),
            join(&self.parents),
            self.children.len().to_string(),
            join(&self.children),
            self.weights
                .iter()
                .map(f64::to_string)
                .collect::<Vec<_>>()
                .join(","),
        ]
    }
}

/// Parse a comma separated id list; an empty string is an empty list.
pub fn parse_id_list(s: &str) -> Option<Vec<ElementId>> {
    s.split(',')
        .filter(|part| !part.is_empty())
        .map(|part| part.trim().parse::<ElementId>().ok())
        .collect()
}

/// Fetch the full element listing of one dimension.
pub fn list_elements<T: Transport + ?Sized>(
    transport: &T,
    database: &str,
    dimension: &str,
) -> CubeResult<Vec<ElementRecord>> {
    let descriptor = Descriptor::new("/dimension/elements")
        .param("name_database", database)
        .param("name_dimension", dimension);
    let rows = transport.send(&descriptor)?;
    log::debug!("dimension '{}': {} elements listed", dimension, rows.len());
    rows.iter()
        .map(|row| ElementRecord::from_row(dimension, row))
        .collect()
}
