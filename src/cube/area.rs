//! Rectangular cell regions.
//!
//! An [`AreaBuilder`] collects element names per dimension. Resolving it
//! against a [`CoordinateResolver`] yields an [`Area`]: one id set (or
//! wildcard) per cube dimension, whose cartesian product is the region.
//!
//! Wire form: ids inside a dimension joined by `:`, dimensions joined by `,`,
//! a wildcard written `*`. For a cube `[Year, Region]`:
//!
//! ```text
//! Year ∈ {2020, 2021}, Region = *   →   "0:1,*"
//! ```

use std::fmt;

use crate::dimension::{CoordinateResolver, ElementId};
use crate::error::{CubeError, CubeResult};
use crate::transport::Transport;

/// What one dimension of an [`Area`] covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every element of the dimension.
    All,
    /// These element ids, in selection order, without duplicates.
    Elements(Vec<ElementId>),
}

impl Selection {
    fn render(&self) -> String {
        match self {
            Selection::All => "*".to_string(),
            Selection::Elements(ids) => ids
                .iter()
                .map(ElementId::to_string)
                .collect::<Vec<_>>()
                .join(":"),
        }
    }
}

/// A resolved region: one [`Selection`] per cube dimension, in cube order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Area {
    dimensions: Vec<String>,
    selections: Vec<Selection>,
}

impl Area {
    /// The whole cube.
    pub fn all(dimensions: &[String]) -> Self {
        Self {
            dimensions: dimensions.to_vec(),
            selections: vec![Selection::All; dimensions.len()],
        }
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    /// Selection of one dimension, by name.
    pub fn selection(&self, dimension: &str) -> Option<&Selection> {
        self.dimensions
            .iter()
            .position(|d| d.eq_ignore_ascii_case(dimension))
            .map(|idx| &self.selections[idx])
    }

    /// True when no dimension is restricted.
    pub fn is_all_wildcard(&self) -> bool {
        self.selections.iter().all(|s| *s == Selection::All)
    }

    /// Wire form of the area.
    pub fn render(&self) -> String {
        self.selections
            .iter()
            .map(Selection::render)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether an id path lies inside the area.
    pub fn contains(&self, path: &[ElementId]) -> bool {
        path.len() == self.selections.len()
            && path.iter().zip(&self.selections).all(|(id, s)| match s {
                Selection::All => true,
                Selection::Elements(ids) => ids.contains(id),
            })
    }

    /// Number of cells addressed, counting wildcards as the full dimension.
    ///
    /// Lists every wildcard dimension that is not loaded yet.
    pub fn cell_count<T: Transport>(&self, resolver: &CoordinateResolver<T>) -> CubeResult<u64> {
        self.selections
            .iter()
            .enumerate()
            .try_fold(1u64, |acc, (idx, selection)| {
                let n = match selection {
                    Selection::All => resolver.table_at(idx)?.len(),
                    Selection::Elements(ids) => ids.len(),
                };
                Ok(acc.saturating_mul(n as u64))
            })
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Request {
    Include(Vec<String>),
    Exclude(Vec<String>),
    Wildcard,
}

/// Collects per-dimension element selections by name.
///
/// Dimensions never mentioned stay wildcards. Building is read-only: the
/// same builder can be resolved any number of times, and extended between
/// resolutions.
///
/// # Example
///
/// ```ignore
/// let area = AreaBuilder::new()
///     .add_elements("Year", &["2020", "2021"])
///     .build_subcube(cube.resolver())?;
/// assert_eq!(area.render(), "0:1,*");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaBuilder {
    entries: Vec<(String, Request)>,
}

impl AreaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, dimension: &str) -> &mut Request {
        let idx = match self
            .entries
            .iter()
            .position(|(d, _)| d.eq_ignore_ascii_case(dimension))
        {
            Some(idx) => idx,
            None => {
                self.entries.push((dimension.to_string(), Request::Wildcard));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }

    /// Add elements to a dimension's selection.
    ///
    /// Merges with earlier additions. After [`AreaBuilder::all_except`] the
    /// names are taken back out of the exclusions. On a wildcard dimension
    /// the selection becomes exactly these names.
    pub fn add_elements(mut self, dimension: &str, elements: &[&str]) -> Self {
        let entry = self.entry(dimension);
        if *entry == Request::Wildcard {
            *entry = Request::Include(Vec::new());
        }
        match entry {
            Request::Include(names) => {
                for element in elements {
                    if !names.iter().any(|n| n.eq_ignore_ascii_case(element)) {
                        names.push(element.to_string());
                    }
                }
            }
            Request::Exclude(excluded) => {
                excluded.retain(|n| !elements.iter().any(|e| n.eq_ignore_ascii_case(e)));
            }
            Request::Wildcard => {}
        }
        self
    }

    /// Replace a dimension's selection.
    pub fn set_elements(mut self, dimension: &str, elements: &[&str]) -> Self {
        *self.entry(dimension) = Request::Include(Vec::new());
        self.add_elements(dimension, elements)
    }

    /// Select every element of a dimension except these.
    ///
    /// The full listing is taken from the resolver when the area is built.
    pub fn all_except(mut self, dimension: &str, elements: &[&str]) -> Self {
        *self.entry(dimension) = Request::Exclude(elements.iter().map(|e| e.to_string()).collect());
        self
    }

    /// Reset a dimension to the wildcard.
    pub fn wildcard(mut self, dimension: &str) -> Self {
        *self.entry(dimension) = Request::Wildcard;
        self
    }

    /// Resolve names into an [`Area`] laid out in cube order.
    ///
    /// Dimension names are checked before any element listing is requested.
    ///
    /// # Errors
    ///
    /// `UnknownDimension` for a dimension the cube lacks, `UnknownElement`
    /// for an element its dimension lacks, and `EmptySelection` when a
    /// dimension ends up with no elements.
    pub fn build_subcube<T: Transport>(&self, resolver: &CoordinateResolver<T>) -> CubeResult<Area> {
        let schema = resolver.schema();
        let positions = self
            .entries
            .iter()
            .map(|(dimension, _)| schema.require(dimension))
            .collect::<CubeResult<Vec<_>>>()?;

        let mut area = Area::all(schema.dimensions());
        for (idx, (_, request)) in positions.into_iter().zip(&self.entries) {
            let dimension = &schema.dimensions()[idx];
            area.selections[idx] = match request {
                Request::Wildcard => Selection::All,
                Request::Include(names) => {
                    let table = resolver.table_at(idx)?;
                    let mut ids = Vec::with_capacity(names.len());
                    for name in names {
                        let id = table.id_of(name)?;
                        if !ids.contains(&id) {
                            ids.push(id);
                        }
                    }
                    Selection::Elements(ids)
                }
                Request::Exclude(names) => {
                    let table = resolver.table_at(idx)?;
                    let excluded = names
                        .iter()
                        .map(|name| table.id_of(name))
                        .collect::<CubeResult<Vec<_>>>()?;
                    Selection::Elements(
                        table
                            .elements()
                            .map(|e| e.id)
                            .filter(|id| !excluded.contains(id))
                            .collect(),
                    )
                }
            };
            if area.selections[idx] == Selection::Elements(Vec::new()) {
                return Err(CubeError::EmptySelection(dimension.clone()));
            }
        }
        Ok(area)
    }
}
