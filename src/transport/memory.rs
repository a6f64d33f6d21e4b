//! In-process transports for tests and offline runs.
//!
//! [`MemoryServer`] emulates the parts of the cube protocol this crate uses
//! over an in-memory cube. [`ScriptedTransport`] replays canned response
//! bodies in order.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::io::Cursor;

use super::error::{TransportError, TransportResult};
use super::wire::RowWriter;
use super::{ByteStream, Descriptor, Transport};
use crate::cell::{CellValue, TYPE_ERROR, TYPE_NUMERIC, TYPE_STRING};
use crate::dimension::{parse_id_list, render_path, ElementId, ElementRecord};
use crate::error::{CubeError, CubeResult};

/// Default page size the server applies when `blocksize` is absent.
const SERVER_DEFAULT_BLOCKSIZE: usize = 1000;

struct MemoryDimension {
    name: String,
    elements: Vec<ElementRecord>,
}

struct MemoryCube {
    name: String,
    dimensions: Vec<String>,
    cells: BTreeMap<Vec<ElementId>, CellValue>,
}

/// An in-memory cube server.
///
/// Serves `/database/dimensions`, `/cube/info`, `/dimension/elements`,
/// `/cell/export`, `/cell/values` and `/cell/value` for one database.
/// Element ids are assigned in declaration order starting at 0. Only base
/// elements are modelled, so `base_only` and `use_rules` are accepted and
/// ignored. Export pages treat the `path` parameter as an exclusive lower
/// bound and end with an `<emitted>;<total>` line.
///
/// Every request is recorded and can be inspected with
/// [`MemoryServer::requests`].
///
/// # Example
///
/// ```ignore
/// let mut server = MemoryServer::new("Demo")
///     .dimension("Year", &["2020", "2021"])
///     .dimension("Region", &["North", "South"])
///     .cube("Sales", &["Year", "Region"]);
/// server.set_number("Sales", &["2020", "North"], 12.5)?;
/// ```
pub struct MemoryServer {
    database: String,
    dimensions: Vec<MemoryDimension>,
    cubes: Vec<MemoryCube>,
    requests: RefCell<Vec<Descriptor>>,
    failures: RefCell<HashMap<String, usize>>,
}

impl MemoryServer {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            dimensions: Vec::new(),
            cubes: Vec::new(),
            requests: RefCell::new(Vec::new()),
            failures: RefCell::new(HashMap::new()),
        }
    }

    /// Add a dimension of base numeric elements.
    pub fn dimension(mut self, name: &str, elements: &[&str]) -> Self {
        let elements = elements
            .iter()
            .enumerate()
            .map(|(i, e)| ElementRecord::base(i as ElementId, *e, i as u64))
            .collect();
        self.dimensions.push(MemoryDimension {
            name: name.to_string(),
            elements,
        });
        self
    }

    /// Add a cube over existing dimensions, in cube order.
    pub fn cube(mut self, name: &str, dimensions: &[&str]) -> Self {
        self.cubes.push(MemoryCube {
            name: name.to_string(),
            dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
            cells: BTreeMap::new(),
        });
        self
    }

    /// Store a numeric cell addressed by element names in cube order.
    pub fn set_number(&mut self, cube: &str, elements: &[&str], value: f64) -> CubeResult<()> {
        self.set(cube, elements, CellValue::Number(value))
    }

    /// Store a string cell addressed by element names in cube order.
    pub fn set_text(&mut self, cube: &str, elements: &[&str], value: &str) -> CubeResult<()> {
        self.set(cube, elements, CellValue::Text(value.to_string()))
    }

    /// Store a cell addressed by an id path.
    pub fn set_path(&mut self, cube: &str, path: Vec<ElementId>, value: CellValue) -> CubeResult<()> {
        let idx = self.cube_index(cube)?;
        self.cubes[idx].cells.insert(path, value);
        Ok(())
    }

    fn set(&mut self, cube: &str, elements: &[&str], value: CellValue) -> CubeResult<()> {
        let idx = self.cube_index(cube)?;
        let dims = self.cube_dimensions(&self.cubes[idx])?;
        if elements.len() != dims.len() {
            return Err(CubeError::MissingCoordinate(cube.to_string()));
        }
        let path = dims
            .iter()
            .zip(elements)
            .map(|(dim, name)| {
                dim.elements
                    .iter()
                    .find(|e| e.name.eq_ignore_ascii_case(name))
                    .map(|e| e.id)
                    .ok_or_else(|| CubeError::unknown_element(&dim.name, name))
            })
            .collect::<CubeResult<Vec<_>>>()?;
        self.cubes[idx].cells.insert(path, value);
        Ok(())
    }

    /// Make every request to `path` after the first `after` succeed fail.
    pub fn fail_after(&self, path: &str, after: usize) {
        self.failures.borrow_mut().insert(path.to_string(), after);
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<Descriptor> {
        self.requests.borrow().clone()
    }

    /// Number of requests received for a path.
    pub fn count(&self, path: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|d| d.path() == path)
            .count()
    }

    fn cube_index(&self, name: &str) -> CubeResult<usize> {
        self.cubes
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| CubeError::Protocol(format!("no cube '{}'", name)))
    }

    fn cube_dimensions(&self, cube: &MemoryCube) -> CubeResult<Vec<&MemoryDimension>> {
        cube.dimensions
            .iter()
            .map(|name| {
                self.dimension_by_name(name)
                    .ok_or_else(|| CubeError::unknown_dimension(&cube.name, name))
            })
            .collect()
    }

    fn dimension_by_name(&self, name: &str) -> Option<&MemoryDimension> {
        self.dimensions
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }

    fn dimension_id(&self, name: &str) -> Option<usize> {
        self.dimensions
            .iter()
            .position(|d| d.name.eq_ignore_ascii_case(name))
    }

    fn check_failure(&self, path: &str) -> TransportResult<()> {
        let mut failures = self.failures.borrow_mut();
        if let Some(remaining) = failures.get_mut(path) {
            if *remaining == 0 {
                return Err(TransportError::remote("5000", format!("{} failed", path)));
            }
            *remaining -= 1;
        }
        Ok(())
    }

    fn respond(&self, d: &Descriptor) -> TransportResult<Vec<u8>> {
        let database = d.get("name_database").unwrap_or_default();
        if !database.eq_ignore_ascii_case(&self.database) {
            return Err(TransportError::remote("1002", "database not found"));
        }

        let mut out = RowWriter::new();
        match d.path() {
            "/database/dimensions" => self.list_dimensions(&mut out)?,
            "/dimension/elements" => self.list_elements(d, &mut out)?,
            "/cube/info" => self.cube_info(d, &mut out)?,
            "/cell/export" => self.export(d, &mut out)?,
            "/cell/values" => self.values(d, &mut out)?,
            "/cell/value" => self.value(d, &mut out)?,
            other => return Err(TransportError::UnsupportedPath(other.to_string())),
        }
        out.finish()
    }

    fn list_dimensions(&self, out: &mut RowWriter) -> TransportResult<()> {
        for (id, dim) in self.dimensions.iter().enumerate() {
            out.row([
                id.to_string().as_str(),
                &dim.name,
                &dim.elements.len().to_string(),
                "0",
                "1",
                "0",
                "0",
            ])?;
        }
        Ok(())
    }

    fn list_elements(&self, d: &Descriptor, out: &mut RowWriter) -> TransportResult<()> {
        let name = d.get("name_dimension").unwrap_or_default();
        let dim = self
            .dimension_by_name(name)
            .ok_or_else(|| TransportError::remote("1004", "dimension not found"))?;
        for element in &dim.elements {
            out.row(element.to_row())?;
        }
        Ok(())
    }

    fn lookup_cube(&self, d: &Descriptor) -> TransportResult<(&MemoryCube, Vec<&MemoryDimension>)> {
        let name = d.get("name_cube").unwrap_or_default();
        let cube = self
            .cubes
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| TransportError::remote("1005", "cube not found"))?;
        let dims = self
            .cube_dimensions(cube)
            .map_err(|e| TransportError::remote("1004", e.to_string()))?;
        Ok((cube, dims))
    }

    fn cube_info(&self, d: &Descriptor, out: &mut RowWriter) -> TransportResult<()> {
        let (cube, dims) = self.lookup_cube(d)?;
        let ids = dims
            .iter()
            .filter_map(|dim| self.dimension_id(&dim.name))
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        out.row([
            "0",
            cube.name.as_str(),
            &dims.len().to_string(),
            &ids,
            "0",
            &cube.cells.len().to_string(),
            "1",
            "0",
        ])
    }

    fn export(&self, d: &Descriptor, out: &mut RowWriter) -> TransportResult<()> {
        let (cube, dims) = self.lookup_cube(d)?;
        let invalid = |what: &str| TransportError::remote("1019", format!("invalid {}", what));

        let blocksize = match d.get("blocksize") {
            Some(b) => b.parse::<usize>().map_err(|_| invalid("blocksize"))?,
            None => SERVER_DEFAULT_BLOCKSIZE,
        };
        let skip_empty = d.get("skip_empty").unwrap_or("1") == "1";
        let value_type = d.get("type").unwrap_or("0");

        let selection: Vec<Vec<ElementId>> = match d.get("area") {
            Some(area) => {
                let parts: Vec<&str> = area.split(',').collect();
                if parts.len() != dims.len() {
                    return Err(invalid("area"));
                }
                parts
                    .iter()
                    .zip(&dims)
                    .map(|(part, dim)| {
                        if *part == "*" {
                            Ok(dim.elements.iter().map(|e| e.id).collect())
                        } else {
                            let mut ids: Vec<ElementId> = part
                                .split(':')
                                .map(|id| id.parse::<ElementId>().map_err(|_| invalid("area")))
                                .collect::<TransportResult<_>>()?;
                            ids.sort_unstable();
                            Ok(ids)
                        }
                    })
                    .collect::<TransportResult<_>>()?
            }
            None => dims
                .iter()
                .map(|dim| dim.elements.iter().map(|e| e.id).collect())
                .collect(),
        };

        let in_area = |path: &[ElementId]| {
            path.iter()
                .zip(&selection)
                .all(|(id, ids)| ids.binary_search(id).is_ok())
        };
        let type_matches = |value: &CellValue| match (value_type, value) {
            ("1", CellValue::Text(_)) | ("2", CellValue::Number(_)) => false,
            _ => true,
        };

        let sequence: Vec<(Vec<ElementId>, Option<&CellValue>)> = if skip_empty {
            cube.cells
                .iter()
                .filter(|(path, value)| in_area(path.as_slice()) && type_matches(*value))
                .map(|(path, value)| (path.clone(), Some(value)))
                .collect()
        } else {
            cartesian(&selection)
                .into_iter()
                .map(|path| {
                    let value = cube.cells.get(&path);
                    (path, value)
                })
                .filter(|(_, value)| value.map_or(value_type != "2", |v| type_matches(v)))
                .collect()
        };

        let start = match d.get("path") {
            Some(resume) => {
                let resume = parse_id_list(resume).ok_or_else(|| invalid("path"))?;
                sequence.partition_point(|(path, _)| *path <= resume)
            }
            None => 0,
        };
        let end = (start + blocksize).min(sequence.len());

        for (path, value) in &sequence[start..end] {
            let path = render_path(path);
            match value {
                Some(CellValue::Number(n)) => out.row([TYPE_NUMERIC, "1", &n.to_string(), &path])?,
                Some(CellValue::Text(s)) => out.row([TYPE_STRING, "1", s.as_str(), &path])?,
                _ => out.row([TYPE_NUMERIC, "0", "", &path])?,
            }
        }
        out.bare_row([end.to_string(), sequence.len().to_string()])
    }

    fn cell_row(
        &self,
        cube: &MemoryCube,
        dims: &[&MemoryDimension],
        path: &str,
        out: &mut RowWriter,
    ) -> TransportResult<()> {
        let ids = match parse_id_list(path) {
            Some(ids) if ids.len() == dims.len() => ids,
            _ => return out.row([TYPE_ERROR, "0", "invalid path"]),
        };
        let valid = ids
            .iter()
            .zip(dims)
            .all(|(id, dim)| dim.elements.iter().any(|e| e.id == *id));
        if !valid {
            return out.row([TYPE_ERROR, "0", "invalid element"]);
        }
        match cube.cells.get(&ids) {
            Some(CellValue::Number(n)) => out.row([TYPE_NUMERIC, "1", &n.to_string()]),
            Some(CellValue::Text(s)) => out.row([TYPE_STRING, "1", s.as_str()]),
            _ => out.row([TYPE_NUMERIC, "0", ""]),
        }
    }

    fn values(&self, d: &Descriptor, out: &mut RowWriter) -> TransportResult<()> {
        let (cube, dims) = self.lookup_cube(d)?;
        let paths = d
            .get("paths")
            .ok_or_else(|| TransportError::remote("1019", "missing paths"))?;
        for path in paths.split(':') {
            self.cell_row(cube, &dims, path, out)?;
        }
        Ok(())
    }

    fn value(&self, d: &Descriptor, out: &mut RowWriter) -> TransportResult<()> {
        let (cube, dims) = self.lookup_cube(d)?;
        let path = d
            .get("path")
            .ok_or_else(|| TransportError::remote("1019", "missing path"))?;
        self.cell_row(cube, &dims, path, out)
    }
}

/// All id paths of a selection in lexicographic order.
fn cartesian(selection: &[Vec<ElementId>]) -> Vec<Vec<ElementId>> {
    selection.iter().fold(vec![Vec::new()], |acc, ids| {
        acc.iter()
            .flat_map(|prefix| {
                ids.iter().map(move |id| {
                    let mut path = prefix.clone();
                    path.push(*id);
                    path
                })
            })
            .collect()
    })
}

impl Transport for MemoryServer {
    fn send_raw(&self, descriptor: &Descriptor) -> TransportResult<ByteStream> {
        self.requests.borrow_mut().push(descriptor.clone());
        self.check_failure(descriptor.path())?;
        let body = self.respond(descriptor)?;
        Ok(Box::new(Cursor::new(body)))
    }
}

/// Replays canned response bodies, one per request, in order.
///
/// # Example
///
/// ```ignore
/// let transport = ScriptedTransport::new();
/// transport.push_body("1;1;5;0,0;\n1;1;7;0,1;\n2;2\n");
/// ```
#[derive(Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<TransportResult<String>>>,
    requests: RefCell<Vec<Descriptor>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response body.
    pub fn push_body(&self, body: impl Into<String>) {
        self.responses.borrow_mut().push_back(Ok(body.into()));
    }

    /// Queue a failed response.
    pub fn push_error(&self, error: TransportError) {
        self.responses.borrow_mut().push_back(Err(error));
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<Descriptor> {
        self.requests.borrow().clone()
    }

    /// Responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn send_raw(&self, descriptor: &Descriptor) -> TransportResult<ByteStream> {
        self.requests.borrow_mut().push(descriptor.clone());
        let next = self.responses.borrow_mut().pop_front();
        match next {
            Some(Ok(body)) => Ok(Box::new(Cursor::new(body.into_bytes()))),
            Some(Err(e)) => Err(e),
            None => Err(TransportError::UnsupportedPath(format!(
                "{} (no scripted response left)",
                descriptor.path()
            ))),
        }
    }
}
