//! Batched point lookups.
//!
//! Many single-cell reads are collected first and answered by one
//! `/cell/values` request.
//!
//! # Design
//!
//! - Two phases: `Idle` serves resolved values, `Collecting` queues requests
//! - Pending lookups are keyed by a SHA-256 of the coordinate tuple, so a
//!   repeated coordinate costs one slot; the queue keeps request order for
//!   matching response rows
//! - No retry: a failed flush keeps the pending set for the caller to retry
//!
//! ```text
//!   start_collecting ──► request, request, ...  (#PENDING)
//!          ▲                      │
//!          │                    flush ── one /cell/values call
//!          │                      ▼
//!          └──────────── request  (resolved value or #N/A)
//! ```

mod hash;
pub use hash::{compute_hash, coordinate_key};

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::cell::CellValue;
use crate::cube::Cube;
use crate::dimension::{render_path, Coordinates};
use crate::error::CubeResult;
use crate::transport::{Descriptor, Transport};

/// `[cache]` settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Drop resolved values whenever a new collecting phase starts.
    pub reset_on_collect: bool,
}

#[derive(Debug, Clone)]
struct PendingLookup {
    key: String,
    path: String,
}

/// Two-phase cache for single-cell reads of one cube.
///
/// # Example
///
/// ```ignore
/// let mut cache = cube.batch();
/// cache.start_collecting(false);
/// cache.request(&Coordinates::positional(&["2021", "North"]))?; // #PENDING
/// cache.request(&Coordinates::positional(&["2021", "South"]))?; // #PENDING
/// cache.flush()?;                                               // one round trip
/// let north = cache.request(&Coordinates::positional(&["2021", "North"]))?;
/// ```
pub struct BatchValueCache<'c, T: Transport> {
    cube: &'c Cube<T>,
    collecting: bool,
    pending: Vec<PendingLookup>,
    queued: HashSet<String>,
    resolved: HashMap<String, CellValue>,
}

impl<'c, T: Transport> BatchValueCache<'c, T> {
    pub fn new(cube: &'c Cube<T>) -> Self {
        Self {
            cube,
            collecting: false,
            pending: Vec::new(),
            queued: HashSet::new(),
            resolved: HashMap::new(),
        }
    }

    /// Enter the collecting phase, discarding queued lookups. Resolved
    /// values survive unless `reset_resolved` is set.
    pub fn start_collecting(&mut self, reset_resolved: bool) {
        self.pending.clear();
        self.queued.clear();
        if reset_resolved {
            self.resolved.clear();
        }
        self.collecting = true;
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// Distinct lookups queued for the next flush.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn resolved_len(&self) -> usize {
        self.resolved.len()
    }

    /// Queue a lookup while collecting, or answer it while idle.
    ///
    /// While collecting this always returns [`CellValue::Pending`]. While
    /// idle it returns the value from the last flush, or
    /// [`CellValue::Unavailable`] with a warning if the coordinate was never
    /// resolved. Idle lookups never reach the server.
    pub fn request(&mut self, coords: &Coordinates<'_>) -> CubeResult<CellValue> {
        let resolver = self.cube.resolver();
        let key = coordinate_key(&resolver.ordered(coords)?)?;

        if self.collecting {
            if !self.queued.contains(&key) {
                let path = render_path(&resolver.build_path(coords)?);
                self.queued.insert(key.clone());
                self.pending.push(PendingLookup { key, path });
            }
            return Ok(CellValue::Pending);
        }

        match self.resolved.get(&key) {
            Some(value) => Ok(value.clone()),
            None => {
                log::warn!(
                    "cube '{}': {:?} was not collected before the last flush",
                    self.cube.name(),
                    coords
                );
                Ok(CellValue::Unavailable)
            }
        }
    }

    /// Resolve every queued lookup with one request and return to idle.
    ///
    /// Returns the number of lookups resolved. Rows are matched to lookups
    /// by position; lookups without a row become [`CellValue::Unavailable`].
    /// On failure the cache stays in the collecting phase with its queue
    /// intact.
    pub fn flush(&mut self) -> CubeResult<usize> {
        if !self.collecting {
            return Ok(0);
        }
        if self.pending.is_empty() {
            self.collecting = false;
            return Ok(0);
        }

        let paths = self
            .pending
            .iter()
            .map(|p| p.path.as_str())
            .collect::<Vec<_>>()
            .join(":");
        let rows = self.cube.transport().send(
            &Descriptor::new("/cell/values")
                .param("name_database", self.cube.database())
                .param("name_cube", self.cube.name())
                .param("paths", paths),
        )?;

        if rows.len() > self.pending.len() {
            log::warn!(
                "cube '{}': {} values returned for {} lookups, extra rows ignored",
                self.cube.name(),
                rows.len(),
                self.pending.len()
            );
        }

        let mut rows = rows.into_iter();
        let count = self.pending.len();
        self.queued.clear();
        for lookup in self.pending.drain(..) {
            let value = rows
                .next()
                .map(|row| CellValue::from_row(&row))
                .unwrap_or(CellValue::Unavailable);
            self.resolved.insert(lookup.key, value);
        }
        self.collecting = false;
        log::debug!("cube '{}': resolved {} lookups", self.cube.name(), count);
        Ok(count)
    }
}
