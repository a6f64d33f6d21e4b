//! Dimension element listings and name/id resolution.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    CoordinateResolver                           │
//! │  - one lazily listed DimensionTable per cube dimension          │
//! │  - id_from_name() / name_from_id() / build_path()               │
//! │  - reload() drops tables wholesale                              │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │ /dimension/elements
//!                               ▼
//!                          Transport
//! ```

mod element;
mod resolver;
mod table;

pub use element::{list_elements, parse_id_list, ElementId, ElementRecord, ElementType};
pub use resolver::{render_path, Coordinates, CoordinateResolver};
pub use table::DimensionTable;
