//! # cubeport
//!
//! Client-side data access for OLAP cubes reachable through a paginated
//! CSV-over-HTTP protocol.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                       Cube facade                        │
//! │   (schema, resolver, export, point reads, batch cache)   │
//! └─────────────────────────────────────────────────────────┘
//!        │                  │                     │
//!        ▼ [area]           ▼ [export]            ▼ [cache]
//! ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐
//! │ AreaBuilder  │  │ ExportCursor     │  │ BatchValueCache  │
//! │   → Area     │  │ + RowTranslator  │  │ Idle ⇄ Collecting│
//! └──────────────┘  └──────────────────┘  └──────────────────┘
//!        │                  │                     │
//!        ▼                  ▼                     ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │        CoordinateResolver (element names ↔ ids)          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │   Transport: HttpTransport | MemoryServer (semicolon CSV)│
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod cell;
pub mod config;
pub mod cube;
pub mod dimension;
pub mod error;
pub mod export;
pub mod transport;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::cache::BatchValueCache;
    pub use crate::cell::CellValue;
    pub use crate::cube::{Area, AreaBuilder, Cube, CubeSchema};
    pub use crate::dimension::{CoordinateResolver, Coordinates, ElementId};
    pub use crate::error::{CubeError, CubeResult};
    pub use crate::export::{ExportOptions, ProgressPolicy, ValueFilter};
    pub use crate::transport::{HttpTransport, MemoryServer, Transport};
}

pub use cell::CellValue;
pub use cube::{Area, AreaBuilder, Cube};
pub use dimension::Coordinates;
pub use error::{CubeError, CubeResult};
pub use export::ExportOptions;
