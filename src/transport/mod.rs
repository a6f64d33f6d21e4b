//! Request channel to the cube server.
//!
//! Everything above this module talks to the server through the
//! [`Transport`] trait: one call that returns parsed semicolon-CSV rows and
//! one that hands back the raw response stream (used by the paginated export,
//! which must not buffer whole pages of text).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  CoordinateResolver / ExportCursor / BatchValueCache            │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │ Descriptor { path, params }
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Transport                               │
//! │   send(descriptor)     -> Rows (semicolon CSV, parsed)          │
//! │   send_raw(descriptor) -> Box<dyn Read>                          │
//! └─────────────────────────────────────────────────────────────────┘
//!            │                                   │
//!            ▼                                   ▼
//!     HttpTransport (reqwest)          MemoryServer / ScriptedTransport
//! ```
//!
//! Session handling, retries and TLS belong to the transport implementation.

mod descriptor;
mod error;
pub mod http;
pub mod memory;
pub mod wire;

use std::io::Read;
use std::sync::Arc;

pub use descriptor::Descriptor;
pub use error::{TransportError, TransportResult};
pub use http::HttpTransport;
pub use memory::{MemoryServer, ScriptedTransport};
pub use wire::Rows;

/// A raw response body.
pub type ByteStream = Box<dyn Read>;

/// The two request operations the core depends on.
pub trait Transport {
    /// Send a request and return the response as an unparsed byte stream.
    fn send_raw(&self, descriptor: &Descriptor) -> TransportResult<ByteStream>;

    /// Send a request and return the response parsed into rows.
    fn send(&self, descriptor: &Descriptor) -> TransportResult<Rows> {
        let body = self.send_raw(descriptor)?;
        wire::parse_rows(body)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send_raw(&self, descriptor: &Descriptor) -> TransportResult<ByteStream> {
        (**self).send_raw(descriptor)
    }

    fn send(&self, descriptor: &Descriptor) -> TransportResult<Rows> {
        (**self).send(descriptor)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send_raw(&self, descriptor: &Descriptor) -> TransportResult<ByteStream> {
        (**self).send_raw(descriptor)
    }

    fn send(&self, descriptor: &Descriptor) -> TransportResult<Rows> {
        (**self).send(descriptor)
    }
}
