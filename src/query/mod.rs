//! Search query parameter subsystem.
//!
//! # Data Flow
//! ```text
//! /search?q=...&categories=...           /mcp tools/call {"q": ..., ...}
//!     → codec.rs decode_query                 → flattened into wire pairs
//!     → SearchParams (validated)  ←──────────────┘
//!     → codec.rs encode (forwarding from the tool surface)
//! ```
//!
//! # Design Decisions
//! - List fields never fail; scalar fields fail loudly
//! - Plugin defaults are stored literally, one constant per list
//! - params.rs field table also drives the OpenAPI document

pub mod codec;
pub mod locale;
pub mod params;

pub use codec::{decode, decode_query, encode, to_query_string, ValidationError};
pub use params::{FieldKind, FieldSpec, SearchParams, FIELDS};
