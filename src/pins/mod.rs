//! Component bindings: how upstream pin claims enter the crate.

pub mod binding;
pub mod ingest;
pub mod normalize;

pub use binding::{ComponentBinding, PinAssignmentSet, DEFAULT_SIGNAL};
pub use ingest::{
    extract_define_mappings, extract_prompt_mappings, parse_connections, IngestError,
    RawConnection, RawPinEntry,
};
pub use normalize::{normalize, normalize_role, NormalizeError, RawPin};
