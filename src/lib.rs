//! Board-aware pin resolution.
//!
//! Takes loosely specified `{component -> pin}` claims from an upstream
//! generator, checks them against a board's capability profile and repairs
//! what it can, returning the corrected set together with typed diagnostics.
//!
//! ```no_run
//! use pin_resolver::{resolve, BoardCatalog, ComponentBinding, PinAssignmentSet, PinRole};
//!
//! let catalog = BoardCatalog::builtin()?;
//! let mut set = PinAssignmentSet::new(catalog.lookup_or_generic("esp32"));
//! set.push(ComponentBinding::new("LED", 2, PinRole::Gpio));
//! set.push(ComponentBinding::new("Servo", 2, PinRole::Pwm));
//!
//! let resolution = resolve(set);
//! assert!(resolution.is_ready());
//! # Ok::<(), pin_resolver::CatalogError>(())
//! ```

pub mod allocator;
pub mod board;
pub mod config;
pub mod pins;
pub mod render;
pub mod report;
pub mod resolve;
pub mod validate;

pub use allocator::{PeripheralKind, PinAllocator};
pub use board::{BoardCatalog, BoardProfile, BusRole, CatalogError, PinId, PinRole};
pub use pins::{ComponentBinding, PinAssignmentSet, RawConnection, RawPin};
pub use render::Diagnostics;
pub use report::{report, UsageSummary};
pub use resolve::{resolve, Resolution};
pub use validate::{validate, IssueKind, Severity, ValidationIssue};
