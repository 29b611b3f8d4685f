//! Versioned on-disk component documents.
//!
//! A document is a JSON envelope around one component spec:
//! `{ "format": "gridfinity-component", "version": 2, "metadata": {...}, "component": {...} }`.
//! Older versions are migrated on load; newer ones are refused.

pub mod errors;
pub mod load;
pub mod metadata;
pub mod migrate;
pub mod save;

pub use errors::{LoadError, SaveError};
pub use load::{load_component, LoadedComponent};
pub use metadata::ComponentMetadata;
pub use save::{save_component, FORMAT_ID, FORMAT_VERSION};
