//! Shared value types for the Gridfinity component pipeline.
//!
//! Everything here is plain data: the dimensional constants, the profile
//! library, the typed component specs and the validating constructor that
//! turns raw configuration into them.

pub mod config;
pub mod constants;
pub mod naming;
pub mod profile;
pub mod spec;

pub use config::{ConfigDocument, ConfigError, ConfigWarning};
pub use naming::component_filename;
pub use profile::{Profile, ProfileSegment, ProfileSpan};
pub use spec::*;
