use gf_types::ConfigDocument;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::LoadError;
use crate::metadata::ComponentMetadata;
use crate::save::{FORMAT_ID, FORMAT_VERSION};

/// The envelope, with the component left untyped until it is migrated.
#[derive(Debug, Clone, Deserialize)]
struct ComponentFileRaw {
    format: String,
    version: u32,
    metadata: ComponentMetadata,
    component: Value,
}

/// A document read back from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedComponent {
    pub document: ConfigDocument,
    pub metadata: ComponentMetadata,
    /// Version the file was written with, before migration.
    pub source_version: u32,
}

/// Parse, version-check, migrate and validate a component document.
///
/// Unknown keys inside the component do not fail the load; they come back
/// as warnings on the [`ConfigDocument`].
pub fn load_component(json: &str) -> Result<LoadedComponent, LoadError> {
    let raw: ComponentFileRaw =
        serde_json::from_str(json).map_err(|e| LoadError::Parse(e.to_string()))?;

    if raw.format != FORMAT_ID {
        return Err(LoadError::UnknownFormat(raw.format));
    }
    if raw.version > FORMAT_VERSION {
        return Err(LoadError::FutureVersion {
            file_version: raw.version,
            supported_version: FORMAT_VERSION,
        });
    }

    let component = if raw.version < FORMAT_VERSION {
        debug!(from = raw.version, to = FORMAT_VERSION, "migrating component document");
        crate::migrate::migrate(raw.component, raw.version, FORMAT_VERSION)?
    } else {
        raw.component
    };

    let document = ConfigDocument::from_value(component)?;
    for w in &document.warnings {
        warn!(warning = %w, name = %raw.metadata.name, "component document warning");
    }
    Ok(LoadedComponent {
        document,
        metadata: raw.metadata,
        source_version: raw.version,
    })
}
