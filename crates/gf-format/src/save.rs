use gf_types::ComponentSpec;
use serde::Serialize;

use crate::errors::SaveError;
use crate::metadata::ComponentMetadata;

pub const FORMAT_ID: &str = "gridfinity-component";

/// Current document version.
pub const FORMAT_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize)]
struct ComponentFile<'a> {
    format: &'static str,
    version: u32,
    metadata: &'a ComponentMetadata,
    component: &'a ComponentSpec,
}

/// Serialize a component to a pretty-printed document. The spec is range
/// checked first so that every saved document loads again.
pub fn save_component(spec: &ComponentSpec, metadata: &ComponentMetadata) -> Result<String, SaveError> {
    spec.validate()?;
    let file = ComponentFile {
        format: FORMAT_ID,
        version: FORMAT_VERSION,
        metadata,
        component: spec,
    };
    serde_json::to_string_pretty(&file).map_err(|e| SaveError::Serialize(e.to_string()))
}
