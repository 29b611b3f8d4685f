//! Validating constructor for component configurations.
//!
//! Raw JSON is walked against the known field lists before it is
//! deserialized, so a misspelled key surfaces as a warning instead of
//! silently falling back to a default.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::spec::ComponentSpec;

/// Errors raised while turning raw input into a `ComponentSpec`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("unknown component kind: {0}")]
    UnknownKind(String),

    #[error("{field} = {value} is outside {range}")]
    OutOfRange {
        field: String,
        value: f64,
        range: String,
    },

    #[error("invalid {field}: {reason}")]
    Invalid { field: String, reason: String },
}

/// Non-fatal findings about a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfigWarning {
    UnknownKey { path: String },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::UnknownKey { path } => write!(f, "unknown configuration key `{path}`"),
        }
    }
}

/// A validated spec together with everything noticed while reading it.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    pub spec: ComponentSpec,
    pub warnings: Vec<ConfigWarning>,
}

impl ConfigDocument {
    /// Wrap an already-typed spec. Ranges are still checked.
    pub fn from_spec(spec: ComponentSpec) -> Result<Self, ConfigError> {
        spec.validate()?;
        Ok(Self {
            spec,
            warnings: Vec::new(),
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let Some(root) = value.as_object() else {
            return Err(ConfigError::Parse("configuration must be a JSON object".to_string()));
        };
        let kind = root
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| ConfigError::Parse("missing string field `kind`".to_string()))?;
        let fields = match kind {
            "baseplate" => BASEPLATE_FIELDS,
            "bin" => BIN_FIELDS,
            "lid" => LID_FIELDS,
            other => return Err(ConfigError::UnknownKind(other.to_string())),
        };

        let mut warnings = Vec::new();
        collect_unknown(&value, fields, "", &mut warnings);

        let spec: ComponentSpec =
            serde_json::from_value(value).map_err(|e| ConfigError::Parse(e.to_string()))?;
        spec.validate()?;
        Ok(Self { spec, warnings })
    }
}

// ── Field lists ─────────────────────────────────────────────────────────────

/// Shape of a configuration object.
#[derive(Debug, Clone, Copy)]
enum Schema {
    Leaf,
    Object(&'static [(&'static str, Schema)]),
}

const GRID_SIZE_FIELDS: &[(&str, Schema)] = &[("length_u", Schema::Leaf), ("width_u", Schema::Leaf)];

const DRAWER_FIT_FIELDS: &[(&str, Schema)] = &[("target", Schema::Leaf), ("alignment", Schema::Leaf)];

const MODIFIER_FIELDS: &[(&str, Schema)] = &[
    ("crush_ribs", Schema::Leaf),
    ("chamfer", Schema::Leaf),
    ("refined", Schema::Leaf),
    ("printable_top", Schema::Leaf),
];

const HOLE_STYLE_FIELDS: &[(&str, Schema)] = &[("enhanced", Schema::Object(MODIFIER_FIELDS))];

const HOLE_FIELDS: &[(&str, Schema)] = &[
    ("style", Schema::Object(HOLE_STYLE_FIELDS)),
    ("diameter", Schema::Leaf),
    ("depth", Schema::Leaf),
    ("placements", Schema::Leaf),
];

const WALL_MASK_FIELDS: &[(&str, Schema)] = &[
    ("front", Schema::Leaf),
    ("back", Schema::Leaf),
    ("left", Schema::Leaf),
    ("right", Schema::Leaf),
];

const PATTERN_FIELDS: &[(&str, Schema)] = &[
    ("sides", Schema::Leaf),
    ("cell", Schema::Leaf),
    ("spacing", Schema::Leaf),
    ("corner_radius", Schema::Leaf),
    ("fill", Schema::Leaf),
    ("layout", Schema::Leaf),
    ("walls", Schema::Object(WALL_MASK_FIELDS)),
];

const HEIGHT_FIELDS: &[(&str, Schema)] = &[("mode", Schema::Leaf), ("value", Schema::Leaf), ("z_snap", Schema::Leaf)];

const DIVIDER_FIELDS: &[(&str, Schema)] = &[("length_count", Schema::Leaf), ("width_count", Schema::Leaf)];

const BASEPLATE_FIELDS: &[(&str, Schema)] = &[
    ("kind", Schema::Leaf),
    ("size", Schema::Object(GRID_SIZE_FIELDS)),
    ("drawer_fit", Schema::Object(DRAWER_FIT_FIELDS)),
    ("half_grid", Schema::Leaf),
    ("ext_depth", Schema::Leaf),
    ("straight_bottom", Schema::Leaf),
    ("holes", Schema::Object(HOLE_FIELDS)),
    ("screw_holes", Schema::Leaf),
    ("corner_screws", Schema::Leaf),
    ("weighted", Schema::Leaf),
    ("skeleton", Schema::Leaf),
    ("screw_together", Schema::Leaf),
];

const BIN_FIELDS: &[(&str, Schema)] = &[
    ("kind", Schema::Leaf),
    ("size", Schema::Object(GRID_SIZE_FIELDS)),
    ("height", Schema::Object(HEIGHT_FIELDS)),
    ("half_grid", Schema::Leaf),
    ("wall_thickness", Schema::Leaf),
    ("lip", Schema::Leaf),
    ("dividers", Schema::Object(DIVIDER_FIELDS)),
    ("scoops", Schema::Leaf),
    ("scoop_scale", Schema::Leaf),
    ("labels", Schema::Leaf),
    ("label_width", Schema::Leaf),
    ("label_height", Schema::Leaf),
    ("interior_height", Schema::Leaf),
    ("solid", Schema::Leaf),
    ("lite", Schema::Leaf),
    ("vase", Schema::Leaf),
    ("holes", Schema::Object(HOLE_FIELDS)),
    ("thumbscrew", Schema::Leaf),
    ("wall_pattern", Schema::Object(PATTERN_FIELDS)),
    ("floor_pattern", Schema::Object(PATTERN_FIELDS)),
    ("fillet_interior", Schema::Leaf),
    ("fillet_radius", Schema::Leaf),
];

const LID_FIELDS: &[(&str, Schema)] = &[
    ("kind", Schema::Leaf),
    ("size", Schema::Object(GRID_SIZE_FIELDS)),
    ("style", Schema::Leaf),
    ("thickness", Schema::Leaf),
    ("finger_slot", Schema::Leaf),
    ("finger_slot_width", Schema::Leaf),
    ("finger_slot_depth", Schema::Leaf),
    ("label", Schema::Leaf),
    ("label_width", Schema::Leaf),
    ("label_height", Schema::Leaf),
    ("label_depth", Schema::Leaf),
];

fn collect_unknown(
    value: &Value,
    fields: &'static [(&'static str, Schema)],
    prefix: &str,
    out: &mut Vec<ConfigWarning>,
) {
    let Some(map) = value.as_object() else {
        return;
    };
    for (key, child) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match fields.iter().find(|(name, _)| *name == key.as_str()) {
            None => out.push(ConfigWarning::UnknownKey { path }),
            Some((_, Schema::Object(nested))) => collect_unknown(child, *nested, &path, out),
            Some((_, Schema::Leaf)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{BinSpec, HoleStyle, LidStyle, LipStyle};
    use serde_json::json;

    #[test]
    fn minimal_bin_document() {
        let doc = ConfigDocument::from_value(json!({
            "kind": "bin",
            "size": { "length_u": 2, "width_u": 2 },
            "height": { "value": 3 }
        }))
        .unwrap();
        assert!(doc.warnings.is_empty());
        let ComponentSpec::Bin(bin) = doc.spec else {
            panic!("expected a bin");
        };
        assert_eq!(bin.lip, LipStyle::Normal);
        assert_eq!(bin.size.length_u, 2.0);
    }

    #[test]
    fn unknown_keys_become_warnings() {
        let doc = ConfigDocument::from_value(json!({
            "kind": "bin",
            "scoop": true,
            "height": { "value": 3, "snap": true },
            "holes": { "style": { "enhanced": { "chamfer": true, "ribs": true } } }
        }))
        .unwrap();
        let paths: Vec<String> = doc
            .warnings
            .iter()
            .map(|w| match w {
                ConfigWarning::UnknownKey { path } => path.clone(),
            })
            .collect();
        assert_eq!(paths.len(), 3);
        assert!(paths.contains(&"scoop".to_string()));
        assert!(paths.contains(&"height.snap".to_string()));
        assert!(paths.contains(&"holes.style.enhanced.ribs".to_string()));

        let ComponentSpec::Bin(bin) = doc.spec else {
            panic!("expected a bin");
        };
        assert!(!bin.scoops);
        assert!(matches!(bin.holes.unwrap().style, HoleStyle::Enhanced(m) if m.chamfer));
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let err = ConfigDocument::from_value(json!({ "kind": "drawer" })).unwrap_err();
        assert_eq!(err, ConfigError::UnknownKind("drawer".to_string()));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = ConfigDocument::from_value(json!({
            "kind": "bin",
            "wall_thickness": 4.0
        }))
        .unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { .. }));
    }

    #[test]
    fn typed_spec_round_trips_without_warnings() {
        let spec = ComponentSpec::Bin(BinSpec::new(3.0, 2.0, 6.0));
        let value = serde_json::to_value(&spec).unwrap();
        let doc = ConfigDocument::from_value(value).unwrap();
        assert!(doc.warnings.is_empty(), "{:?}", doc.warnings);
        assert_eq!(doc.spec, spec);
    }

    #[test]
    fn lid_document_flags_bin_only_keys() {
        let doc = ConfigDocument::from_value(json!({
            "kind": "lid",
            "size": { "length_u": 2, "width_u": 1 },
            "style": "stackable",
            "scoops": true
        }))
        .unwrap();
        assert_eq!(
            doc.warnings,
            vec![ConfigWarning::UnknownKey {
                path: "scoops".to_string()
            }]
        );
        let ComponentSpec::Lid(lid) = doc.spec else {
            panic!("expected a lid");
        };
        assert_eq!(lid.style, LidStyle::Stackable);
        assert!(lid.finger_slot);
    }
}
