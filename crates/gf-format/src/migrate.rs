use gf_types::HoleSpec;
use serde_json::Value;

use crate::errors::LoadError;

/// Bring a raw component from `from_version` up to `to_version`, one step
/// at a time.
pub fn migrate(mut component: Value, from_version: u32, to_version: u32) -> Result<Value, LoadError> {
    let mut version = from_version;
    while version < to_version {
        component = match version {
            1 => v1_to_v2(component)?,
            _ => {
                return Err(LoadError::MigrationFailed {
                    from: version,
                    to: version + 1,
                    reason: format!("no migration path from v{version}"),
                })
            }
        };
        version += 1;
    }
    Ok(component)
}

/// Version 1 spelled the lip as a `no_lip` flag and allowed `holes: true`
/// as shorthand for standard magnet holes.
fn v1_to_v2(component: Value) -> Result<Value, LoadError> {
    let Value::Object(mut fields) = component else {
        return Err(step_failed("component is not an object"));
    };

    if let Some(no_lip) = fields.remove("no_lip") {
        match no_lip {
            Value::Bool(true) => {
                fields.insert("lip".to_string(), Value::String("none".to_string()));
            }
            Value::Bool(false) => {}
            other => return Err(step_failed(&format!("`no_lip` must be a boolean, got {other}"))),
        }
    }

    match fields.get("holes") {
        Some(Value::Bool(true)) => {
            let magnet = serde_json::to_value(HoleSpec::magnet())
                .map_err(|e| step_failed(&e.to_string()))?;
            fields.insert("holes".to_string(), magnet);
        }
        Some(Value::Bool(false)) => {
            fields.remove("holes");
        }
        _ => {}
    }
    Ok(Value::Object(fields))
}

fn step_failed(reason: &str) -> LoadError {
    LoadError::MigrationFailed {
        from: 1,
        to: 2,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn no_lip_becomes_lip_style() {
        let out = migrate(json!({ "kind": "bin", "no_lip": true }), 1, 2).unwrap();
        assert_eq!(out["lip"], "none");
        assert!(out.get("no_lip").is_none());
    }

    #[test]
    fn holes_shorthand_expands() {
        let out = migrate(json!({ "kind": "baseplate", "holes": true }), 1, 2).unwrap();
        assert_eq!(out["holes"]["diameter"], 6.5);
        let out = migrate(json!({ "kind": "baseplate", "holes": false }), 1, 2).unwrap();
        assert!(out.get("holes").is_none());
    }

    #[test]
    fn current_version_is_untouched() {
        let v = json!({ "kind": "bin", "no_lip": true });
        assert_eq!(migrate(v.clone(), 2, 2).unwrap(), v);
    }

    #[test]
    fn bad_shapes_fail_the_step() {
        assert!(matches!(
            migrate(json!([1, 2]), 1, 2),
            Err(LoadError::MigrationFailed { from: 1, to: 2, .. })
        ));
        assert!(migrate(json!({ "no_lip": "yes" }), 1, 2).is_err());
    }

    #[test]
    fn unknown_old_version_has_no_path() {
        assert!(matches!(
            migrate(json!({}), 0, 2),
            Err(LoadError::MigrationFailed { from: 0, to: 1, .. })
        ));
    }
}
