//! Helper functions: error type, spec shortcuts, reference volumes.

use std::f64::consts::PI;

use gf_engine::EngineError;
use gf_format::LoadError;
use gf_types::{
    BaseplateSpec, BinSpec, ComponentSpec, ConfigDocument, ConfigError, HoleSpec, LidSpec,
};

// ── Error Type ──────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("component not found: {name}")]
    ComponentNotFound { name: String },

    #[error("duplicate name: {name}")]
    DuplicateName { name: String },

    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("oracle failure ({oracle}): {detail}")]
    OracleFailure { oracle: String, detail: String },

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("load error: {0}")]
    Load(#[from] LoadError),

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

// ── Spec Shortcuts ──────────────────────────────────────────────────────────

pub fn bin(length_u: f64, width_u: f64, height_u: f64) -> ComponentSpec {
    ComponentSpec::Bin(BinSpec::new(length_u, width_u, height_u))
}

pub fn baseplate(length_u: f64, width_u: f64) -> ComponentSpec {
    ComponentSpec::Baseplate(BaseplateSpec::new(length_u, width_u))
}

pub fn lid(length_u: f64, width_u: f64) -> ComponentSpec {
    ComponentSpec::Lid(LidSpec::new(length_u, width_u))
}

/// A bin with `edit` applied on top of the defaults.
pub fn bin_with(length_u: f64, width_u: f64, height_u: f64, edit: impl FnOnce(&mut BinSpec)) -> ComponentSpec {
    let mut spec = BinSpec::new(length_u, width_u, height_u);
    edit(&mut spec);
    ComponentSpec::Bin(spec)
}

pub fn baseplate_with(length_u: f64, width_u: f64, edit: impl FnOnce(&mut BaseplateSpec)) -> ComponentSpec {
    let mut spec = BaseplateSpec::new(length_u, width_u);
    edit(&mut spec);
    ComponentSpec::Baseplate(spec)
}

pub fn lid_with(length_u: f64, width_u: f64, edit: impl FnOnce(&mut LidSpec)) -> ComponentSpec {
    let mut spec = LidSpec::new(length_u, width_u);
    edit(&mut spec);
    ComponentSpec::Lid(spec)
}

pub fn document(spec: ComponentSpec) -> Result<ConfigDocument, HarnessError> {
    Ok(ConfigDocument::from_spec(spec)?)
}

// ── Reference Volumes ───────────────────────────────────────────────────────

pub fn cylinder_volume(diameter: f64, height: f64) -> f64 {
    PI * (diameter / 2.0).powi(2) * height
}

/// Material one plain recess of `spec` takes out of a solid floor.
pub fn recess_volume(spec: &HoleSpec) -> f64 {
    let (d, h) = spec.effective_size();
    cylinder_volume(d, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gf_types::constants::{MAGNET_HOLE_D, MAGNET_HOLE_H};

    #[test]
    fn magnet_recess_matches_cylinder() {
        let v = recess_volume(&HoleSpec::magnet());
        assert!((v - PI * (MAGNET_HOLE_D / 2.0).powi(2) * MAGNET_HOLE_H).abs() < 1e-12);
    }

    #[test]
    fn bin_with_applies_the_edit() {
        let ComponentSpec::Bin(b) = bin_with(2.0, 1.0, 3.0, |b| b.scoops = true) else {
            panic!("expected a bin");
        };
        assert!(b.scoops);
        assert_eq!(b.size.length_u, 2.0);
    }
}
