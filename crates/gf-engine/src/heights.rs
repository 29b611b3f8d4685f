//! Bin height resolution.
//!
//! All four input modes converge on the body height: fabricated height
//! from the bottom of the feet to the top of the walls, base included and
//! stacking lip excluded.

use gf_types::constants::*;
use gf_types::{BinSpec, HeightMode, LipStyle};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedHeight {
    /// Overall height including the lip.
    pub total: f64,
    /// Height excluding the lip.
    pub body: f64,
    pub lip: f64,
}

/// Lip actually built. Vase bins never carry one.
pub fn effective_lip(bin: &BinSpec) -> LipStyle {
    if bin.vase {
        LipStyle::None
    } else {
        bin.lip
    }
}

pub fn resolve(bin: &BinSpec) -> ResolvedHeight {
    let lip = effective_lip(bin).height();
    let value = bin.height.value;
    let mut body = match bin.height.mode {
        HeightMode::Units => value * HEIGHT_UNIT - lip,
        HeightMode::InternalMm => value + BASE_HEIGHT + FLOOR_THICKNESS,
        HeightMode::ExternalMm => value,
        HeightMode::ExternalWithLipMm => value - lip,
    };
    if bin.height.z_snap {
        body = (body / HEIGHT_UNIT - 1e-9).ceil() * HEIGHT_UNIT;
    }
    body = body.max(BASE_HEIGHT);
    ResolvedHeight {
        total: body + lip,
        body,
        lip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gf_types::HeightSpec;

    fn bin(height: HeightSpec) -> BinSpec {
        BinSpec {
            height,
            ..BinSpec::new(1.0, 1.0, 3.0)
        }
    }

    #[test]
    fn units_include_the_lip() {
        let h = resolve(&BinSpec::new(2.0, 2.0, 3.0));
        assert_relative_eq!(h.total, 21.0);
        assert_relative_eq!(h.body, 21.0 - LIP_HEIGHT);
    }

    #[test]
    fn lipless_units_keep_the_full_height() {
        let spec = BinSpec {
            lip: LipStyle::None,
            ..BinSpec::new(1.0, 1.0, 3.0)
        };
        let h = resolve(&spec);
        assert_relative_eq!(h.body, 21.0);
        assert_relative_eq!(h.lip, 0.0);
    }

    #[test]
    fn millimetre_modes() {
        let h = resolve(&bin(HeightSpec::mm(HeightMode::InternalMm, 20.0)));
        assert_relative_eq!(h.body, 27.0);
        let h = resolve(&bin(HeightSpec::mm(HeightMode::ExternalMm, 30.0)));
        assert_relative_eq!(h.body, 30.0);
        assert_relative_eq!(h.total, 34.4);
        let h = resolve(&bin(HeightSpec::mm(HeightMode::ExternalWithLipMm, 30.0)));
        assert_relative_eq!(h.total, 30.0);
    }

    #[test]
    fn z_snap_rounds_up_before_the_floor() {
        let mut spec = HeightSpec::mm(HeightMode::ExternalMm, 22.0);
        spec.z_snap = true;
        assert_relative_eq!(resolve(&bin(spec)).body, 28.0);
        let mut exact = HeightSpec::mm(HeightMode::ExternalMm, 21.0);
        exact.z_snap = true;
        assert_relative_eq!(resolve(&bin(exact)).body, 21.0);
    }

    #[test]
    fn body_never_drops_below_the_base() {
        let h = resolve(&bin(HeightSpec::mm(HeightMode::ExternalMm, 2.0)));
        assert_relative_eq!(h.body, BASE_HEIGHT);
    }

    #[test]
    fn vase_drops_the_lip() {
        let spec = BinSpec {
            vase: true,
            ..BinSpec::new(1.0, 1.0, 3.0)
        };
        assert_eq!(effective_lip(&spec), LipStyle::None);
        assert_relative_eq!(resolve(&spec).total, 21.0);
    }
}
