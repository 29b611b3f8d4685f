//! Deterministic descriptive file names for built components.

use crate::spec::{
    BaseplateSpec, BinSpec, ComponentSpec, HeightMode, HoleSpec, HoleStyle, LidSpec, LipStyle,
};

/// Base file name (no extension) describing a component and its features.
pub fn component_filename(spec: &ComponentSpec) -> String {
    match spec {
        ComponentSpec::Baseplate(bp) => baseplate_filename(bp),
        ComponentSpec::Bin(bin) => bin_filename(bin),
        ComponentSpec::Lid(lid) => lid_filename(lid),
    }
}

fn units(v: f64) -> String {
    if (v - v.round()).abs() < 1e-9 {
        format!("{}", v.round() as i64)
    } else {
        format!("{v:.1}")
    }
}

fn hole_tag(holes: &HoleSpec) -> String {
    match holes.style {
        HoleStyle::Standard => "mag".to_string(),
        HoleStyle::Enhanced(_) => {
            let tags: Vec<&str> = holes.kinds().iter().map(|k| k.tag()).collect();
            format!("mag-{}", tags.join("-"))
        }
    }
}

fn baseplate_filename(bp: &BaseplateSpec) -> String {
    let mut name = String::from("gf_baseplate_");
    match (&bp.size, &bp.drawer_fit) {
        (_, Some(fit)) => name.push_str(&format!("fit{:.0}x{:.0}", fit.target[0], fit.target[1])),
        (Some(size), None) => {
            name.push_str(&format!("{}x{}", units(size.length_u), units(size.width_u)))
        }
        (None, None) => name.push_str("unsized"),
    }
    if bp.half_grid {
        name.push_str("_half");
    }

    let mut holes = Vec::new();
    if let Some(h) = &bp.holes {
        holes.push(hole_tag(h));
    }
    if bp.screw_holes {
        holes.push("screw".to_string());
    }
    if !holes.is_empty() {
        name.push('_');
        name.push_str(&holes.join("-"));
    }

    if bp.corner_screws {
        name.push_str("_csk");
    }
    if bp.weighted {
        name.push_str("_weighted");
    }
    if bp.skeleton {
        name.push_str("_skel");
    }
    match bp.screw_together {
        Some(1) => name.push_str("_screwtog"),
        Some(n) => name.push_str(&format!("_screwtog{n}")),
        None => {}
    }
    if bp.straight_bottom {
        name.push_str("_str");
    }
    if let Some(d) = bp.ext_depth {
        name.push_str(&format!("_ext{d:.1}"));
    }
    name
}

fn bin_filename(bin: &BinSpec) -> String {
    let height = match bin.height.mode {
        HeightMode::Units => units(bin.height.value),
        HeightMode::InternalMm => format!("i{:.1}", bin.height.value),
        HeightMode::ExternalMm => format!("h{:.1}", bin.height.value),
        HeightMode::ExternalWithLipMm => format!("t{:.1}", bin.height.value),
    };
    let mut name = format!(
        "gf_bin_{}x{}x{}",
        units(bin.size.length_u),
        units(bin.size.width_u),
        height
    );
    if bin.height.z_snap {
        name.push_str("_zs");
    }
    if bin.half_grid {
        name.push_str("_half");
    }
    if bin.vase {
        name.push_str("_vase");
    } else if bin.lite {
        name.push_str("_lite");
    }
    match bin.lip {
        LipStyle::Normal => {}
        LipStyle::Reduced => name.push_str("_reduced"),
        LipStyle::None => name.push_str("_nolip"),
    }
    if (bin.wall_thickness - crate::constants::WALL_THICKNESS).abs() > 1e-9 {
        name.push_str(&format!("_wall{:.2}", bin.wall_thickness));
    }
    if bin.dividers.any() {
        name.push_str(&format!(
            "_div{}x{}",
            bin.dividers.length_count, bin.dividers.width_count
        ));
    }
    if bin.scoops {
        name.push_str("_scoops");
    }
    if bin.labels {
        name.push_str("_labels");
    }
    if let Some(h) = bin.interior_height {
        name.push_str(&format!("_hi{h:.1}"));
    }
    if let Some(r) = bin.solid {
        name.push_str(&format!("_solid{r:.2}"));
    }
    if let Some(h) = &bin.holes {
        name.push('_');
        name.push_str(&hole_tag(h));
    }
    if bin.thumbscrew {
        name.push_str("_thumb");
    }
    if bin.wall_pattern.is_some() {
        name.push_str("_wpat");
    }
    if bin.floor_pattern.is_some() {
        name.push_str("_fpat");
    }
    name
}

fn lid_filename(lid: &LidSpec) -> String {
    let mut name = format!(
        "gf_lid_{}x{}_{}",
        units(lid.size.length_u),
        units(lid.size.width_u),
        lid.style.name()
    );
    if lid.finger_slot {
        name.push_str("_finger");
    }
    if lid.label {
        name.push_str("_label");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{DrawerFit, HoleModifiers, LidStyle};

    #[test]
    fn plain_bin_name() {
        let spec = ComponentSpec::Bin(BinSpec::new(2.0, 2.0, 3.0));
        assert_eq!(component_filename(&spec), "gf_bin_2x2x3");
    }

    #[test]
    fn bin_feature_suffixes() {
        let mut bin = BinSpec::new(3.0, 2.0, 5.0);
        bin.lip = LipStyle::None;
        bin.scoops = true;
        bin.dividers.length_count = 2;
        bin.holes = Some(HoleSpec::magnet());
        assert_eq!(
            component_filename(&ComponentSpec::Bin(bin)),
            "gf_bin_3x2x5_nolip_div2x0_scoops_mag"
        );
    }

    #[test]
    fn baseplate_names() {
        let mut bp = BaseplateSpec::new(4.0, 3.0);
        bp.holes = Some(HoleSpec::magnet());
        bp.screw_holes = true;
        bp.corner_screws = true;
        assert_eq!(
            component_filename(&ComponentSpec::Baseplate(bp)),
            "gf_baseplate_4x3_mag-screw_csk"
        );

        let mut skel = BaseplateSpec::new(2.0, 2.0);
        skel.skeleton = true;
        skel.screw_together = Some(2);
        skel.holes = Some(HoleSpec::enhanced(HoleModifiers {
            crush_ribs: true,
            chamfer: true,
            ..Default::default()
        }));
        assert_eq!(
            component_filename(&ComponentSpec::Baseplate(skel)),
            "gf_baseplate_2x2_mag-cr-ch_skel_screwtog2"
        );
    }

    #[test]
    fn drawer_fit_name_uses_target() {
        let mut bp = BaseplateSpec::default();
        bp.drawer_fit = Some(DrawerFit {
            target: [300.0, 200.0],
            alignment: [-1.0, 0.0],
        });
        assert_eq!(
            component_filename(&ComponentSpec::Baseplate(bp)),
            "gf_baseplate_fit300x200"
        );
    }

    #[test]
    fn lid_names() {
        let lid = LidSpec::new(3.0, 2.0);
        assert_eq!(component_filename(&ComponentSpec::Lid(lid)), "gf_lid_3x2_flat_finger");

        let lid = LidSpec {
            style: LidStyle::Stackable,
            finger_slot: false,
            ..LidSpec::new(1.0, 1.0)
        };
        assert_eq!(component_filename(&ComponentSpec::Lid(lid)), "gf_lid_1x1_stackable");
    }
}
