//! Shape builders shared by the bin and baseplate recipes.

use gf_kernel::{InsetProfile, InsetSegment, Section, Shape};
use gf_types::constants::*;
use gf_types::Profile;

/// Sweep insets for `profile` with its bottom at `z0`.
pub fn inset_profile(profile: &Profile, z0: f64) -> InsetProfile {
    InsetProfile::new(
        profile
            .spans(z0)
            .into_iter()
            .filter(|s| s.z1 > s.z0)
            .map(|s| InsetSegment::Linear {
                t0: s.z0,
                t1: s.z1,
                d0: s.inset0,
                d1: s.inset1,
            })
            .collect(),
    )
}

/// Rounded outline of a component footprint, centred on the origin.
pub fn outline(size: [f64; 2]) -> Section {
    Section::rounded_rect([0.0, 0.0], size, OUTER_RADIUS)
}

/// Square `size` x `size` prism from `z0` to `z1`.
pub fn square_prism(center: [f64; 2], size: f64, z0: f64, z1: f64) -> Shape {
    Shape::extrude_z(Section::rect(center, [size, size]), z0, z1)
}

pub fn union_or_single(mut parts: Vec<Shape>) -> Shape {
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        Shape::union(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gf_types::profile::base_profile;

    #[test]
    fn base_profile_sweep_narrows_to_the_bottom() {
        let p = inset_profile(&base_profile(), 0.0);
        assert_relative_eq!(p.at(0.0), BASE_PROFILE_INSET);
        assert_relative_eq!(p.at(BASE_HEIGHT), 0.0, epsilon = 1e-12);
        // Beyond the last segment the end value holds.
        assert_relative_eq!(p.at(BASE_HEIGHT + 3.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn shifted_profile_starts_at_its_base() {
        let p = inset_profile(&base_profile(), 5.0);
        assert_relative_eq!(p.at(5.0), BASE_PROFILE_INSET);
        assert_relative_eq!(p.at(5.8), BASE_CHAMFER_HIGH, epsilon = 1e-12);
    }
}
