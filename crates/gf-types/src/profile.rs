//! Canonical cross-sections swept around component outlines.
//!
//! A profile is read bottom to top. Each segment rises by `rise` and moves the
//! section boundary inward by `run`; a negative run widens the section going
//! up. Insets are measured from the outline the profile is swept along.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// One straight piece of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSegment {
    pub rise: f64,
    pub run: f64,
}

impl ProfileSegment {
    pub const fn new(rise: f64, run: f64) -> Self {
        Self { rise, run }
    }

    /// A 45 degree segment that widens the section by `size`.
    pub const fn chamfer_out(size: f64) -> Self {
        Self::new(size, -size)
    }

    pub const fn vertical(rise: f64) -> Self {
        Self::new(rise, 0.0)
    }
}

/// A profile segment placed at absolute heights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileSpan {
    pub z0: f64,
    pub z1: f64,
    pub inset0: f64,
    pub inset1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    /// Inset at the bottom of the first segment.
    pub start_inset: f64,
    pub segments: Vec<ProfileSegment>,
}

impl Profile {
    pub fn new(name: impl Into<String>, start_inset: f64, segments: Vec<ProfileSegment>) -> Self {
        Self {
            name: name.into(),
            start_inset,
            segments,
        }
    }

    pub fn height(&self) -> f64 {
        self.segments.iter().map(|s| s.rise).sum()
    }

    pub fn end_inset(&self) -> f64 {
        self.start_inset + self.segments.iter().map(|s| s.run).sum::<f64>()
    }

    /// Largest inset reached anywhere along the profile.
    pub fn max_inset(&self) -> f64 {
        self.spans(0.0)
            .iter()
            .map(|s| s.inset0.max(s.inset1))
            .fold(self.start_inset, f64::max)
    }

    /// Inset at height `t` above the profile bottom, clamped to the end values.
    pub fn inset_at(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return self.start_inset;
        }
        for span in self.spans(0.0) {
            if t <= span.z1 {
                let len = span.z1 - span.z0;
                if len <= 0.0 {
                    return span.inset1;
                }
                let f = (t - span.z0) / len;
                return span.inset0 + f * (span.inset1 - span.inset0);
            }
        }
        self.end_inset()
    }

    /// Segments placed with the profile bottom at `z0`.
    pub fn spans(&self, z0: f64) -> Vec<ProfileSpan> {
        let mut out = Vec::with_capacity(self.segments.len());
        let mut z = z0;
        let mut inset = self.start_inset;
        for seg in &self.segments {
            out.push(ProfileSpan {
                z0: z,
                z1: z + seg.rise,
                inset0: inset,
                inset1: inset + seg.run,
            });
            z += seg.rise;
            inset += seg.run;
        }
        out
    }

    /// The same profile with a vertical run of `depth` added underneath.
    pub fn extended_below(&self, depth: f64) -> Self {
        if depth <= 0.0 {
            return self.clone();
        }
        let mut segments = vec![ProfileSegment::vertical(depth)];
        segments.extend(self.segments.iter().copied());
        Self::new(format!("{}+{depth:.2}", self.name), self.start_inset, segments)
    }

    /// The same profile with every inset moved inward by `offset`.
    pub fn offset(&self, offset: f64) -> Self {
        Self::new(
            self.name.clone(),
            self.start_inset + offset,
            self.segments.clone(),
        )
    }
}

/// Foot of a bin: 0.8 at 45 degrees, 1.8 vertical, 2.15 at 45 degrees.
pub fn base_profile() -> Profile {
    Profile::new(
        "base",
        BASE_PROFILE_INSET,
        vec![
            ProfileSegment::chamfer_out(BASE_CHAMFER_LOW),
            ProfileSegment::vertical(BASE_VERTICAL),
            ProfileSegment::chamfer_out(BASE_CHAMFER_HIGH),
        ],
    )
}

/// Base profile with the bottom chamfer replaced by a vertical wall.
pub fn straight_base_profile() -> Profile {
    Profile::new(
        "straight-base",
        BASE_CHAMFER_HIGH,
        vec![
            ProfileSegment::vertical(BASE_CHAMFER_LOW + BASE_VERTICAL),
            ProfileSegment::chamfer_out(BASE_CHAMFER_HIGH),
        ],
    )
}

/// Cavity of the stacking lip, measured from the outer wall.
pub fn lip_profile() -> Profile {
    Profile::new(
        "lip",
        LIP_WIDTH,
        vec![
            ProfileSegment::chamfer_out(LIP_LOW_CHAMFER),
            ProfileSegment::vertical(LIP_VERTICAL),
            ProfileSegment::chamfer_out(LIP_TOP_CHAMFER),
        ],
    )
}

pub fn reduced_lip_profile() -> Profile {
    Profile::new(
        "reduced-lip",
        LIP_TOP_CHAMFER,
        vec![
            ProfileSegment::vertical(LIP_VERTICAL),
            ProfileSegment::chamfer_out(LIP_TOP_CHAMFER),
        ],
    )
}

/// Plug on the underside of a lid, seated inside a stacking lip.
pub fn lid_profile() -> Profile {
    let mut p = lip_profile().offset(LID_CLEARANCE);
    p.name = "lid".to_string();
    p
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    #[test]
    fn base_profile_spans_the_full_base() {
        let p = base_profile();
        assert!((p.height() - BASE_HEIGHT).abs() < TOL);
        assert!((p.start_inset - 2.95).abs() < TOL);
        assert!(p.end_inset().abs() < TOL);
        assert!((p.inset_at(0.8) - 2.15).abs() < TOL);
        assert!((p.inset_at(2.0) - 2.15).abs() < TOL);
        assert!(p.inset_at(10.0).abs() < TOL);
    }

    #[test]
    fn lip_profiles_close_at_the_outer_wall() {
        let lip = lip_profile();
        assert!((lip.height() - LIP_HEIGHT).abs() < TOL);
        assert!(lip.end_inset().abs() < TOL);
        assert!((lip.max_inset() - LIP_WIDTH).abs() < TOL);

        let reduced = reduced_lip_profile();
        assert!((reduced.height() - REDUCED_LIP_HEIGHT).abs() < TOL);
        assert!(reduced.end_inset().abs() < TOL);
    }

    #[test]
    fn lid_profile_sits_inside_the_lip() {
        let lid = lid_profile();
        let lip = lip_profile();
        for t in [0.0, 1.0, 2.5, 4.0] {
            assert!((lid.inset_at(t) - lip.inset_at(t) - LID_CLEARANCE).abs() < TOL);
        }
    }

    #[test]
    fn spans_are_contiguous() {
        let spans = base_profile().extended_below(3.0).spans(1.0);
        assert_eq!(spans.len(), 4);
        assert!((spans[0].z0 - 1.0).abs() < TOL);
        for pair in spans.windows(2) {
            assert!((pair[0].z1 - pair[1].z0).abs() < TOL);
            assert!((pair[0].inset1 - pair[1].inset0).abs() < TOL);
        }
        assert!((spans[3].z1 - (1.0 + 3.0 + BASE_HEIGHT)).abs() < TOL);
    }
}
