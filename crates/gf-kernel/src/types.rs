use serde::{Deserialize, Serialize};

slotmap::new_key_type! {
    /// Key of a solid inside a kernel session.
    pub struct SolidKey;
}

/// Opaque handle to a solid in the geometry kernel.
/// NEVER persisted. Valid only for the kernel session that minted it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SolidHandle(pub(crate) SolidKey);

impl SolidHandle {
    pub(crate) fn key(&self) -> SolidKey {
        self.0
    }
}

/// Errors from kernel operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum KernelError {
    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("fillet failed: {reason}")]
    FilletFailed { reason: String },

    #[error("edge selector {selector} matched no edges")]
    EmptySelection { selector: String },

    #[error("invalid shape: {reason}")]
    InvalidShape { reason: String },

    #[error("solid not found (released or from another session)")]
    SolidNotFound,
}

/// Axis-aligned bounding box in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl BoundingBox {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> [f64; 3] {
        [
            self.max[0] - self.min[0],
            self.max[1] - self.min[1],
            self.max[2] - self.min[2],
        ]
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].min(other.min[i]);
            out.max[i] = out.max[i].max(other.max[i]);
        }
        out
    }

    /// Overlap of two boxes, `None` when they only touch or are apart.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        let mut out = *self;
        for i in 0..3 {
            out.min[i] = out.min[i].max(other.min[i]);
            out.max[i] = out.max[i].min(other.max[i]);
            if out.max[i] <= out.min[i] {
                return None;
            }
        }
        Some(out)
    }

    pub fn contains_point(&self, p: [f64; 3]) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    pub fn approx_eq(&self, other: &BoundingBox, tol: f64) -> bool {
        (0..3).all(|i| {
            (self.min[i] - other.min[i]).abs() <= tol && (self.max[i] - other.max[i]).abs() <= tol
        })
    }
}

/// Result of a validity check on a solid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidityReport {
    /// All coordinates and derived quantities are finite.
    pub finite: bool,
    /// The solid encloses positive volume.
    pub non_empty: bool,
    /// Closed manifold boundary with no free edges.
    pub closed: bool,
    pub issues: Vec<String>,
}

impl ValidityReport {
    pub fn is_valid(&self) -> bool {
        self.finite && self.non_empty && self.closed && self.issues.is_empty()
    }
}

/// Which side of a planar face a hole opens towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoleDirection {
    /// The hole starts at `face_z` and goes up into the material.
    Up,
    /// The hole starts at `face_z` and goes down into the material.
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shaft {
    pub diameter: f64,
    pub depth: f64,
}

/// A counterbored hole for the native counterbore primitive.
/// Depths are measured from the face; the shaft depth includes the bore.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Counterbore {
    pub center: [f64; 2],
    pub face_z: f64,
    pub direction: HoleDirection,
    pub bore_diameter: f64,
    pub bore_depth: f64,
    pub shaft: Option<Shaft>,
}

/// Geometric edge selection for fillets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EdgeSelector {
    /// Edges where pocket walls meet a floor at height `z`.
    FloorRing { z: f64 },
    /// Vertical edges of pockets at least `min_length` deep.
    PocketVerticalEdges { min_length: f64 },
    /// Vertical edges of bosses exactly `height` tall.
    BossVerticalEdges { height: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectorKind {
    FloorRing,
    PocketVerticalEdges,
    BossVerticalEdges,
}

impl EdgeSelector {
    pub fn kind(&self) -> SelectorKind {
        match self {
            EdgeSelector::FloorRing { .. } => SelectorKind::FloorRing,
            EdgeSelector::PocketVerticalEdges { .. } => SelectorKind::PocketVerticalEdges,
            EdgeSelector::BossVerticalEdges { .. } => SelectorKind::BossVerticalEdges,
        }
    }
}

impl std::fmt::Display for EdgeSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeSelector::FloorRing { z } => write!(f, "floor-ring(z={z:.3})"),
            EdgeSelector::PocketVerticalEdges { min_length } => {
                write!(f, "pocket-vertical(min_length={min_length:.3})")
            }
            EdgeSelector::BossVerticalEdges { height } => {
                write!(f, "boss-vertical(height={height:.3})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_union_and_intersection() {
        let a = BoundingBox::new([0.0; 3], [2.0; 3]);
        let b = BoundingBox::new([1.0; 3], [3.0; 3]);
        assert_eq!(a.union(&b), BoundingBox::new([0.0; 3], [3.0; 3]));
        assert_eq!(a.intersection(&b), Some(BoundingBox::new([1.0; 3], [2.0; 3])));
        let c = BoundingBox::new([2.0, 0.0, 0.0], [4.0, 2.0, 2.0]);
        assert_eq!(a.intersection(&c), None);
    }

    #[test]
    fn selector_display_names_the_kind() {
        let s = EdgeSelector::FloorRing { z: 7.0 };
        assert_eq!(s.to_string(), "floor-ring(z=7.000)");
        assert_eq!(s.kind(), SelectorKind::FloorRing);
    }
}
