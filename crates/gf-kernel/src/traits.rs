use crate::shape::Shape;
use crate::types::*;

/// Core geometry kernel trait. Provides all solid construction and modification operations.
/// Implemented by SectionKernel (exact analytic CSG) and MockKernel (fault-injecting wrapper).
pub trait Kernel {
    /// Turn a constructive description into a stored solid.
    fn make_solid(&mut self, shape: &Shape) -> Result<SolidHandle, KernelError>;

    /// Boolean union of two solids.
    fn boolean_union(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError>;

    /// Boolean subtraction: a minus b.
    fn boolean_subtract(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError>;

    /// Boolean intersection of two solids.
    fn boolean_intersect(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError>;

    /// Native counterbore primitive: drill all `holes` into `solid` at once.
    fn counterbore_holes(
        &mut self,
        solid: &SolidHandle,
        holes: &[Counterbore],
    ) -> Result<SolidHandle, KernelError>;

    /// Round the edges picked by `selector` with the given radius.
    fn fillet_edges(
        &mut self,
        solid: &SolidHandle,
        selector: &EdgeSelector,
        radius: f64,
    ) -> Result<SolidHandle, KernelError>;

    /// Drop a solid. Handles to it become invalid.
    fn release(&mut self, solid: SolidHandle);
}

/// Read-only queries on kernel solids.
pub trait KernelIntrospect {
    /// Enclosed volume in mm^3.
    fn volume(&self, solid: &SolidHandle) -> Result<f64, KernelError>;

    fn bounding_box(&self, solid: &SolidHandle) -> Result<BoundingBox, KernelError>;

    /// Watertightness and sanity checks.
    fn check_validity(&self, solid: &SolidHandle) -> Result<ValidityReport, KernelError>;

    /// Number of solids currently alive in the session.
    fn solid_count(&self) -> usize;
}
