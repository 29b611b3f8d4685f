//! MockKernel: fault-injecting test double implementing Kernel + KernelIntrospect.
//!
//! Geometry is delegated to a [`SectionKernel`]; on top of it the mock can
//! reproduce the failure modes of real B-Rep kernels that the pipeline must
//! survive: fillets that throw or panic, subtractions that silently do
//! nothing when the tool shares a face plane with the target, and solids
//! with flipped face orientation that still pass the validity check.

use std::collections::HashMap;

use crate::section_kernel::SectionKernel;
use crate::shape::Shape;
use crate::traits::{Kernel, KernelIntrospect};
use crate::types::*;

/// How an injected fillet fault manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilletFault {
    /// Return `KernelError::FilletFailed`.
    Fail,
    /// Panic inside the kernel call.
    Panic,
}

/// One recorded kernel call.
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    MakeSolid,
    Union,
    Subtract { noop: bool },
    Intersect,
    Counterbore { holes: usize },
    Fillet { selector: SelectorKind, radius: f64 },
    Release,
}

/// Plane-coincidence tolerance used by the coplanar no-op simulation.
const COPLANAR_TOL: f64 = 1e-9;

#[derive(Default)]
pub struct MockKernel {
    inner: SectionKernel,
    fillet_faults: HashMap<SelectorKind, FilletFault>,
    coplanar_noop: bool,
    inverted: bool,
    calls: Vec<MockCall>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every fillet with this selector kind fail in the given way.
    pub fn fail_fillet(mut self, kind: SelectorKind, fault: FilletFault) -> Self {
        self.fillet_faults.insert(kind, fault);
        self
    }

    /// Make `boolean_subtract` return an unchanged copy of the target when
    /// any face of the tool's bounding box lies in a face plane of the
    /// target's bounding box.
    pub fn with_coplanar_noop(mut self) -> Self {
        self.coplanar_noop = true;
        self
    }

    /// Report every volume negated, as a kernel does for a shell whose
    /// faces all point inwards. Validity checks are unaffected.
    pub fn with_inverted_volumes(mut self) -> Self {
        self.inverted = true;
        self
    }

    pub fn calls(&self) -> &[MockCall] {
        &self.calls
    }

    pub fn noop_subtractions(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, MockCall::Subtract { noop: true }))
            .count()
    }

    fn shares_face_plane(&self, target: &SolidHandle, tool: &SolidHandle) -> Result<bool, KernelError> {
        let t = self.inner.bounding_box(target)?;
        let Ok(b) = self.inner.bounding_box(tool) else {
            return Ok(false);
        };
        if t.intersection(&b).is_none() {
            return Ok(false);
        }
        Ok((0..3).any(|i| {
            (b.min[i] - t.min[i]).abs() <= COPLANAR_TOL || (b.max[i] - t.max[i]).abs() <= COPLANAR_TOL
        }))
    }
}

impl Kernel for MockKernel {
    fn make_solid(&mut self, shape: &Shape) -> Result<SolidHandle, KernelError> {
        self.calls.push(MockCall::MakeSolid);
        self.inner.make_solid(shape)
    }

    fn boolean_union(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        self.calls.push(MockCall::Union);
        self.inner.boolean_union(a, b)
    }

    fn boolean_subtract(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        let noop = self.coplanar_noop && self.shares_face_plane(a, b)?;
        self.calls.push(MockCall::Subtract { noop });
        if noop {
            return self.inner.duplicate(a);
        }
        self.inner.boolean_subtract(a, b)
    }

    fn boolean_intersect(
        &mut self,
        a: &SolidHandle,
        b: &SolidHandle,
    ) -> Result<SolidHandle, KernelError> {
        self.calls.push(MockCall::Intersect);
        self.inner.boolean_intersect(a, b)
    }

    fn counterbore_holes(
        &mut self,
        solid: &SolidHandle,
        holes: &[Counterbore],
    ) -> Result<SolidHandle, KernelError> {
        self.calls.push(MockCall::Counterbore { holes: holes.len() });
        self.inner.counterbore_holes(solid, holes)
    }

    fn fillet_edges(
        &mut self,
        solid: &SolidHandle,
        selector: &EdgeSelector,
        radius: f64,
    ) -> Result<SolidHandle, KernelError> {
        let kind = selector.kind();
        self.calls.push(MockCall::Fillet {
            selector: kind,
            radius,
        });
        match self.fillet_faults.get(&kind) {
            Some(FilletFault::Fail) => Err(KernelError::FilletFailed {
                reason: format!("injected failure for {selector}"),
            }),
            Some(FilletFault::Panic) => panic!("injected fillet panic for {selector}"),
            None => self.inner.fillet_edges(solid, selector, radius),
        }
    }

    fn release(&mut self, solid: SolidHandle) {
        self.calls.push(MockCall::Release);
        self.inner.release(solid);
    }
}

impl KernelIntrospect for MockKernel {
    fn volume(&self, solid: &SolidHandle) -> Result<f64, KernelError> {
        let v = self.inner.volume(solid)?;
        Ok(if self.inverted { -v } else { v })
    }

    fn bounding_box(&self, solid: &SolidHandle) -> Result<BoundingBox, KernelError> {
        self.inner.bounding_box(solid)
    }

    fn check_validity(&self, solid: &SolidHandle) -> Result<ValidityReport, KernelError> {
        self.inner.check_validity(solid)
    }

    fn solid_count(&self) -> usize {
        self.inner.solid_count()
    }
}
