use gf_kernel::{Kernel, KernelIntrospect, SolidHandle};

use crate::types::OpError;

/// Combined trait for operations that need both mutable Kernel access
/// and read-only KernelIntrospect access on the same object.
pub trait KernelBundle: Kernel + KernelIntrospect {
    fn as_introspect(&self) -> &dyn KernelIntrospect;

    /// Volume of `solid`, mapped into the operation error type.
    fn volume_of(&self, solid: &SolidHandle) -> Result<f64, OpError> {
        Ok(self.as_introspect().volume(solid)?)
    }
}

impl<T: Kernel + KernelIntrospect> KernelBundle for T {
    fn as_introspect(&self) -> &dyn KernelIntrospect {
        self
    }
}
