//! Solid-modeling kernel boundary.
//!
//! The pipeline only ever talks to the [`Kernel`] and [`KernelIntrospect`]
//! traits. [`SectionKernel`] is the exact implementation; [`MockKernel`]
//! wraps it with fault injection for tests.

mod csg;
mod integrate;
pub mod intervals;
pub mod mock_kernel;
pub mod section;
pub mod section_kernel;
pub mod shape;
pub mod traits;
pub mod types;

pub use mock_kernel::{FilletFault, MockCall, MockKernel};
pub use section::Section;
pub use section_kernel::SectionKernel;
pub use shape::{Axis, InsetProfile, InsetSegment, Prism, Shape, Side};
pub use traits::*;
pub use types::*;
