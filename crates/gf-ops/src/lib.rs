//! Geometric operations shared by every component type: the boolean cut
//! discipline, the hole strategy library, the pattern tiler and the safe
//! fillet stage. All of them talk to the kernel through [`KernelBundle`].

pub mod boolean;
pub mod fillet;
pub mod holes;
pub mod kernel_ext;
pub mod pattern;
pub mod types;

pub use boolean::{cut, fuse, CoplanarAdjustment, CutOutcome};
pub use fillet::{FilletGroup, FilletOutcome, FilletRecord, FilletResult};
pub use holes::{HoleFrame, HoleOutcome, HoleTool, RemovedVolume};
pub use kernel_ext::KernelBundle;
pub use pattern::{PatternError, PatternRegion, Placement, Tiling};
pub use types::*;
