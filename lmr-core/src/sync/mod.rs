//! The sync layer (§4.2): the symbol slicer and scanner, the sync-type
//! registry, and CQPSK constellation-permutation recovery.

pub mod permutation;
pub mod registry;
pub mod slicer;

pub use permutation::{recover_permutation, AtomicPermutationState, PermutationResult, SearchPath};
pub use registry::{Polarity, SyncId, SyncRegistry};
pub use slicer::{SlicerThresholds, SymbolSlicer, SyncFound, WarmStartResult};
