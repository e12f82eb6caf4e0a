//! Coverage reconciliation and worklist construction.
//!
//! [`reconcile`] intersects the changed files of a pull request with a
//! coverage report; [`worklist`] turns the selection into the capped list of
//! descriptors handed to the generator.

pub mod reconcile;
pub mod types;
pub mod worklist;

pub use reconcile::analyze_changed_files;
pub use types::{
    DescriptorGroup, FilterReason, FilteredTestable, FilteredTestablesResult, TestableDescriptor,
    TestableFilterConfig, WorklistEntry,
};
pub use worklist::{build_worklist, TestableLimit};
