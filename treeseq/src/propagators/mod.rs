use color_eyre::Result;

use crate::trees::{MarginalTree, TreeDiff};

pub mod leaf_counts;
pub mod leaf_sets;
pub mod traversal;

pub use leaf_counts::LeafCounts;
pub use leaf_sets::{LeafSets, Leaves};
pub use traversal::{Traversal, TraversalStep};

/// Per-node state kept in step with the tree by applying one diff per breakpoint
pub trait Propagator {
    fn apply(&mut self, diff: &TreeDiff) -> Result<()>;

    /// Compare the incremental state against a direct recount on `tree`
    fn verify(&self, tree: &MarginalTree) -> Result<()>;
}

