pub mod builder;
pub mod diffs;
pub mod marginal;

pub use builder::{BuilderState, TreeBuilder};
pub use diffs::{TreeDiff, TreeDiffs};
pub use marginal::MarginalTree;
