use serde::Serialize;

use crate::structs::{Position, Record, RecordStore};
use crate::trees::{MarginalTree, TreeBuilder};

/// Records leaving and entering the active set on the way into the tree on `[left, right)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeDiff {
    pub left: Position,
    pub right: Position,
    pub records_out: Vec<Record>,
    pub records_in: Vec<Record>,
}

impl TreeDiff {
    pub fn span(&self) -> Position {
        self.right - self.left
    }
}

/// The diff sequence, one diff per marginal tree. The first diff has no records out.
#[derive(Debug, Clone)]
pub struct TreeDiffs<'a> {
    builder: TreeBuilder<'a>,
}

impl<'a> TreeDiffs<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self {
            builder: TreeBuilder::new(store),
        }
    }

    /// Advance the sweep by one tree and collect the batches that produced it
    pub fn next_diff(&mut self) -> Option<TreeDiff> {
        let (left, right) = self.builder.next_tree()?.interval();
        let store = self.builder.store();

        Some(TreeDiff {
            left,
            right,
            records_out: self.builder.removed().iter().map(|&idx| store.record(idx)).collect(),
            records_in: self.builder.inserted().iter().map(|&idx| store.record(idx)).collect(),
        })
    }

    /// The tree the last diff leads into
    pub fn tree(&self) -> &MarginalTree {
        self.builder.tree()
    }
}

impl Iterator for TreeDiffs<'_> {
    type Item = TreeDiff;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_diff()
    }
}
