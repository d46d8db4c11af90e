use color_eyre::Result;

use crate::propagators::{LeafCounts, LeafSets, Propagator};
use crate::structs::{NodeId, RecordStore};
use crate::trees::{MarginalTree, TreeDiff, TreeDiffs};

/// One position of a traversal: the tree, the diff that led to it and the enabled propagators
#[derive(Debug)]
pub struct TraversalStep<'t> {
    pub tree: &'t MarginalTree,
    pub diff: TreeDiff,
    pub leaf_counts: Option<&'t LeafCounts>,
    pub leaf_sets: Option<&'t LeafSets>,
}

/// Drives the sweep and feeds each diff to the enabled propagators
#[derive(Debug)]
pub struct Traversal<'a> {
    store: &'a RecordStore,
    diffs: TreeDiffs<'a>,
    leaf_counts: Option<LeafCounts>,
    leaf_sets: Option<LeafSets>,
    check_consistency: bool,
    num_trees: usize,
    num_changes: usize,
    finished: bool,
}

impl<'a> Traversal<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self {
            store,
            diffs: TreeDiffs::new(store),
            leaf_counts: None,
            leaf_sets: None,
            check_consistency: false,
            num_trees: 0,
            num_changes: 0,
            finished: false,
        }
    }

    pub fn with_leaf_counts(mut self) -> Self {
        self.leaf_counts = Some(LeafCounts::new(self.store));
        self
    }

    /// Leaf counts that also count the given samples separately
    pub fn with_tracked_samples(mut self, samples: &[NodeId]) -> Result<Self> {
        self.leaf_counts = Some(LeafCounts::with_tracked_samples(self.store, samples)?);
        Ok(self)
    }

    pub fn with_leaf_sets(mut self) -> Self {
        self.leaf_sets = Some(LeafSets::new(self.store));
        self
    }

    /// Verify the tree and every propagator against full recounts after each step
    pub fn with_consistency_checks(mut self, check: bool) -> Self {
        self.check_consistency = check;
        self
    }

    pub fn num_trees(&self) -> usize {
        self.num_trees
    }

    pub fn next_step(&mut self) -> Result<Option<TraversalStep<'_>>> {
        let Some(diff) = self.diffs.next_diff() else {
            if !self.finished {
                self.finished = true;
                tracing::info!(
                    "Traversed {} trees with {} record changes over [0, {}).",
                    self.num_trees,
                    self.num_changes,
                    self.store.sequence_length()
                );
            }
            return Ok(None);
        };

        for propagator in self.propagators_mut() {
            propagator.apply(&diff)?;
        }

        if self.check_consistency {
            let tree = self.diffs.tree();
            tree.check_state()?;
            for propagator in self.propagators() {
                propagator.verify(tree)?;
            }
        }

        self.num_trees += 1;
        self.num_changes += diff.records_out.len() + diff.records_in.len();

        Ok(Some(TraversalStep {
            tree: self.diffs.tree(),
            diff,
            leaf_counts: self.leaf_counts.as_ref(),
            leaf_sets: self.leaf_sets.as_ref(),
        }))
    }

    fn propagators(&self) -> impl Iterator<Item = &dyn Propagator> + '_ {
        let counts = self.leaf_counts.iter().map(|p| p as &dyn Propagator);
        let sets = self.leaf_sets.iter().map(|p| p as &dyn Propagator);
        counts.chain(sets)
    }

    fn propagators_mut(&mut self) -> impl Iterator<Item = &mut dyn Propagator> + '_ {
        let counts = self.leaf_counts.iter_mut().map(|p| p as &mut dyn Propagator);
        let sets = self.leaf_sets.iter_mut().map(|p| p as &mut dyn Propagator);
        counts.chain(sets)
    }
}
