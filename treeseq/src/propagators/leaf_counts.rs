use color_eyre::{
    eyre::{ensure, eyre},
    Result,
};

use crate::error::TreeSeqError::{
    CountUnderflowError, LeafCountError, ParentCycleError, TrackedSampleError, TreeStateError,
};
use crate::propagators::Propagator;
use crate::structs::{NodeId, RecordStore, NULL_NODE};
use crate::trees::{MarginalTree, TreeDiff};

/// Number of samples, and of tracked samples, under every node.
///
/// Removing a record subtracts its count along the path to the root before the node leaves the
/// tree, inserting one adds the counts of its two children along the new path.
#[derive(Debug, Clone)]
pub struct LeafCounts {
    sample_size: u32,
    parent: Vec<NodeId>,
    counts: Vec<u32>,
    tracked: Vec<u32>,
    num_tracked: u32,
}

impl LeafCounts {
    pub fn new(store: &RecordStore) -> Self {
        let n = store.num_nodes();
        let mut counts = vec![0; n];
        for u in 1..=store.sample_size() {
            counts[u as usize] = 1;
        }

        Self {
            sample_size: store.sample_size(),
            parent: vec![NULL_NODE; n],
            counts,
            tracked: vec![0; n],
            num_tracked: 0,
        }
    }

    pub fn with_tracked_samples(store: &RecordStore, samples: &[NodeId]) -> Result<Self> {
        let mut leaf_counts = Self::new(store);
        for &u in samples {
            ensure!(store.is_sample(u), TrackedSampleError(u));
            leaf_counts.tracked[u as usize] = 1;
        }
        leaf_counts.num_tracked = leaf_counts.tracked.iter().sum();
        tracing::debug!("Tracking {} samples", leaf_counts.num_tracked);
        Ok(leaf_counts)
    }

    pub fn leaf_count(&self, u: NodeId) -> u32 {
        self.counts.get(u as usize).copied().unwrap_or(0)
    }

    pub fn tracked_leaf_count(&self, u: NodeId) -> u32 {
        self.tracked.get(u as usize).copied().unwrap_or(0)
    }

    pub fn num_tracked(&self) -> u32 {
        self.num_tracked
    }

    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    fn is_tracked(&self, u: NodeId) -> bool {
        u != NULL_NODE && u <= self.sample_size && self.tracked[u as usize] == 1
    }

    fn propagate_up(&mut self, u: NodeId, delta: i64, tracked_delta: i64) -> Result<()> {
        let mut v = u;
        let mut steps = 0;
        while v != NULL_NODE {
            ensure!(steps < self.parent.len(), ParentCycleError(u));
            let idx = v as usize;
            self.counts[idx] =
                shift(self.counts[idx], delta).ok_or_else(|| eyre!(CountUnderflowError(v)))?;
            self.tracked[idx] = shift(self.tracked[idx], tracked_delta)
                .ok_or_else(|| eyre!(CountUnderflowError(v)))?;
            v = self.parent[idx];
            steps += 1;
        }
        Ok(())
    }
}

fn shift(count: u32, delta: i64) -> Option<u32> {
    u32::try_from(i64::from(count) + delta).ok()
}

impl Propagator for LeafCounts {
    fn apply(&mut self, diff: &TreeDiff) -> Result<()> {
        for record in &diff.records_out {
            for c in record.children {
                self.parent[c as usize] = NULL_NODE;
            }
            let u = record.node as usize;
            let (k, kt) = (self.counts[u], self.tracked[u]);
            self.propagate_up(record.node, -i64::from(k), -i64::from(kt))?;
        }

        for record in &diff.records_in {
            let [c1, c2] = record.children;
            for c in [c1, c2] {
                self.parent[c as usize] = record.node;
            }
            let k = self.counts[c1 as usize] + self.counts[c2 as usize];
            let kt = self.tracked[c1 as usize] + self.tracked[c2 as usize];
            self.propagate_up(record.node, i64::from(k), i64::from(kt))?;
        }
        Ok(())
    }

    fn verify(&self, tree: &MarginalTree) -> Result<()> {
        for u in 1..self.parent.len() as NodeId {
            ensure!(
                self.parent[u as usize] == tree.parent(u),
                TreeStateError((tree.left(), format!("leaf counts see another parent for {u}")))
            );

            let leaves = tree.leaves_by_traversal(u);
            let expected = leaves.len() as u32;
            ensure!(
                self.leaf_count(u) == expected,
                LeafCountError((u, expected, self.leaf_count(u)))
            );

            let expected = leaves.iter().filter(|&&v| self.is_tracked(v)).count() as u32;
            ensure!(
                self.tracked_leaf_count(u) == expected,
                LeafCountError((u, expected, self.tracked_leaf_count(u)))
            );
        }
        Ok(())
    }
}
