use color_eyre::{eyre::ensure, Result};

use crate::error::TreeSeqError::{LeafListError, ParentCycleError, RootError, TreeStateError};
use crate::propagators::Propagator;
use crate::structs::{NodeId, RecordStore, NULL_NODE};
use crate::trees::{MarginalTree, TreeDiff};

/// Ordered leaf lists for every node, threaded through one arena of samples.
///
/// `head[u]` and `tail[u]` are the first and last sample under `u`, `next[v]` links a sample to
/// the sample after it. Following `next` from `head[u]` ends at `tail[u]` after visiting every
/// sample under `u`, first child before second child. Sample lists are never copied, a removal
/// only cuts the links its children contributed and an insertion re-splices them upwards.
#[derive(Debug, Clone)]
pub struct LeafSets {
    sample_size: u32,
    parent: Vec<NodeId>,
    children: Vec<Option<[NodeId; 2]>>,
    head: Vec<Option<NodeId>>,
    tail: Vec<Option<NodeId>>,
    next: Vec<Option<NodeId>>,
}

impl LeafSets {
    pub fn new(store: &RecordStore) -> Self {
        let n = store.num_nodes();
        let mut head = vec![None; n];
        let mut tail = vec![None; n];
        for u in 1..=store.sample_size() {
            head[u as usize] = Some(u);
            tail[u as usize] = Some(u);
        }

        Self {
            sample_size: store.sample_size(),
            parent: vec![NULL_NODE; n],
            children: vec![None; n],
            head,
            tail,
            next: vec![None; n],
        }
    }

    pub fn head(&self, u: NodeId) -> Option<NodeId> {
        self.head.get(u as usize).copied().flatten()
    }

    pub fn tail(&self, u: NodeId) -> Option<NodeId> {
        self.tail.get(u as usize).copied().flatten()
    }

    /// Samples under `u` in tree order, empty for inactive nodes
    pub fn leaves_of(&self, u: NodeId) -> Leaves<'_> {
        Leaves {
            sets: self,
            current: self.head(u),
            last: self.tail(u),
            remaining: self.sample_size,
        }
    }

    fn remove(&mut self, node: NodeId, children: [NodeId; 2]) {
        for c in children {
            self.parent[c as usize] = NULL_NODE;
            if let Some(t) = self.tail[c as usize] {
                self.next[t as usize] = None;
            }
        }
        let u = node as usize;
        self.head[u] = None;
        self.tail[u] = None;
        self.children[u] = None;
    }

    fn insert(&mut self, node: NodeId, children: [NodeId; 2]) -> Result<()> {
        for c in children {
            self.parent[c as usize] = node;
        }
        self.children[node as usize] = Some(children);

        let mut steps = 0;
        let mut u = node;
        while u != NULL_NODE {
            ensure!(steps < self.parent.len(), ParentCycleError(node));
            if let Some([d1, d2]) = self.children[u as usize] {
                self.head[u as usize] = self.head[d1 as usize];
                self.tail[u as usize] = self.tail[d2 as usize];
            }
            u = self.parent[u as usize];
            steps += 1;
        }
        Ok(())
    }

    // Joins the list of each first child to its sibling on the way up from `node`
    fn splice(&mut self, node: NodeId) -> Result<()> {
        let mut steps = 0;
        let mut u = node;
        while u != NULL_NODE {
            ensure!(steps < self.parent.len(), ParentCycleError(node));
            if let Some([d1, d2]) = self.children[u as usize] {
                let Some(t) = self.tail[d1 as usize] else {
                    break;
                };
                self.next[t as usize] = self.head[d2 as usize];
            }
            u = self.parent[u as usize];
            steps += 1;
        }
        Ok(())
    }
}

impl Propagator for LeafSets {
    fn apply(&mut self, diff: &TreeDiff) -> Result<()> {
        for record in &diff.records_out {
            self.remove(record.node, record.children);
        }
        for record in &diff.records_in {
            self.insert(record.node, record.children)?;
        }
        for record in &diff.records_in {
            self.splice(record.node)?;
        }
        Ok(())
    }

    fn verify(&self, tree: &MarginalTree) -> Result<()> {
        for u in 1..self.parent.len() as NodeId {
            ensure!(
                self.parent[u as usize] == tree.parent(u),
                TreeStateError((tree.left(), format!("leaf sets see another parent for {u}")))
            );
            let leaves = self.leaves_of(u).collect::<Vec<_>>();
            ensure!(
                leaves == tree.leaves_by_traversal(u),
                LeafListError((u, tree.left()))
            );
        }

        let root = tree.root();
        if root != NULL_NODE {
            let mut leaves = self.leaves_of(root).collect::<Vec<_>>();
            leaves.sort_unstable();
            ensure!(
                leaves.into_iter().eq(1..=self.sample_size),
                RootError((root, tree.left()))
            );
        }
        Ok(())
    }
}

/// Iterator over the leaf list of one node
#[derive(Debug, Clone)]
pub struct Leaves<'a> {
    sets: &'a LeafSets,
    current: Option<NodeId>,
    last: Option<NodeId>,
    // A broken list could loop, no node has more leaves than there are samples
    remaining: u32,
}

impl Iterator for Leaves<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let u = self.current?;
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.current = if Some(u) == self.last {
            None
        } else {
            self.sets.next[u as usize]
        };
        Some(u)
    }
}
