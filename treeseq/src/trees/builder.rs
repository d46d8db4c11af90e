use crate::structs::{Position, RecordOrder, RecordStore, NULL_NODE};
use crate::trees::MarginalTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Nothing has been yielded yet
    Initial,
    /// The current tree has been yielded, the next call moves past its right end
    Active,
    /// Every record has been inserted and the last tree has been yielded
    Exhausted,
}

/// Sweep-line construction of the marginal trees, left to right.
///
/// Each step removes the records ending at the current right end (removal order), moves the
/// interval and inserts the records starting at the new left end (insertion order). Records
/// sharing an endpoint are applied as one batch before the tree is handed out. The builder is
/// forward-only, start a new one from the store to traverse again.
#[derive(Debug, Clone)]
pub struct TreeBuilder<'a> {
    store: &'a RecordStore,
    tree: MarginalTree,
    state: BuilderState,
    insertion_rank: usize,
    removal_rank: usize,
    // Record indices of the last batches
    removed: Vec<usize>,
    inserted: Vec<usize>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        let mut tree = MarginalTree::new(store.sample_size(), store.num_nodes());
        tree.right = store
            .index_by_rank(RecordOrder::Removal, 0)
            .map_or(store.sequence_length(), |idx| store.right(idx));

        Self {
            store,
            tree,
            state: BuilderState::Initial,
            insertion_rank: 0,
            removal_rank: 0,
            removed: vec![],
            inserted: vec![],
        }
    }

    pub fn store(&self) -> &'a RecordStore {
        self.store
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// The most recently yielded tree
    pub fn tree(&self) -> &MarginalTree {
        &self.tree
    }

    /// Record indices removed on the way into the current tree
    pub fn removed(&self) -> &[usize] {
        &self.removed
    }

    /// Record indices inserted on the way into the current tree
    pub fn inserted(&self) -> &[usize] {
        &self.inserted
    }

    /// Advance to the next tree without copying it
    pub fn next_tree(&mut self) -> Option<&MarginalTree> {
        match self.state {
            BuilderState::Initial => {
                self.activate();
                self.state = BuilderState::Active;
            }
            BuilderState::Active => {
                if self.insertion_rank == self.store.num_records() {
                    self.state = BuilderState::Exhausted;
                    return None;
                }
                self.deactivate();
                self.advance_interval();
                self.activate();
            }
            BuilderState::Exhausted => return None,
        }

        tracing::debug!(
            "Tree [{}, {}): {} records out, {} in, root {}",
            self.tree.left,
            self.tree.right,
            self.removed.len(),
            self.inserted.len(),
            self.tree.root
        );
        Some(&self.tree)
    }

    fn activate(&mut self) {
        self.inserted.clear();
        while let Some(idx) = self
            .store
            .index_by_rank(RecordOrder::Insertion, self.insertion_rank)
        {
            if self.store.left(idx) != self.tree.left {
                break;
            }
            let u = self.store.node(idx);
            let children = self.store.children(idx);
            for c in children {
                self.tree.parent[c as usize] = u;
            }
            self.tree.time[u as usize] = self.store.time(idx);
            self.tree.children[u as usize] = Some(children);
            if u > self.tree.root {
                self.tree.root = u;
            }
            tracing::trace!("Insert {}", self.store.record(idx));
            self.inserted.push(idx);
            self.insertion_rank += 1;
        }
        self.settle_root();
    }

    fn deactivate(&mut self) {
        self.removed.clear();
        while let Some(idx) = self
            .store
            .index_by_rank(RecordOrder::Removal, self.removal_rank)
        {
            if self.store.right(idx) != self.tree.right {
                break;
            }
            let u = self.store.node(idx);
            let children = self.store.children(idx);
            for c in children {
                self.tree.parent[c as usize] = NULL_NODE;
            }
            self.tree.time[u as usize] = 0.0;
            self.tree.children[u as usize] = None;
            if u == self.tree.root {
                self.tree.root = children[0].max(children[1]);
            }
            tracing::trace!("Remove {}", self.store.record(idx));
            self.removed.push(idx);
            self.removal_rank += 1;
        }
    }

    fn advance_interval(&mut self) {
        self.tree.left = self.tree.right;
        self.tree.right = self.next_breakpoint();
    }

    fn next_breakpoint(&self) -> Position {
        self.store
            .index_by_rank(RecordOrder::Removal, self.removal_rank)
            .map_or(self.store.sequence_length(), |idx| self.store.right(idx))
    }

    // Walk up from the tracked root until a parentless node is reached. The store rejects
    // cycles, so the step cap is never hit for a validated store.
    fn settle_root(&mut self) {
        let mut root = self.tree.root;
        if root == NULL_NODE {
            return;
        }
        let mut steps = 0;
        while self.tree.parent[root as usize] != NULL_NODE && steps < self.tree.num_nodes() {
            root = self.tree.parent[root as usize];
            steps += 1;
        }
        self.tree.root = root;
    }
}

impl Iterator for TreeBuilder<'_> {
    type Item = MarginalTree;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_tree().cloned()
    }
}
