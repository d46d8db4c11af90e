use color_eyre::{eyre::ensure, Result};
use itertools::Itertools;
use serde::Serialize;

use crate::error::TreeSeqError::{ParentCycleError, RootError, TreeStateError};
use crate::structs::{NodeId, Position, NULL_NODE};

/// The tree that applies on `[left, right)`.
///
/// All per-node vectors are indexed by node id and have the same length. Inactive nodes have
/// parent `0`, time `0.0` and no children. Samples are `1..=sample_size` and never have children.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarginalTree {
    pub(crate) sample_size: u32,
    pub(crate) left: Position,
    pub(crate) right: Position,
    pub(crate) root: NodeId,
    pub(crate) parent: Vec<NodeId>,
    pub(crate) time: Vec<f64>,
    pub(crate) children: Vec<Option<[NodeId; 2]>>,
}

impl MarginalTree {
    pub fn new(sample_size: u32, num_nodes: usize) -> Self {
        Self {
            sample_size,
            left: 0,
            right: 0,
            root: NULL_NODE,
            parent: vec![NULL_NODE; num_nodes],
            time: vec![0.0; num_nodes],
            children: vec![None; num_nodes],
        }
    }

    pub fn left(&self) -> Position {
        self.left
    }

    pub fn right(&self) -> Position {
        self.right
    }

    pub fn interval(&self) -> (Position, Position) {
        (self.left, self.right)
    }

    pub fn span(&self) -> Position {
        self.right - self.left
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    pub fn num_nodes(&self) -> usize {
        self.parent.len()
    }

    pub fn is_sample(&self, u: NodeId) -> bool {
        u != NULL_NODE && u <= self.sample_size
    }

    pub fn parent(&self, u: NodeId) -> NodeId {
        self.parent.get(u as usize).copied().unwrap_or(NULL_NODE)
    }

    pub fn parents(&self) -> &[NodeId] {
        &self.parent
    }

    pub fn time(&self, u: NodeId) -> f64 {
        self.time.get(u as usize).copied().unwrap_or(0.0)
    }

    pub fn children(&self, u: NodeId) -> Option<[NodeId; 2]> {
        self.children.get(u as usize).copied().flatten()
    }

    /// Samples and internal nodes that are part of the current tree
    pub fn is_active(&self, u: NodeId) -> bool {
        self.is_sample(u) || self.children(u).is_some()
    }

    /// Nodes from `u` up to its root, inclusive
    pub fn path_to_root(&self, u: NodeId) -> Result<Vec<NodeId>> {
        let mut path = vec![];
        let mut v = u;
        while v != NULL_NODE {
            ensure!(path.len() < self.num_nodes(), ParentCycleError(u));
            path.push(v);
            v = self.parent(v);
        }
        Ok(path)
    }

    /// Most recent common ancestor of `u` and `v`, `None` if either is out of range or they
    /// are in different components
    pub fn mrca(&self, u: NodeId, v: NodeId) -> Option<NodeId> {
        let in_range = |w: NodeId| w != NULL_NODE && (w as usize) < self.num_nodes();
        if !in_range(u) || !in_range(v) {
            return None;
        }
        let path_u = self.path_to_root(u).ok()?;
        let path_v = self.path_to_root(v).ok()?;

        path_u
            .iter()
            .rev()
            .zip(path_v.iter().rev())
            .take_while(|(a, b)| a == b)
            .last()
            .map(|(a, _)| *a)
    }

    /// Number of samples under `u` by walking the subtree
    pub fn num_leaves_by_traversal(&self, u: NodeId) -> u32 {
        self.leaves_by_traversal(u).len() as u32
    }

    /// Samples under `u`, first child before second child
    pub fn leaves_by_traversal(&self, u: NodeId) -> Vec<NodeId> {
        self.preorder(u)
            .into_iter()
            .filter(|&v| self.is_sample(v))
            .collect()
    }

    /// Nodes of the subtree under `u` in preorder, first child before second child
    pub fn preorder(&self, u: NodeId) -> Vec<NodeId> {
        let mut nodes = vec![];
        if u == NULL_NODE || u as usize >= self.num_nodes() {
            return nodes;
        }
        let mut stack = vec![u];
        while let Some(v) = stack.pop() {
            nodes.push(v);
            if let Some([c1, c2]) = self.children(v) {
                stack.push(c2);
                stack.push(c1);
            }
        }
        nodes
    }

    /// Full structural check of the tree, used to validate incremental updates
    pub fn check_state(&self) -> Result<()> {
        let err = |msg: String| TreeStateError((self.left, msg));

        for (u, children) in self.children.iter().enumerate() {
            let Some([c1, c2]) = *children else {
                continue;
            };
            let u = u as NodeId;
            ensure!(!self.is_sample(u), err(format!("sample {u} has children")));
            for c in [c1, c2] {
                ensure!(
                    self.parent(c) == u,
                    err(format!("child {c} of {u} points to parent {}", self.parent(c)))
                );
                ensure!(
                    self.time(c) < self.time(u),
                    err(format!("child {c} is not younger than {u}"))
                );
            }
        }

        for u in 1..=self.sample_size {
            ensure!(self.time(u) == 0.0, err(format!("sample {u} has a time")));
            let path = self.path_to_root(u)?;
            for (&child, &parent) in path.iter().tuple_windows() {
                ensure!(
                    self.children(parent).is_some_and(|c| c.contains(&child)),
                    err(format!("{parent} is the parent of {child} but not listed as such"))
                );
            }
            let top = path.last().copied().unwrap_or(NULL_NODE);
            if self.root == NULL_NODE {
                ensure!(top == u, err(format!("sample {u} is linked in an empty tree")));
            } else {
                ensure!(top == self.root, RootError((self.root, self.left)));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for MarginalTree {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "[{}, {}) root = {}", self.left, self.right, self.root)?;
        for u in 1..self.num_nodes() as NodeId {
            if self.parent(u) == NULL_NODE && u != self.root {
                continue;
            }
            let children = self
                .children(u)
                .map(|c| c.iter().join(","))
                .unwrap_or_else(|| String::from("-"));
            writeln!(f, "{u}\t{}\t{children}\t{}", self.parent(u), self.time(u))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 5 = (1, 2), 6 = (5, 3) over three samples, node 4 is inactive
    fn small_tree() -> MarginalTree {
        let mut tree = MarginalTree::new(3, 7);
        tree.right = 10;
        tree.root = 6;
        tree.parent = vec![0, 5, 5, 6, 0, 6, 0];
        tree.time = vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.2, 0.7];
        tree.children[5] = Some([1, 2]);
        tree.children[6] = Some([5, 3]);
        tree
    }

    #[test]
    fn test_traversals() {
        let tree = small_tree();
        assert_eq!(tree.preorder(6), vec![6, 5, 1, 2, 3]);
        assert_eq!(tree.leaves_by_traversal(6), vec![1, 2, 3]);
        assert_eq!(tree.num_leaves_by_traversal(5), 2);
        assert_eq!(tree.num_leaves_by_traversal(3), 1);
        assert_eq!(tree.num_leaves_by_traversal(4), 0);
        assert!(tree.preorder(0).is_empty());
    }

    #[test]
    fn test_mrca() {
        let tree = small_tree();
        assert_eq!(tree.mrca(1, 2), Some(5));
        assert_eq!(tree.mrca(1, 3), Some(6));
        assert_eq!(tree.mrca(5, 1), Some(5));
        assert_eq!(tree.mrca(3, 3), Some(3));
        assert_eq!(tree.mrca(0, 3), None);
        assert_eq!(tree.mrca(1, 70), None);
        assert_eq!(tree.mrca(1, 4), None);
    }

    #[test]
    fn test_check_state() {
        let tree = small_tree();
        assert!(tree.check_state().is_ok());

        let mut broken = small_tree();
        broken.parent[2] = 6;
        assert!(broken.check_state().is_err());

        let mut cycle = small_tree();
        cycle.parent[6] = 5;
        assert!(cycle.check_state().is_err());

        assert!(MarginalTree::new(3, 4).check_state().is_ok());
    }

    #[test]
    fn test_display() {
        let tree = small_tree();
        let text = tree.to_string();
        assert!(text.starts_with("[0, 10) root = 6\n"));
        assert!(text.contains("5\t6\t1,2\t0.2\n"));
        assert!(text.contains("6\t0\t5,3\t0.7\n"));
        assert!(!text.contains("\n4\t"));
    }
}
