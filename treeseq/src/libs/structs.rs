use color_eyre::{
    eyre::{ensure, eyre},
    Result,
};
use serde::{Deserialize, Serialize};

use crate::error::TreeSeqError::{
    ChildCountError, CoverageError, DanglingChildError, DuplicateChildError, EmptyIntervalError,
    IdOrderError, IncompleteTreeError, IntervalBoundsError, MultipleParentsError, NodeOverlapError,
    NodeRangeError, NodeTimeError, SampleAsParentError, SelfChildError, SentinelChildError,
    TimeOrderError, TimeValueError, UnknownChildError, ZeroLengthError, ZeroSamplesError,
};

/// Node identifier, `0` is reserved for the null node
pub type NodeId = u32;

/// Genome coordinate (locus)
pub type Position = u32;

/// The null node: "no parent" in parent links, "no root" in an empty tree
pub const NULL_NODE: NodeId = 0;

/// A coalescence record: over `[left, right)` the two `children` coalesce into `node` at `time`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub left: Position,
    pub right: Position,
    pub node: NodeId,
    pub children: [NodeId; 2],
    pub time: f64,
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}, {}) {} -> ({}, {}) @ {}",
            self.left, self.right, self.node, self.children[0], self.children[1], self.time
        )
    }
}

/// A record as it comes out of a file, before the number of children has been checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub left: Position,
    pub right: Position,
    pub node: NodeId,
    pub children: Vec<NodeId>,
    pub time: f64,
}

impl RawRecord {
    pub fn into_record(self, idx: usize) -> Result<Record> {
        let children: [NodeId; 2] = self
            .children
            .as_slice()
            .try_into()
            .map_err(|_| eyre!(ChildCountError((idx, self.children.len()))))?;

        Ok(Record {
            left: self.left,
            right: self.right,
            node: self.node,
            children,
            time: self.time,
        })
    }
}

impl From<Record> for RawRecord {
    fn from(record: Record) -> Self {
        Self {
            left: record.left,
            right: record.right,
            node: record.node,
            children: record.children.to_vec(),
            time: record.time,
        }
    }
}

/// The two total orders the sweep consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum RecordOrder {
    /// Ascending by `(left, time)`
    #[default]
    Insertion,
    /// Ascending by `right`, older records first on ties
    Removal,
}

/// Validated, columnar view of all records with the insertion and removal orders precomputed.
///
/// The store is read-only after construction, any number of traversals can borrow it at once.
#[derive(Debug, Clone)]
pub struct RecordStore {
    sample_size: u32,
    num_nodes: usize,
    sequence_length: Position,
    left: Vec<Position>,
    right: Vec<Position>,
    node: Vec<NodeId>,
    children: Vec<[NodeId; 2]>,
    time: Vec<f64>,
    // Permutations of record indices
    insertion_order: Vec<usize>,
    removal_order: Vec<usize>,
    // Per node id, 0.0 for samples and for ids without records
    node_time: Vec<f64>,
}

impl RecordStore {
    pub fn new(sample_size: u32, sequence_length: Position, records: Vec<Record>) -> Result<Self> {
        ensure!(sample_size >= 1, ZeroSamplesError);
        ensure!(sequence_length > 0, ZeroLengthError);

        // Every internal node has at least one record, larger ids can only be malformed
        let max_node = NodeId::try_from(u64::from(sample_size) + records.len() as u64)
            .unwrap_or(NodeId::MAX);
        for (idx, record) in records.iter().enumerate() {
            check_record(idx, record, sample_size, sequence_length, max_node)?;
        }

        let num_nodes = records
            .iter()
            .flat_map(|r| [r.node, r.children[0], r.children[1]])
            .max()
            .unwrap_or(NULL_NODE)
            .max(sample_size) as usize
            + 1;

        let mut store = Self {
            sample_size,
            num_nodes,
            sequence_length,
            left: records.iter().map(|r| r.left).collect(),
            right: records.iter().map(|r| r.right).collect(),
            node: records.iter().map(|r| r.node).collect(),
            children: records.iter().map(|r| r.children).collect(),
            time: records.iter().map(|r| r.time).collect(),
            insertion_order: (0..records.len()).collect(),
            removal_order: (0..records.len()).collect(),
            node_time: vec![0.0; num_nodes],
        };

        store.set_node_times()?;
        store.check_time_order()?;
        store.sort_orders();
        store.check_topology()?;

        tracing::info!(
            "Indexed {} records over {} samples and {} nodes on [0, {}).",
            store.num_records(),
            store.sample_size,
            store.num_nodes,
            store.sequence_length
        );

        Ok(store)
    }

    pub fn from_raw(
        sample_size: u32,
        sequence_length: Position,
        records: Vec<RawRecord>,
    ) -> Result<Self> {
        let records = records
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| raw.into_record(idx))
            .collect::<Result<Vec<Record>>>()?;
        Self::new(sample_size, sequence_length, records)
    }

    fn set_node_times(&mut self) -> Result<()> {
        let mut has_record = vec![false; self.num_nodes];

        for idx in 0..self.num_records() {
            let (u, t) = (self.node[idx] as usize, self.time[idx]);
            if has_record[u] {
                ensure!(
                    self.node_time[u] == t,
                    NodeTimeError((self.node[idx], self.node_time[u], t))
                );
            }
            has_record[u] = true;
            self.node_time[u] = t;
        }

        for idx in 0..self.num_records() {
            for c in self.children[idx] {
                if self.is_sample(c) {
                    continue;
                }
                ensure!(has_record[c as usize], UnknownChildError((idx, c)));
                ensure!(
                    self.node_time[c as usize] < self.time[idx],
                    TimeOrderError((self.node[idx], c))
                );
            }
        }
        Ok(())
    }

    // Root tracking relies on the oldest node having the largest id
    fn check_time_order(&self) -> Result<()> {
        let mut previous: Option<(NodeId, f64)> = None;
        for u in (self.sample_size + 1) as usize..self.num_nodes {
            let t = self.node_time[u];
            if t == 0.0 {
                continue;
            }
            if let Some((v, prev_t)) = previous {
                ensure!(prev_t <= t, IdOrderError((v, u as NodeId)));
            }
            previous = Some((u as NodeId, t));
        }
        Ok(())
    }

    fn sort_orders(&mut self) {
        let (left, right, time) = (&self.left, &self.right, &self.time);
        self.insertion_order
            .sort_by(|&a, &b| left[a].cmp(&left[b]).then(time[a].total_cmp(&time[b])));
        self.removal_order
            .sort_by(|&a, &b| right[a].cmp(&right[b]).then(time[b].total_cmp(&time[a])));
    }

    // Dry run over every breakpoint: each tree must be complete and binary
    fn check_topology(&self) -> Result<()> {
        let m = self.num_records();
        if m == 0 {
            return Ok(());
        }

        let first_left = self.left.iter().min().copied().unwrap_or(0);
        let last_right = self.right.iter().max().copied().unwrap_or(0);
        ensure!(
            first_left == 0 && last_right == self.sequence_length,
            CoverageError((first_left, last_right, self.sequence_length))
        );

        let expected = (self.sample_size - 1) as usize;
        let mut parent = vec![NULL_NODE; self.num_nodes];
        let mut active = vec![false; self.num_nodes];
        let mut n_active = 0;
        let (mut j, mut k) = (0, 0);

        loop {
            let next_in = self.insertion_order.get(j).map(|&idx| self.left[idx]);
            let next_out = self.removal_order.get(k).map(|&idx| self.right[idx]);
            let pos = match (next_in, next_out) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) | (None, Some(a)) => a,
                (None, None) => break,
            };
            if pos >= self.sequence_length {
                break;
            }

            let mut removed = vec![];
            while k < m && self.right[self.removal_order[k]] == pos {
                let idx = self.removal_order[k];
                for c in self.children[idx] {
                    parent[c as usize] = NULL_NODE;
                }
                active[self.node[idx] as usize] = false;
                n_active -= 1;
                removed.push(self.node[idx]);
                k += 1;
            }

            let mut inserted = vec![];
            while j < m && self.left[self.insertion_order[j]] == pos {
                let idx = self.insertion_order[j];
                let u = self.node[idx];
                ensure!(!active[u as usize], NodeOverlapError((u, pos)));
                for c in self.children[idx] {
                    ensure!(
                        parent[c as usize] == NULL_NODE,
                        MultipleParentsError((c, pos))
                    );
                    parent[c as usize] = u;
                }
                active[u as usize] = true;
                n_active += 1;
                inserted.push(idx);
                j += 1;
            }

            ensure!(
                n_active == expected,
                IncompleteTreeError((pos, n_active, expected))
            );
            for idx in inserted {
                for c in self.children[idx] {
                    ensure!(
                        self.is_sample(c) || active[c as usize],
                        DanglingChildError((c, pos))
                    );
                }
            }
            for u in removed {
                ensure!(
                    active[u as usize] || parent[u as usize] == NULL_NODE,
                    DanglingChildError((u, pos))
                );
            }
            tracing::trace!("Breakpoint {pos} holds a complete tree");
        }
        Ok(())
    }

    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    /// One more than the largest node id, the length of every per-node array
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    pub fn num_records(&self) -> usize {
        self.node.len()
    }

    pub fn sequence_length(&self) -> Position {
        self.sequence_length
    }

    pub fn is_sample(&self, u: NodeId) -> bool {
        u != NULL_NODE && u <= self.sample_size
    }

    pub fn node_time(&self, u: NodeId) -> f64 {
        self.node_time.get(u as usize).copied().unwrap_or(0.0)
    }

    pub fn left(&self, idx: usize) -> Position {
        self.left[idx]
    }

    pub fn right(&self, idx: usize) -> Position {
        self.right[idx]
    }

    pub fn node(&self, idx: usize) -> NodeId {
        self.node[idx]
    }

    pub fn children(&self, idx: usize) -> [NodeId; 2] {
        self.children[idx]
    }

    pub fn time(&self, idx: usize) -> f64 {
        self.time[idx]
    }

    /// Record at `idx` in input order
    pub fn record(&self, idx: usize) -> Record {
        Record {
            left: self.left[idx],
            right: self.right[idx],
            node: self.node[idx],
            children: self.children[idx],
            time: self.time[idx],
        }
    }

    /// Record index at `rank` of the given order
    pub fn index_by_rank(&self, order: RecordOrder, rank: usize) -> Option<usize> {
        match order {
            RecordOrder::Insertion => self.insertion_order.get(rank).copied(),
            RecordOrder::Removal => self.removal_order.get(rank).copied(),
        }
    }

    pub fn record_by_rank(&self, order: RecordOrder, rank: usize) -> Option<Record> {
        self.index_by_rank(order, rank).map(|idx| self.record(idx))
    }

    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        (0..self.num_records()).map(|idx| self.record(idx))
    }

    pub fn records_in_order(&self, order: RecordOrder) -> impl Iterator<Item = Record> + '_ {
        let permutation = match order {
            RecordOrder::Insertion => &self.insertion_order,
            RecordOrder::Removal => &self.removal_order,
        };
        permutation.iter().map(|&idx| self.record(idx))
    }
}

fn check_record(
    idx: usize,
    record: &Record,
    sample_size: u32,
    length: Position,
    max_node: NodeId,
) -> Result<()> {
    let [c1, c2] = record.children;
    ensure!(
        record.left < record.right,
        EmptyIntervalError((idx, record.left, record.right))
    );
    ensure!(
        record.right <= length,
        IntervalBoundsError((idx, record.right, length))
    );
    ensure!(
        record.node > sample_size,
        SampleAsParentError((idx, record.node))
    );
    ensure!(
        c1 != NULL_NODE && c2 != NULL_NODE,
        SentinelChildError(idx)
    );
    ensure!(
        c1 != record.node && c2 != record.node,
        SelfChildError((idx, record.node))
    );
    for u in [record.node, c1, c2] {
        ensure!(u <= max_node, NodeRangeError((idx, u, max_node)));
    }
    ensure!(c1 != c2, DuplicateChildError((idx, c1)));
    ensure!(
        record.time.is_finite() && record.time > 0.0,
        TimeValueError((idx, record.time))
    );
    Ok(())
}

#[cfg(test)]
#[rustfmt::skip]
mod tests {
    use super::*;
    use crate::error::TreeSeqError;

    fn record(left: Position, right: Position, node: NodeId, children: [NodeId; 2], time: f64) -> Record {
        Record { left, right, node, children, time }
    }

    fn error_of(result: Result<RecordStore>) -> TreeSeqError {
        result.unwrap_err().downcast_ref::<TreeSeqError>().unwrap().clone()
    }

    #[test]
    fn test_orders() {
        // Tree 1: 5 = (4, 3), tree 2: 6 = (4, 3), both over 4 = (1, 2)
        let records = vec![
            record(0, 5, 5, [4, 3], 0.8),
            record(5, 10, 6, [4, 3], 0.9),
            record(0, 10, 4, [1, 2], 0.3),
        ];
        let store = RecordStore::new(3, 10, records).unwrap();

        let insertion = store.records_in_order(RecordOrder::Insertion).map(|r| r.node).collect::<Vec<_>>();
        assert_eq!(insertion, vec![4, 5, 6]);

        let removal = store.records_in_order(RecordOrder::Removal).map(|r| r.node).collect::<Vec<_>>();
        assert_eq!(removal, vec![5, 6, 4]);

        assert_eq!(store.num_nodes(), 7);
        assert_eq!(store.record_by_rank(RecordOrder::Removal, 0).unwrap().node, 5);
        assert_eq!(store.record_by_rank(RecordOrder::Insertion, 3), None);
        assert_eq!(store.node_time(5), 0.8);
        assert_eq!(store.node_time(2), 0.0);
    }

    #[test]
    fn test_removal_ties_oldest_first() {
        let records = vec![
            record(0, 10, 4, [1, 2], 0.3),
            record(0, 10, 5, [4, 3], 0.8),
        ];
        let store = RecordStore::new(3, 10, records).unwrap();
        let removal = store.records_in_order(RecordOrder::Removal).map(|r| r.node).collect::<Vec<_>>();
        assert_eq!(removal, vec![5, 4]);
    }

    #[test]
    fn test_empty_store() {
        let store = RecordStore::new(4, 100, vec![]).unwrap();
        assert_eq!(store.num_records(), 0);
        assert_eq!(store.num_nodes(), 5);
        assert!(store.is_sample(4));
        assert!(!store.is_sample(0));
    }

    #[test]
    fn test_zero_samples() {
        assert_eq!(error_of(RecordStore::new(0, 10, vec![])), TreeSeqError::ZeroSamplesError);
    }

    #[test]
    fn test_zero_length() {
        assert_eq!(error_of(RecordStore::new(3, 0, vec![])), TreeSeqError::ZeroLengthError);
    }

    #[test]
    fn test_child_count() {
        let raw = RawRecord { left: 0, right: 10, node: 4, children: vec![1, 2, 3], time: 0.5 };
        let result = RecordStore::from_raw(3, 10, vec![raw]);
        assert_eq!(error_of(result), TreeSeqError::ChildCountError((0, 3)));
    }

    #[test]
    fn test_record_checks() {
        let result = RecordStore::new(2, 10, vec![record(4, 4, 3, [1, 2], 0.5)]);
        assert_eq!(error_of(result), TreeSeqError::EmptyIntervalError((0, 4, 4)));

        let result = RecordStore::new(2, 10, vec![record(0, 12, 3, [1, 2], 0.5)]);
        assert_eq!(error_of(result), TreeSeqError::IntervalBoundsError((0, 12, 10)));

        let result = RecordStore::new(2, 10, vec![record(0, 10, 2, [1, 3], 0.5)]);
        assert_eq!(error_of(result), TreeSeqError::SampleAsParentError((0, 2)));

        let result = RecordStore::new(2, 10, vec![record(0, 10, 3, [0, 2], 0.5)]);
        assert_eq!(error_of(result), TreeSeqError::SentinelChildError(0));

        let result = RecordStore::new(2, 10, vec![record(0, 10, 3, [1, 1], 0.5)]);
        assert_eq!(error_of(result), TreeSeqError::DuplicateChildError((0, 1)));

        let result = RecordStore::new(2, 10, vec![record(0, 10, 3, [1, 2], -1.0)]);
        assert_eq!(error_of(result), TreeSeqError::TimeValueError((0, -1.0)));
    }

    #[test]
    fn test_node_range() {
        let result = RecordStore::new(2, 10, vec![record(0, 10, u32::MAX, [1, 2], 0.5)]);
        assert_eq!(error_of(result), TreeSeqError::NodeRangeError((0, u32::MAX, 3)));

        let result = RecordStore::new(2, 10, vec![record(0, 10, 3, [1, 4], 0.5)]);
        assert_eq!(error_of(result), TreeSeqError::NodeRangeError((0, 4, 3)));

        // In range but never a parent
        let records = vec![
            record(0, 10, 3, [1, 4], 0.5),
            record(0, 10, 3, [1, 2], 0.5),
        ];
        assert_eq!(error_of(RecordStore::new(2, 10, records)), TreeSeqError::UnknownChildError((0, 4)));
    }

    #[test]
    fn test_time_checks() {
        // 5 is younger than its child 4
        let records = vec![
            record(0, 10, 4, [1, 2], 0.9),
            record(0, 10, 5, [4, 3], 0.4),
        ];
        assert_eq!(error_of(RecordStore::new(3, 10, records)), TreeSeqError::TimeOrderError((5, 4)));

        // 3 is older than 4
        let records = vec![
            record(0, 5, 3, [1, 2], 0.9),
            record(5, 10, 4, [1, 2], 0.5),
        ];
        assert_eq!(error_of(RecordStore::new(2, 10, records)), TreeSeqError::IdOrderError((3, 4)));

        let records = vec![
            record(0, 5, 3, [1, 2], 0.9),
            record(5, 10, 3, [1, 2], 0.5),
        ];
        assert_eq!(error_of(RecordStore::new(2, 10, records)), TreeSeqError::NodeTimeError((3, 0.9, 0.5)));
    }

    #[test]
    fn test_topology_checks() {
        let result = RecordStore::new(3, 10, vec![record(0, 10, 4, [1, 2], 0.5)]);
        assert_eq!(error_of(result), TreeSeqError::IncompleteTreeError((0, 1, 2)));

        let result = RecordStore::new(2, 10, vec![record(0, 8, 3, [1, 2], 0.5)]);
        assert_eq!(error_of(result), TreeSeqError::CoverageError((0, 8, 10)));

        // Gap between 4 and 6
        let records = vec![
            record(0, 4, 3, [1, 2], 0.5),
            record(6, 10, 4, [1, 2], 0.7),
        ];
        assert_eq!(error_of(RecordStore::new(2, 10, records)), TreeSeqError::IncompleteTreeError((4, 0, 1)));

        // Sample 1 has two parents on [0, 10)
        let records = vec![
            record(0, 10, 4, [1, 2], 0.5),
            record(0, 10, 5, [1, 3], 0.7),
        ];
        assert_eq!(error_of(RecordStore::new(3, 10, records)), TreeSeqError::MultipleParentsError((1, 0)));

        let records = vec![
            record(0, 6, 3, [1, 2], 0.5),
            record(4, 10, 3, [1, 2], 0.5),
        ];
        assert_eq!(error_of(RecordStore::new(2, 10, records)), TreeSeqError::NodeOverlapError((3, 4)));
    }

    #[test]
    fn test_dangling_child() {
        // 4 ends at 5 but 5 still points to it
        let records = vec![
            record(0, 5, 4, [1, 2], 0.3),
            record(0, 10, 5, [4, 3], 0.8),
            record(5, 10, 6, [1, 2], 0.9),
        ];
        assert!(error_of(RecordStore::new(3, 10, records)).is_validation());
    }
}
