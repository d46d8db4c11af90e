use crate::structs::{NodeId, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The record set is malformed, traversal never starts
    Validation,
    /// Internal state went out of sync during a traversal
    Invariant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeSeqError {
    ZeroSamplesError,
    ZeroLengthError,
    ChildCountError((usize, usize)),
    EmptyIntervalError((usize, Position, Position)),
    IntervalBoundsError((usize, Position, Position)),
    SampleAsParentError((usize, NodeId)),
    SentinelChildError(usize),
    SelfChildError((usize, NodeId)),
    NodeRangeError((usize, NodeId, NodeId)),
    DuplicateChildError((usize, NodeId)),
    TimeValueError((usize, f64)),
    NodeTimeError((NodeId, f64, f64)),
    TimeOrderError((NodeId, NodeId)),
    IdOrderError((NodeId, NodeId)),
    UnknownChildError((usize, NodeId)),
    NodeOverlapError((NodeId, Position)),
    MultipleParentsError((NodeId, Position)),
    CoverageError((Position, Position, Position)),
    IncompleteTreeError((Position, usize, usize)),
    DanglingChildError((NodeId, Position)),
    TrackedSampleError(NodeId),
    LeafCountError((NodeId, u32, u32)),
    CountUnderflowError(NodeId),
    LeafListError((NodeId, Position)),
    ParentCycleError(NodeId),
    RootError((NodeId, Position)),
    TreeStateError((Position, String)),
}

impl TreeSeqError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::LeafCountError(_)
            | Self::CountUnderflowError(_)
            | Self::LeafListError(_)
            | Self::ParentCycleError(_)
            | Self::RootError(_)
            | Self::TreeStateError(_) => ErrorKind::Invariant,
            _ => ErrorKind::Validation,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

impl std::fmt::Display for TreeSeqError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroSamplesError => write!(f, "Sample size must be at least one"),
            Self::ZeroLengthError => write!(f, "Sequence length must be at least one"),
            Self::ChildCountError((idx, count)) => write!(
                f,
                "Record {idx} has {count} children, every coalescence record needs exactly two"
            ),
            Self::EmptyIntervalError((idx, left, right)) => {
                write!(f, "Record {idx} has an empty interval [{left}, {right})")
            }
            Self::IntervalBoundsError((idx, right, length)) => write!(
                f,
                "Record {idx} ends at {right} which is past the sequence length {length}"
            ),
            Self::SampleAsParentError((idx, node)) => write!(
                f,
                "Record {idx} uses sample {node} as a parent, internal nodes must be larger than the sample size"
            ),
            Self::SentinelChildError(idx) => {
                write!(f, "Record {idx} uses the null node 0 as a child")
            }
            Self::SelfChildError((idx, node)) => {
                write!(f, "Record {idx} lists node {node} as its own child")
            }
            Self::NodeRangeError((idx, node, max)) => write!(
                f,
                "Record {idx} refers to node {node}, ids can not exceed the sample size plus the number of records ({max})"
            ),
            Self::DuplicateChildError((idx, node)) => {
                write!(f, "Record {idx} lists child {node} twice")
            }
            Self::TimeValueError((idx, time)) => write!(
                f,
                "Record {idx} has time {time}, coalescence times must be finite and positive"
            ),
            Self::NodeTimeError((node, first, second)) => write!(
                f,
                "Node {node} appears with two different times: {first} and {second}"
            ),
            Self::TimeOrderError((parent, child)) => write!(
                f,
                "Node {child} is not younger than its parent {parent}, times must increase towards the root"
            ),
            Self::IdOrderError((older, younger)) => write!(
                f,
                "Node {older} is older than node {younger} but has a smaller id, internal node ids must increase with time"
            ),
            Self::UnknownChildError((idx, node)) => write!(
                f,
                "Record {idx} has child {node} which is neither a sample nor the parent of any record"
            ),
            Self::NodeOverlapError((node, pos)) => write!(
                f,
                "Node {node} has two records overlapping at position {pos}"
            ),
            Self::MultipleParentsError((node, pos)) => {
                write!(f, "Node {node} has two parents at position {pos}")
            }
            Self::CoverageError((left, right, length)) => write!(
                f,
                "Records cover [{left}, {right}) but must cover the whole sequence [0, {length})"
            ),
            Self::IncompleteTreeError((pos, active, expected)) => write!(
                f,
                "The tree starting at position {pos} has {active} active records, expected {expected}"
            ),
            Self::DanglingChildError((node, pos)) => write!(
                f,
                "Node {node} is a child in the tree starting at {pos} but has no active record"
            ),
            Self::TrackedSampleError(node) => {
                write!(f, "Tracked node {node} is not a sample")
            }
            Self::LeafCountError((node, expected, found)) => write!(
                f,
                "Leaf count of node {node} is {found}, a full recount gives {expected}"
            ),
            Self::CountUnderflowError(node) => {
                write!(f, "Leaf count of node {node} went below zero")
            }
            Self::LeafListError((node, pos)) => write!(
                f,
                "Leaf list of node {node} in the tree starting at {pos} does not match its subtree"
            ),
            Self::ParentCycleError(node) => {
                write!(f, "Walking up from node {node} never reached the null node")
            }
            Self::RootError((root, pos)) => write!(
                f,
                "Root {root} of the tree starting at {pos} does not subtend every sample"
            ),
            Self::TreeStateError((pos, msg)) => {
                write!(f, "Inconsistent tree starting at {pos}: {msg}")
            }
        }
    }
}

impl std::error::Error for TreeSeqError {}
