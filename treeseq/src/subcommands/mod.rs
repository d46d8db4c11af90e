/// List the records in insertion or removal order
pub mod records;

/// Print every marginal tree as a node table
pub mod trees;

/// Print the records leaving and entering at each breakpoint
pub mod diffs;

/// Incremental leaf and tracked leaf counts per tree
pub mod leaf_counts;

/// Ordered leaf lists per tree
pub mod leaf_sets;

/// Validate a record file and verify every tree against full recounts
pub mod check;
