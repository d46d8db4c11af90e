use std::io;

use color_eyre::Result;
use csv::Writer;
use serde::Serialize;

use crate::args::StandardArgs;
use crate::io::{open_tsv_writer, read_records_file};
use crate::propagators::Traversal;
use crate::structs::{NodeId, Position, RecordStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafCountRow {
    pub left: Position,
    pub right: Position,
    pub node: NodeId,
    pub leaves: u32,
    pub tracked: u32,
}

/// Counts for `node` in every tree, or for every internal node of each tree
pub fn write_leaf_counts<W: io::Write>(
    writer: &mut Writer<W>,
    store: &RecordStore,
    track: &[NodeId],
    node: Option<NodeId>,
) -> Result<()> {
    let mut traversal = Traversal::new(store).with_tracked_samples(track)?;

    while let Some(step) = traversal.next_step()? {
        let Some(counts) = step.leaf_counts else {
            continue;
        };
        let nodes = match node {
            Some(u) => vec![u],
            None => (1..step.tree.num_nodes() as NodeId)
                .filter(|&u| step.tree.children(u).is_some())
                .collect(),
        };
        for u in nodes {
            writer.serialize(LeafCountRow {
                left: step.tree.left(),
                right: step.tree.right(),
                node: u,
                leaves: counts.leaf_count(u),
                tracked: counts.tracked_leaf_count(u),
            })?;
        }
    }
    Ok(())
}

#[doc(hidden)]
#[tracing::instrument]
pub fn run(args: StandardArgs, track: Vec<NodeId>, node: Option<NodeId>) -> Result<()> {
    let store = read_records_file(&args)?;
    let mut writer = open_tsv_writer(args.output)?;
    write_leaf_counts(&mut writer, &store, &track, node)?;
    writer.flush()?;
    Ok(())
}
