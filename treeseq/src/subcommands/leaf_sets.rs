use std::io;

use color_eyre::Result;
use csv::Writer;
use itertools::Itertools;
use serde::Serialize;

use crate::args::StandardArgs;
use crate::io::{open_tsv_writer, read_records_file};
use crate::propagators::Traversal;
use crate::structs::{NodeId, Position, RecordStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafSetRow {
    pub left: Position,
    pub right: Position,
    pub node: NodeId,
    pub leaves: String,
}

/// The ordered leaves under `node` in every tree, under the root if no node is given
pub fn write_leaf_sets<W: io::Write>(
    writer: &mut Writer<W>,
    store: &RecordStore,
    node: Option<NodeId>,
) -> Result<()> {
    let mut traversal = Traversal::new(store).with_leaf_sets();

    while let Some(step) = traversal.next_step()? {
        let Some(sets) = step.leaf_sets else {
            continue;
        };
        let u = node.unwrap_or_else(|| step.tree.root());
        writer.serialize(LeafSetRow {
            left: step.tree.left(),
            right: step.tree.right(),
            node: u,
            leaves: sets.leaves_of(u).join(","),
        })?;
    }
    Ok(())
}

#[doc(hidden)]
#[tracing::instrument]
pub fn run(args: StandardArgs, node: Option<NodeId>) -> Result<()> {
    let store = read_records_file(&args)?;
    let mut writer = open_tsv_writer(args.output)?;
    write_leaf_sets(&mut writer, &store, node)?;
    writer.flush()?;
    Ok(())
}
