use std::io;

use color_eyre::Result;
use csv::Writer;
use itertools::Itertools;
use serde::Serialize;

use crate::args::StandardArgs;
use crate::io::{open_tsv_writer, read_records_file};
use crate::structs::{NodeId, Position, RecordStore, NULL_NODE};
use crate::trees::{MarginalTree, TreeBuilder};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeRow {
    pub left: Position,
    pub right: Position,
    pub node: NodeId,
    pub parent: NodeId,
    pub children: String,
    pub time: f64,
}

/// Nodes of `tree` that are linked in, the root included
pub fn tree_rows(tree: &MarginalTree) -> Vec<TreeRow> {
    (1..tree.num_nodes() as NodeId)
        .filter(|&u| tree.parent(u) != NULL_NODE || u == tree.root())
        .map(|u| TreeRow {
            left: tree.left(),
            right: tree.right(),
            node: u,
            parent: tree.parent(u),
            children: tree
                .children(u)
                .map_or_else(|| String::from("-"), |c| c.iter().join(",")),
            time: tree.time(u),
        })
        .collect()
}

pub fn write_trees<W: io::Write>(writer: &mut Writer<W>, store: &RecordStore) -> Result<()> {
    let mut builder = TreeBuilder::new(store);
    while let Some(tree) = builder.next_tree() {
        for row in tree_rows(tree) {
            writer.serialize(row)?;
        }
    }
    Ok(())
}

#[doc(hidden)]
#[tracing::instrument]
pub fn run(args: StandardArgs) -> Result<()> {
    let store = read_records_file(&args)?;
    let mut writer = open_tsv_writer(args.output)?;
    write_trees(&mut writer, &store)?;
    writer.flush()?;
    Ok(())
}
