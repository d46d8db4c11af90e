use std::io;

use color_eyre::Result;
use csv::Writer;
use serde::Serialize;

use crate::args::StandardArgs;
use crate::io::{open_tsv_writer, read_records_file};
use crate::propagators::Traversal;
use crate::structs::{Position, RecordStore};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckSummary {
    pub sample_size: u32,
    pub num_nodes: usize,
    pub num_records: usize,
    pub sequence_length: Position,
    pub num_trees: usize,
}

/// Run every propagator over every tree with consistency checks enabled
pub fn check_store(store: &RecordStore) -> Result<CheckSummary> {
    let mut traversal = Traversal::new(store)
        .with_leaf_counts()
        .with_leaf_sets()
        .with_consistency_checks(true);
    while traversal.next_step()?.is_some() {}

    tracing::info!("All {} trees are consistent", traversal.num_trees());
    Ok(CheckSummary {
        sample_size: store.sample_size(),
        num_nodes: store.num_nodes(),
        num_records: store.num_records(),
        sequence_length: store.sequence_length(),
        num_trees: traversal.num_trees(),
    })
}

pub fn write_check<W: io::Write>(writer: &mut Writer<W>, store: &RecordStore) -> Result<()> {
    writer.serialize(check_store(store)?)?;
    Ok(())
}

#[doc(hidden)]
#[tracing::instrument]
pub fn run(args: StandardArgs) -> Result<()> {
    let store = read_records_file(&args)?;
    let mut writer = open_tsv_writer(args.output)?;
    write_check(&mut writer, &store)?;
    writer.flush()?;
    Ok(())
}
