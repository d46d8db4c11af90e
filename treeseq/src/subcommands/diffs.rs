use std::io;

use color_eyre::Result;
use csv::Writer;
use serde::Serialize;

use crate::args::StandardArgs;
use crate::io::{open_tsv_writer, read_records_file};
use crate::structs::{NodeId, Position, Record, RecordStore};
use crate::trees::{TreeDiff, TreeDiffs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    Out,
    In,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffRow {
    pub left: Position,
    pub right: Position,
    pub span: Position,
    pub change: Change,
    pub node: NodeId,
    pub children: String,
    pub time: f64,
}

pub fn diff_rows(diff: &TreeDiff) -> Vec<DiffRow> {
    let row = |change: Change, record: &Record| DiffRow {
        left: diff.left,
        right: diff.right,
        span: diff.span(),
        change,
        node: record.node,
        children: format!("{},{}", record.children[0], record.children[1]),
        time: record.time,
    };

    diff.records_out
        .iter()
        .map(|r| row(Change::Out, r))
        .chain(diff.records_in.iter().map(|r| row(Change::In, r)))
        .collect()
}

pub fn write_diffs<W: io::Write>(writer: &mut Writer<W>, store: &RecordStore) -> Result<()> {
    for diff in TreeDiffs::new(store) {
        for row in diff_rows(&diff) {
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
    write_diffs(&mut writer, &store)?;
    writer.flush()?;
    Ok(())
}
