use std::io;

use color_eyre::Result;
use csv::Writer;

use crate::args::StandardArgs;
use crate::io::{open_tsv_writer, read_records_file, RecordRow};
use crate::structs::{RecordOrder, RecordStore};

pub fn write_records<W: io::Write>(
    writer: &mut Writer<W>,
    store: &RecordStore,
    order: RecordOrder,
) -> Result<()> {
    for record in store.records_in_order(order) {
        writer.serialize(RecordRow::from(record))?;
    }
    Ok(())
}

#[doc(hidden)]
#[tracing::instrument]
pub fn run(args: StandardArgs, order: RecordOrder) -> Result<()> {
    let store = read_records_file(&args)?;
    let mut writer = open_tsv_writer(args.output)?;
    write_records(&mut writer, &store, order)?;
    writer.flush()?;
    Ok(())
}
