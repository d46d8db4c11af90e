use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{eyre, OptionExt, WrapErr};
use color_eyre::Result;
use csv::{Reader, ReaderBuilder, Writer, WriterBuilder};
use serde::{Deserialize, Serialize};

use crate::args::StandardArgs;
use crate::structs::{NodeId, Position, RawRecord, Record, RecordStore};

#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    CSV,
    TSV,
    JSON,
}

impl FileType {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension: &str = path
            .extension()
            .and_then(OsStr::to_str)
            .ok_or_else(|| eyre!("No filetype in path {path:?}"))?;

        let extension = match extension {
            "gz" => return_double_extension_filetype(path, extension)?,
            _ => extension.to_string(),
        };

        Ok(match extension.as_str() {
            "csv" | "csv.gz" => Self::CSV,
            "tsv" | "tsv.gz" => Self::TSV,
            "json" | "json.gz" => Self::JSON,
            _ => return Err(eyre!("File extension: {extension} is not supported")),
        })
    }
}

pub fn return_double_extension_filetype(path: &Path, e1: &str) -> Result<String> {
    let stem = path
        .file_stem()
        .and_then(OsStr::to_str)
        .ok_or_else(|| eyre!("file has no stem"))?;
    let e2 = Path::new(&stem)
        .extension()
        .and_then(OsStr::to_str)
        .ok_or_else(|| eyre!("file has no other filetype"))?;
    Ok(format!("{e2}.{e1}"))
}

/// One row of a tsv/csv record file, children as a `,` or `;` separated list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordRow {
    pub left: Position,
    pub right: Position,
    pub node: NodeId,
    pub children: String,
    pub time: f64,
}

impl From<Record> for RecordRow {
    fn from(record: Record) -> Self {
        let [c1, c2] = record.children;
        Self {
            left: record.left,
            right: record.right,
            node: record.node,
            children: format!("{c1},{c2}"),
            time: record.time,
        }
    }
}

impl RecordRow {
    pub fn into_raw(self, line: usize) -> Result<RawRecord> {
        let children = self
            .children
            .split([',', ';'])
            .map(|c| c.trim().parse::<NodeId>())
            .collect::<std::result::Result<Vec<NodeId>, _>>()
            .wrap_err(eyre!("Invalid children {:?} on row {line}", self.children))?;

        Ok(RawRecord {
            left: self.left,
            right: self.right,
            node: self.node,
            children,
            time: self.time,
        })
    }
}

/// A whole record set as one JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordFile {
    pub sample_size: u32,
    #[serde(default)]
    pub sequence_length: Option<Position>,
    pub records: Vec<RawRecord>,
}

pub fn read_records_file(args: &StandardArgs) -> Result<RecordStore> {
    let input = get_input(Some(args.file.clone()))?;

    let (sample_size, file_length, records) = match FileType::from_path(&args.file)? {
        FileType::JSON => {
            let file: RecordFile = serde_json::from_reader(input)
                .wrap_err(eyre!("Failed to parse records from {:?}", args.file))?;
            (
                args.sample_size.unwrap_or(file.sample_size),
                file.sequence_length,
                file.records,
            )
        }
        filetype => {
            let sample_size = args
                .sample_size
                .ok_or_eyre("The sample size (--sample-size) is required for tsv and csv input")?;
            let rdr = match filetype {
                FileType::CSV => get_csv_reader(input),
                _ => get_tsv_reader(input, true),
            };
            (sample_size, None, read_record_rows(rdr)?)
        }
    };

    let sequence_length = match args.sequence_length.or(file_length) {
        Some(length) => length,
        None => {
            let length = records.iter().map(|r| r.right).max().unwrap_or(0);
            tracing::warn!("No sequence length given, using the largest right coordinate {length}");
            length
        }
    };

    tracing::info!("Read {} records from {:?}", records.len(), args.file);
    RecordStore::from_raw(sample_size, sequence_length, records)
}

pub fn read_record_rows<R: io::Read>(mut rdr: Reader<R>) -> Result<Vec<RawRecord>> {
    let mut records = vec![];
    for (line, row) in rdr.deserialize().enumerate() {
        let row: RecordRow = row.wrap_err(eyre!(
            "Make sure the columns are in order left,right,node,children,time. Failed on row {line}"
        ))?;
        records.push(row.into_raw(line)?);
    }
    Ok(records)
}

pub fn get_tsv_reader<R: io::Read>(input: R, has_headers: bool) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .flexible(false)
        .from_reader(input)
}

pub fn get_csv_reader<R: io::Read>(input: R) -> Reader<R> {
    ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .flexible(false)
        .from_reader(input)
}

pub fn get_tsv_writer<W: io::Write>(output: W) -> Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(false)
        .from_writer(output)
}

pub fn get_input(filename: Option<PathBuf>) -> Result<Box<dyn io::Read>> {
    let input: Box<dyn io::Read> = match filename {
        Some(name) => match name.to_str() {
            Some("-") => Box::new(io::stdin()),
            Some(name) => {
                let r = match niffler::from_path(name) {
                    Ok(x) => x.0,
                    Err(err) => return Err(eyre!("failed to open \"{name}\": {err}")),
                };
                Box::new(r)
            }
            None => return Err(eyre!("Unknown I/O error")),
        },
        None => Box::new(io::stdin()),
    };
    Ok(input)
}

pub fn get_output(filename: Option<PathBuf>) -> Result<Box<dyn io::Write>> {
    let output: Box<dyn io::Write> = match filename {
        Some(name) => match name.to_str() {
            Some("-") => Box::new(io::stdout()),
            Some(name) => Box::new(
                match std::fs::File::options()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(name)
                {
                    Ok(x) => x,
                    Err(err) => return Err(eyre!("failed to open \"{name}\": {err}")),
                },
            ),
            None => return Err(eyre!("Unknown I/O error")),
        },
        None => Box::new(io::stdout()),
    };
    Ok(output)
}

pub fn open_tsv_writer(filename: Option<PathBuf>) -> Result<Writer<Box<dyn io::Write>>> {
    Ok(get_tsv_writer(get_output(filename)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filetype() {
        assert_eq!(FileType::from_path(Path::new("a/records.tsv")).unwrap(), FileType::TSV);
        assert_eq!(FileType::from_path(Path::new("records.csv.gz")).unwrap(), FileType::CSV);
        assert_eq!(FileType::from_path(Path::new("records.json")).unwrap(), FileType::JSON);
        assert!(FileType::from_path(Path::new("records.vcf")).is_err());
        assert!(FileType::from_path(Path::new("records")).is_err());
    }

    #[test]
    fn test_read_rows() {
        let data = "left\tright\tnode\tchildren\ttime\n0\t10\t4\t1,2\t0.5\n0\t10\t5\t4;3\t0.9\n";
        let records = read_record_rows(get_tsv_reader(data.as_bytes(), true)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].children, vec![1, 2]);
        assert_eq!(records[1].children, vec![4, 3]);
        assert_eq!(records[1].time, 0.9);

        let data = "left,right,node,children,time\n0,10,4,\"1,x\",0.5\n";
        assert!(read_record_rows(get_csv_reader(data.as_bytes())).is_err());
    }
}
