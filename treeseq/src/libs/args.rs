use std::path::PathBuf;

use crate::structs::Position;

#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct StandardArgs {
    /// Coalescence records (tsv, csv or json, optionally gzipped)
    pub file: PathBuf,

    /// Number of samples, required for tsv and csv input
    #[cfg_attr(feature = "clap", arg(short = 'n', long))]
    pub sample_size: Option<u32>,

    /// Sequence length, defaults to the largest right coordinate in the records
    #[cfg_attr(feature = "clap", arg(short = 'L', long))]
    pub sequence_length: Option<Position>,

    /// Output file, stdout if not given
    #[cfg_attr(feature = "clap", arg(short = 'o', long, value_hint = clap::ValueHint::FilePath))]
    pub output: Option<PathBuf>,
}
