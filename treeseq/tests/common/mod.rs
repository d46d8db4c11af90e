#![allow(dead_code)]
use std::collections::BTreeMap;
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::seq::{IteratorRandom, SliceRandom};
use rand::{Rng, SeedableRng};

use treeseq::{
    args::StandardArgs,
    structs::{NodeId, Position, Record, RecordStore},
};

pub const SCENARIO_TSV: &str = "tests/data/scenario.tsv";
pub const SCENARIO_CSV: &str = "tests/data/scenario.csv";
pub const SCENARIO_JSON: &str = "tests/data/scenario.json";
pub const SCENARIO_GZ: &str = "tests/data/scenario.tsv.gz";
pub const OUTDIR: &str = "tests/results";

pub fn record(left: Position, right: Position, node: NodeId, children: [NodeId; 2], time: f64) -> Record {
    Record { left, right, node, children, time }
}

/// Five samples, breakpoints at 3 and 7 over [0, 10), roots 9, 11 and 14
#[rustfmt::skip]
pub fn scenario_records() -> Vec<Record> {
    vec![
        record(0, 7, 6, [1, 2], 0.1),
        record(0, 10, 7, [3, 4], 0.2),
        record(0, 3, 8, [7, 5], 0.3),
        record(0, 3, 9, [6, 8], 0.4),
        record(3, 7, 10, [6, 7], 0.5),
        record(3, 7, 11, [10, 5], 0.6),
        record(7, 10, 12, [2, 7], 0.7),
        record(7, 10, 13, [1, 12], 0.8),
        record(7, 10, 14, [13, 5], 0.9),
    ]
}

pub fn scenario_store() -> RecordStore {
    RecordStore::new(5, 10, scenario_records()).unwrap()
}

pub fn scenario_args(path: &str) -> StandardArgs {
    StandardArgs {
        file: PathBuf::from(path),
        sample_size: Some(5),
        ..Default::default()
    }
}

#[cfg(feature = "clap")]
pub fn silent_verbosity() -> treeseq::clap::LogAndVerbosity {
    treeseq::clap::LogAndVerbosity {
        verbosity: 1,
        log_file: None,
        silent: false,
    }
}

// Open records by node: (left, children, time)
type OpenRecords = BTreeMap<NodeId, (Position, [NodeId; 2], f64)>;

fn coalesce(rng: &mut StdRng, mut lineages: Vec<NodeId>, left: Position, next_id: &mut NodeId, open: &mut OpenRecords) {
    while lineages.len() > 1 {
        let a = lineages.swap_remove(rng.gen_range(0..lineages.len()));
        let b = lineages.swap_remove(rng.gen_range(0..lineages.len()));
        let u = *next_id;
        *next_id += 1;
        open.insert(u, (left, [a, b], f64::from(u) / 10.0));
        lineages.push(u);
    }
}

/// A random but valid record set.
///
/// At each breakpoint every node at or above a randomly chosen internal node ends, and the
/// lineages left below it coalesce again with fresh, older nodes. Each node therefore has one
/// contiguous record and node ids grow with time.
pub fn random_records(seed: u64, sample_size: u32, sequence_length: Position, num_breakpoints: usize) -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut open = OpenRecords::new();
    let mut next_id = sample_size + 1;
    let mut records = vec![];

    coalesce(&mut rng, (1..=sample_size).collect(), 0, &mut next_id, &mut open);

    let mut breakpoints = (1..sequence_length).choose_multiple(&mut rng, num_breakpoints);
    breakpoints.sort_unstable();

    for x in breakpoints {
        let internal = open.keys().copied().collect::<Vec<_>>();
        if internal.is_empty() {
            break;
        }
        let cut = internal[rng.gen_range(0..internal.len())];
        let ended = open.split_off(&cut);

        let mut lineages = vec![];
        for (&u, &(left, children, time)) in &ended {
            records.push(record(left, x, u, children, time));
            lineages.extend(children.into_iter().filter(|&c| c < cut));
        }
        coalesce(&mut rng, lineages, x, &mut next_id, &mut open);
    }

    for (u, (left, children, time)) in open {
        records.push(record(left, sequence_length, u, children, time));
    }
    records.shuffle(&mut rng);
    records
}

pub fn random_store(seed: u64, sample_size: u32, sequence_length: Position, num_breakpoints: usize) -> RecordStore {
    let records = random_records(seed, sample_size, sequence_length, num_breakpoints);
    RecordStore::new(sample_size, sequence_length, records).unwrap()
}
