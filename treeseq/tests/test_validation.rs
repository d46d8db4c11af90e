mod common;

use color_eyre::Report;

use treeseq::error::{ErrorKind, TreeSeqError};
use treeseq::structs::{RawRecord, Record, RecordStore};

use crate::common::{record, scenario_records};

fn error_of(result: Result<RecordStore, Report>) -> TreeSeqError {
    result.unwrap_err().downcast_ref::<TreeSeqError>().unwrap().clone()
}

fn store(records: Vec<Record>) -> Result<RecordStore, Report> {
    RecordStore::new(5, 10, records)
}

#[test]
fn valid_scenario() {
    assert!(store(scenario_records()).is_ok());
}

#[test]
fn missing_record_is_rejected() {
    let mut records = scenario_records();
    records.remove(1);
    assert_eq!(error_of(store(records)).kind(), ErrorKind::Validation);
}

#[test]
fn gap_in_coverage() {
    let mut records = scenario_records();
    for r in records.iter_mut().filter(|r| r.right == 10) {
        r.right = 9;
    }
    assert_eq!(error_of(store(records)), TreeSeqError::CoverageError((0, 9, 10)));
}

#[test]
fn child_older_than_parent() {
    let mut records = scenario_records();
    records[0].time = 0.45;
    assert_eq!(error_of(store(records)), TreeSeqError::TimeOrderError((9, 6)));
}

#[test]
fn ids_out_of_time_order() {
    let mut records = scenario_records();
    // 9 becomes older than 10, the two never share a tree
    records[3].time = 0.55;
    assert_eq!(error_of(store(records)), TreeSeqError::IdOrderError((9, 10)));
}

#[test]
fn node_ids_out_of_range() {
    let mut records = scenario_records();
    records[2].children = [7, 15];
    assert_eq!(error_of(store(records)), TreeSeqError::NodeRangeError((2, 15, 14)));

    let mut records = scenario_records();
    records[8].node = u32::MAX;
    assert_eq!(error_of(store(records)), TreeSeqError::NodeRangeError((8, u32::MAX, 14)));
}

#[test]
fn unknown_child() {
    // 15 is in range once a tenth record exists, but it is never a parent
    let mut records = scenario_records();
    records[2].children = [7, 15];
    records.push(record(0, 3, 9, [6, 8], 0.4));
    assert_eq!(error_of(store(records)), TreeSeqError::UnknownChildError((2, 15)));
}

#[test]
fn two_parents() {
    let mut records = scenario_records();
    records.push(record(0, 3, 15, [1, 3], 1.0));
    assert!(error_of(store(records)).is_validation());
}

#[test]
fn malformed_records() {
    let raw = RawRecord { left: 0, right: 10, node: 6, children: vec![1], time: 0.5 };
    let err = RecordStore::from_raw(5, 10, vec![raw]).unwrap_err();
    assert_eq!(err.downcast_ref::<TreeSeqError>(), Some(&TreeSeqError::ChildCountError((0, 1))));

    let result = store(vec![record(0, 10, 6, [1, 2], f64::NAN)]);
    assert!(matches!(error_of(result), TreeSeqError::TimeValueError((0, t)) if t.is_nan()));

    let result = store(vec![record(0, 10, 6, [6, 2], 0.5)]);
    assert_eq!(error_of(result), TreeSeqError::SelfChildError((0, 6)));
}

#[test]
fn errors_render() {
    let err = store(vec![record(3, 2, 6, [1, 2], 0.5)]).unwrap_err();
    assert_eq!(err.to_string(), "Record 0 has an empty interval [3, 2)");
}
