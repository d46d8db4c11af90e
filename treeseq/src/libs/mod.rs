// TREESEQ - Marginal trees from coalescence records
// Copyright (C) 2024  Osma S. Rautila
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! TREESEQ - Marginal trees from coalescence records
//!
//! This library reconstructs the sequence of marginal trees along a genome from a set of
//! coalescence records and keeps per-node leaf counts and ordered leaf lists up to date while
//! sweeping from left to right. Each tree is derived from the previous one by removing the
//! records that end at the breakpoint and inserting the records that start there, so nothing
//! is rebuilt from scratch.
//!
//! # Getting started
//!
//! ```bash
//! cargo install treeseq
//! ```
//!
//! ## Running TREESEQ
//!
//! Records are read from a TSV/CSV file with the columns `left right node children time` or
//! from a JSON document with the fields `sample_size`, `sequence_length` and `records`.
//! ```bash
//! treeseq trees records.tsv --sample-size 5 > trees.tsv
//!
//! treeseq diffs records.tsv --sample-size 5
//!
//! treeseq leaf-counts records.json --track 1 2 3
//!
//! treeseq leaf-sets records.json --node 9
//!
//! treeseq check records.json
//!```
//!

#[doc(hidden)]
pub mod args;

#[doc(hidden)]
pub mod io;

/// Records and the record store
pub mod structs;

#[doc(hidden)]
pub mod error;

#[cfg(feature = "clap")]
pub mod clap;
