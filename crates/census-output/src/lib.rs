//! CSV output for census-pull.
//!
//! One file per resolved year, named
//! `{variable}_{table}_{year}_{geography}.csv` for derived variables and
//! `{table}_{year}_{geography}.csv` for raw extractions.
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/census-pull/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod read;

pub use export::{
    ExportError, Exporter, TableFile, write_derived_table, write_raw_table, write_table,
};
pub use read::read_derived_table;
