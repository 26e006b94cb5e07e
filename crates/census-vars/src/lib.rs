//! Derived census variables.
//!
//! A derived variable is `sum(numerator fields) / sum(denominator fields)`
//! (or just the numerator sum) computed per geography, where the raw fields
//! behind it may differ from one survey year to the next.
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/census-pull/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod definition;
pub mod error;
pub mod presets;
pub mod resolver;

pub use definition::{VariableDefinition, YearFields};
pub use error::{ConfigError, ResolveError};
pub use presets::{PresetInfo, available_presets, preset};
pub use resolver::{
    Resolution, ResolveOptions, YEAR_COLUMN, YearFailure, derive_table, resolve, resolve_year,
};
