//! Census Bureau data API access for census-pull.
//!
//! This crate owns the fetch half of the pipeline: building a query for a
//! `(year, geography, dataset, table, fields)` tuple, issuing the request and
//! normalizing the row-oriented JSON reply into a [`polars::frame::DataFrame`]
//! keyed by geography.
//!
//! # Example
//!
//! ```no_run
//! use census_data::{CensusClient, ClientConfig, FetchRequest, Geography};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CensusClient::new(ClientConfig::new("my-api-key"))?;
//!     let request = FetchRequest::new(2017, Geography::State, "acs", "acs5", ["B25011_001E"]);
//!     let df = client.fetch(&request).await?;
//!     println!("{} states", df.height());
//!     Ok(())
//! }
//! ```
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/census-pull/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod client;
pub mod error;
pub mod geography;
pub mod response;
pub mod source;

pub use client::{CENSUS_BASE_URL, CensusClient, ClientConfig, FetchRequest};
pub use error::{DataError, Result};
pub use geography::Geography;
pub use response::{coerce_value, normalize_rows, parse_response};
pub use source::TableSource;

/// Survey year, e.g. `2017`.
pub type Year = u16;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
