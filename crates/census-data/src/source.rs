//! Table source abstraction.

use crate::client::{CensusClient, FetchRequest};
use crate::error::Result;
use polars::prelude::DataFrame;
use std::future::Future;

/// Anything that can answer a [`FetchRequest`] with a normalized table.
///
/// Implementors must apply the same normalization as
/// [`CensusClient::fetch`]: geography key columns first, requested fields in
/// order, negative and non-numeric values null.
pub trait TableSource {
    /// Fetch one table.
    fn fetch_table(&self, request: &FetchRequest) -> impl Future<Output = Result<DataFrame>> + Send;
}

impl TableSource for CensusClient {
    fn fetch_table(&self, request: &FetchRequest) -> impl Future<Output = Result<DataFrame>> + Send {
        self.fetch(request)
    }
}
