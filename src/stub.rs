//! The RPC operation surface a borrowed [`Client`](crate::client::Client)
//! forwards to, and the seam a [`StubConnector`](crate::connector::StubConnector)
//! produces.
//!
//! This is deliberately the out-of-scope "generated RPC stub" of spec.md §1:
//! the pool never inspects these methods' arguments or results, it only
//! calls them and folds any error into the borrowing handle's
//! [`ErrorList`](crate::error::ErrorList).

use async_trait::async_trait;

use crate::model::{Attributes, BatchMutation, Cell, ColumnDescriptor, Mutation, RegionInfo, RowResult, Scan, ScannerId};

/// The full table/row/scan RPC surface, generic over the connector's error
/// type so it composes with whatever `StubConnector` implementation a
/// caller supplies (spec.md §4.1).
///
/// `Error` must be `Clone + PartialEq` so a [`crate::error::ErrorList`] can
/// deduplicate by value, matching the reference's pointer/value-equality
/// dedup rule (spec.md §4.2).
#[async_trait]
pub trait Stub: Send + Sync + 'static {
    /// The error type every RPC method and [`shutdown`](Stub::shutdown) returns.
    type Error: std::error::Error + Clone + PartialEq + Send + Sync + 'static;

    /// Enables a table for reads and writes.
    async fn enable_table(&self, name: &str) -> Result<(), Self::Error>;
    /// Disables a table.
    async fn disable_table(&self, name: &str) -> Result<(), Self::Error>;
    /// Reports whether a table is currently enabled.
    async fn is_table_enabled(&self, name: &str) -> Result<bool, Self::Error>;
    /// Lists all table names known to the service.
    async fn get_table_names(&self) -> Result<Vec<String>, Self::Error>;
    /// Fetches a table's column family descriptors, keyed by family name.
    async fn get_column_descriptors(
        &self,
        name: &str,
    ) -> Result<std::collections::HashMap<String, ColumnDescriptor>, Self::Error>;
    /// Lists the regions backing a table.
    async fn get_table_regions(&self, name: &str) -> Result<Vec<RegionInfo>, Self::Error>;
    /// Creates a table with the given column families.
    async fn create_table(&self, name: &str, column_families: &[ColumnDescriptor]) -> Result<(), Self::Error>;
    /// Deletes a table.
    async fn delete_table(&self, name: &str) -> Result<(), Self::Error>;

    /// Fetches the cells of a single column in a single row.
    async fn get(
        &self,
        table: &str,
        row: &[u8],
        column: &str,
        attributes: &Attributes,
    ) -> Result<Vec<Cell>, Self::Error>;
    /// Fetches every column of a single row.
    async fn get_row(&self, table: &str, row: &[u8], attributes: &Attributes) -> Result<Vec<RowResult>, Self::Error>;
    /// Fetches a restricted set of columns of a single row.
    async fn get_row_with_columns(
        &self,
        table: &str,
        row: &[u8],
        columns: &[String],
        attributes: &Attributes,
    ) -> Result<Vec<RowResult>, Self::Error>;
    /// Fetches every column of several rows.
    async fn get_rows(
        &self,
        table: &str,
        rows: &[Vec<u8>],
        attributes: &Attributes,
    ) -> Result<Vec<RowResult>, Self::Error>;
    /// Fetches a restricted set of columns of several rows.
    async fn get_rows_with_columns(
        &self,
        table: &str,
        rows: &[Vec<u8>],
        columns: &[String],
        attributes: &Attributes,
    ) -> Result<Vec<RowResult>, Self::Error>;

    /// Applies a batch of column mutations to a single row.
    async fn mutate_row(
        &self,
        table: &str,
        row: &[u8],
        mutations: &[Mutation],
        attributes: &Attributes,
    ) -> Result<(), Self::Error>;
    /// Applies per-row mutation batches across several rows.
    async fn mutate_rows(
        &self,
        table: &str,
        row_batches: &[BatchMutation],
        attributes: &Attributes,
    ) -> Result<(), Self::Error>;

    /// Opens a scanner from a full [`Scan`] descriptor.
    async fn scanner_open_with_scan(
        &self,
        table: &str,
        scan: &Scan,
        attributes: &Attributes,
    ) -> Result<ScannerId, Self::Error>;
    /// Opens a scanner starting at `start_row` over the given columns.
    async fn scanner_open(
        &self,
        table: &str,
        start_row: &[u8],
        columns: &[String],
        attributes: &Attributes,
    ) -> Result<ScannerId, Self::Error>;
    /// Opens a scanner bounded by `start_row` and `stop_row`.
    async fn scanner_open_with_stop(
        &self,
        table: &str,
        start_row: &[u8],
        stop_row: &[u8],
        columns: &[String],
        attributes: &Attributes,
    ) -> Result<ScannerId, Self::Error>;
    /// Opens a scanner over every row sharing `start_and_prefix` as a prefix.
    async fn scanner_open_with_prefix(
        &self,
        table: &str,
        start_and_prefix: &[u8],
        columns: &[String],
        attributes: &Attributes,
    ) -> Result<ScannerId, Self::Error>;
    /// Fetches the next row from an open scanner.
    async fn scanner_get(&self, id: ScannerId) -> Result<Vec<RowResult>, Self::Error>;
    /// Fetches up to `n_rows` rows from an open scanner.
    async fn scanner_get_list(&self, id: ScannerId, n_rows: i32) -> Result<Vec<RowResult>, Self::Error>;
    /// Closes a scanner, releasing its server-held cursor.
    async fn scanner_close(&self, id: ScannerId) -> Result<(), Self::Error>;

    /// Tears down the underlying transport. Called by the pool only when a
    /// stub is being destroyed (forced eviction, idle reap, or pool close),
    /// never while a [`Client`](crate::client::Client) still holds it.
    async fn shutdown(&mut self) -> Result<(), Self::Error>;
}
