//! Logical shapes of the RPC arguments and results the [`Stub`](crate::stub::Stub)
//! surface forwards to the wrapped RPC stub.
//!
//! These are plain data carriers with no wire-format logic of their own; the
//! actual Thrift encoding is the out-of-scope stub's job (spec.md §1, §6).
//! Field sets are trimmed to what the pool's own tests and call sites need,
//! not a full transcription of the HBase Thrift IDL.

use std::collections::HashMap;

/// Identifies a server-side scanner cursor returned by a `scanner_open*` call.
pub type ScannerId = i32;

/// Attributes accompanying an RPC call, forwarded verbatim to the stub.
pub type Attributes = HashMap<String, String>;

/// A column family descriptor, as passed to `create_table`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnDescriptor {
    /// Column family name, e.g. `"c:"`.
    pub name: String,
    /// Number of versions to retain.
    pub max_versions: i32,
    /// Compression codec name, or empty for none.
    pub compression: String,
    /// Whether the family should be kept in the block cache preferentially.
    pub in_memory: bool,
    /// Seconds before a cell expires, or `0` for no expiry.
    pub time_to_live: i32,
}

/// A region's placement, as returned by `get_table_regions`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RegionInfo {
    /// Inclusive start key of the region.
    pub start_key: Vec<u8>,
    /// Exclusive end key of the region.
    pub end_key: Vec<u8>,
    /// Region id.
    pub id: i64,
    /// Encoded region name.
    pub name: Vec<u8>,
    /// Host:port of the server currently serving this region.
    pub server_name: String,
}

/// A single cell value with its write timestamp.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    /// Raw cell value.
    pub value: Vec<u8>,
    /// Write timestamp in milliseconds.
    pub timestamp: i64,
}

/// One row's worth of cells, keyed by column (`"family:qualifier"`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RowResult {
    /// The row key.
    pub row: Vec<u8>,
    /// Cells in this row, keyed by column.
    pub columns: HashMap<String, Cell>,
}

/// A single-column mutation within a `mutate_row`/`mutate_rows` call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mutation {
    /// If true, this mutation deletes the column rather than setting it.
    pub is_delete: bool,
    /// Column to mutate (`"family:qualifier"`).
    pub column: String,
    /// New value; ignored when `is_delete` is set.
    pub value: Vec<u8>,
    /// Whether the mutation must be durable (write-ahead-logged) before it
    /// is acknowledged.
    pub write_to_wal: bool,
}

/// One row's worth of mutations, as used by `mutate_rows`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchMutation {
    /// The row key the mutations apply to.
    pub row: Vec<u8>,
    /// Mutations to apply to `row`.
    pub mutations: Vec<Mutation>,
}

/// A server-side scan descriptor, as used by `scanner_open_with_scan`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scan {
    /// Inclusive start row, or empty for the start of the table.
    pub start_row: Vec<u8>,
    /// Exclusive stop row, or empty for the end of the table.
    pub stop_row: Vec<u8>,
    /// Only cells written at or before this timestamp are returned.
    pub timestamp: Option<i64>,
    /// Columns to restrict the scan to; empty means all columns.
    pub columns: Vec<String>,
    /// Rows to prefetch per `scanner_get_list` round-trip; `0` defers to the
    /// server's default.
    pub caching: i32,
}
