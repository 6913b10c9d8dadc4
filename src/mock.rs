//! Test doubles for the pool's two extension seams ([`Stub`], [`StubConnector`]),
//! used only by this crate's own unit tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::connector::StubConnector;
use crate::instance::Instance;
use crate::model::{Attributes, BatchMutation, Cell, ColumnDescriptor, Mutation, RegionInfo, RowResult, Scan, ScannerId};
use crate::stub::Stub;

/// A trivial, value-comparable error so [`crate::error::ErrorList`]'s dedup
/// logic can be exercised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("mock failure: {0}")]
pub struct MockError(String);

impl MockError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

/// A stub that tags itself with a unique id so tests can tell whether a
/// borrow reused a previous instance or was freshly constructed, and that
/// can be told to fail its next RPC on demand.
#[derive(Debug)]
pub struct MockStub {
    id: u32,
    closed: AtomicBool,
    fail_next: AtomicBool,
}

impl MockStub {
    fn new() -> Self {
        Self { id: NEXT_ID.fetch_add(1, Ordering::SeqCst), closed: AtomicBool::new(false), fail_next: AtomicBool::new(false) }
    }

    /// This instance's unique id, stable for its whole lifetime.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Whether `shutdown` has run on this stub.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Arms a one-shot failure for the next RPC call.
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn maybe_fail(&self) -> Result<(), MockError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            Err(MockError::new("induced failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Stub for MockStub {
    type Error = MockError;

    async fn enable_table(&self, _name: &str) -> Result<(), MockError> {
        self.maybe_fail()
    }

    async fn disable_table(&self, _name: &str) -> Result<(), MockError> {
        self.maybe_fail()
    }

    async fn is_table_enabled(&self, _name: &str) -> Result<bool, MockError> {
        self.maybe_fail()?;
        Ok(true)
    }

    async fn get_table_names(&self) -> Result<Vec<String>, MockError> {
        self.maybe_fail()?;
        Ok(Vec::new())
    }

    async fn get_column_descriptors(
        &self,
        _name: &str,
    ) -> Result<std::collections::HashMap<String, ColumnDescriptor>, MockError> {
        self.maybe_fail()?;
        Ok(Default::default())
    }

    async fn get_table_regions(&self, _name: &str) -> Result<Vec<RegionInfo>, MockError> {
        self.maybe_fail()?;
        Ok(Vec::new())
    }

    async fn create_table(&self, _name: &str, _column_families: &[ColumnDescriptor]) -> Result<(), MockError> {
        self.maybe_fail()
    }

    async fn delete_table(&self, _name: &str) -> Result<(), MockError> {
        self.maybe_fail()
    }

    async fn get(&self, _table: &str, _row: &[u8], _column: &str, _attributes: &Attributes) -> Result<Vec<Cell>, MockError> {
        self.maybe_fail()?;
        Ok(Vec::new())
    }

    async fn get_row(&self, _table: &str, _row: &[u8], _attributes: &Attributes) -> Result<Vec<RowResult>, MockError> {
        self.maybe_fail()?;
        Ok(Vec::new())
    }

    async fn get_row_with_columns(
        &self,
        _table: &str,
        _row: &[u8],
        _columns: &[String],
        _attributes: &Attributes,
    ) -> Result<Vec<RowResult>, MockError> {
        self.maybe_fail()?;
        Ok(Vec::new())
    }

    async fn get_rows(
        &self,
        _table: &str,
        _rows: &[Vec<u8>],
        _attributes: &Attributes,
    ) -> Result<Vec<RowResult>, MockError> {
        self.maybe_fail()?;
        Ok(Vec::new())
    }

    async fn get_rows_with_columns(
        &self,
        _table: &str,
        _rows: &[Vec<u8>],
        _columns: &[String],
        _attributes: &Attributes,
    ) -> Result<Vec<RowResult>, MockError> {
        self.maybe_fail()?;
        Ok(Vec::new())
    }

    async fn mutate_row(
        &self,
        _table: &str,
        _row: &[u8],
        _mutations: &[Mutation],
        _attributes: &Attributes,
    ) -> Result<(), MockError> {
        self.maybe_fail()
    }

    async fn mutate_rows(
        &self,
        _table: &str,
        _row_batches: &[BatchMutation],
        _attributes: &Attributes,
    ) -> Result<(), MockError> {
        self.maybe_fail()
    }

    async fn scanner_open_with_scan(
        &self,
        _table: &str,
        _scan: &Scan,
        _attributes: &Attributes,
    ) -> Result<ScannerId, MockError> {
        self.maybe_fail()?;
        Ok(0)
    }

    async fn scanner_open(
        &self,
        _table: &str,
        _start_row: &[u8],
        _columns: &[String],
        _attributes: &Attributes,
    ) -> Result<ScannerId, MockError> {
        self.maybe_fail()?;
        Ok(0)
    }

    async fn scanner_open_with_stop(
        &self,
        _table: &str,
        _start_row: &[u8],
        _stop_row: &[u8],
        _columns: &[String],
        _attributes: &Attributes,
    ) -> Result<ScannerId, MockError> {
        self.maybe_fail()?;
        Ok(0)
    }

    async fn scanner_open_with_prefix(
        &self,
        _table: &str,
        _start_and_prefix: &[u8],
        _columns: &[String],
        _attributes: &Attributes,
    ) -> Result<ScannerId, MockError> {
        self.maybe_fail()?;
        Ok(0)
    }

    async fn scanner_get(&self, _id: ScannerId) -> Result<Vec<RowResult>, MockError> {
        self.maybe_fail()?;
        Ok(Vec::new())
    }

    async fn scanner_get_list(&self, _id: ScannerId, _n_rows: i32) -> Result<Vec<RowResult>, MockError> {
        self.maybe_fail()?;
        Ok(Vec::new())
    }

    async fn scanner_close(&self, _id: ScannerId) -> Result<(), MockError> {
        self.maybe_fail()
    }

    async fn shutdown(&mut self) -> Result<(), MockError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Produces [`MockStub`]s, counting every attempt and optionally failing
/// all of them, to exercise the pool's connect-failure rollback path.
#[derive(Debug, Default)]
pub struct MockConnector {
    pub fail_connect: AtomicBool,
    pub connect_calls: AtomicU32,
}

#[async_trait]
impl StubConnector for MockConnector {
    type Stub = MockStub;
    type Error = MockError;

    async fn connect(&self, _instance: &Instance, _socket_timeout: Option<Duration>) -> Result<MockStub, MockError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(MockError::new("connect failed"));
        }
        Ok(MockStub::new())
    }
}
