//! A one-shot, single-thread-at-a-time wrapper around a borrowed stub
//! (spec.md §4.1). Exposes the full RPC operation surface plus `close`/
//! `is_closed`; on first `close` it hands the stub back to the pool, forced
//! to be destroyed iff any RPC on this handle ever returned an error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex as AsyncMutex;

use crate::connector::StubConnector;
use crate::error::{ClientError, ErrorList};
use crate::model::{Attributes, BatchMutation, Cell, ColumnDescriptor, Mutation, RegionInfo, RowResult, Scan, ScannerId};
use crate::pool::SharedPool;
use crate::stub::Stub;

type CallResult<T, C> = Result<T, ClientError<<C as StubConnector>::Error>>;

#[allow(missing_debug_implementations)]
pub(crate) struct ClientState<S> {
    /// `None` only after `close` has taken the stub to hand back to the pool.
    pub(crate) stub: Option<S>,
}

/// A checked-out handle wrapping one live stub. Concurrent callers on the
/// *same* handle are permitted (RPCs queue on an internal lock); a handle is
/// never shared implicitly across pool borrows the way a raw stub would be.
#[allow(missing_debug_implementations)]
pub struct Client<C: StubConnector> {
    pool: Arc<SharedPool<C>>,
    state: AsyncMutex<ClientState<C::Stub>>,
    errors: StdMutex<ErrorList<C::Error>>,
    closed: AtomicBool,
}

impl<C: StubConnector> Client<C> {
    pub(crate) fn new(pool: Arc<SharedPool<C>>, stub: C::Stub) -> Self {
        Self {
            pool,
            state: AsyncMutex::new(ClientState { stub: Some(stub) }),
            errors: StdMutex::new(ErrorList::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Whether `close` has already run for this handle. Monotonic: once
    /// true, never false again.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Closes the handle exactly once. The first caller returns the stub to
    /// the pool: destroyed if any RPC on this handle ever errored, parked
    /// for reuse otherwise. Every later call fails with `ClientError::Closed`.
    pub async fn close(&self) -> Result<(), ClientError<C::Error>> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(ClientError::Closed);
        }

        let mut state = self.state.lock().await;
        if let Some(stub) = state.stub.take() {
            let force = !self.errors.lock().expect("error list mutex poisoned").is_empty();
            drop(state);
            self.pool.put(stub, force).await;
        }
        Ok(())
    }

    fn record<T>(&self, op: &'static str, table: &str, result: Result<T, C::Error>) -> CallResult<T, C> {
        if let Err(ref e) = result {
            self.errors.lock().expect("error list mutex poisoned").add(e.clone());
            tracing::debug!(op, table, error = %e, "rpc call failed");
        }
        result.map_err(ClientError::Rpc)
    }

    /// Enables `name` for reads and writes.
    pub async fn enable_table(&self, name: &str) -> CallResult<(), C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").enable_table(name).await;
        self.record("enable_table", name, result)
    }

    /// Disables `name`.
    pub async fn disable_table(&self, name: &str) -> CallResult<(), C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").disable_table(name).await;
        self.record("disable_table", name, result)
    }

    /// Reports whether `name` is currently enabled.
    pub async fn is_table_enabled(&self, name: &str) -> CallResult<bool, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").is_table_enabled(name).await;
        self.record("is_table_enabled", name, result)
    }

    /// Lists all table names known to the service.
    pub async fn get_table_names(&self) -> CallResult<Vec<String>, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").get_table_names().await;
        self.record("get_table_names", "", result)
    }

    /// Fetches `name`'s column family descriptors, keyed by family name.
    pub async fn get_column_descriptors(
        &self,
        name: &str,
    ) -> CallResult<std::collections::HashMap<String, ColumnDescriptor>, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").get_column_descriptors(name).await;
        self.record("get_column_descriptors", name, result)
    }

    /// Lists the regions backing `name`.
    pub async fn get_table_regions(&self, name: &str) -> CallResult<Vec<RegionInfo>, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").get_table_regions(name).await;
        self.record("get_table_regions", name, result)
    }

    /// Creates `name` with the given column families.
    pub async fn create_table(&self, name: &str, column_families: &[ColumnDescriptor]) -> CallResult<(), C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").create_table(name, column_families).await;
        self.record("create_table", name, result)
    }

    /// Deletes `name`.
    pub async fn delete_table(&self, name: &str) -> CallResult<(), C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").delete_table(name).await;
        self.record("delete_table", name, result)
    }

    /// Fetches the cells of a single `column` in `row`.
    pub async fn get(&self, table: &str, row: &[u8], column: &str, attributes: &Attributes) -> CallResult<Vec<Cell>, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").get(table, row, column, attributes).await;
        self.record("get", table, result)
    }

    /// Fetches every column of `row`.
    pub async fn get_row(&self, table: &str, row: &[u8], attributes: &Attributes) -> CallResult<Vec<RowResult>, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").get_row(table, row, attributes).await;
        self.record("get_row", table, result)
    }

    /// Fetches a restricted set of `columns` of `row`.
    pub async fn get_row_with_columns(
        &self,
        table: &str,
        row: &[u8],
        columns: &[String],
        attributes: &Attributes,
    ) -> CallResult<Vec<RowResult>, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state
            .stub
            .as_ref()
            .expect("stub present while open")
            .get_row_with_columns(table, row, columns, attributes)
            .await;
        self.record("get_row_with_columns", table, result)
    }

    /// Fetches every column of several `rows`.
    pub async fn get_rows(&self, table: &str, rows: &[Vec<u8>], attributes: &Attributes) -> CallResult<Vec<RowResult>, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").get_rows(table, rows, attributes).await;
        self.record("get_rows", table, result)
    }

    /// Fetches a restricted set of `columns` of several `rows`.
    pub async fn get_rows_with_columns(
        &self,
        table: &str,
        rows: &[Vec<u8>],
        columns: &[String],
        attributes: &Attributes,
    ) -> CallResult<Vec<RowResult>, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state
            .stub
            .as_ref()
            .expect("stub present while open")
            .get_rows_with_columns(table, rows, columns, attributes)
            .await;
        self.record("get_rows_with_columns", table, result)
    }

    /// Applies a batch of column `mutations` to a single `row`.
    pub async fn mutate_row(
        &self,
        table: &str,
        row: &[u8],
        mutations: &[Mutation],
        attributes: &Attributes,
    ) -> CallResult<(), C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result =
            state.stub.as_ref().expect("stub present while open").mutate_row(table, row, mutations, attributes).await;
        self.record("mutate_row", table, result)
    }

    /// Applies per-row mutation `row_batches` across several rows.
    pub async fn mutate_rows(
        &self,
        table: &str,
        row_batches: &[BatchMutation],
        attributes: &Attributes,
    ) -> CallResult<(), C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result =
            state.stub.as_ref().expect("stub present while open").mutate_rows(table, row_batches, attributes).await;
        self.record("mutate_rows", table, result)
    }

    /// Opens a scanner from a full [`Scan`] descriptor.
    pub async fn scanner_open_with_scan(
        &self,
        table: &str,
        scan: &Scan,
        attributes: &Attributes,
    ) -> CallResult<ScannerId, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result =
            state.stub.as_ref().expect("stub present while open").scanner_open_with_scan(table, scan, attributes).await;
        self.record("scanner_open_with_scan", table, result)
    }

    /// Opens a scanner starting at `start_row` over `columns`.
    pub async fn scanner_open(
        &self,
        table: &str,
        start_row: &[u8],
        columns: &[String],
        attributes: &Attributes,
    ) -> CallResult<ScannerId, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state
            .stub
            .as_ref()
            .expect("stub present while open")
            .scanner_open(table, start_row, columns, attributes)
            .await;
        self.record("scanner_open", table, result)
    }

    /// Opens a scanner bounded by `start_row` and `stop_row`.
    pub async fn scanner_open_with_stop(
        &self,
        table: &str,
        start_row: &[u8],
        stop_row: &[u8],
        columns: &[String],
        attributes: &Attributes,
    ) -> CallResult<ScannerId, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state
            .stub
            .as_ref()
            .expect("stub present while open")
            .scanner_open_with_stop(table, start_row, stop_row, columns, attributes)
            .await;
        self.record("scanner_open_with_stop", table, result)
    }

    /// Opens a scanner over every row sharing `start_and_prefix` as a prefix.
    pub async fn scanner_open_with_prefix(
        &self,
        table: &str,
        start_and_prefix: &[u8],
        columns: &[String],
        attributes: &Attributes,
    ) -> CallResult<ScannerId, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state
            .stub
            .as_ref()
            .expect("stub present while open")
            .scanner_open_with_prefix(table, start_and_prefix, columns, attributes)
            .await;
        self.record("scanner_open_with_prefix", table, result)
    }

    /// Fetches the next row from scanner `id`.
    pub async fn scanner_get(&self, id: ScannerId) -> CallResult<Vec<RowResult>, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").scanner_get(id).await;
        self.record("scanner_get", "", result)
    }

    /// Fetches up to `n_rows` rows from scanner `id`.
    pub async fn scanner_get_list(&self, id: ScannerId, n_rows: i32) -> CallResult<Vec<RowResult>, C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").scanner_get_list(id, n_rows).await;
        self.record("scanner_get_list", "", result)
    }

    /// Closes scanner `id`, releasing its server-held cursor.
    pub async fn scanner_close(&self, id: ScannerId) -> CallResult<(), C> {
        if self.is_closed() {
            return Err(ClientError::Closed);
        }
        let state = self.state.lock().await;
        let result = state.stub.as_ref().expect("stub present while open").scanner_close(id).await;
        self.record("scanner_close", "", result)
    }
}

#[cfg(test)]
impl<C: StubConnector> Client<C> {
    pub(crate) async fn peek_stub(&self) -> tokio::sync::MappedMutexGuard<'_, C::Stub> {
        tokio::sync::MutexGuard::map(self.state.lock().await, |s| s.stub.as_mut().expect("stub present while open"))
    }

    pub(crate) async fn force_error(&self, err: C::Error) {
        self.errors.lock().expect("error list mutex poisoned").add(err);
    }
}
