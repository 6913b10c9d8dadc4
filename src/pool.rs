//! The connection-pool state machine: idle list, active count, blocking
//! waiters, background picker refresh and idle reaping, and the open/close
//! lifecycle (spec.md §4.5).

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::channel::oneshot;
use tokio::sync::{watch, Mutex as AsyncMutex};

use crate::balancer::{Balancer, Picker, RoundRobinBalancer};
use crate::client::Client;
use crate::connector::StubConnector;
use crate::discovery::{Discovery, StaticDiscovery};
use crate::error::PoolError;
use crate::instance::Instance;

/// A borrowed stub's health check, consulted only for idle nodes about to
/// be reused (spec.md §9 Open Questions: never for freshly constructed
/// ones). Returning `false` discards that node and tries the next.
pub type HealthChecker<S> = Arc<dyn Fn(&S, Instant) -> bool + Send + Sync>;

/// Builds a [`Pool`] from a set of named options applied in sequence, each
/// validating its own value and setting exactly one field: a no-op on
/// invalid input (spec.md §4.6), not a panic the way bb8's own `Builder`
/// asserts. That divergence from the teacher's validation style is
/// deliberate; see DESIGN.md.
pub struct PoolBuilder<C: StubConnector> {
    connector: C,
    discovery: Box<dyn Discovery>,
    balancer: Box<dyn Balancer>,
    update_picker_interval: Duration,
    socket_timeout: Option<Duration>,
    max_active: usize,
    max_idle: usize,
    idle_timeout: Duration,
    clean_up_interval: Duration,
    block_mode: bool,
    health_checker: Option<HealthChecker<C::Stub>>,
    now: Arc<dyn Fn() -> Instant + Send + Sync>,
}

impl<C: StubConnector> PoolBuilder<C> {
    /// Starts a builder with the reference defaults: an empty static
    /// discovery, a round-robin balancer, no socket timeout, unbounded
    /// active/idle, no idle reaping, no picker refresh, and fail-fast
    /// (non-blocking) admission.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            discovery: Box::new(StaticDiscovery::default()),
            balancer: Box::new(RoundRobinBalancer::new()),
            update_picker_interval: Duration::ZERO,
            socket_timeout: None,
            max_active: 0,
            max_idle: 0,
            idle_timeout: Duration::ZERO,
            clean_up_interval: Duration::ZERO,
            block_mode: false,
            health_checker: None,
            now: Arc::new(Instant::now),
        }
    }

    /// `Addrs(addrs...)`: builds a static discovery from bare addresses.
    /// A no-op if `addrs` is empty.
    pub fn addrs<I, S>(mut self, addrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let instances: Vec<Instance> = addrs.into_iter().map(|a| Instance::new(a.into())).collect();
        if !instances.is_empty() {
            self.discovery = Box::new(StaticDiscovery::new(instances));
        }
        self
    }

    /// `Instances(...)`: builds a static discovery from full [`Instance`]
    /// records. A no-op if `instances` is empty.
    pub fn instances(mut self, instances: Vec<Instance>) -> Self {
        if !instances.is_empty() {
            self.discovery = Box::new(StaticDiscovery::new(instances));
        }
        self
    }

    /// `Discovery(d)`: a custom discovery source.
    pub fn discovery(mut self, discovery: impl Discovery) -> Self {
        self.discovery = Box::new(discovery);
        self
    }

    /// `Balancer(b)`: a custom balancer.
    pub fn balancer(mut self, balancer: impl Balancer) -> Self {
        self.balancer = Box::new(balancer);
        self
    }

    /// `UpdatePickerInterval(d >= 0)`: `0` disables periodic refresh; the
    /// picker is still built once at construction.
    pub fn update_picker_interval(mut self, interval: Duration) -> Self {
        self.update_picker_interval = interval;
        self
    }

    /// `SocketTimeout(d >= 0)`: `0`/`None` means no socket-level timeout.
    pub fn socket_timeout(mut self, timeout: Duration) -> Self {
        self.socket_timeout = if timeout.is_zero() { None } else { Some(timeout) };
        self
    }

    /// `MaxActive(n >= 0)`: `0` means unbounded actives.
    pub fn max_active(mut self, max_active: usize) -> Self {
        self.max_active = max_active;
        self
    }

    /// `MaxIdle(n >= 0)`: `0` means unbounded idle retention.
    pub fn max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    /// `IdleTimeout(d >= 0)`: `0` disables time-based reaping (forced reap
    /// at close still runs).
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// `CleanUpInterval(d >= 0)`: `0` disables the background reaper.
    pub fn clean_up_interval(mut self, interval: Duration) -> Self {
        self.clean_up_interval = interval;
        self
    }

    /// `BlockMode(bool)`: whether `Get` suspends (true) or fails fast
    /// (false) once `max_active` is reached. Defaults to `false`.
    pub fn block_mode(mut self, block_mode: bool) -> Self {
        self.block_mode = block_mode;
        self
    }

    /// `HealthChecker(fn)`: consulted only when popping a node off the
    /// idle list, never for a freshly constructed stub.
    pub fn health_checker(mut self, checker: impl Fn(&C::Stub, Instant) -> bool + Send + Sync + 'static) -> Self {
        self.health_checker = Some(Arc::new(checker));
        self
    }

    /// Test-only hook so idle-reap and lifetime scenarios can simulate the
    /// clock without real sleeps (spec.md §9: "a time function is injected
    /// so tests can simulate the clock").
    #[cfg(test)]
    pub(crate) fn now_fn(mut self, now: impl Fn() -> Instant + Send + Sync + 'static) -> Self {
        self.now = Arc::new(now);
        self
    }

    /// Consumes the builder, returning a `Pool` whose picker already
    /// reflects the current discovery snapshot and that has started its
    /// background refresh/reap loops. No connections are pre-warmed, but
    /// the initial picker build runs synchronously before this returns, the
    /// way the Go reference calls `updatePicker()` inline in `NewPool`
    /// before spawning its goroutines.
    pub async fn build(self) -> Pool<C> {
        let PoolBuilder {
            connector,
            discovery,
            balancer,
            update_picker_interval,
            socket_timeout,
            max_active,
            max_idle,
            idle_timeout,
            clean_up_interval,
            block_mode,
            health_checker,
            now,
        } = self;

        let initial_picker = balancer.new_picker(Vec::new());
        let (close_tx, close_rx) = watch::channel(false);

        let shared = Arc::new(SharedPool {
            connector,
            discovery,
            balancer,
            update_picker_interval,
            socket_timeout,
            max_active,
            max_idle,
            idle_timeout,
            clean_up_interval,
            block_mode,
            health_checker,
            now,
            internals: AsyncMutex::new(PoolInternals {
                idle: VecDeque::new(),
                active: 0,
                waiters: VecDeque::new(),
                picker: initial_picker,
            }),
            closed: AtomicBool::new(false),
            close_tx,
            close_rx,
        });

        let pool = Pool { inner: shared };
        Pool::refresh_picker(&pool.inner).await;
        pool.spawn_picker_refresh();
        pool.spawn_reaper();
        pool
    }
}

struct IdleNode<S> {
    stub: S,
    deposited_at: Instant,
}

#[allow(missing_debug_implementations)]
struct PoolInternals<S> {
    idle: VecDeque<IdleNode<S>>,
    active: usize,
    waiters: VecDeque<oneshot::Sender<()>>,
    picker: Arc<dyn Picker>,
}

/// Signals exactly one waiter per release/reap event that could have freed
/// capacity (spec.md §5: "signal, not broadcast"). Skips waiters whose
/// receiver is already gone, same as bb8's `put_idle_conn` retry loop.
fn notify_one<S>(internals: &mut PoolInternals<S>) {
    while let Some(tx) = internals.waiters.pop_front() {
        if tx.send(()).is_ok() {
            break;
        }
    }
}

#[allow(missing_debug_implementations)]
pub(crate) struct SharedPool<C: StubConnector> {
    connector: C,
    discovery: Box<dyn Discovery>,
    balancer: Box<dyn Balancer>,
    update_picker_interval: Duration,
    socket_timeout: Option<Duration>,
    max_active: usize,
    max_idle: usize,
    idle_timeout: Duration,
    clean_up_interval: Duration,
    block_mode: bool,
    health_checker: Option<HealthChecker<C::Stub>>,
    now: Arc<dyn Fn() -> Instant + Send + Sync>,
    internals: AsyncMutex<PoolInternals<C::Stub>>,
    closed: AtomicBool,
    close_tx: watch::Sender<bool>,
    close_rx: watch::Receiver<bool>,
}

impl<C: StubConnector> SharedPool<C> {
    /// The release path: `put(stub, force)` from spec.md §4.5.
    ///
    /// If the pool is closed the stub is destroyed unconditionally. Otherwise,
    /// unless `force`, the stub is pushed to the front of the idle list; if
    /// that overflows `max_idle`, the oldest (back) node is evicted and
    /// becomes the victim instead. A victim (forced or overflowed) is
    /// destroyed with the pool lock released, so slow socket teardown never
    /// stalls other borrowers.
    pub(crate) async fn put(self: &Arc<Self>, stub: C::Stub, force: bool) {
        if self.closed.load(Ordering::SeqCst) {
            let mut stub = stub;
            let _ = stub.shutdown().await;
            return;
        }

        let mut internals = self.internals.lock().await;

        let victim = if force {
            Some(stub)
        } else {
            internals.idle.push_front(IdleNode { stub, deposited_at: (self.now)() });
            if self.max_idle > 0 && internals.idle.len() > self.max_idle {
                internals.idle.pop_back().map(|n| n.stub)
            } else {
                None
            }
        };

        match victim {
            Some(victim) => {
                internals.active -= 1;
                notify_one(&mut internals);
                drop(internals);
                let mut victim = victim;
                let _ = victim.shutdown().await;
            }
            None => {
                notify_one(&mut internals);
            }
        }
    }
}

/// A client-side connection pool and dynamic endpoint selector for a
/// Thrift-framed RPC service (spec.md §1). Cloning shares the same
/// underlying state: a `Pool` is a thin handle, the way bb8's `Pool<M>` is.
pub struct Pool<C: StubConnector> {
    inner: Arc<SharedPool<C>>,
}

impl<C: StubConnector> Clone for Pool<C> {
    fn clone(&self) -> Self {
        Pool { inner: self.inner.clone() }
    }
}

impl<C: StubConnector> fmt::Debug for Pool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("Pool({:p})", self.inner))
    }
}

impl<C: StubConnector> Pool<C> {
    /// Returns a builder to configure a new pool.
    pub fn builder(connector: C) -> PoolBuilder<C> {
        PoolBuilder::new(connector)
    }

    /// Borrows a handle from the pool, per spec.md §4.5's `Get` flowchart:
    /// reuse an idle stub (if healthy), else construct a fresh one (if under
    /// `max_active`), else block or fail fast depending on block mode.
    pub async fn get(&self) -> Result<Client<C>, PoolError> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(PoolError::PoolClosed);
        }

        self.clean_up_idle_nodes(false).await;

        loop {
            let mut internals = self.inner.internals.lock().await;

            if self.inner.closed.load(Ordering::SeqCst) {
                return Err(PoolError::PoolClosed);
            }

            if let Some(node) = internals.idle.pop_front() {
                let checker = self.inner.health_checker.clone();
                drop(internals);

                let healthy = match &checker {
                    Some(check) => check(&node.stub, node.deposited_at),
                    None => true,
                };

                if healthy {
                    return Ok(Client::new(self.inner.clone(), node.stub));
                }

                let mut stub = node.stub;
                let _ = stub.shutdown().await;

                let mut internals = self.inner.internals.lock().await;
                internals.active -= 1;
                notify_one(&mut internals);
                continue;
            }

            if self.inner.max_active == 0 || internals.active < self.inner.max_active {
                internals.active += 1;
                let picker = internals.picker.clone();
                drop(internals);

                return match self.connect_via(&picker).await {
                    Ok(stub) => Ok(Client::new(self.inner.clone(), stub)),
                    Err(err) => {
                        let mut internals = self.inner.internals.lock().await;
                        internals.active -= 1;
                        notify_one(&mut internals);
                        Err(err)
                    }
                };
            }

            if !self.inner.block_mode {
                return Err(PoolError::PoolFull);
            }

            let (tx, rx) = oneshot::channel();
            internals.waiters.push_back(tx);
            drop(internals);
            let _ = rx.await;
            // Woken or sender dropped: loop back and re-check everything,
            // exactly as spec.md §4.5 describes; no item is handed to the
            // waiter directly.
        }
    }

    async fn connect_via(&self, picker: &Arc<dyn Picker>) -> Result<C::Stub, PoolError> {
        let instance = picker.pick().map_err(|_| PoolError::NoInstance)?;
        self.inner
            .connector
            .connect(&instance, self.inner.socket_timeout)
            .await
            .map_err(|e| PoolError::Connect(Box::new(e)))
    }

    /// Closes the pool: marks it closed, stops the background loops, and
    /// force-reaps the entire idle list. Idempotent only in the sense of
    /// reporting `PoolClosed` on repeat calls; it does not return `Ok(())`
    /// twice (spec.md §5 shutdown).
    pub async fn close(&self) -> Result<(), PoolError> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Err(PoolError::PoolClosed);
        }

        let _ = self.inner.close_tx.send(true);
        self.clean_up_idle_nodes(true).await;
        Ok(())
    }

    /// Whether the pool has been closed. Monotonic: once true, never false
    /// again for this instance.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// `cleanUpIdleNodes(force)` from spec.md §4.5: walks the idle list from
    /// the oldest end, stopping at the first node younger than
    /// `idle_timeout` unless `force`. The lock is released around each
    /// transport teardown.
    async fn clean_up_idle_nodes(&self, force: bool) {
        if !force && self.inner.idle_timeout.is_zero() {
            return;
        }

        loop {
            let mut internals = self.inner.internals.lock().await;

            let expired = match internals.idle.back() {
                Some(node) => force || (self.inner.now)().duration_since(node.deposited_at) >= self.inner.idle_timeout,
                None => false,
            };
            if !expired {
                return;
            }

            let node = internals.idle.pop_back().expect("checked non-empty above");
            internals.active -= 1;
            notify_one(&mut internals);
            drop(internals);

            let mut stub = node.stub;
            let _ = stub.shutdown().await;
        }
    }

    async fn refresh_picker(inner: &Arc<SharedPool<C>>) {
        match inner.discovery.discover().await {
            Ok(instances) => {
                let picker = inner.balancer.new_picker(instances);
                let mut internals = inner.internals.lock().await;
                internals.picker = picker;
                tracing::debug!(balancer = inner.balancer.name(), "picker refreshed");
            }
            Err(err) => {
                tracing::warn!(error = %err, "discovery failed, keeping previous picker");
            }
        }
    }

    fn spawn_picker_refresh(&self) {
        if self.inner.update_picker_interval.is_zero() {
            // The initial build already ran once synchronously; spec.md
            // §4.5 says a zero interval means refresh only at construction.
            return;
        }

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(inner.update_picker_interval);
            ticker.tick().await; // first tick fires immediately; already refreshed in build()
            let mut close_rx = inner.close_rx.clone();
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        Self::refresh_picker(&inner).await;
                    }
                    _ = close_rx.changed() => {
                        return;
                    }
                }
            }
        });
    }

    fn spawn_reaper(&self) {
        if self.inner.clean_up_interval.is_zero() {
            return;
        }

        let pool = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(pool.inner.clean_up_interval);
            ticker.tick().await;
            let mut close_rx = pool.inner.close_rx.clone();
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        tracing::debug!("idle reaper tick");
                        pool.clean_up_idle_nodes(false).await;
                    }
                    _ = close_rx.changed() => {
                        return;
                    }
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering as AtomicOrdering;
    use std::time::Duration;

    use super::*;
    use crate::balancer::WeightedRoundRobinBalancer;
    use crate::mock::MockConnector;

    fn connector() -> MockConnector {
        MockConnector::default()
    }

    #[tokio::test]
    async fn blocking_saturation_wakes_exactly_one_waiter() {
        let pool = Pool::builder(connector())
            .addrs(["a:1"])
            .max_active(1)
            .block_mode(true)
            .build().await;

        let a = pool.get().await.unwrap();
        let a_id = {
            let guard = a.peek_stub().await;
            guard.id()
        };

        let pool2 = pool.clone();
        let b = tokio::spawn(async move { pool2.get().await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!b.is_finished());

        a.close().await.unwrap();

        let b = b.await.unwrap().unwrap();
        let b_id = b.peek_stub().await.id();
        assert_eq!(a_id, b_id, "B should reuse A's exact stub");
    }

    #[tokio::test]
    async fn fail_fast_saturation_does_not_suspend() {
        let pool = Pool::builder(connector()).addrs(["a:1"]).max_active(1).build().await;

        let a = pool.get().await.unwrap();
        let err = pool.get().await.unwrap_err();
        assert!(matches!(err, PoolError::PoolFull));
        assert!(!a.is_closed());
    }

    #[tokio::test]
    async fn faulty_handle_is_not_recycled() {
        let pool = Pool::builder(connector())
            .addrs(["a:1"])
            .max_active(1)
            .max_idle(1)
            .build().await;

        let a = pool.get().await.unwrap();
        let a_id = a.peek_stub().await.id();
        a.force_error(crate::mock::MockError::new("boom")).await;
        a.close().await.unwrap();

        let b = pool.get().await.unwrap();
        let b_id = b.peek_stub().await.id();
        assert_ne!(a_id, b_id, "faulty stub must not be recycled");
    }

    #[tokio::test(start_paused = true)]
    async fn idle_reaping_empties_the_list_after_timeout() {
        let pool = Pool::builder(connector())
            .addrs(["a:1", "b:1"])
            .max_active(2)
            .max_idle(2)
            .idle_timeout(Duration::from_millis(50))
            .clean_up_interval(Duration::from_millis(10))
            .build().await;

        let a = pool.get().await.unwrap();
        let b = pool.get().await.unwrap();
        a.close().await.unwrap();
        b.close().await.unwrap();

        tokio::time::advance(Duration::from_millis(200)).await;
        // Let the reaper task actually run on the advanced clock.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(10)).await;
        tokio::task::yield_now().await;

        let internals = pool.inner.internals.lock().await;
        assert_eq!(internals.idle.len(), 0);
        assert_eq!(internals.active, 0);
    }

    #[tokio::test]
    async fn get_then_close_reuses_the_same_stub_with_max_active_one() {
        let pool = Pool::builder(connector()).addrs(["a:1"]).max_active(1).max_idle(1).build().await;

        let a = pool.get().await.unwrap();
        let a_id = a.peek_stub().await.id();
        a.close().await.unwrap();

        let b = pool.get().await.unwrap();
        assert_eq!(a_id, b.peek_stub().await.id());
    }

    #[tokio::test]
    async fn max_idle_zero_creates_a_fresh_stub_every_cycle() {
        let pool = Pool::builder(connector()).addrs(["a:1"]).build().await;

        let a = pool.get().await.unwrap();
        let a_id = a.peek_stub().await.id();
        a.close().await.unwrap();

        let b = pool.get().await.unwrap();
        assert_ne!(a_id, b.peek_stub().await.id());
    }

    #[tokio::test]
    async fn closed_pool_rejects_get_and_close() {
        let pool = Pool::builder(connector()).addrs(["a:1"]).build().await;
        pool.close().await.unwrap();

        assert!(matches!(pool.get().await.unwrap_err(), PoolError::PoolClosed));
        assert!(matches!(pool.close().await.unwrap_err(), PoolError::PoolClosed));
        assert!(pool.is_closed());
    }

    #[tokio::test]
    async fn picker_refresh_is_non_blocking_for_an_in_flight_borrow() {
        let pool = Pool::builder(connector())
            .addrs(["a:1"])
            .balancer(WeightedRoundRobinBalancer::new())
            .max_active(2)
            .build().await;

        let a = pool.get().await.unwrap();
        assert!(!a.is_closed());

        // A background refresh replacing the picker must not disturb a
        // handle that is already checked out.
        let b = pool.get().await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn no_instance_surfaces_as_pool_error() {
        let pool: Pool<MockConnector> = Pool::builder(connector()).build().await; // empty discovery
        let err = pool.get().await.unwrap_err();
        assert!(matches!(err, PoolError::NoInstance));
    }

    #[tokio::test]
    async fn connect_failure_decrements_active_and_notifies() {
        let connector = connector();
        connector.fail_connect.store(true, AtomicOrdering::SeqCst);
        let pool = Pool::builder(connector).addrs(["a:1"]).max_active(1).build().await;

        assert!(pool.get().await.is_err());

        // active should have been rolled back, so a later successful
        // connect is allowed through.
        let inner = &pool.inner;
        inner.connector.fail_connect.store(false, AtomicOrdering::SeqCst);
        assert!(pool.get().await.is_ok());
    }

}
