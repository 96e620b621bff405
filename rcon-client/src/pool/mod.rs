//! A fixed-capacity pool of reusable RCON connections.

mod worker;

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use rcon_types::RconBody;
use tokio::sync::{Mutex, mpsc};

pub use worker::PoolWorker;

use crate::{client::DEFAULT_TIMEOUT, commands::RconCommands, error::RconError};

/// A pool of up to `max_workers` concurrently-usable connections to the
/// same RCON server.
///
/// Workers are created lazily, on demand, up to `max_workers`; once that
/// capacity is reached, callers queue for the next worker to become
/// available. A worker whose connection has been lost removes itself from
/// the pool the moment that's detected — whether it was sitting idle, was
/// checked out and mid-command, or never managed to connect in the first
/// place — so a failing server never permanently wedges the pool against
/// its capacity limit.
pub struct RconPool {
    host: String,
    port: u16,
    password: String,
    timeout: Duration,
    max_workers: usize,
    workers: Arc<Mutex<Vec<Arc<PoolWorker>>>>,
    created: AtomicUsize,
    idle_tx: mpsc::UnboundedSender<Arc<PoolWorker>>,
    idle_rx: Mutex<mpsc::UnboundedReceiver<Arc<PoolWorker>>>,
    evict_tx: mpsc::UnboundedSender<Arc<PoolWorker>>,
}

impl RconPool {
    /// Builds a pool that will open at most `max_workers` connections to
    /// `host:port`.
    ///
    /// # Panics
    ///
    /// Panics if `max_workers` is `0`.
    pub fn new(host: impl Into<String>, port: u16, password: impl Into<String>, max_workers: usize) -> Self {
        assert!(max_workers > 0, "max_workers must be greater than 0");
        let (idle_tx, idle_rx) = mpsc::unbounded_channel();
        let (evict_tx, mut evict_rx) = mpsc::unbounded_channel::<Arc<PoolWorker>>();
        let workers: Arc<Mutex<Vec<Arc<PoolWorker>>>> = Arc::new(Mutex::new(Vec::new()));

        let evicted_from = Arc::clone(&workers);
        tokio::spawn(async move {
            while let Some(worker) = evict_rx.recv().await {
                let mut workers = evicted_from.lock().await;
                let before = workers.len();
                workers.retain(|candidate| !Arc::ptr_eq(candidate, &worker));
                if workers.len() < before {
                    tracing::info!(live_workers = workers.len(), "pool worker evicted");
                }
            }
        });

        Self {
            host: host.into(),
            port,
            password: password.into(),
            timeout: DEFAULT_TIMEOUT,
            max_workers,
            workers,
            created: AtomicUsize::new(0),
            idle_tx,
            idle_rx: Mutex::new(idle_rx),
            evict_tx,
        }
    }

    /// Overrides the per-command timeout used by workers created from now
    /// on.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How many workers have been created so far (connected or not). Unlike
    /// the pool's live worker list, this never decreases — it counts
    /// creations, not survivors.
    pub async fn worker_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    async fn acquire(&self) -> Arc<PoolWorker> {
        loop {
            let worker = {
                let mut workers = self.workers.lock().await;
                let mut idle = self.idle_rx.lock().await;
                match idle.try_recv() {
                    Ok(worker) => worker,
                    Err(mpsc::error::TryRecvError::Empty) if workers.len() < self.max_workers => {
                        let worker = PoolWorker::new(
                            self.host.clone(),
                            self.port,
                            self.password.clone(),
                            self.timeout,
                            self.evict_tx.clone(),
                        );
                        workers.push(Arc::clone(&worker));
                        let created = self.created.fetch_add(1, Ordering::SeqCst) + 1;
                        tracing::debug!(created, live_workers = workers.len(), "pool worker created");
                        worker
                    }
                    _ => {
                        drop(workers);
                        idle
                            .recv()
                            .await
                            .expect("idle_tx is held by this pool for its whole lifetime")
                    }
                }
            };

            if !worker.is_disconnected() {
                return worker;
            }
        }
    }

    fn release(&self, worker: Arc<PoolWorker>) {
        if !worker.is_disconnected() {
            // The receiver is owned by this same pool for its whole
            // lifetime, so this can only fail if the pool is being
            // dropped, in which case there's nothing left to hand the
            // worker back to.
            let _ = self.idle_tx.send(worker);
        }
    }

    /// Sends a command on whichever worker becomes available first.
    pub async fn execute(
        &self,
        command: &str,
        version: u32,
        body: impl Into<RconBody>,
    ) -> Result<String, RconError> {
        let worker = self.acquire().await;
        let result = worker.execute(command, version, body).await;
        self.release(worker);
        result
    }
}

impl RconCommands for RconPool {
    async fn execute(
        &self,
        command: &str,
        version: u32,
        body: impl Into<RconBody>,
    ) -> Result<String, RconError> {
        RconPool::execute(self, command, version, body).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rcon_test_utils::FakeServer;

    use super::*;

    #[tokio::test]
    async fn dead_worker_is_retired_and_replaced() {
        let server = FakeServer::start().await;
        server.expect_handshake(b"K", "T1", "pw").await;
        server.reply_ok("[]").await;

        let pool = RconPool::new("127.0.0.1", server.port(), "pw", 2).with_timeout(Duration::from_secs(2));
        let reply = pool.execute("GetPlayers", 2, "").await;
        assert_eq!(reply.unwrap(), "[]");
        assert_eq!(pool.worker_count().await, 1);

        server.sever_connection().await;
        // Give the reader task a moment to observe EOF and flip the
        // worker's disconnected flag.
        tokio::time::sleep(Duration::from_millis(50)).await;

        server.expect_handshake(b"K", "T2", "pw").await;
        server.reply_ok("[]").await;
        let reply = pool.execute("GetPlayers", 2, "").await;
        assert_eq!(reply.unwrap(), "[]");
        assert_eq!(pool.worker_count().await, 2);
    }

    #[tokio::test]
    async fn dead_worker_is_evicted_from_the_live_list_immediately() {
        let server = FakeServer::start().await;
        server.expect_handshake(b"K", "T1", "pw").await;
        server.reply_ok("[]").await;

        let pool = RconPool::new("127.0.0.1", server.port(), "pw", 1).with_timeout(Duration::from_secs(2));
        let reply = pool.execute("GetPlayers", 2, "").await;
        assert_eq!(reply.unwrap(), "[]");
        assert_eq!(pool.workers.lock().await.len(), 1);

        server.sever_connection().await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        // With max_workers == 1, a dead worker left in the live list would
        // permanently wedge acquire() against the idle queue: capacity
        // would never free up, and nothing dead is ever re-queued. The
        // eviction must clear the live list, not just flag the worker.
        assert_eq!(pool.workers.lock().await.len(), 0);

        server.expect_handshake(b"K", "T2", "pw").await;
        server.reply_ok("[]").await;
        let reply = tokio::time::timeout(Duration::from_secs(2), pool.execute("GetPlayers", 2, ""))
            .await
            .expect("acquire() must not block forever once the dead worker is gone");
        assert_eq!(reply.unwrap(), "[]");
    }
}
