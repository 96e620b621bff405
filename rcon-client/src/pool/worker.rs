use std::{
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use rcon_types::RconBody;
use tokio::sync::{Mutex, mpsc};

use crate::{connection::RconConnection, error::RconError};

/// One pooled connection slot. Connects lazily on its first use and stays
/// connected across calls until the underlying transport reports loss, at
/// which point [`PoolWorker::is_disconnected`] starts returning `true` and
/// this worker removes itself from the owning [`crate::pool::RconPool`]'s
/// worker list, rather than waiting to be noticed the next time it would
/// have been handed out.
pub struct PoolWorker {
    host: String,
    port: u16,
    password: String,
    timeout: Duration,
    connection: Mutex<Option<Arc<RconConnection>>>,
    busy: AtomicBool,
    disconnected: AtomicBool,
    self_weak: Weak<PoolWorker>,
    evict_tx: mpsc::UnboundedSender<Arc<PoolWorker>>,
}

impl PoolWorker {
    pub(crate) fn new(
        host: String,
        port: u16,
        password: String,
        timeout: Duration,
        evict_tx: mpsc::UnboundedSender<Arc<PoolWorker>>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            host,
            port,
            password,
            timeout,
            connection: Mutex::new(None),
            busy: AtomicBool::new(false),
            disconnected: AtomicBool::new(false),
            self_weak: weak.clone(),
            evict_tx,
        })
    }

    /// Marks this worker dead and, if it's still reachable from the pool,
    /// asks the pool to drop it from `workers` immediately rather than on
    /// its next trip through the idle queue.
    fn evict(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
        match self.self_weak.upgrade() {
            Some(this) => {
                tracing::warn!("pool worker lost its connection, evicting");
                let _ = self.evict_tx.send(this);
            }
            None => tracing::debug!("pool worker lost its connection after being dropped"),
        }
    }

    async fn get_connection(&self) -> Result<Arc<RconConnection>, RconError> {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = &*guard {
            if conn.is_connected() {
                return Ok(Arc::clone(conn));
            }
        }

        let conn = match RconConnection::connect(&self.host, self.port, &self.password, self.timeout).await {
            Ok(conn) => Arc::new(conn),
            Err(e) => {
                self.evict();
                return Err(e);
            }
        };

        let watched = Arc::clone(&conn);
        let self_weak = self.self_weak.clone();
        tokio::spawn(async move {
            watched.wait_until_disconnected().await;
            if let Some(worker) = self_weak.upgrade() {
                worker.evict();
            }
        });

        *guard = Some(Arc::clone(&conn));
        Ok(conn)
    }

    /// Whether this worker is currently handling a command.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Whether this worker's connection has been lost and it must be
    /// retired rather than reused.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    pub(crate) async fn execute(
        &self,
        command: &str,
        version: u32,
        body: impl Into<RconBody>,
    ) -> Result<String, RconError> {
        self.busy.store(true, Ordering::SeqCst);
        let result = async {
            let conn = self.get_connection().await?;
            conn.execute(command, version, body).await
        }
        .await;
        self.busy.store(false, Ordering::SeqCst);
        result
    }
}
