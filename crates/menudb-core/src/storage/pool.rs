//! Fixed-size connection pool.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use rusqlite::Connection;

/// Idle connections plus a condition variable signalled on release.
pub(crate) struct Pool {
    idle: Mutex<Vec<Connection>>,
    released: Condvar,
    size: usize,
}

impl Pool {
    pub(crate) fn new(connections: Vec<Connection>) -> Self {
        Self {
            size: connections.len(),
            idle: Mutex::new(connections),
            released: Condvar::new(),
        }
    }

    /// Number of connections owned by the pool.
    pub(crate) fn size(&self) -> usize {
        self.size
    }

    /// Number of connections not currently checked out.
    pub(crate) fn idle(&self) -> usize {
        self.idle.lock().len()
    }

    /// Block until a connection is free.
    pub(crate) fn acquire(self: &Arc<Self>) -> PooledConnection {
        let mut idle = self.idle.lock();
        loop {
            if let Some(conn) = idle.pop() {
                return PooledConnection {
                    conn: Some(conn),
                    pool: Arc::clone(self),
                };
            }
            self.released.wait(&mut idle);
        }
    }

    fn release(&self, conn: Connection) {
        self.idle.lock().push(conn);
        self.released.notify_one();
    }
}

/// A checked-out connection, returned to the pool on drop.
pub(crate) struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<Pool>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // Only `drop` takes the connection.
        self.conn.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
