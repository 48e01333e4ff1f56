//! SQLite storage access.
//!
//! [`Database`] owns a fixed pool of connections. Every storage round-trip
//! checks a connection out immediately before it runs, on a blocking worker,
//! bounded by a deadline. On expiry the running statement is interrupted and
//! the connection goes back to the pool. In-memory databases use a single
//! connection.

mod convert;
mod pool;
pub mod schema;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{Connection, InterruptHandle, OpenFlags};
use tracing::{debug, info, trace, warn};

use crate::config::RepositoryConfig;
use crate::error::Error;
use crate::mapper::Row;
use crate::query::RenderedQuery;

pub use convert::{classify, from_sql_value, to_sql_value};
use pool::Pool;

/// Progress of one storage call, shared with its deadline watcher.
enum CallState {
    Pending,
    Running(InterruptHandle),
    Finished,
    Cancelled,
}

/// Pooled SQLite database.
#[derive(Clone)]
pub struct Database {
    pool: Arc<Pool>,
    location: Arc<str>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("location", &self.location)
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl Database {
    /// Open the database described by `config`.
    ///
    /// An in-memory configuration gets a private database held by a single
    /// connection, whatever the configured pool size: shared-cache table
    /// locks are not covered by the busy timeout. Calls queue on that
    /// connection instead.
    pub fn open(config: &RepositoryConfig) -> Result<Self, Error> {
        let (location, size) = if config.in_memory {
            let location = format!("file:menudb-{}?mode=memory", uuid::Uuid::new_v4());
            if config.pool_size > 1 {
                debug!(
                    requested = config.pool_size,
                    "In-memory database uses a single connection"
                );
            }
            (location, 1)
        } else {
            (config.path.to_string_lossy().into_owned(), config.pool_size.max(1))
        };
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            let conn = Connection::open_with_flags(&location, flags).map_err(classify)?;
            prepare_connection(&conn, config)?;
            connections.push(conn);
        }

        Ok(Self {
            pool: Arc::new(Pool::new(connections)),
            location: location.into(),
        })
    }

    /// Where the database lives.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Number of pooled connections.
    pub fn pool_size(&self) -> usize {
        self.pool.size()
    }

    /// Number of connections not checked out.
    pub fn idle_connections(&self) -> usize {
        self.pool.idle()
    }

    /// Create tables and indexes if missing.
    pub fn migrate(&self) -> Result<(), Error> {
        let conn = self.pool.acquire();
        conn.execute_batch(schema::SCHEMA).map_err(classify)?;
        info!(
            location = %self.location,
            tables = schema::TABLES.len(),
            "Schema migrated"
        );
        Ok(())
    }

    /// Run `op` on a pooled connection within `deadline`.
    ///
    /// When the deadline passes before `op` has started, it never runs. When
    /// `op` is running, its statement is interrupted and the call waits for
    /// `op` to return: an `op` that still completed (for example a write that
    /// had already committed) reports its own result, anything else fails
    /// with `DeadlineExceeded`.
    pub async fn run<T, F>(&self, deadline: Duration, op: F) -> Result<T, Error>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, Error> + Send + 'static,
    {
        let state = Arc::new(Mutex::new(CallState::Pending));
        let task_state = Arc::clone(&state);
        let pool = Arc::clone(&self.pool);

        let mut task = tokio::task::spawn_blocking(move || {
            let mut conn = pool.acquire();
            {
                let mut state = task_state.lock();
                if matches!(*state, CallState::Cancelled) {
                    return Err(Error::DeadlineExceeded(deadline));
                }
                *state = CallState::Running(conn.get_interrupt_handle());
            }
            let result = op(&mut conn);
            *task_state.lock() = CallState::Finished;
            result
        });

        let result = match tokio::time::timeout(deadline, &mut task).await {
            Ok(joined) => flatten(joined),
            Err(_) => {
                // Interrupt under the lock: the task cannot finish and hand
                // the connection to another call meanwhile.
                let interrupted = {
                    let mut state = state.lock();
                    match std::mem::replace(&mut *state, CallState::Cancelled) {
                        CallState::Pending | CallState::Cancelled => None,
                        CallState::Running(handle) => {
                            handle.interrupt();
                            Some(true)
                        }
                        CallState::Finished => Some(false),
                    }
                };
                match interrupted {
                    None => Err(Error::DeadlineExceeded(deadline)),
                    Some(interrupted) => match flatten(task.await) {
                        Ok(value) => {
                            debug!(
                                deadline_ms = deadline.as_millis() as u64,
                                "Storage call completed past its deadline"
                            );
                            Ok(value)
                        }
                        Err(e) if !interrupted => Err(e),
                        Err(_) => Err(Error::DeadlineExceeded(deadline)),
                    },
                }
            }
        };

        match &result {
            Err(Error::DeadlineExceeded(_)) => warn!(
                deadline_ms = deadline.as_millis() as u64,
                "Storage call exceeded deadline"
            ),
            Err(e) if e.is_transient() => warn!(error = %e, "Transient storage failure"),
            _ => {}
        }
        result
    }

    /// Execute a rendered query and return its rows.
    pub async fn fetch(&self, query: RenderedQuery, deadline: Duration) -> Result<Vec<Row>, Error> {
        self.run(deadline, move |conn| query_rows(conn, &query)).await
    }
}

fn flatten<T>(joined: Result<Result<T, Error>, tokio::task::JoinError>) -> Result<T, Error> {
    joined.unwrap_or_else(|e| Err(Error::Storage(format!("storage task failed: {e}"))))
}

fn prepare_connection(conn: &Connection, config: &RepositoryConfig) -> Result<(), Error> {
    conn.busy_timeout(config.busy_timeout).map_err(classify)?;
    // `like` is case sensitive; `ilike` lowers both sides.
    conn.pragma_update(None, "case_sensitive_like", true)
        .map_err(classify)?;
    if !config.in_memory {
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
            .map_err(classify)?;
    }
    Ok(())
}

/// Run `query` on `conn`, converting every row.
pub(crate) fn query_rows(conn: &Connection, query: &RenderedQuery) -> Result<Vec<Row>, Error> {
    trace!(sql = %query.sql, params = query.params.len(), "Executing query");
    let mut stmt = conn.prepare_cached(&query.sql).map_err(classify)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let params: Vec<_> = query.params.iter().map(to_sql_value).collect();

    let mut rows = stmt
        .query(rusqlite::params_from_iter(params.iter()))
        .map_err(classify)?;
    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(classify)? {
        let mut columns = Vec::with_capacity(names.len());
        for (idx, name) in names.iter().enumerate() {
            let value: rusqlite::types::Value = row.get(idx).map_err(classify)?;
            columns.push((name.clone(), from_sql_value(value)));
        }
        out.push(Row::new(columns));
    }
    Ok(out)
}
