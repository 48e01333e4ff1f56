//! Repository configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default number of pooled storage connections.
pub const DEFAULT_POOL_SIZE: usize = 4;

/// Default page size when the caller gives no limit.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Default upper bound for a caller supplied limit.
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 1000;

/// Default deadline for one storage round-trip.
pub const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Default SQLite busy timeout.
pub const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 5;

/// Paging bounds applied by the query builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    /// Limit used when the caller supplies none.
    pub default_page_size: u32,
    /// Largest accepted limit.
    pub max_page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl PageLimits {
    /// Create paging bounds.
    pub fn new(default_page_size: u32, max_page_size: u32) -> Self {
        Self {
            default_page_size,
            max_page_size,
        }
    }
}

/// Configuration for the repository layer.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,

    /// Use a private in-memory database instead of `path`.
    pub in_memory: bool,

    /// Number of pooled connections.
    pub pool_size: usize,

    /// Paging bounds.
    pub page_limits: PageLimits,

    /// Deadline for one storage round-trip when the caller gives none.
    pub query_timeout: Duration,

    /// How long SQLite waits on a locked database before reporting busy.
    pub busy_timeout: Duration,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./menudb.sqlite3"),
            in_memory: false,
            pool_size: DEFAULT_POOL_SIZE,
            page_limits: PageLimits::default(),
            query_timeout: Duration::from_secs(DEFAULT_QUERY_TIMEOUT_SECS),
            busy_timeout: Duration::from_secs(DEFAULT_BUSY_TIMEOUT_SECS),
        }
    }
}

impl RepositoryConfig {
    /// Create a configuration for the database file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create an in-memory configuration. The database is served by a
    /// single connection regardless of the pool size.
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            in_memory: true,
            ..Default::default()
        }
    }

    /// Set the pool size. Zero is raised to one.
    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size.max(1);
        self
    }

    /// Set the default page size.
    pub fn with_default_page_size(mut self, size: u32) -> Self {
        self.page_limits.default_page_size = size;
        self
    }

    /// Set the maximum page size.
    pub fn with_max_page_size(mut self, size: u32) -> Self {
        self.page_limits.max_page_size = size;
        self
    }

    /// Set the query timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Set the busy timeout.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }
}
