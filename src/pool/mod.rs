//! Outbound connection pool subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher.acquire(origin)
//!     → per-origin shard (semaphore, C permits, FIFO waiters)
//!     → permit within acquire_timeout_ms, else PoolExhausted
//!     → pop live idle connection, else dial via the Connector
//!     → PooledConnection (exclusively owned by one request)
//!
//! release(reusable)
//!     → idle deque if reusable and below max_idle, else closed
//!     → permit freed afterwards so the next waiter finds the idle conn
//!
//! periodic sweep
//!     → closes idle connections older than idle_timeout
//! ```
//!
//! # Design Decisions
//! - One permit per live connection slot: idle + in-use + opening never
//!   exceeds C per origin because acquirers always drain idle first
//! - Per-origin shards in a DashMap; contention on one origin never
//!   blocks traffic to another
//! - Dropping a PooledConnection without releasing closes it: a request
//!   cancelled mid-flight conservatively discards its connection
//! - The wire transport lives behind the Connector trait; the pool never
//!   performs protocol I/O itself

pub mod body;
pub mod connection;
#[allow(clippy::module_inception)]
pub mod pool;

pub use body::GuardedBody;
pub use connection::{Connector, HttpConnector, OriginConnection};
pub use pool::{ConnectionPool, PooledConnection};
