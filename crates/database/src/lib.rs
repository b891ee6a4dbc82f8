//! # Database Crate
//!
//! Owns the lifecycle of a single PostgreSQL session whose credentials come
//! from the `configuration` crate.
//!
//! ## Public API
//!
//! - [`ConnectionManager`]: resolves credentials up front, then connects lazily,
//!   hands out scoped cursors and runs one-shot queries in their own transaction.
//! - [`Cursor`]: the statement cursor lent to a [`ConnectionManager::with_cursor`] scope.
//! - [`Driver`] / [`DbHandle`]: the seam to the client library; [`PgDriver`] is
//!   the sqlx-backed implementation.
//! - [`DbError`]: the errors this crate can return.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod cursor;
pub mod decode;
pub mod driver;
pub mod error;
pub mod manager;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect_options, PgDriver, PgHandle};
pub use cursor::Cursor;
pub use driver::{DbHandle, Driver, Row};
pub use error::DbError;
pub use manager::{ConnectionInfo, ConnectionManager, FetchMode, QueryResult, CONNECT_TIMEOUT};
