//! The seam between the connection manager and the database client.

use async_trait::async_trait;
use core_types::CredentialSet;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;

/// One result row: column name to value, in select-list order.
pub type Row = IndexMap<String, JsonValue>;

/// Opens database sessions.
#[async_trait]
pub trait Driver: Send + Sync {
    type Handle: DbHandle;

    async fn connect(&self, credentials: &CredentialSet) -> Result<Self::Handle, sqlx::Error>;
}

/// A live database session with DB-API style transaction semantics: the
/// first statement after a commit or rollback opens a new transaction.
#[async_trait]
pub trait DbHandle: Send {
    /// Runs a trivial query outside any transaction.
    async fn ping(&mut self) -> Result<(), sqlx::Error>;

    /// Runs one statement with positional parameters and buffers its rows.
    async fn execute(&mut self, sql: &str, params: &[JsonValue]) -> Result<(), sqlx::Error>;

    /// Takes the next buffered row, if any.
    fn fetch_one(&mut self) -> Option<Row>;

    /// Takes every remaining buffered row.
    fn fetch_all(&mut self) -> Vec<Row>;

    /// Discards unread rows of the last statement.
    fn close_cursor(&mut self);

    async fn commit(&mut self) -> Result<(), sqlx::Error>;

    async fn rollback(&mut self) -> Result<(), sqlx::Error>;

    /// Ends the session. Closing twice is a no-op.
    async fn close(&mut self) -> Result<(), sqlx::Error>;

    fn is_closed(&self) -> bool;
}
