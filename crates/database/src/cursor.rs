use crate::driver::{DbHandle, Row};
use crate::error::DbError;
use serde_json::Value as JsonValue;

/// A statement cursor bound to one transactional scope.
///
/// Cursors are only handed out by
/// [`ConnectionManager::with_cursor`](crate::ConnectionManager::with_cursor),
/// which commits or rolls back and closes the cursor when the scope ends.
pub struct Cursor<'h, H: DbHandle> {
    handle: &'h mut H,
    closed: bool,
}

impl<'h, H: DbHandle> Cursor<'h, H> {
    pub(crate) fn new(handle: &'h mut H) -> Self {
        Self {
            handle,
            closed: false,
        }
    }

    /// Runs one statement; its rows become available to `fetch_*`.
    pub async fn execute(&mut self, sql: &str, params: &[JsonValue]) -> Result<(), DbError> {
        self.ensure_open()?;
        self.handle.execute(sql, params).await?;
        Ok(())
    }

    /// Runs `sql` once per parameter set, in order, stopping at the first failure.
    pub async fn execute_many(&mut self, sql: &str, param_sets: &[Vec<JsonValue>]) -> Result<(), DbError> {
        for params in param_sets {
            self.execute(sql, params).await?;
        }
        Ok(())
    }

    pub fn fetch_one(&mut self) -> Option<Row> {
        if self.closed {
            return None;
        }
        self.handle.fetch_one()
    }

    pub fn fetch_all(&mut self) -> Vec<Row> {
        if self.closed {
            return Vec::new();
        }
        self.handle.fetch_all()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub(crate) async fn commit(&mut self) -> Result<(), DbError> {
        self.handle.commit().await?;
        Ok(())
    }

    pub(crate) async fn rollback(&mut self) -> Result<(), DbError> {
        self.handle.rollback().await?;
        Ok(())
    }

    pub(crate) fn close(&mut self) {
        if !self.closed {
            self.handle.close_cursor();
            self.closed = true;
        }
    }

    fn ensure_open(&self) -> Result<(), DbError> {
        if self.closed {
            return Err(DbError::CursorClosed);
        }
        Ok(())
    }
}
