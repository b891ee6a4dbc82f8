use crate::connection::PgDriver;
use crate::cursor::Cursor;
use crate::driver::{DbHandle, Driver, Row};
use crate::error::DbError;
use configuration::CredentialResolver;
use core_types::{CredentialSet, Environment, SslMode};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Upper bound on establishing a session.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// How many rows `execute_query` hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    All,
    One,
    None,
}

impl FromStr for FetchMode {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(FetchMode::All),
            "one" => Ok(FetchMode::One),
            "none" => Ok(FetchMode::None),
            _ => Err(DbError::InvalidArgument(
                "fetch must be 'all', 'one', or 'none'".to_string(),
            )),
        }
    }
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FetchMode::All => "all",
            FetchMode::One => "one",
            FetchMode::None => "none",
        })
    }
}

/// The output of [`ConnectionManager::execute_query`], shaped by its [`FetchMode`].
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Rows(Vec<Row>),
    Row(Option<Row>),
    Empty,
}

impl QueryResult {
    /// Flattens any shape into a list of rows.
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            QueryResult::Rows(rows) => rows,
            QueryResult::Row(row) => row.into_iter().collect(),
            QueryResult::Empty => Vec::new(),
        }
    }
}

/// A snapshot of the non-sensitive connection parameters and state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub ssl_mode: SslMode,
    pub environment: Environment,
    pub connected: bool,
}

/// Owns the lifecycle of one database session.
///
/// Credentials are resolved and validated when the manager is built; the
/// session itself is opened lazily by [`connect`](Self::connect) (or any
/// helper that needs it) and at most one is live at a time.
pub struct ConnectionManager<D: Driver = PgDriver> {
    resolver: CredentialResolver,
    credentials: CredentialSet,
    driver: D,
    handle: Option<D::Handle>,
}

impl ConnectionManager<PgDriver> {
    /// Resolves credentials for `environment` (detected when `None`) from the
    /// process environment.
    pub async fn new(environment: Option<Environment>) -> Result<Self, DbError> {
        Self::from_resolver(CredentialResolver::new(environment)).await
    }

    pub async fn from_resolver(resolver: CredentialResolver) -> Result<Self, DbError> {
        Self::with_driver(resolver, PgDriver).await
    }
}

impl<D: Driver> ConnectionManager<D> {
    /// Builds a manager over an explicit driver. Fails fast if the
    /// credentials cannot be loaded or are incomplete.
    pub async fn with_driver(mut resolver: CredentialResolver, driver: D) -> Result<Self, DbError> {
        let credentials = match resolver.get_credentials().await {
            Ok(credentials) => credentials.clone(),
            Err(e) => {
                tracing::error!("Failed to load credentials: {}", e);
                return Err(e.into());
            }
        };

        if !resolver.validate_credentials(&credentials.to_map()) {
            tracing::error!("Failed to load credentials: invalid or incomplete credentials");
            return Err(DbError::InvalidCredentials);
        }

        Ok(Self {
            resolver,
            credentials,
            driver,
            handle: None,
        })
    }

    pub fn environment(&self) -> Environment {
        self.resolver.environment()
    }

    /// Returns the live session, opening one if needed.
    ///
    /// A new session is probed with a trivial query before it is handed out;
    /// if the probe fails the session is discarded and the call fails.
    pub async fn connect(&mut self) -> Result<&mut D::Handle, DbError> {
        let handle = match self.handle.take() {
            Some(handle) if !handle.is_closed() => handle,
            _ => self.open().await?,
        };
        Ok(self.handle.insert(handle))
    }

    async fn open(&self) -> Result<D::Handle, DbError> {
        let connecting = self.driver.connect(&self.credentials);
        let mut handle = match tokio::time::timeout(CONNECT_TIMEOUT, connecting).await {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                tracing::error!("PostgreSQL connection error: {}", e);
                return Err(DbError::ConnectionError(e));
            }
            Err(_) => {
                tracing::error!("PostgreSQL connection timed out after {:?}", CONNECT_TIMEOUT);
                return Err(DbError::ConnectionTimeout(CONNECT_TIMEOUT));
            }
        };

        if let Err(e) = handle.ping().await {
            tracing::error!("PostgreSQL liveness probe failed: {}", e);
            if let Err(close_err) = handle.close().await {
                tracing::debug!("Failed to close unhealthy connection: {}", close_err);
            }
            return Err(DbError::ConnectionError(e));
        }

        tracing::info!(
            "Successfully connected to PostgreSQL at {}:{}",
            self.credentials.host,
            self.credentials.port
        );
        Ok(handle)
    }

    /// Closes the session if one is live.
    pub async fn disconnect(&mut self) -> Result<(), DbError> {
        if let Some(mut handle) = self.handle.take() {
            if !handle.is_closed() {
                handle.close().await.map_err(DbError::ConnectionError)?;
                tracing::info!("PostgreSQL connection closed");
            }
        }
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_closed())
    }

    /// Hands out the live session for direct use.
    ///
    /// The session stays open afterwards; closing it is up to the caller
    /// (via [`disconnect`](Self::disconnect)).
    pub async fn get_connection(&mut self) -> Result<&mut D::Handle, DbError> {
        self.connect().await
    }

    /// Runs `scope` with a cursor inside a transaction.
    ///
    /// On success the transaction is committed when `commit` is set. If the
    /// scope (or the commit) fails, the transaction is rolled back and the
    /// error is returned as is. The cursor is closed on every path.
    pub async fn with_cursor<T, F>(&mut self, commit: bool, scope: F) -> Result<T, DbError>
    where
        F: AsyncFnOnce(&mut Cursor<'_, D::Handle>) -> Result<T, DbError>,
    {
        let handle = self.connect().await?;
        let mut cursor = Cursor::new(handle);

        let outcome = match scope(&mut cursor).await {
            Ok(value) if commit => cursor.commit().await.map(|()| value),
            other => other,
        };

        if outcome.is_err() {
            if let Err(e) = cursor.rollback().await {
                tracing::warn!("Rollback failed: {}", e);
            }
        }

        cursor.close();
        outcome
    }

    /// Runs one statement in its own committed transaction.
    pub async fn execute_query(
        &mut self,
        sql: &str,
        params: &[JsonValue],
        fetch: FetchMode,
    ) -> Result<QueryResult, DbError> {
        self.with_cursor(true, async |cursor| {
            cursor.execute(sql, params).await?;
            Ok(match fetch {
                FetchMode::All => QueryResult::Rows(cursor.fetch_all()),
                FetchMode::One => QueryResult::Row(cursor.fetch_one()),
                FetchMode::None => QueryResult::Empty,
            })
        })
        .await
    }

    /// Runs `sql` once per parameter set in a single transaction: either every
    /// execution is committed or none is.
    pub async fn execute_many(&mut self, sql: &str, param_sets: &[Vec<JsonValue>]) -> Result<(), DbError> {
        self.with_cursor(true, async |cursor| cursor.execute_many(sql, param_sets).await)
            .await
    }

    pub fn get_connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            host: self.credentials.host.clone(),
            port: self.credentials.port,
            database: self.credentials.database.clone(),
            username: self.credentials.username.clone(),
            ssl_mode: self.credentials.ssl_mode,
            environment: self.resolver.environment(),
            connected: self.is_connected(),
        }
    }

    /// Connects, runs `scope` with the manager, then disconnects whatever the
    /// outcome. An error from `scope` takes precedence over one from closing.
    pub async fn with_connection<T, F>(&mut self, scope: F) -> Result<T, DbError>
    where
        F: AsyncFnOnce(&mut Self) -> Result<T, DbError>,
    {
        self.connect().await?;
        let outcome = scope(self).await;
        let closed = self.disconnect().await;

        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(close_err)) => {
                tracing::warn!("Failed to close connection after error: {}", close_err);
                Err(e)
            }
        }
    }
}

impl<D: Driver> Drop for ConnectionManager<D> {
    fn drop(&mut self) {
        // An async close cannot run here; dropping the handle closes the socket.
        if self.is_connected() {
            tracing::warn!("ConnectionManager dropped while connected; closing without a graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_mode_parses_known_values_only() {
        assert_eq!("all".parse::<FetchMode>().unwrap(), FetchMode::All);
        assert_eq!("one".parse::<FetchMode>().unwrap(), FetchMode::One);
        assert_eq!("none".parse::<FetchMode>().unwrap(), FetchMode::None);

        let err = "many".parse::<FetchMode>().unwrap_err();
        assert_eq!(err.kind(), core_types::ErrorKind::InvalidArgument);
        assert!(err.to_string().contains("fetch must be 'all', 'one', or 'none'"));
    }

    #[test]
    fn query_result_flattens() {
        let row: Row = [("n".to_string(), JsonValue::from(1))].into_iter().collect();
        assert_eq!(QueryResult::Row(Some(row.clone())).into_rows(), vec![row.clone()]);
        assert_eq!(QueryResult::Row(None).into_rows(), Vec::<Row>::new());
        assert_eq!(QueryResult::Rows(vec![row.clone(), row]).into_rows().len(), 2);
        assert!(QueryResult::Empty.into_rows().is_empty());
    }
}
