use crate::decode::{bind_value, row_to_json};
use crate::driver::{DbHandle, Driver, Row};
use async_trait::async_trait;
use core_types::{CredentialSet, SslMode};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::{Connection, Executor};
use std::collections::VecDeque;

/// Builds the sqlx connect options for a credential set.
pub fn connect_options(credentials: &CredentialSet) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&credentials.host)
        .port(credentials.port)
        .database(&credentials.database)
        .username(&credentials.username)
        .password(&credentials.password)
        .ssl_mode(pg_ssl_mode(credentials.ssl_mode))
        .application_name("pgconnect")
}

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Allow => PgSslMode::Allow,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
        SslMode::VerifyCa => PgSslMode::VerifyCa,
        SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

fn closed_error() -> sqlx::Error {
    sqlx::Error::Io(std::io::Error::new(
        std::io::ErrorKind::NotConnected,
        "the connection has been closed",
    ))
}

/// Opens single PostgreSQL sessions through sqlx.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgDriver;

#[async_trait]
impl Driver for PgDriver {
    type Handle = PgHandle;

    async fn connect(&self, credentials: &CredentialSet) -> Result<PgHandle, sqlx::Error> {
        let conn = PgConnection::connect_with(&connect_options(credentials)).await?;
        Ok(PgHandle {
            conn: Some(conn),
            in_transaction: false,
            pending: VecDeque::new(),
        })
    }
}

/// A single PostgreSQL session.
pub struct PgHandle {
    conn: Option<PgConnection>,
    in_transaction: bool,
    pending: VecDeque<Row>,
}

impl PgHandle {
    fn conn(&mut self) -> Result<&mut PgConnection, sqlx::Error> {
        self.conn.as_mut().ok_or_else(closed_error)
    }
}

#[async_trait]
impl DbHandle for PgHandle {
    async fn ping(&mut self) -> Result<(), sqlx::Error> {
        let conn = self.conn()?;
        conn.execute("SELECT 1").await?;
        Ok(())
    }

    async fn execute(&mut self, sql: &str, params: &[JsonValue]) -> Result<(), sqlx::Error> {
        self.pending.clear();
        let begin = !self.in_transaction;
        let conn = self.conn()?;
        if begin {
            conn.execute("BEGIN").await?;
        }
        self.in_transaction = true;

        let conn = self.conn()?;
        let query = params
            .iter()
            .fold(sqlx::query(sql), |query, value| bind_value(query, value));
        let rows = query.fetch_all(&mut *conn).await?;

        self.pending = rows.iter().map(row_to_json).collect::<Result<_, _>>()?;
        Ok(())
    }

    fn fetch_one(&mut self) -> Option<Row> {
        self.pending.pop_front()
    }

    fn fetch_all(&mut self) -> Vec<Row> {
        self.pending.drain(..).collect()
    }

    fn close_cursor(&mut self) {
        self.pending.clear();
    }

    async fn commit(&mut self) -> Result<(), sqlx::Error> {
        if self.in_transaction {
            self.conn()?.execute("COMMIT").await?;
            self.in_transaction = false;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), sqlx::Error> {
        if self.in_transaction {
            // Cleared before the round trip so a failed ROLLBACK is not retried.
            self.in_transaction = false;
            self.conn()?.execute("ROLLBACK").await?;
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pending.clear();
        self.in_transaction = false;
        match self.conn.take() {
            Some(conn) => conn.close().await,
            None => Ok(()),
        }
    }

    fn is_closed(&self) -> bool {
        self.conn.is_none()
    }
}
