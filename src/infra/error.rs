//! Failures in the process plumbing around the survey: sockets, output
//! files, the Postgres connection and subscriber setup.

use std::{io, net::SocketAddr, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("cannot listen on {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },
    #[error("cannot write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("http server stopped: {0}")]
    Server(#[source] io::Error),
    /// `stage` is `connection` or `migration`.
    #[error("database {stage} failed: {source}")]
    Database {
        stage: &'static str,
        source: sqlx::Error,
    },
    #[error("database url is not configured")]
    MissingDatabaseUrl,
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
}

impl InfraError {
    pub fn connect(source: sqlx::Error) -> Self {
        Self::Database {
            stage: "connection",
            source,
        }
    }

    pub fn migrate(source: sqlx::Error) -> Self {
        Self::Database {
            stage: "migration",
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
