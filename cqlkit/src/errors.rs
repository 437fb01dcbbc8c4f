use scylla::transport::errors::{BadQuery, DbError, NewSessionError, QueryError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CassError {
    #[error("not found")]
    NotFound,

    #[error("unavailable")]
    Unavailable,

    #[error("feature not supported")]
    Unsupported,

    #[error("too many statements")]
    TooManyStatements,

    #[error("session has been closed")]
    SessionClosed,

    #[error("no connections available")]
    NoConnections,

    #[error("no keyspace provided")]
    NoKeyspace,

    #[error("no metadata available")]
    NoMetadata,

    #[error("Bind error: statement expects {expected} values, {supplied} supplied")]
    Bind { expected: usize, supplied: usize },

    #[error("Bind error: statement mixes positional and named markers")]
    MixedBindMarkers,

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout error: {0}")]
    Timeout(String),
}

impl CassError {
    /// True for the fixed categories the driver can report, as opposed to
    /// errors that carry request-specific detail.
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self,
            CassError::NotFound
                | CassError::Unavailable
                | CassError::Unsupported
                | CassError::TooManyStatements
                | CassError::SessionClosed
                | CassError::NoConnections
                | CassError::NoKeyspace
                | CassError::NoMetadata
        )
    }
}

/// Message the driver's connection pool reports when no connection to the
/// target node is open.
const NO_CONNECTIONS_MESSAGE: &str = "No connections in the pool";

impl From<QueryError> for CassError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::DbError(DbError::Unavailable { .. }, _) => CassError::Unavailable,
            QueryError::DbError(DbError::ReadTimeout { .. }, msg)
            | QueryError::DbError(DbError::WriteTimeout { .. }, msg) => CassError::Timeout(msg),
            QueryError::RequestTimeout(msg) => CassError::Timeout(msg),
            QueryError::BadQuery(BadQuery::TooManyQueriesInBatchStatement(_)) => {
                CassError::TooManyStatements
            }
            QueryError::IoError(io) if io.to_string().contains(NO_CONNECTIONS_MESSAGE) => {
                CassError::NoConnections
            }
            other => CassError::Database(other.to_string()),
        }
    }
}

impl From<NewSessionError> for CassError {
    fn from(err: NewSessionError) -> Self {
        match err {
            NewSessionError::EmptyKnownNodesList => {
                CassError::Config("no contact points configured".to_string())
            }
            other => CassError::Database(format!("Connection failed: {}", other)),
        }
    }
}
