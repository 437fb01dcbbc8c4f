//! Query API for Cassandra and ScyllaDB on top of the `scylla` driver.
//!
//! ```rust,no_run
//! use cqlkit::{Consistency, DatabaseConfig, Session};
//!
//! # async fn run() -> Result<(), cqlkit::CassError> {
//! let session = Session::connect(&DatabaseConfig::default()).await?;
//!
//! let mut iter = session
//!     .query("SELECT name, age FROM ks.users WHERE id = ?", (42_i32,))
//!     .consistency(Consistency::QUORUM)
//!     .iter()
//!     .await;
//!
//! while let Some((name, age)) = iter.scan::<(String, i32)>() {
//!     println!("{} {}", name, age);
//! }
//! iter.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! Statement and execution resources are released before `iter` returns.
//! `scan` returning `None` means either the rows ran out or a row failed;
//! always check `close`.

pub mod config;
pub mod consistency;
pub mod database;
pub mod decode;
pub mod errors;
pub mod iter;
pub mod metrics;
pub mod query;
pub mod session;
pub mod statement;
pub mod types;

pub use config::DatabaseConfig;
pub use consistency::{Consistency, SerialConsistency};
pub use database::{Driver, MemoryDriver, ResultSet, ScyllaDriver};
pub use decode::{FromRow, FromValue};
pub use errors::CassError;
pub use iter::{Iter, ScanStep};
pub use query::Query;
pub use session::Session;
pub use statement::{QueryOptions, Statement};
pub use types::{BindValues, Row, Value};
