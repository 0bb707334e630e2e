//! SQLite persistence for tasklane.
//!
//! [`SqliteSession`] implements [`tasklane_core::Session`] over a single
//! `rusqlite` connection. Hosts open one session per database, wrap each
//! request in [`SqliteSession::transaction`] and hand the session to a
//! [`tasklane_core::TaskService`].

pub mod error;
pub mod schema;
mod session;

pub use error::{Result, SqliteStoreError};
pub use schema::run_migrations;
pub use session::SqliteSession;
