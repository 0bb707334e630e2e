//! Core of the tasklane task store.
//!
//! This crate holds everything that does not depend on a database:
//!
//! - [`filter`]: the filter expression language and field registry
//! - [`query`]: compilation of task queries into predicate trees
//! - [`position`]: sparse ordering keys and rebalancing
//! - [`recurrence`]: rescheduling of repeating tasks
//! - [`service`]: task create, update, delete and listing
//! - [`session`]: the collaborator traits a host implements
//!
//! # Example
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use tasklane_core::filter::FieldResolver;
//! use tasklane_core::query::{compile, Dialect, ProjectScope, TaskQuery};
//!
//! let query = TaskQuery::from_query_string("filter=priority%20%3E%3D%203").unwrap();
//! let resolver = FieldResolver::new(Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap(), chrono_tz::UTC);
//! let plan = compile(&query, &ProjectScope::projects(vec![1]), &resolver, 50).unwrap();
//!
//! let (sql, params) = plan.cond.to_sql(Dialect::Postgres);
//! assert_eq!(sql, r#"("project_id" IN ($1) AND "priority" >= $2)"#);
//! assert_eq!(params.len(), 2);
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod position;
pub mod query;
pub mod recurrence;
pub mod service;
pub mod session;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Config, ConfigError};
pub use error::{Error, Result};
pub use models::{Bucket, Label, Project, Task, TaskReminder, TaskUpdate, User};
pub use service::{TaskPage, TaskService};
pub use session::{EventSink, Permissions, Session, StoreError, TaskEvent};
