//! Shared fixture for the service integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use tasklane_core::models::{Bucket, Project, Task, User};
use tasklane_core::session::{RecordingEventSink, StaticPermissions};
use tasklane_core::{FixedClock, TaskService};
use tasklane_store::SqliteSession;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

/// A database with one user and three projects.
///
/// `project` has a backlog, a "doing" bucket limited to two tasks and a done
/// bucket. `other` has a single bucket. `secret` is not readable by the user.
pub struct Fixture {
    pub session: SqliteSession,
    pub permissions: StaticPermissions,
    pub events: RecordingEventSink,
    pub clock: FixedClock,
    pub user: User,
    pub project: Project,
    pub backlog: Bucket,
    pub doing: Bucket,
    pub done: Bucket,
    pub other: Project,
    pub other_bucket: Bucket,
    pub secret: Project,
    pub secret_bucket: Bucket,
}

impl Fixture {
    pub fn new() -> Self {
        let session = SqliteSession::open_in_memory().unwrap();
        let user = session.insert_user("alice", "Alice").unwrap();

        let project = session
            .insert_project(&Project {
                title: "Work".to_string(),
                identifier: "WORK".to_string(),
                namespace_id: 1,
                ..Default::default()
            })
            .unwrap();
        let backlog = bucket(&session, project.id, "Backlog", 1.0, 0, false);
        let doing = bucket(&session, project.id, "Doing", 2.0, 2, false);
        let done = bucket(&session, project.id, "Done", 3.0, 0, true);

        let other = session
            .insert_project(&Project {
                title: "Home".to_string(),
                namespace_id: 2,
                ..Default::default()
            })
            .unwrap();
        let other_bucket = bucket(&session, other.id, "Backlog", 1.0, 0, false);

        let secret = session
            .insert_project(&Project {
                title: "Secret".to_string(),
                namespace_id: 3,
                ..Default::default()
            })
            .unwrap();
        let secret_bucket = bucket(&session, secret.id, "Backlog", 1.0, 0, false);

        Self {
            permissions: StaticPermissions::new(user.id, [project.id, other.id]),
            events: RecordingEventSink::new(),
            clock: FixedClock::new(now(), chrono_tz::UTC),
            session,
            user,
            project,
            backlog,
            doing,
            done,
            other,
            other_bucket,
            secret,
            secret_bucket,
        }
    }

    pub fn service(&self) -> TaskService<'_> {
        TaskService::new(&self.session, &self.permissions, &self.events, &self.clock)
    }

    /// Creates a task in the main project.
    pub fn create(&self, title: &str) -> Task {
        self.create_with(Task {
            title: title.to_string(),
            ..Default::default()
        })
    }

    /// Creates a task, defaulting its project to the main one.
    pub fn create_with(&self, mut task: Task) -> Task {
        if task.project_id == 0 {
            task.project_id = self.project.id;
        }
        self.service().create(task).unwrap()
    }
}

fn bucket(
    session: &SqliteSession,
    project_id: i64,
    title: &str,
    position: f64,
    limit: i64,
    is_done_bucket: bool,
) -> Bucket {
    session
        .insert_bucket(&Bucket {
            project_id,
            title: title.to_string(),
            position,
            limit,
            is_done_bucket,
            ..Default::default()
        })
        .unwrap()
}
