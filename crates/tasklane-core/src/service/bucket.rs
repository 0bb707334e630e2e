//! Kanban bucket rules applied on every save.

use crate::error::{Error, Result};
use crate::models::{Bucket, Task};
use crate::query::Cond;
use crate::session::Session;

/// Picks the bucket `task` is saved into and validates it.
///
/// `original` is the stored task for updates and `None` for creates.
/// Marking a task done moves it into the project's done bucket; moving a
/// task into the done bucket marks it done. A zero bucket keeps the stored
/// one, and falls back to the project's default bucket on create or when
/// the task changes projects.
///
/// # Errors
///
/// - `BucketNotFound` when the bucket or a default bucket does not exist
/// - `BucketProjectMismatch` when the bucket belongs to another project
/// - `BucketLimitExceeded` when `check_limit` is set and the bucket is full
pub fn resolve_bucket(
    session: &dyn Session,
    task: &mut Task,
    original: Option<&Task>,
    check_limit: bool,
) -> Result<Bucket> {
    let was_open = original.is_some_and(|o| !o.done);
    let mut bucket = None;

    if task.done && was_open {
        if let Some(done) = session.done_bucket(task.project_id)? {
            task.bucket_id = done.id;
            bucket = Some(done);
        }
    }

    if task.bucket_id == 0 {
        if let Some(original) = original.filter(|o| o.bucket_id != 0) {
            task.bucket_id = original.bucket_id;
        }
    }

    let moved_project =
        original.is_some_and(|o| task.project_id != 0 && o.project_id != task.project_id);
    if task.bucket_id == 0 || moved_project {
        let default = session
            .default_bucket(task.project_id)?
            .ok_or(Error::BucketNotFound { bucket_id: 0 })?;
        task.bucket_id = default.id;
        bucket = Some(default);
    }

    let bucket = match bucket {
        Some(bucket) => bucket,
        None => session
            .bucket(task.bucket_id)?
            .ok_or(Error::BucketNotFound {
                bucket_id: task.bucket_id,
            })?,
    };

    if bucket.project_id != task.project_id {
        return Err(Error::BucketProjectMismatch {
            bucket_id: task.bucket_id,
            project_id: task.project_id,
        });
    }

    if check_limit {
        ensure_capacity(session, &bucket)?;
    }

    if bucket.is_done_bucket && was_open {
        task.done = true;
    }

    Ok(bucket)
}

/// Fails when the bucket already holds `limit` tasks.
pub fn ensure_capacity(session: &dyn Session, bucket: &Bucket) -> Result<()> {
    if bucket.limit <= 0 {
        return Ok(());
    }
    let count = session.count_tasks(&Cond::eq("bucket_id", bucket.id))?;
    if count >= bucket.limit {
        return Err(Error::BucketLimitExceeded {
            bucket_id: bucket.id,
            limit: bucket.limit,
        });
    }
    Ok(())
}
