//! Task operations.
//!
//! [`TaskService`] ties the filter compiler, the bucket rules, the position
//! allocator and the recurrence engine to the collaborators of one request.
//! It runs inside whatever transaction the host opened on the session.

mod bucket;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::DEFAULT_MAX_ITEMS_PER_PAGE;
use crate::error::{Error, Result};
use crate::filter::FieldResolver;
use crate::models::{
    FavoriteKind, FieldUpdate, Project, RelatedTaskMap, RelatedTaskSummary, Task, TaskColumn,
    TaskUpdate, User,
};
use crate::position::{self, Axis};
use crate::query::{compile, Cond, FavoritesScope, ProjectScope, TaskQuery};
use crate::recurrence;
use crate::session::{EventSink, Permissions, Session, TaskEvent};

pub use bucket::{ensure_capacity, resolve_bucket};

/// One page of a task listing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskPage {
    pub tasks: Vec<Task>,
    /// Number of tasks in this page.
    pub count: usize,
    /// Number of matching tasks across all pages.
    pub total: i64,
}

/// Task operations for one caller.
pub struct TaskService<'a> {
    session: &'a dyn Session,
    permissions: &'a dyn Permissions,
    events: &'a dyn EventSink,
    clock: &'a dyn Clock,
    max_items_per_page: i64,
}

impl<'a> TaskService<'a> {
    pub fn new(
        session: &'a dyn Session,
        permissions: &'a dyn Permissions,
        events: &'a dyn EventSink,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            session,
            permissions,
            events,
            clock,
            max_items_per_page: DEFAULT_MAX_ITEMS_PER_PAGE,
        }
    }

    /// Sets the page size limit, normally from [`Config`](crate::config::Config).
    pub fn with_max_items_per_page(mut self, max_items_per_page: i64) -> Self {
        self.max_items_per_page = max_items_per_page;
        self
    }

    /// Creates a task.
    ///
    /// The task gets the caller as creator, a fresh uid when none is given,
    /// the next index of its project and default positions.
    pub fn create(&self, mut task: Task) -> Result<Task> {
        if task.title.is_empty() {
            return Err(Error::TaskTitleEmpty);
        }
        let project = self.project(task.project_id)?;
        let doer_id = self.permissions.user_id();
        let now = self.clock.now();

        task.id = 0;
        task.created_by_id = doer_id;
        if task.uid.is_empty() {
            task.uid = Uuid::new_v4().to_string();
        }

        resolve_bucket(self.session, &mut task, None, true)?;

        task.index = self.session.max_task_index(task.project_id)? + 1;
        task.position = position::default_position(task.index, task.position);
        task.kanban_position = position::default_position(task.index, task.kanban_position);
        task.done_at = task.done.then_some(now);
        task.created = Some(now);
        task.updated = Some(now);

        recurrence::resolve_reminders(&mut task)?;

        task.id = self.session.insert_task(&task)?;
        for reminder in &mut task.reminders {
            reminder.task_id = task.id;
        }

        task.assignees = self.write_assignees(task.id, &task.assignees)?;
        self.session.replace_reminders(task.id, &task.reminders)?;
        if task.is_favorite {
            self.session
                .add_favorite(doer_id, FavoriteKind::Task, task.id)?;
        }
        task.created_by = self.session.users(&[doer_id])?.into_iter().next();
        task.set_identifier(&project.identifier);

        self.rebalance_if_needed(&mut task)?;

        info!(task_id = task.id, project_id = task.project_id, "created task");
        self.events.dispatch(TaskEvent::Created {
            task: task.clone(),
            doer_id,
        })?;
        self.session.touch_project(task.project_id, now)?;
        Ok(task)
    }

    /// Updates a task.
    ///
    /// Fields marked [`FieldUpdate::Keep`] are left alone. Reminders are
    /// always rewritten from the resulting task.
    pub fn update(&self, task_id: i64, update: TaskUpdate) -> Result<Task> {
        let mut old = self.load(task_id)?;
        old.reminders = self.session.reminders_for(&[task_id])?;
        let doer_id = self.permissions.user_id();
        let now = self.clock.now();

        let mut task = old.clone();
        update.apply(&mut task);

        let moves_bucket = matches!(
            update.bucket_id,
            FieldUpdate::Set(bucket_id) if bucket_id != 0 && bucket_id != old.bucket_id
        );
        if task.project_id != old.project_id {
            self.project(task.project_id)?;
        }
        let target = resolve_bucket(self.session, &mut task, Some(&old), moves_bucket)?;

        // Repeating tasks never stay in the done bucket.
        if target.is_done_bucket && task.is_repeating() {
            task.done = true;
            task.bucket_id = old.bucket_id;
        }

        recurrence::update_done(&old, &mut task, now, self.clock.tz());

        let mut columns = TaskColumn::UPDATABLE.to_vec();
        if task.project_id != old.project_id {
            task.index = self.session.max_task_index(task.project_id)? + 1;
            columns.push(TaskColumn::Index);
        }

        if task.cover_image_attachment_id != 0 {
            let owner = self
                .session
                .attachment_task_id(task.cover_image_attachment_id)?;
            if owner != Some(task_id) {
                return Err(Error::AttachmentNotOwned {
                    task_id,
                    attachment_id: task.cover_image_attachment_id,
                });
            }
        }

        recurrence::resolve_reminders(&mut task)?;

        task.updated = Some(now);
        self.session.update_task(&task, &columns)?;

        if let FieldUpdate::Set(assignees) = &update.assignees {
            self.write_assignees(task_id, assignees)?;
        }
        self.session.replace_reminders(task_id, &task.reminders)?;
        self.write_favorite(task_id, &update.is_favorite)?;

        self.rebalance_if_needed(&mut task)?;

        let mut updated = self.load(task_id)?;
        self.hydrate(std::slice::from_mut(&mut updated))?;

        info!(task_id, project_id = updated.project_id, done = updated.done, "updated task");
        self.events.dispatch(TaskEvent::Updated {
            task: updated.clone(),
            doer_id,
        })?;
        self.session.touch_project(updated.project_id, now)?;
        Ok(updated)
    }

    /// Deletes a task with its reminders, assignees, label links, favourites
    /// and relations.
    pub fn delete(&self, task_id: i64) -> Result<()> {
        let task = self.load(task_id)?;
        let doer_id = self.permissions.user_id();

        self.session.set_assignees(task_id, &[])?;
        self.session
            .remove_favorite(None, FavoriteKind::Task, task_id)?;
        self.session.delete_label_links(task_id)?;
        self.session.delete_relations(task_id)?;
        self.session.replace_reminders(task_id, &[])?;
        self.session.delete_tasks(&Cond::eq("id", task_id))?;

        info!(task_id, project_id = task.project_id, "deleted task");
        let project_id = task.project_id;
        self.events.dispatch(TaskEvent::Deleted { task, doer_id })?;
        self.session.touch_project(project_id, self.clock.now())?;
        Ok(())
    }

    /// Reads one hydrated task.
    pub fn read_one(&self, task_id: i64) -> Result<Task> {
        let mut task = self.load(task_id)?;
        self.hydrate(std::slice::from_mut(&mut task))?;
        Ok(task)
    }

    /// Lists the hydrated tasks of `projects` matching `query`.
    ///
    /// The favourites pseudo project expands to the caller's favourite tasks
    /// in every project they can read. The query is compiled before anything
    /// is read, so invalid filters never reach the session.
    pub fn read_all(&self, query: &TaskQuery, projects: &[Project]) -> Result<TaskPage> {
        let scope = self.scope(projects);
        let resolver = FieldResolver::new(self.clock.now(), self.clock.tz());
        let plan = compile(query, &scope, &resolver, self.max_items_per_page)?;

        if scope.is_empty() {
            return Ok(TaskPage::default());
        }

        let mut tasks = self
            .session
            .find_tasks(&plan.cond, &plan.order, plan.window)?;
        let total = self.session.count_tasks(&plan.cond)?;
        self.hydrate(&mut tasks)?;

        debug!(count = tasks.len(), total, "listed tasks");
        Ok(TaskPage {
            count: tasks.len(),
            total,
            tasks,
        })
    }

    fn scope(&self, projects: &[Project]) -> ProjectScope {
        let favorites = projects
            .iter()
            .any(Project::is_favorites_pseudo_project)
            .then(|| FavoritesScope {
                user_id: self.permissions.user_id(),
                visible_project_ids: self.permissions.visible_project_ids(),
            });
        ProjectScope {
            project_ids: projects
                .iter()
                .filter(|p| !p.is_favorites_pseudo_project())
                .map(|p| p.id)
                .collect(),
            favorites,
        }
    }

    /// Loads the stored columns of one task.
    fn load(&self, task_id: i64) -> Result<Task> {
        if task_id < 1 {
            return Err(Error::TaskNotFound { task_id });
        }
        self.session
            .find_tasks(&Cond::eq("id", task_id), &[], None)?
            .into_iter()
            .next()
            .ok_or(Error::TaskNotFound { task_id })
    }

    fn project(&self, project_id: i64) -> Result<Project> {
        self.session
            .project(project_id)?
            .ok_or(Error::ProjectNotFound { project_id })
    }

    /// Replaces the assignees, dropping users that do not exist.
    fn write_assignees(&self, task_id: i64, assignees: &[User]) -> Result<Vec<User>> {
        let ids: Vec<i64> = assignees
            .iter()
            .map(|u| u.id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let users = if ids.is_empty() {
            Vec::new()
        } else {
            self.session.users(&ids)?
        };
        if users.len() != ids.len() {
            warn!(task_id, requested = ids.len(), found = users.len(), "skipped unknown assignees");
        }
        let user_ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        self.session.set_assignees(task_id, &user_ids)?;
        Ok(users)
    }

    fn write_favorite(&self, task_id: i64, update: &FieldUpdate<bool>) -> Result<()> {
        let wanted = match update {
            FieldUpdate::Keep => return Ok(()),
            FieldUpdate::Clear => false,
            FieldUpdate::Set(value) => *value,
        };
        let user_id = self.permissions.user_id();
        let was = !self
            .session
            .favorites(user_id, FavoriteKind::Task, &[task_id])?
            .is_empty();
        match (was, wanted) {
            (false, true) => self.session.add_favorite(user_id, FavoriteKind::Task, task_id)?,
            (true, false) => self
                .session
                .remove_favorite(Some(user_id), FavoriteKind::Task, task_id)?,
            _ => {}
        }
        Ok(())
    }

    /// Respaces an axis whose saved key fell below the minimum spacing and
    /// reads the task's keys back.
    fn rebalance_if_needed(&self, task: &mut Task) -> Result<()> {
        let mut rebalanced = false;
        if position::needs_rebalance(task.position) {
            position::rebalance(
                self.session,
                Axis::List {
                    project_id: task.project_id,
                },
            )?;
            rebalanced = true;
        }
        if position::needs_rebalance(task.kanban_position) {
            position::rebalance(
                self.session,
                Axis::Kanban {
                    bucket_id: task.bucket_id,
                },
            )?;
            rebalanced = true;
        }
        if rebalanced {
            let stored = self.load(task.id)?;
            task.position = stored.position;
            task.kanban_position = stored.kanban_position;
        }
        Ok(())
    }

    /// Fills reminders, assignees, labels, creators, favourites, identifiers
    /// and related tasks.
    fn hydrate(&self, tasks: &mut [Task]) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        let user_id = self.permissions.user_id();

        let mut reminders: HashMap<i64, Vec<_>> = HashMap::new();
        for reminder in self.session.reminders_for(&ids)? {
            reminders.entry(reminder.task_id).or_default().push(reminder);
        }

        let mut assignees: HashMap<i64, Vec<User>> = HashMap::new();
        for (task_id, user) in self.session.assignees_for(&ids)? {
            assignees.entry(task_id).or_default().push(user);
        }

        let mut labels: HashMap<i64, Vec<_>> = HashMap::new();
        for (task_id, label) in self.session.labels_for(&ids)? {
            labels.entry(task_id).or_default().push(label);
        }

        let creator_ids: Vec<i64> = tasks
            .iter()
            .map(|t| t.created_by_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let creators: HashMap<i64, User> = self
            .session
            .users(&creator_ids)?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let favorites: BTreeSet<i64> = self
            .session
            .favorites(user_id, FavoriteKind::Task, &ids)?
            .into_iter()
            .collect();

        let project_ids: Vec<i64> = tasks
            .iter()
            .map(|t| t.project_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let projects: HashMap<i64, Project> = self
            .session
            .projects(&project_ids)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut related = self.related_tasks(&ids)?;

        for task in tasks.iter_mut() {
            let mut own = reminders.remove(&task.id).unwrap_or_default();
            own.sort_by_key(|r| r.reminder);
            task.reminders = own;
            task.assignees = assignees.remove(&task.id).unwrap_or_default();
            task.labels = labels.remove(&task.id).unwrap_or_default();
            task.created_by = creators.get(&task.created_by_id).cloned();
            task.is_favorite = favorites.contains(&task.id);
            if let Some(project) = projects.get(&task.project_id) {
                task.set_identifier(&project.identifier);
            }
            task.related_tasks = related.remove(&task.id).unwrap_or_default();
        }
        Ok(())
    }

    /// Collects one-level summaries of related tasks the caller may read.
    fn related_tasks(
        &self,
        task_ids: &[i64],
    ) -> Result<HashMap<i64, RelatedTaskMap>> {
        let relations = self.session.relations_for(task_ids)?;
        if relations.is_empty() {
            return Ok(HashMap::new());
        }

        let other_ids: Vec<i64> = relations
            .iter()
            .map(|r| r.other_task_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let others: BTreeMap<i64, Task> = self
            .session
            .find_tasks(&Cond::in_ids("id", &other_ids), &[], None)?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        let favorites: BTreeSet<i64> = self
            .session
            .favorites(self.permissions.user_id(), FavoriteKind::Task, &other_ids)?
            .into_iter()
            .collect();

        let mut out: HashMap<i64, RelatedTaskMap> = HashMap::new();
        for relation in relations {
            let Some(other) = others.get(&relation.other_task_id) else {
                warn!(
                    task_id = relation.task_id,
                    other_task_id = relation.other_task_id,
                    "skipped relation to missing task"
                );
                continue;
            };
            if !self.permissions.can_read_project(other.project_id) {
                continue;
            }
            out.entry(relation.task_id)
                .or_default()
                .entry(relation.relation_kind)
                .or_default()
                .push(RelatedTaskSummary::from_task(
                    other,
                    favorites.contains(&other.id),
                ));
        }
        Ok(out)
    }
}
