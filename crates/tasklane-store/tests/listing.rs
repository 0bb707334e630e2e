//! Listing tasks through the service against SQLite.

mod common;

use common::{at, Fixture};
use tasklane_core::models::{Project, Task, TaskReminder, FAVORITES_PSEUDO_PROJECT_ID};
use tasklane_core::query::TaskQuery;

fn titles(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.title.as_str()).collect()
}

/// Seeds four tasks with priorities 3, 5, 1 and 0. The second one is done.
fn seed_priorities(f: &Fixture) {
    let seeds = [("A", 3, false), ("B", 5, true), ("C", 1, false), ("D", 0, false)];
    for (title, priority, done) in seeds {
        f.create_with(Task {
            title: title.to_string(),
            priority,
            done,
            ..Default::default()
        });
    }
}

#[test]
fn test_filter_priority_and_open() {
    let f = Fixture::new();
    seed_priorities(&f);

    let query =
        TaskQuery::from_query_string("filter=priority%20%3E%3D%203%20%26%26%20done%20%3D%20false")
            .unwrap();
    let page = f.service().read_all(&query, &[f.project.clone()]).unwrap();

    assert_eq!(titles(&page.tasks), vec!["A"]);
    assert_eq!(page.count, 1);
    assert_eq!(page.total, 1);
}

#[test]
fn test_include_nulls_is_a_superset() {
    let f = Fixture::new();
    seed_priorities(&f);
    let projects = [f.project.clone()];

    let strict = f
        .service()
        .read_all(&TaskQuery::with_filter("priority >= 3"), &projects)
        .unwrap();
    let lenient = f
        .service()
        .read_all(
            &TaskQuery {
                filter_include_nulls: true,
                ..TaskQuery::with_filter("priority >= 3")
            },
            &projects,
        )
        .unwrap();

    assert_eq!(titles(&strict.tasks), vec!["A", "B"]);
    assert_eq!(titles(&lenient.tasks), vec!["A", "B", "D"]);
    for task in &strict.tasks {
        assert!(lenient.tasks.iter().any(|t| t.id == task.id));
    }
}

#[test]
fn test_legacy_filter_arrays() {
    let f = Fixture::new();
    seed_priorities(&f);

    let query = TaskQuery::from_query_string(
        "filter_by[]=priority&filter_comparator[]=greater_equals&filter_value[]=3\
         &filter_by[]=done&filter_comparator[]=equals&filter_value[]=false&filter_concat=and",
    )
    .unwrap();
    let page = f.service().read_all(&query, &[f.project.clone()]).unwrap();
    assert_eq!(titles(&page.tasks), vec!["A"]);
}

#[test]
fn test_pagination_reports_total() {
    let f = Fixture::new();
    for i in 1..=5 {
        f.create(&format!("task {i}"));
    }
    let projects = [f.project.clone()];
    let service = f.service();

    let page = service
        .read_all(&TaskQuery::from_query_string("page=2&per_page=2").unwrap(), &projects)
        .unwrap();
    assert_eq!(titles(&page.tasks), vec!["task 3", "task 4"]);
    assert_eq!(page.count, 2);
    assert_eq!(page.total, 5);

    let last = service
        .read_all(&TaskQuery::from_query_string("page=3&per_page=2").unwrap(), &projects)
        .unwrap();
    assert_eq!(titles(&last.tasks), vec!["task 5"]);

    let all = service
        .read_all(&TaskQuery::from_query_string("per_page=0").unwrap(), &projects)
        .unwrap();
    assert_eq!(all.count, 5);

    let clamped = service
        .with_max_items_per_page(3)
        .read_all(&TaskQuery::from_query_string("per_page=100").unwrap(), &projects)
        .unwrap();
    assert_eq!(clamped.count, 3);
    assert_eq!(clamped.total, 5);
}

#[test]
fn test_sort_by_priority_desc() {
    let f = Fixture::new();
    seed_priorities(&f);

    let query = TaskQuery::from_query_string("sort_by=priority&order_by=desc").unwrap();
    let page = f.service().read_all(&query, &[f.project.clone()]).unwrap();
    assert_eq!(titles(&page.tasks), vec!["B", "A", "C", "D"]);
}

#[test]
fn test_search_by_title_and_index() {
    let f = Fixture::new();
    f.create("Write report");
    f.create("Buy milk");
    f.create("Call plumber");
    let projects = [f.project.clone()];

    let by_title = f
        .service()
        .read_all(&TaskQuery::from_query_string("s=REPORT").unwrap(), &projects)
        .unwrap();
    assert_eq!(titles(&by_title.tasks), vec!["Write report"]);

    let by_index = f
        .service()
        .read_all(&TaskQuery::from_query_string("s=%232").unwrap(), &projects)
        .unwrap();
    assert_eq!(titles(&by_index.tasks), vec!["Buy milk"]);
}

#[test]
fn test_filter_related_collections() {
    let f = Fixture::new();
    let labelled = f.create("labelled");
    f.create_with(Task {
        title: "assigned".to_string(),
        assignees: vec![f.user.clone()],
        ..Default::default()
    });
    f.create_with(Task {
        title: "reminded".to_string(),
        reminders: vec![TaskReminder::absolute(at(2024, 3, 20, 9))],
        ..Default::default()
    });
    f.create_with(Task {
        title: "at home".to_string(),
        project_id: f.other.id,
        ..Default::default()
    });

    let label = f.session.insert_label("urgent", "ff0000").unwrap();
    f.session.add_label(labelled.id, label.id).unwrap();

    let projects = [f.project.clone(), f.other.clone()];
    let list = |filter: &str| {
        let page = f
            .service()
            .read_all(&TaskQuery::with_filter(filter), &projects)
            .unwrap();
        page.tasks.into_iter().map(|t| t.title).collect::<Vec<_>>()
    };

    assert_eq!(list(&format!("labels in {}", label.id)), vec!["labelled"]);
    assert_eq!(list("assignees = alice"), vec!["assigned"]);
    assert_eq!(list("reminders > 2024-03-18"), vec!["reminded"]);
    assert_eq!(list("namespace = 2"), vec!["at home"]);
}

#[test]
fn test_listing_hydrates_tasks() {
    let f = Fixture::new();
    let created = f.create_with(Task {
        title: "hydrated".to_string(),
        assignees: vec![f.user.clone()],
        reminders: vec![
            TaskReminder::absolute(at(2024, 3, 21, 9)),
            TaskReminder::absolute(at(2024, 3, 20, 9)),
        ],
        ..Default::default()
    });
    let label = f.session.insert_label("urgent", "ff0000").unwrap();
    f.session.add_label(created.id, label.id).unwrap();

    let page = f
        .service()
        .read_all(&TaskQuery::default(), &[f.project.clone()])
        .unwrap();
    let task = &page.tasks[0];

    assert_eq!(task.identifier, "WORK-1");
    assert_eq!(task.created_by.as_ref().map(|u| u.id), Some(f.user.id));
    assert_eq!(task.assignees, vec![f.user.clone()]);
    assert_eq!(task.labels, vec![label]);
    let triggers: Vec<_> = task.reminders.iter().map(|r| r.reminder).collect();
    assert_eq!(triggers, vec![Some(at(2024, 3, 20, 9)), Some(at(2024, 3, 21, 9))]);
}

#[test]
fn test_favorites_pseudo_project() {
    let f = Fixture::new();
    let mine = f.create_with(Task {
        title: "favourite at work".to_string(),
        is_favorite: true,
        ..Default::default()
    });
    f.create("plain");
    f.create_with(Task {
        title: "favourite at home".to_string(),
        project_id: f.other.id,
        is_favorite: true,
        ..Default::default()
    });
    f.create_with(Task {
        title: "favourite in secret".to_string(),
        project_id: f.secret.id,
        is_favorite: true,
        ..Default::default()
    });

    let favorites = Project {
        id: FAVORITES_PSEUDO_PROJECT_ID,
        title: "Favorites".to_string(),
        ..Default::default()
    };
    let page = f
        .service()
        .read_all(&TaskQuery::default(), &[favorites])
        .unwrap();

    assert_eq!(titles(&page.tasks), vec!["favourite at work", "favourite at home"]);
    assert!(page.tasks.iter().all(|t| t.is_favorite));
    assert_eq!(page.tasks[0].id, mine.id);
}

#[test]
fn test_invalid_queries_report_codes() {
    let f = Fixture::new();
    f.create("anything");
    let projects = [f.project.clone()];
    let code = |query: TaskQuery| {
        f.service()
            .read_all(&query, &projects)
            .unwrap_err()
            .code()
    };

    assert_eq!(code(TaskQuery::with_filter("colour = red")), "invalid_task_field");
    assert_eq!(code(TaskQuery::with_filter("priority = high")), "invalid_task_filter_value");
    assert_eq!(code(TaskQuery::with_filter("(priority = 1")), "invalid_filter_syntax");
    assert_eq!(
        code(TaskQuery::from_query_string("sort_by=colour").unwrap()),
        "invalid_sort_param"
    );
}

#[test]
fn test_empty_scope_still_validates() {
    let f = Fixture::new();
    f.create("anything");

    let page = f.service().read_all(&TaskQuery::default(), &[]).unwrap();
    assert!(page.tasks.is_empty());
    assert_eq!(page.total, 0);

    let err = f
        .service()
        .read_all(&TaskQuery::with_filter("colour = red"), &[])
        .unwrap_err();
    assert_eq!(err.code(), "invalid_task_field");
}
