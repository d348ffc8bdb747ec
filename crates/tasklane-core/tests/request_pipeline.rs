//! End-to-end behaviour of the request pipeline over real stores.

use std::sync::Arc;

use tasklane_core::api::comments::{
    create_comment, delete_comment, get_comment, list_comments_by_task, update_comment,
};
use tasklane_core::api::tasks::{
    CreateTask, UpdateTask, create_task, delete_task, get_task, list_tasks, task_history,
    update_task,
};
use tasklane_core::auth::FixedIdentity;
use tasklane_core::clock::ManualClock;
use tasklane_core::config::{ProjectConfig, RateLimitConfig};
use tasklane_core::error::Resource;
use tasklane_core::model::{ActivityAction, TaskStatus};
use tasklane_core::ratelimit::{RateLimitAction, RateLimiter, SqliteCounterStore};
use tasklane_core::{ApiError, Backend, audit, db};

const NOW: i64 = 1_700_000_040_000;

fn in_memory() -> (Backend, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(NOW));
    let backend = Backend::in_memory(clock.clone()).expect("in-memory backend");
    (backend, clock)
}

#[test]
fn buy_milk_lifecycle() {
    let (backend, clock) = in_memory();
    let ctx = backend.request(&FixedIdentity::user("ada"));

    let id = create_task(&ctx, CreateTask::titled("Buy milk")).expect("create");
    clock.advance(60_000);
    update_task(
        &ctx,
        id,
        UpdateTask {
            status: Some(TaskStatus::Completed),
            ..UpdateTask::default()
        },
    )
    .expect("complete");

    let done = get_task(&ctx, id).expect("get");
    assert_eq!(done.status, TaskStatus::Completed);
    assert_eq!(done.completed_at, Some(NOW + 60_000));

    let actions: Vec<ActivityAction> = task_history(&ctx, id)
        .expect("history")
        .iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(actions, vec![ActivityAction::Created, ActivityAction::Completed]);

    delete_task(&ctx, id).expect("delete");

    assert!(task_history(&ctx, id).expect("history").is_empty());
    assert!(audit::by_task(backend.connection(), id).expect("raw history").is_empty());
    assert!(matches!(
        get_task(&ctx, id),
        Err(ApiError::NotFound {
            resource: Resource::Task,
            ..
        })
    ));
    assert!(list_tasks(&ctx).expect("list").is_empty());
}

#[test]
fn comments_survive_their_task() {
    let (backend, _clock) = in_memory();
    let ctx = backend.request(&FixedIdentity::user("ada"));

    let task = create_task(&ctx, CreateTask::titled("t")).expect("create");
    let comment = create_comment(&ctx, task, "remember the receipt").expect("comment");
    assert_eq!(list_comments_by_task(&ctx, task).expect("list").len(), 1);

    delete_task(&ctx, task).expect("delete");

    let orphan = get_comment(&ctx, comment).expect("comment still readable");
    assert_eq!(orphan.task_id, task);
    assert!(matches!(
        list_comments_by_task(&ctx, task),
        Err(ApiError::NotFound { .. })
    ));
}

#[test]
fn leftover_comment_changes_leave_no_history() {
    let (backend, clock) = in_memory();
    let ctx = backend.request(&FixedIdentity::user("ada"));

    let task = create_task(&ctx, CreateTask::titled("t")).expect("create");
    let comment = create_comment(&ctx, task, "draft").expect("comment");
    delete_task(&ctx, task).expect("delete");
    assert!(task_history(&ctx, task).expect("history").is_empty());

    clock.advance(1_000);
    update_comment(&ctx, comment, "revised").expect("edit leftover comment");
    assert_eq!(get_comment(&ctx, comment).expect("get").content, "revised");
    delete_comment(&ctx, comment).expect("remove leftover comment");

    assert!(task_history(&ctx, task).expect("history").is_empty());
    assert!(audit::by_task(backend.connection(), task).expect("raw history").is_empty());
}

#[test]
fn history_of_deleted_task_does_not_leak_to_others() {
    let (backend, _clock) = in_memory();
    let ada = backend.request(&FixedIdentity::user("ada"));
    let grace = backend.request(&FixedIdentity::user("grace"));

    let task = create_task(&ada, CreateTask::titled("t")).expect("create");
    assert!(matches!(
        task_history(&grace, task),
        Err(ApiError::Unauthorized(_))
    ));
    delete_task(&ada, task).expect("delete");
    assert!(task_history(&grace, task).expect("history").is_empty());
}

#[test]
fn anonymous_requests_touch_nothing() {
    let (backend, _clock) = in_memory();
    let ctx = backend.request(&FixedIdentity::anonymous());

    assert!(matches!(
        create_task(&ctx, CreateTask::titled("x")),
        Err(ApiError::Unauthenticated)
    ));
    assert!(matches!(list_tasks(&ctx), Err(ApiError::Unauthenticated)));

    let activity: i64 = backend
        .connection()
        .query_row("SELECT COUNT(*) FROM task_activity", [], |row| row.get(0))
        .expect("count");
    assert_eq!(activity, 0);
}

#[test]
fn open_existing_leaves_missing_store_alone() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ProjectConfig::default();
    let path = config.store_path(dir.path());

    assert!(Backend::open_existing(dir.path(), &config).expect("open").is_none());
    assert!(!path.exists());

    let created = Backend::open(dir.path(), &config).expect("create");
    let task = create_task(&created.request(&FixedIdentity::user("ada")), CreateTask::titled("t"))
        .expect("create task");
    drop(created);

    let reopened = Backend::open_existing(dir.path(), &config)
        .expect("open")
        .expect("store exists");
    let ctx = reopened.request(&FixedIdentity::user("ada"));
    assert_eq!(get_task(&ctx, task).expect("get").title, "t");
}

#[test]
fn on_disk_backend_shares_quota_between_instances() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ProjectConfig::default();

    let first = Backend::open(dir.path(), &config).expect("open first");
    let second = Backend::open(dir.path(), &config).expect("open second");
    let ada = FixedIdentity::user("ada");

    for n in 0..3 {
        create_task(&first.request(&ada), CreateTask::titled(format!("a{n}"))).expect("create");
    }
    for n in 0..2 {
        create_task(&second.request(&ada), CreateTask::titled(format!("b{n}"))).expect("create");
    }
    let err = create_task(&first.request(&ada), CreateTask::titled("over")).expect_err("limited");
    assert!(matches!(
        err,
        ApiError::RateLimited {
            action: "createTask",
            ..
        }
    ));
    assert_eq!(list_tasks(&second.request(&ada)).expect("list").len(), 5);
}

#[test]
fn disabled_rate_limit_config_admits_bursts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ProjectConfig {
        rate_limit: RateLimitConfig { enabled: false },
        ..ProjectConfig::default()
    };
    let backend = Backend::open(dir.path(), &config).expect("open");
    let ctx = backend.request(&FixedIdentity::user("ada"));
    for n in 0..12 {
        create_task(&ctx, CreateTask::titled(format!("t{n}"))).expect("unlimited");
    }
}

#[test]
fn sqlite_counters_are_atomic_across_threads() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tasklane.sqlite3");
    drop(db::open_store(&path).expect("create store"));

    let clock = Arc::new(ManualClock::new(NOW));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let path = path.clone();
            let clock = clock.clone();
            std::thread::spawn(move || {
                let limiter = RateLimiter::new(Box::new(SqliteCounterStore::new(&path)), clock);
                (0..5)
                    .filter(|_| {
                        limiter
                            .check(RateLimitAction::UpdateTask, "ada")
                            .expect("check")
                            .allowed
                    })
                    .count()
            })
        })
        .collect();

    let admitted: usize = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker"))
        .sum();
    // updateTask holds 10 tokens and the clock is frozen.
    assert_eq!(admitted, 10);
}
