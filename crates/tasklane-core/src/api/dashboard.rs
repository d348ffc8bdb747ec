//! Read-only aggregates over the caller's data.

use serde::Serialize;

use super::{Operation, RequestContext};
use crate::audit;
use crate::clock::ONE_WEEK_MS;
use crate::db::{self, tasks::PriorityCounts, tasks::TaskFilter};
use crate::error::ApiResult;
use crate::model::{Task, TaskActivity};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_tasks: u64,
    pub pending_tasks: u64,
    pub in_progress_tasks: u64,
    pub completed_tasks: u64,
    pub overdue_tasks: u64,
    pub upcoming_tasks: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    /// Whole percent, rounded half up; zero when there are no tasks.
    pub completion_rate: u64,
    /// Tasks whose completion stamp falls within the last seven days.
    pub recent_completions: u64,
}

/// Row counts per entity, scoped to the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub tasks: u64,
    pub comments: u64,
    pub activity: u64,
    pub preferences: u64,
    pub total_records: u64,
}

fn len(items: &[Task]) -> u64 {
    u64::try_from(items.len()).unwrap_or(u64::MAX)
}

/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn dashboard_summary(ctx: &RequestContext<'_>) -> ApiResult<DashboardSummary> {
    let identity = ctx.begin(Operation::DashboardSummary)?;
    let now_ms = ctx.now_ms();
    let counts = db::tasks::count_by_status(ctx.conn(), identity.as_str())?;
    let overdue = db::tasks::list_overdue(ctx.conn(), identity.as_str(), now_ms)?;
    let upcoming = db::tasks::list_upcoming(ctx.conn(), identity.as_str(), now_ms)?;

    Ok(DashboardSummary {
        total_tasks: counts.total,
        pending_tasks: counts.pending,
        in_progress_tasks: counts.in_progress,
        completed_tasks: counts.completed,
        overdue_tasks: len(&overdue),
        upcoming_tasks: len(&upcoming),
    })
}

/// The newest tasks, capped by `[dashboard] recent_tasks`.
///
/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn recent_tasks(ctx: &RequestContext<'_>) -> ApiResult<Vec<Task>> {
    let identity = ctx.begin(Operation::RecentTasks)?;
    let limit = ctx.backend().dashboard_config().recent_tasks;
    Ok(db::tasks::list_by_user(
        ctx.conn(),
        identity.as_str(),
        &TaskFilter {
            limit: Some(limit),
            ..TaskFilter::default()
        },
    )?)
}

/// The caller's latest activity across all tasks, capped by
/// `[dashboard] recent_activity`.
///
/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn recent_activity(ctx: &RequestContext<'_>) -> ApiResult<Vec<TaskActivity>> {
    let identity = ctx.begin(Operation::RecentActivity)?;
    let limit = ctx.backend().dashboard_config().recent_activity;
    Ok(audit::recent_by_user(ctx.conn(), identity.as_str(), Some(limit))?)
}

/// Counts of tasks not yet completed, by priority.
///
/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn tasks_by_priority(ctx: &RequestContext<'_>) -> ApiResult<PriorityCounts> {
    let identity = ctx.begin(Operation::TasksByPriority)?;
    Ok(db::tasks::count_open_by_priority(ctx.conn(), identity.as_str())?)
}

/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn completion_stats(ctx: &RequestContext<'_>) -> ApiResult<CompletionStats> {
    let identity = ctx.begin(Operation::CompletionStats)?;
    let counts = db::tasks::count_by_status(ctx.conn(), identity.as_str())?;
    let recent = db::tasks::count_completed_since(
        ctx.conn(),
        identity.as_str(),
        ctx.now_ms() - ONE_WEEK_MS,
    )?;

    Ok(CompletionStats {
        total_tasks: counts.total,
        completed_tasks: counts.completed,
        completion_rate: completion_rate(counts.completed, counts.total),
        recent_completions: recent,
    })
}

fn completion_rate(completed: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    (completed * 100 + total / 2) / total
}

/// # Errors
///
/// Fails with `Unauthenticated` or `Store`.
pub fn dashboard_overview(ctx: &RequestContext<'_>) -> ApiResult<DashboardOverview> {
    let identity = ctx.begin(Operation::DashboardOverview)?;
    let user = identity.as_str();

    let tasks = db::tasks::count_by_status(ctx.conn(), user)?.total;
    let comments = db::comments::count_by_user(ctx.conn(), user)?;
    let activity = db::activity::count_by_user(ctx.conn(), user)?;
    let preferences = u64::from(db::preferences::get_by_user(ctx.conn(), user)?.is_some());

    Ok(DashboardOverview {
        tasks,
        comments,
        activity,
        preferences,
        total_records: tasks + comments + activity + preferences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::comments::create_comment;
    use crate::api::preferences::init_preferences;
    use crate::api::tasks::{CreateTask, UpdateTask, create_task, update_task};
    use crate::api::testing::{NOW, as_user, backend};
    use crate::clock::{ONE_DAY_MS, ONE_HOUR_MS};
    use crate::model::{ActivityAction, TaskPriority, TaskStatus};

    #[test]
    fn rate_rounds_half_up() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(1, 8), 13);
        assert_eq!(completion_rate(4, 4), 100);
    }

    #[test]
    fn summary_and_priority_counts() {
        let (backend, _clock) = backend();
        let ctx = backend.request(&as_user("ada"));
        create_task(
            &ctx,
            CreateTask {
                due_date: Some(NOW - ONE_HOUR_MS),
                priority: TaskPriority::High,
                ..CreateTask::titled("late")
            },
        )
        .expect("create");
        create_task(
            &ctx,
            CreateTask {
                due_date: Some(NOW + ONE_DAY_MS),
                ..CreateTask::titled("soon")
            },
        )
        .expect("create");
        let done = create_task(
            &ctx,
            CreateTask {
                priority: TaskPriority::High,
                ..CreateTask::titled("done")
            },
        )
        .expect("create");
        update_task(
            &ctx,
            done,
            UpdateTask {
                status: Some(TaskStatus::Completed),
                ..UpdateTask::default()
            },
        )
        .expect("complete");

        assert_eq!(
            dashboard_summary(&ctx).expect("summary"),
            DashboardSummary {
                total_tasks: 3,
                pending_tasks: 2,
                in_progress_tasks: 0,
                completed_tasks: 1,
                overdue_tasks: 1,
                upcoming_tasks: 1,
            }
        );
        assert_eq!(
            tasks_by_priority(&ctx).expect("priority"),
            PriorityCounts {
                low: 0,
                medium: 1,
                high: 1
            }
        );

        let stats = completion_stats(&ctx).expect("stats");
        assert_eq!(stats.completion_rate, 33);
        assert_eq!(stats.recent_completions, 1);
    }

    #[test]
    fn recent_completions_age_out_after_a_week() {
        let (backend, clock) = backend();
        let ctx = backend.request(&as_user("ada"));
        let id = create_task(&ctx, CreateTask::titled("t")).expect("create");
        update_task(
            &ctx,
            id,
            UpdateTask {
                status: Some(TaskStatus::Completed),
                ..UpdateTask::default()
            },
        )
        .expect("complete");

        clock.advance(ONE_WEEK_MS + 1);
        let stats = completion_stats(&ctx).expect("stats");
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.completion_rate, 100);
        assert_eq!(stats.recent_completions, 0);
    }

    #[test]
    fn recent_lists_follow_configured_caps() {
        let (backend, clock) = backend();
        let backend = backend.with_dashboard(crate::config::DashboardConfig {
            recent_tasks: 2,
            recent_activity: 3,
        });
        let ctx = backend.request(&as_user("ada"));
        for n in 0..4 {
            clock.advance(5_000);
            create_task(&ctx, CreateTask::titled(format!("t{n}"))).expect("create");
        }

        let titles: Vec<String> = recent_tasks(&ctx)
            .expect("recent")
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["t3", "t2"]);

        let activity = recent_activity(&ctx).expect("activity");
        assert_eq!(activity.len(), 3);
        assert!(activity.iter().all(|e| e.action == ActivityAction::Created));
        assert!(activity[0].created_at > activity[2].created_at);
    }

    #[test]
    fn overview_counts_only_the_callers_rows() {
        let (backend, _clock) = backend();
        let ada = backend.request(&as_user("ada"));
        let grace = backend.request(&as_user("grace"));

        let task = create_task(&ada, CreateTask::titled("t")).expect("create");
        create_comment(&ada, task, "c").expect("comment");
        init_preferences(&ada).expect("prefs");
        create_task(&grace, CreateTask::titled("g")).expect("create");

        assert_eq!(
            dashboard_overview(&ada).expect("overview"),
            DashboardOverview {
                tasks: 1,
                comments: 1,
                activity: 2,
                preferences: 1,
                total_records: 5,
            }
        );
        assert_eq!(dashboard_overview(&grace).expect("overview").total_records, 2);
    }
}
