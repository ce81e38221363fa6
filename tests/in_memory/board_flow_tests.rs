//! Integration tests for the task lifecycle, event log, and ordering.

use super::helpers::{build_engine, ops};
use dealflow::board::{
    domain::{BoardDomainError, BoardEventKind, TaskStatus},
    services::{BoardServiceError, CreateTaskRequest, MoveTaskRequest, ScheduleTaskRequest},
};
use chrono::{Duration, Utc};

#[tokio::test(flavor = "multi_thread")]
async fn schedule_then_complete_accumulates_two_events() {
    let engine = build_engine();
    let task = engine
        .board
        .create(
            CreateTaskRequest::new("acct-1", "initech.example", ops())
                .with_segment("mid-market"),
        )
        .await
        .expect("creation should succeed");
    assert_eq!(task.status(), TaskStatus::Pending);

    let at = Utc::now() + Duration::days(2);
    let scheduled = engine
        .board
        .schedule(ScheduleTaskRequest::new(task.id(), at, "tech-2", ops()))
        .await
        .expect("scheduling should succeed");
    assert_eq!(scheduled.status(), TaskStatus::Scheduled);

    let done = engine
        .board
        .complete(task.id(), ops(), Some("installed".to_owned()))
        .await
        .expect("completion should succeed");
    assert_eq!(done.status(), TaskStatus::Done);

    let events = engine
        .board
        .list_events(task.id())
        .await
        .expect("events should list");
    let kinds: Vec<BoardEventKind> = events.iter().map(|event| event.kind()).collect();
    assert_eq!(kinds, vec![BoardEventKind::Scheduled, BoardEventKind::Done]);
}

#[tokio::test(flavor = "multi_thread")]
async fn head_inserts_read_back_in_move_order() {
    let engine = build_engine();
    let mut ids = Vec::new();
    for account in ["acct-1", "acct-2"] {
        let task = engine
            .board
            .create(CreateTaskRequest::new(account, "customer.example", ops()))
            .await
            .expect("creation should succeed");
        engine
            .board
            .schedule(ScheduleTaskRequest::new(
                task.id(),
                Utc::now() + Duration::days(1),
                "tech-2",
                ops(),
            ))
            .await
            .expect("scheduling should succeed");
        ids.push(task.id());
    }
    let first = *ids.first().expect("first task should exist");
    let second = *ids.last().expect("second task should exist");

    engine
        .board
        .move_task(MoveTaskRequest::new(first, TaskStatus::Scheduled, 0, ops()))
        .await
        .expect("first move should succeed");
    engine
        .board
        .move_task(MoveTaskRequest::new(second, TaskStatus::Scheduled, 0, ops()))
        .await
        .expect("second move should succeed");

    let column = engine
        .board
        .list_column(TaskStatus::Scheduled)
        .await
        .expect("column should list");
    let order: Vec<_> = column.iter().map(|task| task.id()).collect();
    assert_eq!(order, vec![second, first]);
}

#[tokio::test(flavor = "multi_thread")]
async fn finished_tasks_refuse_every_status_move() {
    let engine = build_engine();
    let task = engine
        .board
        .create(CreateTaskRequest::new("acct-1", "initech.example", ops()))
        .await
        .expect("creation should succeed");
    engine
        .board
        .schedule(ScheduleTaskRequest::new(
            task.id(),
            Utc::now() + Duration::days(1),
            "tech-2",
            ops(),
        ))
        .await
        .expect("scheduling should succeed");
    engine
        .board
        .mark_unsuccessful(task.id(), ops(), None)
        .await
        .expect("closing should succeed");

    for target in [TaskStatus::Pending, TaskStatus::Scheduled, TaskStatus::Done] {
        let result = engine
            .board
            .move_task(MoveTaskRequest::new(task.id(), target, 0, ops()))
            .await;
        assert!(
            matches!(
                result,
                Err(BoardServiceError::Domain(
                    BoardDomainError::TerminalStatus { .. }
                ))
            ),
            "move to {target} should be rejected"
        );
    }

    // Reads stay available on finished tasks.
    let read_back = engine.board.get(task.id()).await.expect("get should succeed");
    assert_eq!(read_back.status(), TaskStatus::Unsuccessful);
}
