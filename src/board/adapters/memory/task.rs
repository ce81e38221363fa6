//! In-memory repository for board tests and reference semantics.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::board::{
    domain::{BoardEvent, ImplementationTask, TaskId, TaskStatus},
    ports::{BoardRepository, BoardRepositoryError, BoardRepositoryResult},
};

/// Thread-safe in-memory board repository.
///
/// The single lock scope per call is the reference implementation of the
/// atomicity contract: task, event, and sibling shifts become visible
/// together. Insertion sequence numbers provide the tie-break for equal
/// positions.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoardRepository {
    state: Arc<RwLock<InMemoryBoardState>>,
}

#[derive(Debug, Default)]
struct InMemoryBoardState {
    tasks: HashMap<TaskId, ImplementationTask>,
    insertion: HashMap<TaskId, u64>,
    events: HashMap<TaskId, Vec<BoardEvent>>,
    next_seq: u64,
}

impl InMemoryBoardRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl std::fmt::Display) -> BoardRepositoryError {
    BoardRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn check_version(
    state: &InMemoryBoardState,
    task: &ImplementationTask,
    expected_version: u64,
) -> BoardRepositoryResult<()> {
    let stored = state
        .tasks
        .get(&task.id())
        .ok_or(BoardRepositoryError::NotFound(task.id()))?;
    if stored.version() != expected_version {
        return Err(BoardRepositoryError::ConcurrentModification {
            task_id: task.id(),
            expected: expected_version,
        });
    }
    Ok(())
}

#[async_trait]
impl BoardRepository for InMemoryBoardRepository {
    async fn create(&self, task: &ImplementationTask) -> BoardRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.tasks.contains_key(&task.id()) {
            return Err(BoardRepositoryError::DuplicateTask(task.id()));
        }
        let seq = state.next_seq;
        state.next_seq += 1;
        state.insertion.insert(task.id(), seq);
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn commit(
        &self,
        task: &ImplementationTask,
        event: Option<&BoardEvent>,
        expected_version: u64,
    ) -> BoardRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        check_version(&state, task, expected_version)?;
        state.tasks.insert(task.id(), task.clone());
        if let Some(entry) = event {
            state
                .events
                .entry(task.id())
                .or_default()
                .push(entry.clone());
        }
        Ok(())
    }

    async fn commit_move(
        &self,
        task: &ImplementationTask,
        event: Option<&BoardEvent>,
        expected_version: u64,
    ) -> BoardRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        check_version(&state, task, expected_version)?;

        // Insert-and-shift: everyone at or after the requested slot in the
        // destination column moves one slot later.
        for sibling in state.tasks.values_mut() {
            if sibling.id() != task.id()
                && sibling.status() == task.status()
                && sibling.position() >= task.position()
            {
                sibling.displace();
            }
        }

        state.tasks.insert(task.id(), task.clone());
        if let Some(entry) = event {
            state
                .events
                .entry(task.id())
                .or_default()
                .push(entry.clone());
        }
        Ok(())
    }

    async fn append_event(&self, event: &BoardEvent) -> BoardRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state
            .events
            .entry(event.task_id())
            .or_default()
            .push(event.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> BoardRepositoryResult<Option<ImplementationTask>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn list_column(
        &self,
        status: TaskStatus,
    ) -> BoardRepositoryResult<Vec<ImplementationTask>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut column: Vec<ImplementationTask> = state
            .tasks
            .values()
            .filter(|task| task.status() == status)
            .cloned()
            .collect();
        column.sort_by_key(|task| {
            (
                task.position(),
                state.insertion.get(&task.id()).copied().unwrap_or(u64::MAX),
            )
        });
        Ok(column)
    }

    async fn list_events(&self, task_id: TaskId) -> BoardRepositoryResult<Vec<BoardEvent>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.events.get(&task_id).cloned().unwrap_or_default())
    }
}
