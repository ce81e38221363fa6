//! `PostgreSQL` repository implementation for board storage.

use super::{
    models::{EventRow, NewEventRow, NewTaskRow, TaskChangeset, TaskRow},
    schema::{implementation_events, implementation_tasks},
};
use crate::board::{
    domain::{
        AccountId, BoardEvent, BoardEventKind, CustomerDomain, ImplementationTask,
        PersistedTaskData, TaskId, TaskStatus,
    },
    ports::{BoardRepository, BoardRepositoryError, BoardRepositoryResult},
};
use crate::identity::ActorId;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by board adapters.
pub type BoardPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed board repository.
///
/// Each write method runs in one transaction so the task, its optional
/// event, and any sibling shifts commit together.
#[derive(Debug, Clone)]
pub struct PostgresBoardRepository {
    pool: BoardPgPool,
}

impl PostgresBoardRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: BoardPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> BoardRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> BoardRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(BoardRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(BoardRepositoryError::persistence)?
    }
}

/// Applies the version-guarded task update inside a transaction.
fn guarded_update(
    connection: &mut PgConnection,
    task_id: TaskId,
    changeset: &TaskChangeset,
    expected_version: u64,
) -> BoardRepositoryResult<()> {
    let guard_version =
        i64::try_from(expected_version).map_err(BoardRepositoryError::persistence)?;
    let affected = diesel::update(
        implementation_tasks::table
            .filter(implementation_tasks::id.eq(task_id.into_inner()))
            .filter(implementation_tasks::version.eq(guard_version)),
    )
    .set(changeset)
    .execute(connection)
    .map_err(BoardRepositoryError::persistence)?;

    if affected == 0 {
        let exists: i64 = implementation_tasks::table
            .filter(implementation_tasks::id.eq(task_id.into_inner()))
            .count()
            .get_result(connection)
            .map_err(BoardRepositoryError::persistence)?;
        if exists == 0 {
            return Err(BoardRepositoryError::NotFound(task_id));
        }
        return Err(BoardRepositoryError::ConcurrentModification {
            task_id,
            expected: expected_version,
        });
    }
    Ok(())
}

fn insert_event(connection: &mut PgConnection, row: &NewEventRow) -> BoardRepositoryResult<()> {
    diesel::insert_into(implementation_events::table)
        .values(row)
        .execute(connection)
        .map_err(BoardRepositoryError::persistence)?;
    Ok(())
}

#[async_trait]
impl BoardRepository for PostgresBoardRepository {
    async fn create(&self, task: &ImplementationTask) -> BoardRepositoryResult<()> {
        let task_id = task.id();
        let new_row = to_new_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(implementation_tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        BoardRepositoryError::DuplicateTask(task_id)
                    }
                    _ => BoardRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn commit(
        &self,
        task: &ImplementationTask,
        event: Option<&BoardEvent>,
        expected_version: u64,
    ) -> BoardRepositoryResult<()> {
        let task_id = task.id();
        let changeset = to_changeset(task)?;
        let event_row = event.map(to_new_event_row);

        self.run_blocking(move |connection| {
            connection.transaction::<_, BoardRepositoryError, _>(|tx_conn| {
                guarded_update(tx_conn, task_id, &changeset, expected_version)?;
                if let Some(row) = event_row {
                    insert_event(tx_conn, &row)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn commit_move(
        &self,
        task: &ImplementationTask,
        event: Option<&BoardEvent>,
        expected_version: u64,
    ) -> BoardRepositoryResult<()> {
        let task_id = task.id();
        let changeset = to_changeset(task)?;
        let event_row = event.map(to_new_event_row);
        let column = task.status().as_str().to_owned();
        let slot = i32::try_from(task.position()).map_err(BoardRepositoryError::persistence)?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, BoardRepositoryError, _>(|tx_conn| {
                guarded_update(tx_conn, task_id, &changeset, expected_version)?;

                // Insert-and-shift: free the requested slot in the
                // destination column.
                diesel::update(
                    implementation_tasks::table
                        .filter(implementation_tasks::status.eq(&column))
                        .filter(implementation_tasks::position.ge(slot))
                        .filter(implementation_tasks::id.ne(task_id.into_inner())),
                )
                .set(implementation_tasks::position.eq(implementation_tasks::position + 1))
                .execute(tx_conn)
                .map_err(BoardRepositoryError::persistence)?;

                if let Some(row) = event_row {
                    insert_event(tx_conn, &row)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn append_event(&self, event: &BoardEvent) -> BoardRepositoryResult<()> {
        let row = to_new_event_row(event);
        self.run_blocking(move |connection| insert_event(connection, &row))
            .await
    }

    async fn find_by_id(&self, id: TaskId) -> BoardRepositoryResult<Option<ImplementationTask>> {
        self.run_blocking(move |connection| {
            let row = implementation_tasks::table
                .filter(implementation_tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(BoardRepositoryError::persistence)?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list_column(
        &self,
        status: TaskStatus,
    ) -> BoardRepositoryResult<Vec<ImplementationTask>> {
        let column = status.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = implementation_tasks::table
                .filter(implementation_tasks::status.eq(column))
                .order((
                    implementation_tasks::position.asc(),
                    implementation_tasks::insertion_seq.asc(),
                ))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(BoardRepositoryError::persistence)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn list_events(&self, task_id: TaskId) -> BoardRepositoryResult<Vec<BoardEvent>> {
        self.run_blocking(move |connection| {
            let rows = implementation_events::table
                .filter(implementation_events::task_id.eq(task_id.into_inner()))
                .order(implementation_events::id.asc())
                .select(EventRow::as_select())
                .load::<EventRow>(connection)
                .map_err(BoardRepositoryError::persistence)?;
            rows.into_iter().map(row_to_event).collect()
        })
        .await
    }
}

fn to_new_row(task: &ImplementationTask) -> BoardRepositoryResult<NewTaskRow> {
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        account_id: task.account_id().as_str().to_owned(),
        domain: task.domain().as_str().to_owned(),
        segment: task.segment().map(ToOwned::to_owned),
        status: task.status().as_str().to_owned(),
        assignee_id: task.assignee_id().map(|actor| actor.as_str().to_owned()),
        scheduled_at: task.scheduled_at(),
        notes: task.notes().map(ToOwned::to_owned),
        position: i32::try_from(task.position()).map_err(BoardRepositoryError::persistence)?,
        created_by: task.created_by().as_str().to_owned(),
        version: i64::try_from(task.version()).map_err(BoardRepositoryError::persistence)?,
        created_at: task.created_at(),
        updated_at: task.updated_at(),
    })
}

fn to_changeset(task: &ImplementationTask) -> BoardRepositoryResult<TaskChangeset> {
    Ok(TaskChangeset {
        status: task.status().as_str().to_owned(),
        assignee_id: task.assignee_id().map(|actor| actor.as_str().to_owned()),
        scheduled_at: task.scheduled_at(),
        notes: task.notes().map(ToOwned::to_owned),
        position: i32::try_from(task.position()).map_err(BoardRepositoryError::persistence)?,
        version: i64::try_from(task.version()).map_err(BoardRepositoryError::persistence)?,
        updated_at: task.updated_at(),
    })
}

fn to_new_event_row(event: &BoardEvent) -> NewEventRow {
    NewEventRow {
        task_id: event.task_id().into_inner(),
        kind: event.kind().as_str().to_owned(),
        payload: event.payload().clone(),
        created_by: event.created_by().as_str().to_owned(),
        created_at: event.created_at(),
    }
}

fn row_to_task(row: TaskRow) -> BoardRepositoryResult<ImplementationTask> {
    let status =
        TaskStatus::try_from(row.status.as_str()).map_err(BoardRepositoryError::persistence)?;
    let assignee_id = row
        .assignee_id
        .map(ActorId::new)
        .transpose()
        .map_err(BoardRepositoryError::persistence)?;
    Ok(ImplementationTask::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(row.id),
        account_id: AccountId::new(row.account_id).map_err(BoardRepositoryError::persistence)?,
        domain: CustomerDomain::new(row.domain).map_err(BoardRepositoryError::persistence)?,
        segment: row.segment,
        status,
        assignee_id,
        scheduled_at: row.scheduled_at,
        notes: row.notes,
        position: u32::try_from(row.position).map_err(BoardRepositoryError::persistence)?,
        created_by: ActorId::new(row.created_by).map_err(BoardRepositoryError::persistence)?,
        version: u64::try_from(row.version).map_err(BoardRepositoryError::persistence)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn row_to_event(row: EventRow) -> BoardRepositoryResult<BoardEvent> {
    let kind =
        BoardEventKind::try_from(row.kind.as_str()).map_err(BoardRepositoryError::persistence)?;
    Ok(BoardEvent::from_persisted(
        TaskId::from_uuid(row.task_id),
        kind,
        row.payload,
        ActorId::new(row.created_by).map_err(BoardRepositoryError::persistence)?,
        row.created_at,
    ))
}
