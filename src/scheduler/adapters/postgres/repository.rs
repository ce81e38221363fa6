//! `PostgreSQL` job store implementation.

use super::{
    models::{JobChangeset, JobRow, NewJobRow},
    schema::delayed_jobs,
};
use crate::scheduler::{
    domain::{DelayedJob, JobId, JobKey, JobName, JobStatus, PersistedJobData},
    ports::{JobStore, JobStoreError, JobStoreResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by scheduler adapters.
pub type SchedulerPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed job store.
#[derive(Debug, Clone)]
pub struct PostgresJobStore {
    pool: SchedulerPgPool,
}

impl PostgresJobStore {
    /// Creates a new store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: SchedulerPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> JobStoreResult<T>
    where
        F: FnOnce(&mut PgConnection) -> JobStoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(JobStoreError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(JobStoreError::persistence)?
    }
}

#[async_trait]
impl JobStore for PostgresJobStore {
    async fn insert(&self, job: &DelayedJob) -> JobStoreResult<()> {
        let job_id = job.id();
        let new_row = to_new_row(job)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(delayed_jobs::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        JobStoreError::DuplicateJob(job_id)
                    }
                    _ => JobStoreError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, job: &DelayedJob) -> JobStoreResult<()> {
        let job_id = job.id();
        let changeset = to_changeset(job)?;

        self.run_blocking(move |connection| {
            let affected = diesel::update(
                delayed_jobs::table.filter(delayed_jobs::id.eq(job_id.into_inner())),
            )
            .set(&changeset)
            .execute(connection)
            .map_err(JobStoreError::persistence)?;
            if affected == 0 {
                return Err(JobStoreError::NotFound(job_id));
            }
            Ok(())
        })
        .await
    }

    async fn find_by_id(&self, id: JobId) -> JobStoreResult<Option<DelayedJob>> {
        self.run_blocking(move |connection| {
            let row = delayed_jobs::table
                .filter(delayed_jobs::id.eq(id.into_inner()))
                .select(JobRow::as_select())
                .first::<JobRow>(connection)
                .optional()
                .map_err(JobStoreError::persistence)?;
            row.map(row_to_job).transpose()
        })
        .await
    }

    async fn find_pending(
        &self,
        key: &JobKey,
        name: &JobName,
    ) -> JobStoreResult<Option<DelayedJob>> {
        let key_value = key.as_str().to_owned();
        let name_value = name.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = delayed_jobs::table
                .filter(delayed_jobs::key.eq(key_value))
                .filter(delayed_jobs::name.eq(name_value))
                .filter(delayed_jobs::status.eq(JobStatus::Pending.as_str()))
                .select(JobRow::as_select())
                .first::<JobRow>(connection)
                .optional()
                .map_err(JobStoreError::persistence)?;
            row.map(row_to_job).transpose()
        })
        .await
    }

    async fn due(&self, now: DateTime<Utc>) -> JobStoreResult<Vec<DelayedJob>> {
        self.run_blocking(move |connection| {
            let rows = delayed_jobs::table
                .filter(delayed_jobs::status.eq(JobStatus::Pending.as_str()))
                .filter(delayed_jobs::fire_at.le(now))
                .order((delayed_jobs::fire_at.asc(), delayed_jobs::insertion_seq.asc()))
                .select(JobRow::as_select())
                .load::<JobRow>(connection)
                .map_err(JobStoreError::persistence)?;
            rows.into_iter().map(row_to_job).collect()
        })
        .await
    }
}

fn to_new_row(job: &DelayedJob) -> JobStoreResult<NewJobRow> {
    Ok(NewJobRow {
        id: job.id().into_inner(),
        key: job.key().as_str().to_owned(),
        name: job.name().as_str().to_owned(),
        payload: job.payload().clone(),
        fire_at: job.fire_at(),
        status: job.status().as_str().to_owned(),
        attempts: i32::try_from(job.attempts()).map_err(JobStoreError::persistence)?,
        last_error: job.last_error().map(ToOwned::to_owned),
        created_at: job.created_at(),
        updated_at: job.updated_at(),
    })
}

fn to_changeset(job: &DelayedJob) -> JobStoreResult<JobChangeset> {
    Ok(JobChangeset {
        fire_at: job.fire_at(),
        status: job.status().as_str().to_owned(),
        attempts: i32::try_from(job.attempts()).map_err(JobStoreError::persistence)?,
        last_error: job.last_error().map(ToOwned::to_owned),
        updated_at: job.updated_at(),
    })
}

fn row_to_job(row: JobRow) -> JobStoreResult<DelayedJob> {
    let status = JobStatus::try_from(row.status.as_str()).map_err(JobStoreError::persistence)?;
    Ok(DelayedJob::from_persisted(PersistedJobData {
        id: JobId::from_uuid(row.id),
        key: JobKey::new(row.key).map_err(JobStoreError::persistence)?,
        name: JobName::new(row.name).map_err(JobStoreError::persistence)?,
        payload: row.payload,
        fire_at: row.fire_at,
        status,
        attempts: u32::try_from(row.attempts).map_err(JobStoreError::persistence)?,
        last_error: row.last_error,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
