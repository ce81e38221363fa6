//! `PostgreSQL` repository implementation for opportunity storage.

use super::{
    models::{HistoryRow, NewHistoryRow, NewOpportunityRow, OpportunityChangeset, OpportunityRow},
    schema::{opportunities, opportunity_history},
};
use crate::identity::ActorId;
use crate::pipeline::{
    domain::{
        CompanyName, Money, Opportunity, OpportunityId, PersistedOpportunityData, Stage,
        StageHistoryRecord,
    },
    ports::{OpportunityRepository, OpportunityRepositoryError, OpportunityRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by pipeline adapters.
pub type PipelinePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed opportunity repository.
///
/// Each write method runs in one transaction so the entity and its history
/// record commit together; version-guarded updates realise the optimistic
/// locking contract.
#[derive(Debug, Clone)]
pub struct PostgresOpportunityRepository {
    pool: PipelinePgPool,
}

impl PostgresOpportunityRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: PipelinePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> OpportunityRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> OpportunityRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(OpportunityRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(OpportunityRepositoryError::persistence)?
    }
}

#[async_trait]
impl OpportunityRepository for PostgresOpportunityRepository {
    async fn create(
        &self,
        opportunity: &Opportunity,
        record: &StageHistoryRecord,
    ) -> OpportunityRepositoryResult<()> {
        let opportunity_id = opportunity.id();
        let new_row = to_new_row(opportunity)?;
        let history_row = to_new_history_row(record);

        self.run_blocking(move |connection| {
            connection.transaction::<_, OpportunityRepositoryError, _>(|tx_conn| {
                diesel::insert_into(opportunities::table)
                    .values(&new_row)
                    .execute(tx_conn)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            OpportunityRepositoryError::DuplicateOpportunity(opportunity_id)
                        }
                        _ => OpportunityRepositoryError::persistence(err),
                    })?;
                diesel::insert_into(opportunity_history::table)
                    .values(&history_row)
                    .execute(tx_conn)
                    .map_err(OpportunityRepositoryError::persistence)?;
                Ok(())
            })
        })
        .await
    }

    async fn commit(
        &self,
        opportunity: &Opportunity,
        record: Option<&StageHistoryRecord>,
        expected_version: u64,
    ) -> OpportunityRepositoryResult<()> {
        let opportunity_id = opportunity.id();
        let changeset = to_changeset(opportunity)?;
        let history_row = record.map(to_new_history_row);
        let guard_version =
            i64::try_from(expected_version).map_err(OpportunityRepositoryError::persistence)?;

        self.run_blocking(move |connection| {
            connection.transaction::<_, OpportunityRepositoryError, _>(|tx_conn| {
                let affected = diesel::update(
                    opportunities::table
                        .filter(opportunities::id.eq(opportunity_id.into_inner()))
                        .filter(opportunities::version.eq(guard_version)),
                )
                .set(&changeset)
                .execute(tx_conn)
                .map_err(OpportunityRepositoryError::persistence)?;

                if affected == 0 {
                    let exists: i64 = opportunities::table
                        .filter(opportunities::id.eq(opportunity_id.into_inner()))
                        .count()
                        .get_result(tx_conn)
                        .map_err(OpportunityRepositoryError::persistence)?;
                    if exists == 0 {
                        return Err(OpportunityRepositoryError::NotFound(opportunity_id));
                    }
                    return Err(OpportunityRepositoryError::ConcurrentModification {
                        opportunity_id,
                        expected: expected_version,
                    });
                }

                if let Some(row) = history_row {
                    diesel::insert_into(opportunity_history::table)
                        .values(&row)
                        .execute(tx_conn)
                        .map_err(OpportunityRepositoryError::persistence)?;
                }
                Ok(())
            })
        })
        .await
    }

    async fn find_by_id(
        &self,
        id: OpportunityId,
    ) -> OpportunityRepositoryResult<Option<Opportunity>> {
        self.run_blocking(move |connection| {
            let row = opportunities::table
                .filter(opportunities::id.eq(id.into_inner()))
                .select(OpportunityRow::as_select())
                .first::<OpportunityRow>(connection)
                .optional()
                .map_err(OpportunityRepositoryError::persistence)?;
            row.map(row_to_opportunity).transpose()
        })
        .await
    }

    async fn list_history(
        &self,
        id: OpportunityId,
    ) -> OpportunityRepositoryResult<Vec<StageHistoryRecord>> {
        self.run_blocking(move |connection| {
            let rows = opportunity_history::table
                .filter(opportunity_history::opportunity_id.eq(id.into_inner()))
                .order((
                    opportunity_history::created_at.asc(),
                    opportunity_history::id.asc(),
                ))
                .select(HistoryRow::as_select())
                .load::<HistoryRow>(connection)
                .map_err(OpportunityRepositoryError::persistence)?;
            rows.into_iter().map(row_to_record).collect()
        })
        .await
    }
}

fn to_new_row(opportunity: &Opportunity) -> OpportunityRepositoryResult<NewOpportunityRow> {
    Ok(NewOpportunityRow {
        id: opportunity.id().into_inner(),
        company_name: opportunity.company_name().as_str().to_owned(),
        owner: opportunity.owner().as_str().to_owned(),
        amount_cents: opportunity.amount().cents(),
        stage: opportunity.stage().as_str().to_owned(),
        trial_ends_at: opportunity.trial_ends_at(),
        lost_reason: opportunity.lost_reason().map(ToOwned::to_owned),
        tags: serde_json::to_value(opportunity.tags())
            .map_err(OpportunityRepositoryError::persistence)?,
        version: i64::try_from(opportunity.version())
            .map_err(OpportunityRepositoryError::persistence)?,
        created_at: opportunity.created_at(),
        updated_at: opportunity.updated_at(),
    })
}

fn to_changeset(opportunity: &Opportunity) -> OpportunityRepositoryResult<OpportunityChangeset> {
    Ok(OpportunityChangeset {
        stage: opportunity.stage().as_str().to_owned(),
        trial_ends_at: opportunity.trial_ends_at(),
        lost_reason: opportunity.lost_reason().map(ToOwned::to_owned),
        tags: serde_json::to_value(opportunity.tags())
            .map_err(OpportunityRepositoryError::persistence)?,
        version: i64::try_from(opportunity.version())
            .map_err(OpportunityRepositoryError::persistence)?,
        updated_at: opportunity.updated_at(),
    })
}

fn to_new_history_row(record: &StageHistoryRecord) -> NewHistoryRow {
    NewHistoryRow {
        opportunity_id: record.opportunity_id().into_inner(),
        actor: record.actor().as_str().to_owned(),
        from_stage: record.from_stage().map(|stage| stage.as_str().to_owned()),
        to_stage: record.to_stage().as_str().to_owned(),
        note: record.note().map(ToOwned::to_owned),
        created_at: record.created_at(),
    }
}

fn row_to_opportunity(row: OpportunityRow) -> OpportunityRepositoryResult<Opportunity> {
    let stage =
        Stage::try_from(row.stage.as_str()).map_err(OpportunityRepositoryError::persistence)?;
    Ok(Opportunity::from_persisted(PersistedOpportunityData {
        id: OpportunityId::from_uuid(row.id),
        company_name: CompanyName::new(row.company_name)
            .map_err(OpportunityRepositoryError::persistence)?,
        owner: ActorId::new(row.owner).map_err(OpportunityRepositoryError::persistence)?,
        amount: Money::from_cents(row.amount_cents)
            .map_err(OpportunityRepositoryError::persistence)?,
        stage,
        trial_ends_at: row.trial_ends_at,
        lost_reason: row.lost_reason,
        tags: serde_json::from_value(row.tags).map_err(OpportunityRepositoryError::persistence)?,
        version: u64::try_from(row.version).map_err(OpportunityRepositoryError::persistence)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

fn row_to_record(row: HistoryRow) -> OpportunityRepositoryResult<StageHistoryRecord> {
    let from_stage = row
        .from_stage
        .as_deref()
        .map(Stage::try_from)
        .transpose()
        .map_err(OpportunityRepositoryError::persistence)?;
    let to_stage =
        Stage::try_from(row.to_stage.as_str()).map_err(OpportunityRepositoryError::persistence)?;
    Ok(StageHistoryRecord::from_persisted(
        OpportunityId::from_uuid(row.opportunity_id),
        ActorId::new(row.actor).map_err(OpportunityRepositoryError::persistence)?,
        from_stage,
        to_stage,
        row.note,
        row.created_at,
    ))
}
