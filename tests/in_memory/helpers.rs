//! Shared test helpers for in-memory integration tests.

use dealflow::board::{adapters::memory::InMemoryBoardRepository, services::ImplementationBoard};
use dealflow::identity::ActorId;
use dealflow::pipeline::{
    adapters::memory::InMemoryOpportunityRepository, domain::StageCatalog,
    services::OpportunityPipeline,
};
use dealflow::scheduler::{adapters::memory::InMemoryJobStore, services::DelayedJobScheduler};
use dealflow::trial::{RecordingReminderNotifier, install};
use mockable::DefaultClock;
use std::sync::Arc;

/// Pipeline service over in-memory adapters.
pub type TestPipeline = OpportunityPipeline<InMemoryOpportunityRepository, DefaultClock>;

/// Board service over in-memory adapters.
pub type TestBoard = ImplementationBoard<InMemoryBoardRepository, DefaultClock>;

/// Scheduler service over the in-memory job store.
pub type TestScheduler = DelayedJobScheduler<InMemoryJobStore, DefaultClock>;

/// Fully wired engine: pipeline, scheduler, trial coordination, board.
pub struct Engine {
    /// Opportunity pipeline.
    pub pipeline: Arc<TestPipeline>,
    /// Implementation board.
    pub board: TestBoard,
    /// Delayed-job scheduler.
    pub scheduler: Arc<TestScheduler>,
    /// Job store backing the scheduler, for state assertions.
    pub job_store: Arc<InMemoryJobStore>,
    /// Recording notifier backing the reminder handler.
    pub notifier: Arc<RecordingReminderNotifier>,
}

/// Builds the engine the way a composition root would at startup.
pub fn build_engine() -> Engine {
    let job_store = Arc::new(InMemoryJobStore::new());
    let pipeline = Arc::new(OpportunityPipeline::new(
        Arc::new(InMemoryOpportunityRepository::new()),
        Arc::new(StageCatalog::standard()),
        Arc::new(DefaultClock),
    ));
    let scheduler = Arc::new(DelayedJobScheduler::new(
        job_store.clone(),
        Arc::new(DefaultClock),
    ));
    let board = ImplementationBoard::new(
        Arc::new(InMemoryBoardRepository::new()),
        Arc::new(DefaultClock),
    );
    let notifier = Arc::new(RecordingReminderNotifier::new());
    install(&pipeline, &scheduler, notifier.clone()).expect("trial wiring should succeed");

    Engine {
        pipeline,
        board,
        scheduler,
        job_store,
        notifier,
    }
}

/// A sales actor used across scenarios.
pub fn seller() -> ActorId {
    ActorId::new("seller-1").expect("valid actor")
}

/// An operations actor used across board scenarios.
pub fn ops() -> ActorId {
    ActorId::new("ops-1").expect("valid actor")
}
