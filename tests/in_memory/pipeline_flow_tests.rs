//! Integration tests for the opportunity lifecycle and history accounting.

use super::helpers::{build_engine, seller};
use dealflow::pipeline::{
    domain::{PipelineDomainError, Stage},
    services::{CreateOpportunityRequest, PipelineServiceError, TransitionRequest},
};

#[tokio::test(flavor = "multi_thread")]
async fn history_length_tracks_successful_transitions() {
    let engine = build_engine();
    let created = engine
        .pipeline
        .create(
            CreateOpportunityRequest::new("Globex", "seller-1", 250_000)
                .with_tags(vec!["enterprise".to_owned()]),
        )
        .await
        .expect("creation should succeed");

    let moves = [Stage::Presentation, Stage::Proposal, Stage::Presentation, Stage::Proposal];
    for stage in moves {
        engine
            .pipeline
            .transition(TransitionRequest::new(created.id(), stage, seller()))
            .await
            .expect("transition should succeed");
    }

    // One failed attempt must not appear in the history.
    let rejected = engine
        .pipeline
        .transition(TransitionRequest::new(created.id(), Stage::Lost, seller()))
        .await;
    assert!(matches!(
        rejected,
        Err(PipelineServiceError::Domain(
            PipelineDomainError::MissingLostReason { .. }
        ))
    ));

    let history = engine
        .pipeline
        .list_history(created.id())
        .await
        .expect("history should list");
    assert_eq!(history.len(), moves.len() + 1);
    assert_eq!(history.first().map(|record| record.from_stage()), Some(None));
}

#[tokio::test(flavor = "multi_thread")]
async fn losing_with_a_reason_closes_the_opportunity() {
    let engine = build_engine();
    let created = engine
        .pipeline
        .create(CreateOpportunityRequest::new("Initech", "seller-1", 90_000))
        .await
        .expect("creation should succeed");
    engine
        .pipeline
        .transition(TransitionRequest::new(created.id(), Stage::Proposal, seller()))
        .await
        .expect("move to proposal should succeed");

    let lost = engine
        .pipeline
        .transition(
            TransitionRequest::new(created.id(), Stage::Lost, seller())
                .with_note("budget cut for the quarter"),
        )
        .await
        .expect("losing with a reason should succeed");
    assert_eq!(lost.stage(), Stage::Lost);
    assert_eq!(lost.lost_reason(), Some("budget cut for the quarter"));

    // Terminal: nothing moves a lost opportunity.
    let reopened = engine
        .pipeline
        .transition(TransitionRequest::new(created.id(), Stage::Negotiation, seller()))
        .await;
    assert!(matches!(
        reopened,
        Err(PipelineServiceError::Domain(
            PipelineDomainError::TerminalStage { .. }
        ))
    ));

    // Lost opportunities are retained for reporting.
    let retained = engine
        .pipeline
        .get(created.id())
        .await
        .expect("get should succeed");
    assert_eq!(retained.stage(), Stage::Lost);
}
