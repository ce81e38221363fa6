//! Unit tests for stage catalog construction and lookup.

use crate::pipeline::domain::{
    PipelineDomainError, Stage, StageCatalog, StageCatalogError, StageDefinition,
};
use rstest::rstest;

#[rstest]
#[case(Stage::Negotiation, false)]
#[case(Stage::Presentation, false)]
#[case(Stage::Proposal, true)]
#[case(Stage::Trial, true)]
#[case(Stage::TrialExpiring, true)]
#[case(Stage::Won, false)]
#[case(Stage::Lost, false)]
fn standard_catalog_lost_reason_flags(#[case] stage: Stage, #[case] expected: bool) {
    let catalog = StageCatalog::standard();
    let info = catalog.info(stage).expect("standard catalog is complete");
    assert_eq!(info.lost_reason_required, expected);
}

#[test]
fn standard_catalog_orders_stages_along_the_pipeline() {
    let catalog = StageCatalog::standard();
    let orders: Vec<u32> = Stage::ALL
        .into_iter()
        .map(|stage| {
            catalog
                .info(stage)
                .expect("standard catalog is complete")
                .order
        })
        .collect();
    let mut sorted = orders.clone();
    sorted.sort_unstable();
    assert_eq!(orders, sorted);
}

#[test]
fn stage_of_resolves_canonical_names() {
    let catalog = StageCatalog::standard();
    let info = catalog.stage_of("trial").expect("trial is a known stage");
    assert!(info.lost_reason_required);
}

#[test]
fn stage_of_rejects_unknown_names() {
    let catalog = StageCatalog::standard();
    let result = catalog.stage_of("qualification");
    assert!(matches!(
        result,
        Err(PipelineDomainError::UnknownStage(name)) if name == "qualification"
    ));
}

#[test]
fn from_definitions_rejects_duplicates() {
    let definitions = [
        StageDefinition::new(Stage::Negotiation, 0, false),
        StageDefinition::new(Stage::Negotiation, 1, true),
    ];
    assert_eq!(
        StageCatalog::from_definitions(definitions),
        Err(StageCatalogError::DuplicateStage(Stage::Negotiation))
    );
}

#[test]
fn from_definitions_requires_every_stage() {
    let definitions = [StageDefinition::new(Stage::Negotiation, 0, false)];
    assert_eq!(
        StageCatalog::from_definitions(definitions),
        Err(StageCatalogError::MissingStage(Stage::Presentation))
    );
}

#[test]
fn from_definitions_accepts_custom_flags() {
    let definitions = Stage::ALL
        .into_iter()
        .enumerate()
        .map(|(index, stage)| {
            StageDefinition::new(stage, u32::try_from(index).unwrap_or(u32::MAX), true)
        })
        .collect::<Vec<_>>();
    let catalog = StageCatalog::from_definitions(definitions).expect("catalog should build");
    let info = catalog
        .info(Stage::Negotiation)
        .expect("catalog is complete");
    assert!(info.lost_reason_required);
}
