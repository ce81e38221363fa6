//! Stage catalog: ordered stage definitions and their validation flags.

use super::{PipelineDomainError, Stage, StageCatalogError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Validation flags and ordering for one pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageInfo {
    /// Position of the stage in the pipeline, for presentation ordering.
    pub order: u32,
    /// Whether leaving this stage for `Lost` requires a reason note.
    pub lost_reason_required: bool,
}

/// One configurable catalog entry, as loaded from deployment configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Stage being defined.
    pub stage: Stage,
    /// Position of the stage in the pipeline.
    pub order: u32,
    /// Whether leaving this stage for `Lost` requires a reason note.
    pub lost_reason_required: bool,
}

impl StageDefinition {
    /// Creates a catalog entry.
    #[must_use]
    pub const fn new(stage: Stage, order: u32, lost_reason_required: bool) -> Self {
        Self {
            stage,
            order,
            lost_reason_required,
        }
    }
}

/// Read-only lookup of stage metadata used by transition validation.
///
/// A catalog must define every [`Stage`] exactly once; completeness is
/// enforced at construction so lookups on enum values cannot fail for a
/// well-formed catalog. Name-based lookup still reports unknown names as
/// [`PipelineDomainError::UnknownStage`], which callers must treat as a
/// configuration error rather than user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCatalog {
    stages: BTreeMap<Stage, StageInfo>,
}

impl StageCatalog {
    /// Returns the standard catalog.
    ///
    /// Late stages (`Proposal`, `Trial`, `TrialExpiring`) require a reason
    /// note when the opportunity moves to `Lost`; early stages do not.
    #[must_use]
    pub fn standard() -> Self {
        let definitions = [
            StageDefinition::new(Stage::Negotiation, 0, false),
            StageDefinition::new(Stage::Presentation, 1, false),
            StageDefinition::new(Stage::Proposal, 2, true),
            StageDefinition::new(Stage::Trial, 3, true),
            StageDefinition::new(Stage::TrialExpiring, 4, true),
            StageDefinition::new(Stage::Won, 5, false),
            StageDefinition::new(Stage::Lost, 6, false),
        ];
        let stages = definitions
            .into_iter()
            .map(|def| {
                (
                    def.stage,
                    StageInfo {
                        order: def.order,
                        lost_reason_required: def.lost_reason_required,
                    },
                )
            })
            .collect();
        Self { stages }
    }

    /// Builds a catalog from deployment-supplied definitions.
    ///
    /// # Errors
    ///
    /// Returns [`StageCatalogError::DuplicateStage`] when a stage appears
    /// twice and [`StageCatalogError::MissingStage`] when any pipeline
    /// stage has no definition.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = StageDefinition>,
    ) -> Result<Self, StageCatalogError> {
        let mut stages = BTreeMap::new();
        for def in definitions {
            let info = StageInfo {
                order: def.order,
                lost_reason_required: def.lost_reason_required,
            };
            if stages.insert(def.stage, info).is_some() {
                return Err(StageCatalogError::DuplicateStage(def.stage));
            }
        }
        for stage in Stage::ALL {
            if !stages.contains_key(&stage) {
                return Err(StageCatalogError::MissingStage(stage));
            }
        }
        Ok(Self { stages })
    }

    /// Looks up stage metadata by enum value.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::UnknownStage`] when the catalog has
    /// no entry for the stage. Construction guarantees completeness, so
    /// this only fires for a catalog built through future unchecked paths.
    pub fn info(&self, stage: Stage) -> Result<StageInfo, PipelineDomainError> {
        self.stages
            .get(&stage)
            .copied()
            .ok_or_else(|| PipelineDomainError::UnknownStage(stage.as_str().to_owned()))
    }

    /// Looks up stage metadata by raw stage name.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::UnknownStage`] when the name does not
    /// parse to a pipeline stage.
    pub fn stage_of(&self, name: &str) -> Result<StageInfo, PipelineDomainError> {
        let stage = Stage::try_from(name)
            .map_err(|err| PipelineDomainError::UnknownStage(err.0))?;
        self.info(stage)
    }
}

impl Default for StageCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
