//! Application services for the opportunity pipeline.

mod pipeline;

pub use pipeline::{
    CreateOpportunityRequest, OpportunityPipeline, PipelineServiceError, PipelineServiceResult,
    TransitionRequest,
};
