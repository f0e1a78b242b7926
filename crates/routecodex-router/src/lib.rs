pub mod assembly;
pub mod classify;
pub mod errors;
pub mod runtime;
pub mod stats;
pub mod virtual_router;

pub use assembly::{assemble_pipelines, Pipeline};
pub use classify::{classify, estimate_tokens, ClassificationRule};
pub use errors::RouterError;
pub use runtime::{execute, ExecutionOutcome, RequestContext};
pub use stats::{PipelineStats, PipelineStatsSnapshot};
pub use virtual_router::{PipelineState, RouterState};
