mod entry;
pub mod executor;
mod planner;

pub use entry::{
  explanation, format_explanation, DeltaFormat, PreDiffPlanEntry, UncompressionOption,
};
pub use executor::{execute, ExecutionResult};
pub use planner::{build_plan, PreDiffPlan, RecompressionLimiter};
