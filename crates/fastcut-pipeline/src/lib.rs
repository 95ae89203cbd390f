//! Pipeline orchestration: configuration, bounded work dispatch, the run
//! orchestrator and reporting.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod orchestrator;
pub mod reporter;
pub mod system;

pub use config::PipelineConfig;
pub use dispatcher::WorkDispatcher;
pub use error::{PipelineError, PipelineResult};
pub use orchestrator::Orchestrator;
