pub mod context;
pub mod error;
pub mod orchestrator;

pub use context::{ContextAssembler, SYNTH_PERSONA};
pub use error::ChatError;
pub use orchestrator::{ChatOrchestrator, TurnOutcome, TurnRequest, TurnSettings};
