//! Processing Pipeline Module
//!
//! ```text
//! STAGE 1: Telemetry + threshold screening (every cycle)
//! STAGE 2: Outlier confirmation (every cycle)
//! STAGE 3: Diagnosis (ONLY if confirmed)
//! STAGE 4: Resolution (ONLY if confirmed)
//! ```
//!
//! One orchestrator owns one blackboard and one history. Running several
//! aircraft means building several orchestrators.

mod blackboard;
mod coordinator;
mod state;

pub use blackboard::Blackboard;
pub use coordinator::PipelineOrchestrator;
pub use state::CycleState;
