pub mod orchestrator;
pub mod path;
pub mod progress;
