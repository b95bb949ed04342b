// Orchestration - Composes acceleration, integration and collision into one step

pub mod acceleration;
pub mod integration;
pub mod orchestrator;

pub use acceleration::AccelerationCalculator;
pub use integration::IntegrationManager;
pub use orchestrator::{SimulationOrchestrator, SimulationStepResult};
