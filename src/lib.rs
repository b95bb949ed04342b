// Celestial Engine - Deterministic N-Body Physics Core
// Barnes-Hut gravity, post-Newtonian corrections, type-aware collisions

pub mod body;
pub mod collision;
pub mod config;
pub mod constants;
pub mod driver;
pub mod energy;
pub mod error;
pub mod forces;
pub mod integrators;
pub mod octree;
pub mod orbital;
pub mod orchestration;
pub mod prediction;
pub mod service;

pub use body::{BodyId, BodyType, OrbitalParameters, PhysicsBody, StateVector, Vector3};
pub use collision::{detect_sphere_collision, handle_collisions, CollisionRecord, DestructionEvent};
pub use config::{CollisionPolicy, EngineMode, SimulationParams};
pub use driver::{spawn_tick_source, FixedTimestep};
pub use error::{PhysicsError, Result};
pub use forces::ForceOrder;
pub use octree::{Octree, OctreeConfig};
pub use orchestration::{AccelerationCalculator, IntegrationManager, SimulationOrchestrator, SimulationStepResult};
pub use prediction::{TrajectoryPredictor, TrajectorySample};
pub use service::{PhysicsEngineService, ServiceSnapshot, StepFrame};
