// Error Types - Hard failure signals surfaced by the physics core
// Degenerate inputs and missing lookups are logged and substituted, not returned here

use thiserror::Error;

use crate::body::BodyId;

#[derive(Debug, Error)]
pub enum PhysicsError {
    /// A body left integration with a non-finite position or velocity
    #[error("numerical instability: body {body} became non-finite at step {step}")]
    NumericalInstability { body: BodyId, step: usize },

    #[error("orbit is not bound (eccentricity {eccentricity})")]
    UnboundOrbit { eccentricity: f64 },

    #[error("degenerate state: {0}")]
    DegenerateState(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;

impl PhysicsError {
    /// Re-tag an instability with the step index of a multi-step run
    pub fn at_step(self, step: usize) -> Self {
        match self {
            PhysicsError::NumericalInstability { body, .. } => PhysicsError::NumericalInstability { body, step },
            other => other,
        }
    }

    pub fn is_instability(&self) -> bool {
        matches!(self, PhysicsError::NumericalInstability { .. })
    }
}
