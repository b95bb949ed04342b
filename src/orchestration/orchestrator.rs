// Simulation Orchestrator - accelerate -> integrate -> collide, one deterministic step

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::body::{BodyId, PhysicsBody, Vector3};
use crate::collision::{handle_collisions, DestructionEvent};
use crate::config::SimulationParams;
use crate::error::{PhysicsError, Result};

use super::acceleration::AccelerationCalculator;
use super::integration::IntegrationManager;

/// Everything one step produced; owned by the caller until the next step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationStepResult {
    /// Final states, destroyed bodies removed, input order otherwise kept
    pub bodies: Vec<PhysicsBody>,
    /// Acceleration used this step; empty in Kepler mode
    pub accelerations: HashMap<BodyId, Vector3>,
    pub destroyed_ids: BTreeSet<BodyId>,
    pub events: Vec<DestructionEvent>,
}

impl SimulationStepResult {
    pub fn positions(&self) -> HashMap<BodyId, Vector3> {
        self.bodies.iter().map(|b| (b.id.clone(), b.position)).collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationOrchestrator {
    accelerations: AccelerationCalculator,
    integration: IntegrationManager,
}

impl SimulationOrchestrator {
    pub fn new(accelerations: AccelerationCalculator, integration: IntegrationManager) -> Self {
        Self {
            accelerations,
            integration,
        }
    }

    /// Advance `bodies` by `dt` under `params`.
    ///
    /// Fails only when integration leaves a body with a non-finite state;
    /// the error carries step index 0 for the caller to re-tag.
    pub fn execute_simulation_step(
        &self,
        bodies: &[PhysicsBody],
        dt: f64,
        params: &SimulationParams,
    ) -> Result<SimulationStepResult> {
        let accelerations = self.accelerations.calculate(bodies, params);
        let integrated = self
            .integration
            .integrate(bodies, &accelerations, dt, params, &self.accelerations);

        if let Some(bad) = integrated.iter().find(|b| !b.is_finite()) {
            return Err(PhysicsError::NumericalInstability {
                body: bad.id.clone(),
                step: 0,
            });
        }

        let outcome = handle_collisions(&integrated, params);
        debug!(
            "step dt={} mode={}: {} bodies, {} destroyed",
            dt,
            params.physics_engine,
            outcome.bodies.len(),
            outcome.destroyed_ids.len()
        );

        let accelerations = bodies.iter().map(|b| b.id.clone()).zip(accelerations).collect();

        Ok(SimulationStepResult {
            bodies: outcome.bodies,
            accelerations,
            destroyed_ids: outcome.destroyed_ids,
            events: outcome.events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyType;
    use crate::config::EngineMode;

    fn params() -> SimulationParams {
        SimulationParams {
            gravitational_constant: 1.0,
            softening_length: 0.0,
            octree_size: 1000.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_step_is_deterministic() {
        let bodies = vec![
            PhysicsBody::new(1u64, 10.0, Vector3::new(-5.0, 0.0, 0.0), Vector3::new(0.0, -1.0, 0.0)),
            PhysicsBody::new(2u64, 10.0, Vector3::new(5.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0)),
            PhysicsBody::new(3u64, 0.1, Vector3::new(0.0, 40.0, 0.0), Vector3::new(0.3, 0.0, 0.0)),
        ];
        let orchestrator = SimulationOrchestrator::default();
        let a = orchestrator.execute_simulation_step(&bodies, 0.1, &params()).unwrap();
        let b = orchestrator.execute_simulation_step(&bodies, 0.1, &params()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.accelerations.len(), 3);
        assert_eq!(bodies[0].position.x, -5.0);
    }

    #[test]
    fn test_kepler_step_reports_no_accelerations() {
        let bodies = vec![PhysicsBody::new(1u64, 1.0, Vector3::zeros(), Vector3::zeros())];
        let p = SimulationParams {
            physics_engine: EngineMode::Kepler,
            ..params()
        };
        let result = SimulationOrchestrator::default()
            .execute_simulation_step(&bodies, 1.0, &p)
            .unwrap();
        assert!(result.accelerations.is_empty());
        assert_eq!(result.bodies, bodies);
    }

    #[test]
    fn test_collisions_run_on_integrated_states() {
        // 1 moves into 2 during the step
        let bodies = vec![
            PhysicsBody::new(1u64, 1.0, Vector3::new(0.0, 0.0, 0.0), Vector3::new(10.0, 0.0, 0.0)),
            PhysicsBody::new(2u64, 1.0, Vector3::new(3.0, 0.0, 0.0), Vector3::zeros()),
        ];
        let mut p = SimulationParams {
            physics_engine: EngineMode::Euler,
            ..params()
        };
        for id in [1u64, 2] {
            p.radii.insert(BodyId::Index(id), 0.5);
            p.body_types.insert(BodyId::Index(id), BodyType::Moon);
        }
        let result = SimulationOrchestrator::default()
            .execute_simulation_step(&bodies, 0.3, &p)
            .unwrap();
        assert!(result.bodies.is_empty());
        assert_eq!(result.destroyed_ids.len(), 2);
        assert_eq!(result.events.len(), 1);
    }

    #[test]
    fn test_non_finite_state_is_an_instability() {
        let bodies = vec![PhysicsBody::new(9u64, 1.0, Vector3::zeros(), Vector3::new(f64::INFINITY, 0.0, 0.0))];
        let p = SimulationParams {
            physics_engine: EngineMode::Euler,
            ..params()
        };
        let err = SimulationOrchestrator::default()
            .execute_simulation_step(&bodies, 1.0, &p)
            .unwrap_err();
        assert!(err.is_instability());
        assert!(matches!(
            err.at_step(4),
            PhysicsError::NumericalInstability { step: 4, .. }
        ));
    }
}
