// Trajectory Prediction - Look-ahead over many steps without touching live state

use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::body::{BodyId, PhysicsBody, Vector3};
use crate::config::SimulationParams;
use crate::error::Result;
use crate::orchestration::SimulationOrchestrator;

/// Positions after one predicted step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectorySample {
    /// Simulation time at the end of the step (s)
    pub time: f64,
    pub positions: HashMap<BodyId, Vector3>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrajectoryPredictor {
    orchestrator: SimulationOrchestrator,
}

impl TrajectoryPredictor {
    pub fn new(orchestrator: SimulationOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Run `steps` steps of `dt` from `bodies`, one sample per step.
    ///
    /// Any instability aborts the whole prediction, tagged with the failing
    /// step index.
    pub fn predict(
        &self,
        bodies: &[PhysicsBody],
        dt: f64,
        steps: usize,
        params: &SimulationParams,
    ) -> Result<Vec<TrajectorySample>> {
        let mut samples = Vec::with_capacity(steps);
        let mut current = bodies.to_vec();
        let mut time = params.current_time;

        for step in 0..steps {
            let step_params = params.at_time(time);
            let result = self
                .orchestrator
                .execute_simulation_step(&current, dt, &step_params)
                .map_err(|e| {
                    error!("prediction aborted at step {}: {}", step, e);
                    e.at_step(step)
                })?;

            time += dt;
            samples.push(TrajectorySample {
                time,
                positions: result.positions(),
            });
            current = result.bodies;
        }

        debug!("predicted {} steps for {} bodies", samples.len(), bodies.len());
        Ok(samples)
    }
}
