// Physics Engine Service - Thread-safe simulation state around the step orchestrator
// Pull via execute_step, or push via a stream driven by tick and parameter channels

use chrono::{DateTime, Utc};
use log::{error, info};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::body::PhysicsBody;
use crate::config::SimulationParams;
use crate::energy::{energy_drift, total_energy};
use crate::error::Result;
use crate::orchestration::{SimulationOrchestrator, SimulationStepResult};

// =============================================================================
// SHARED STATE
// =============================================================================

#[derive(Debug, Clone, Default)]
struct ServiceState {
    initial_bodies: Vec<PhysicsBody>,
    /// Front buffer: the latest states
    bodies: Vec<PhysicsBody>,
    /// Back buffer: states before the latest step
    previous_bodies: Vec<PhysicsBody>,
    last_result: Option<SimulationStepResult>,
    simulation_time: f64,
    step_count: usize,
    initial_energy: f64,
    total_energy: f64,
    last_step_at: Option<DateTime<Utc>>,
}

impl ServiceState {
    fn new(bodies: Vec<PhysicsBody>) -> Self {
        Self {
            initial_bodies: bodies.clone(),
            bodies,
            ..Default::default()
        }
    }
}

/// Serializable view of the service for consumers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSnapshot {
    pub bodies: Vec<PhysicsBody>,
    pub simulation_time: f64,
    pub step_count: usize,
    pub total_energy: f64,
    pub energy_drift: f64,
    pub last_step_at: Option<DateTime<Utc>>,
}

/// One pushed step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFrame {
    pub step: usize,
    /// Simulation time after the step (s)
    pub time: f64,
    pub result: SimulationStepResult,
}

// =============================================================================
// SERVICE
// =============================================================================

#[derive(Clone)]
pub struct PhysicsEngineService {
    state: Arc<RwLock<ServiceState>>,
    orchestrator: SimulationOrchestrator,
}

impl PhysicsEngineService {
    pub fn new(bodies: Vec<PhysicsBody>, orchestrator: SimulationOrchestrator) -> Self {
        Self {
            state: Arc::new(RwLock::new(ServiceState::new(bodies))),
            orchestrator,
        }
    }

    pub fn bodies(&self) -> Vec<PhysicsBody> {
        self.state.read().bodies.clone()
    }

    pub fn previous_bodies(&self) -> Vec<PhysicsBody> {
        self.state.read().previous_bodies.clone()
    }

    pub fn last_result(&self) -> Option<SimulationStepResult> {
        self.state.read().last_result.clone()
    }

    pub fn simulation_time(&self) -> f64 {
        self.state.read().simulation_time
    }

    pub fn step_count(&self) -> usize {
        self.state.read().step_count
    }

    /// Run one step from the held state at the service clock.
    ///
    /// On failure the held state is left untouched.
    pub fn execute_step(&self, dt: f64, params: &SimulationParams) -> Result<SimulationStepResult> {
        self.execute_frame(dt, params).map(|frame| frame.result)
    }

    /// Like `execute_step`, with the step index and clock read under the same
    /// write lock as the step itself.
    pub fn execute_frame(&self, dt: f64, params: &SimulationParams) -> Result<StepFrame> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let step_params = params.at_time(state.simulation_time);
        let g = step_params.gravitational_constant;

        if state.step_count == 0 {
            state.initial_energy = total_energy(&state.bodies, g);
        }

        let result = self
            .orchestrator
            .execute_simulation_step(&state.bodies, dt, &step_params)
            .map_err(|e| e.at_step(state.step_count))?;

        for event in &result.events {
            info!(
                "step {}: destruction of {:?} (survivor {:?})",
                state.step_count, event.destroyed, event.survivor
            );
        }

        // old front becomes the back buffer; the old back allocation holds the new front
        std::mem::swap(&mut state.bodies, &mut state.previous_bodies);
        state.bodies.clear();
        state.bodies.extend_from_slice(&result.bodies);

        state.total_energy = total_energy(&state.bodies, g);
        state.simulation_time += dt;
        state.step_count += 1;
        state.last_result = Some(result.clone());
        state.last_step_at = Some(Utc::now());

        Ok(StepFrame {
            step: state.step_count,
            time: state.simulation_time,
            result,
        })
    }

    /// Restore the initial bodies and clear the clock and history
    pub fn reset(&self) {
        let mut state = self.state.write();
        let initial = std::mem::take(&mut state.initial_bodies);
        *state = ServiceState::new(initial);
        info!("simulation reset ({} bodies)", state.bodies.len());
    }

    pub fn snapshot(&self) -> ServiceSnapshot {
        let state = self.state.read();
        ServiceSnapshot {
            bodies: state.bodies.clone(),
            simulation_time: state.simulation_time,
            step_count: state.step_count,
            total_energy: state.total_energy,
            energy_drift: energy_drift(state.initial_energy, state.total_energy),
            last_step_at: state.last_step_at,
        }
    }

    /// Step once per `dt` received on `ticks`, using the latest `params`.
    ///
    /// Frames stop when the tick source closes, the frame receiver is dropped,
    /// or a step becomes unstable.
    pub fn spawn_stream(
        &self,
        mut ticks: mpsc::Receiver<f64>,
        params: watch::Receiver<SimulationParams>,
    ) -> (mpsc::Receiver<StepFrame>, JoinHandle<()>) {
        let service = self.clone();
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            info!("step stream started");
            while let Some(dt) = ticks.recv().await {
                let current = params.borrow().clone();
                let stepper = service.clone();
                let outcome = tokio::task::spawn_blocking(move || stepper.execute_frame(dt, &current)).await;
                match outcome {
                    Ok(Ok(frame)) => {
                        if tx.send(frame).await.is_err() {
                            break;
                        }
                    }
                    Ok(Err(e)) => {
                        error!("step stream stopped: {}", e);
                        break;
                    }
                    Err(e) => {
                        error!("step task failed: {}", e);
                        break;
                    }
                }
            }
            info!("step stream finished");
        });

        (rx, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyId, Vector3};
    use crate::config::EngineMode;

    fn drifting() -> Vec<PhysicsBody> {
        vec![PhysicsBody::new("probe", 1.0, Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0))]
    }

    fn params() -> SimulationParams {
        SimulationParams {
            physics_engine: EngineMode::Symplectic,
            ..Default::default()
        }
    }

    #[test]
    fn test_execute_step_updates_state() {
        let service = PhysicsEngineService::new(drifting(), SimulationOrchestrator::default());
        service.execute_step(2.0, &params()).unwrap();
        service.execute_step(2.0, &params()).unwrap();

        assert_eq!(service.step_count(), 2);
        assert_eq!(service.simulation_time(), 4.0);
        assert_eq!(service.bodies()[0].position.x, 4.0);
        assert_eq!(service.previous_bodies()[0].position.x, 2.0);
        assert!(service.last_result().is_some());

        let snapshot = service.snapshot();
        assert!(snapshot.last_step_at.is_some());
        assert_eq!(snapshot.energy_drift, 0.0);
    }

    #[test]
    fn test_failed_step_leaves_state() {
        let service = PhysicsEngineService::new(drifting(), SimulationOrchestrator::default());
        service.execute_step(1.0, &params()).unwrap();
        let before = service.bodies();
        assert!(service.execute_step(f64::NAN, &params()).is_err());
        assert_eq!(service.bodies(), before);
        assert_eq!(service.step_count(), 1);
    }

    #[test]
    fn test_reset_restores_initial_bodies() {
        let service = PhysicsEngineService::new(drifting(), SimulationOrchestrator::default());
        service.execute_step(1.0, &params()).unwrap();
        service.reset();
        assert_eq!(service.bodies(), drifting());
        assert_eq!(service.step_count(), 0);
        assert_eq!(service.simulation_time(), 0.0);
        assert!(service.last_result().is_none());
        // reset twice keeps the initial set
        service.reset();
        assert_eq!(service.bodies(), drifting());
    }

    #[test]
    fn test_buffers_trade_places_each_step() {
        let service = PhysicsEngineService::new(drifting(), SimulationOrchestrator::default());
        let frame = service.execute_frame(1.0, &params()).unwrap();
        assert_eq!(frame.step, 1);
        assert_eq!(frame.time, 1.0);
        assert_eq!(service.previous_bodies(), drifting());
        let second = service.execute_frame(1.0, &params()).unwrap();
        assert_eq!(service.previous_bodies(), frame.result.bodies);
        assert_eq!(service.bodies(), second.result.bodies);
    }

    #[tokio::test]
    async fn test_frames_agree_with_concurrent_steps() {
        let service = PhysicsEngineService::new(drifting(), SimulationOrchestrator::default());
        let other = service.clone();
        let (tick_tx, tick_rx) = mpsc::channel(64);
        let (_params_tx, params_rx) = watch::channel(params());
        let (mut frames, handle) = service.spawn_stream(tick_rx, params_rx);

        let worker = std::thread::spawn(move || {
            for _ in 0..50 {
                other.execute_step(1.0, &params()).unwrap();
            }
        });
        for _ in 0..50 {
            tick_tx.send(1.0).await.unwrap();
        }
        drop(tick_tx);

        let mut count = 0;
        while let Some(frame) = frames.recv().await {
            // drifting at 1 m/s, position equals the clock
            assert_eq!(frame.time, frame.step as f64);
            assert_eq!(frame.result.bodies[0].position.x, frame.time);
            count += 1;
        }
        handle.await.unwrap();
        worker.join().unwrap();
        assert_eq!(count, 50);
        assert_eq!(service.step_count(), 100);
    }

    #[tokio::test]
    async fn test_stream_pushes_one_frame_per_tick() {
        let service = PhysicsEngineService::new(drifting(), SimulationOrchestrator::default());
        let (tick_tx, tick_rx) = mpsc::channel(8);
        let (params_tx, params_rx) = watch::channel(params());
        let (mut frames, handle) = service.spawn_stream(tick_rx, params_rx);

        tick_tx.send(1.0).await.unwrap();
        let first = frames.recv().await.unwrap();
        assert_eq!(first.step, 1);
        assert_eq!(first.result.bodies[0].position.x, 1.0);

        // parameter changes apply to the next tick
        let mut changed = params();
        changed.external_forces.insert(
            BodyId::from("probe"),
            crate::forces::ExternalForces {
                thrust: Some(crate::forces::Thrust {
                    magnitude: 1.0,
                    direction: Vector3::new(1.0, 0.0, 0.0),
                    active: true,
                }),
                drag: None,
            },
        );
        params_tx.send(changed).unwrap();
        tick_tx.send(1.0).await.unwrap();
        let second = frames.recv().await.unwrap();
        assert_eq!(second.time, 2.0);
        assert_eq!(second.result.bodies[0].velocity.x, 2.0);

        drop(tick_tx);
        handle.await.unwrap();
        assert!(frames.recv().await.is_none());
    }
}
