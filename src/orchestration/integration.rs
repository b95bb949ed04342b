// Integration Manager - Dispatches each engine mode to its integrator and anchors primary stars

use log::warn;
use std::collections::HashMap;

use crate::body::{BodyId, PhysicsBody, Vector3};
use crate::config::{EngineMode, SimulationParams};
use crate::integrators::{Integrator, KeplerPropagator, StandardEuler, SymplecticEuler, VelocityVerlet};

use super::acceleration::AccelerationCalculator;

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegrationManager;

impl IntegrationManager {
    pub fn new() -> Self {
        Self
    }

    /// Advance every body by `dt`. Output is aligned with `bodies`.
    ///
    /// `accelerations` must be aligned with `bodies` for the integrating modes;
    /// `calculator` re-evaluates the field for velocity Verlet.
    pub fn integrate(
        &self,
        bodies: &[PhysicsBody],
        accelerations: &[Vector3],
        dt: f64,
        params: &SimulationParams,
        calculator: &AccelerationCalculator,
    ) -> Vec<PhysicsBody> {
        let advanced = match params.physics_engine {
            EngineMode::Verlet => self.verlet(bodies, accelerations, dt, params, calculator),
            EngineMode::Euler => self.per_body(&StandardEuler, bodies, accelerations, dt),
            EngineMode::Symplectic => self.per_body(&SymplecticEuler, bodies, accelerations, dt),
            EngineMode::Kepler => self.kepler(bodies, dt, params),
        };
        self.pin_primary_stars(bodies, advanced, params)
    }

    fn per_body(
        &self,
        integrator: &dyn Integrator,
        bodies: &[PhysicsBody],
        accelerations: &[Vector3],
        dt: f64,
    ) -> Vec<PhysicsBody> {
        bodies
            .iter()
            .enumerate()
            .map(|(i, body)| {
                let a = accelerations.get(i).copied().unwrap_or_else(Vector3::zeros);
                integrator.integrate(body, &a, dt, None)
            })
            .collect()
    }

    /// Drift every body, rebuild the field over the predicted positions, then kick
    fn verlet(
        &self,
        bodies: &[PhysicsBody],
        accelerations: &[Vector3],
        dt: f64,
        params: &SimulationParams,
        calculator: &AccelerationCalculator,
    ) -> Vec<PhysicsBody> {
        if dt == 0.0 {
            return bodies.to_vec();
        }
        let verlet = VelocityVerlet;
        let zero = Vector3::zeros();
        let acceleration_at = |i: usize| accelerations.get(i).unwrap_or(&zero);

        let predicted: Vec<PhysicsBody> = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| verlet.predict_position(body, acceleration_at(i), dt))
            .collect();
        let predicted = self.pin_primary_stars(bodies, predicted, params);

        let new_accelerations = calculator.n_body(&predicted, params);

        predicted
            .iter()
            .zip(&new_accelerations)
            .enumerate()
            .map(|(i, (body, a_new))| verlet.finish_velocity(body, acceleration_at(i), a_new, dt))
            .collect()
    }

    // =========================================================================
    // KEPLER
    // =========================================================================

    /// Place every body with elements on its orbit at `currentTime + dt`,
    /// resolving parents first so children ride on their parent's new state.
    fn kepler(&self, bodies: &[PhysicsBody], dt: f64, params: &SimulationParams) -> Vec<PhysicsBody> {
        if dt == 0.0 {
            return bodies.to_vec();
        }
        let anchored = self.pin_primary_stars(bodies, bodies.to_vec(), params);
        let index: HashMap<&BodyId, usize> = anchored.iter().enumerate().map(|(i, b)| (&b.id, i)).collect();

        let mut solver = KeplerPass {
            bodies: &anchored,
            index,
            params,
            t: params.current_time + dt,
            resolved: vec![None; anchored.len()],
            visiting: vec![false; anchored.len()],
        };
        (0..anchored.len()).map(|i| solver.resolve(i)).collect()
    }

    /// Hold parentless stars at their starting position with zero velocity
    pub fn pin_primary_stars(
        &self,
        original: &[PhysicsBody],
        mut advanced: Vec<PhysicsBody>,
        params: &SimulationParams,
    ) -> Vec<PhysicsBody> {
        for (before, after) in original.iter().zip(advanced.iter_mut()) {
            if params.is_primary_star(&before.id) {
                *after = before.with_state(before.position, Vector3::zeros());
            }
        }
        advanced
    }
}

/// Memoised parent-first resolution for one Kepler step
struct KeplerPass<'a> {
    bodies: &'a [PhysicsBody],
    index: HashMap<&'a BodyId, usize>,
    params: &'a SimulationParams,
    t: f64,
    resolved: Vec<Option<PhysicsBody>>,
    visiting: Vec<bool>,
}

impl KeplerPass<'_> {
    fn resolve(&mut self, i: usize) -> PhysicsBody {
        if let Some(done) = &self.resolved[i] {
            return done.clone();
        }
        self.visiting[i] = true;

        let (bodies, params) = (self.bodies, self.params);
        let body = &bodies[i];
        let next = match (params.orbital_params_of(&body.id), params.parent_of(&body.id)) {
            (Some(elements), Some(parent_id)) => match self.index.get(parent_id).copied() {
                Some(p) if self.visiting[p] => {
                    warn!("parent cycle through {}, body held in place", body.id);
                    body.clone()
                }
                Some(p) => {
                    let parent = self.resolve(p);
                    let state = KeplerPropagator.propagate(
                        elements,
                        &parent,
                        body.mass,
                        self.t,
                        params.gravitational_constant,
                    );
                    body.with_state(state.position, state.velocity)
                }
                None => {
                    warn!("parent {} of {} not in body set, body held in place", parent_id, body.id);
                    body.clone()
                }
            },
            (Some(_), None) => {
                warn!("{} has orbital elements but no parent, body held in place", body.id);
                body.clone()
            }
            (None, _) => body.clone(),
        };

        self.visiting[i] = false;
        self.resolved[i] = Some(next.clone());
        next
    }
}
