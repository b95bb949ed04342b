// Acceleration Calculator - Per-body acceleration for the configured engine mode

use log::{debug, warn};

use crate::body::{PhysicsBody, Vector3};
use crate::config::{EngineMode, SimulationParams};
use crate::forces::{correction_acceleration, gravitational_force, ForceOrder};
use crate::octree::Octree;

/// Stateless; a fresh octree is built for every evaluation
#[derive(Debug, Clone, Copy, Default)]
pub struct AccelerationCalculator;

impl AccelerationCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Accelerations aligned with `bodies`; empty in Kepler mode, which
    /// needs none.
    pub fn calculate(&self, bodies: &[PhysicsBody], params: &SimulationParams) -> Vec<Vector3> {
        match params.physics_engine {
            EngineMode::Verlet => self.n_body(bodies, params),
            EngineMode::Euler | EngineMode::Symplectic => self.simplified(bodies, params),
            EngineMode::Kepler => Vec::new(),
        }
    }

    // =========================================================================
    // N-BODY (BARNES-HUT)
    // =========================================================================

    pub fn build_octree(&self, bodies: &[PhysicsBody], params: &SimulationParams) -> Octree {
        let tree = Octree::from_bodies(params.octree_config(), bodies);
        debug!(
            "octree built: {} bodies, {} nodes, depth {}",
            tree.len(),
            tree.node_count(),
            tree.depth()
        );
        tree
    }

    /// Full-field accelerations: Barnes-Hut Newtonian gravity, then pairwise
    /// relativistic corrections, then external forces
    pub fn n_body(&self, bodies: &[PhysicsBody], params: &SimulationParams) -> Vec<Vector3> {
        let tree = self.build_octree(bodies, params);
        bodies
            .iter()
            .map(|body| {
                let mut acceleration = tree.calculate_acceleration_on(body, params.barnes_hut_theta);
                acceleration += self.corrections(body, bodies, params);
                acceleration + self.external(body, params)
            })
            .collect()
    }

    fn corrections(&self, body: &PhysicsBody, bodies: &[PhysicsBody], params: &SimulationParams) -> Vector3 {
        if params.gravity_model == ForceOrder::Newtonian {
            return Vector3::zeros();
        }
        bodies
            .iter()
            .filter(|other| other.id != body.id)
            .fold(Vector3::zeros(), |acc, other| {
                acc + correction_acceleration(
                    params.gravity_model,
                    body,
                    other,
                    params.gravitational_constant,
                    params.speed_of_light,
                )
            })
    }

    // =========================================================================
    // SIMPLIFIED (SINGLE ATTRACTOR)
    // =========================================================================

    /// Most massive parentless star, the default attractor
    pub fn central_star<'a>(&self, bodies: &'a [PhysicsBody], params: &SimulationParams) -> Option<&'a PhysicsBody> {
        bodies
            .iter()
            .filter(|b| params.is_primary_star(&b.id))
            .max_by(|a, b| a.mass.total_cmp(&b.mass))
    }

    /// The explicit parent, or the central star for parentless bodies.
    ///
    /// A parent that is not in the body set cannot be resolved, so the body
    /// gets no attractor.
    pub fn attractor_for<'a>(
        &self,
        body: &PhysicsBody,
        bodies: &'a [PhysicsBody],
        params: &SimulationParams,
    ) -> Option<&'a PhysicsBody> {
        match params.parent_of(&body.id) {
            Some(parent_id) => {
                let parent = bodies.iter().find(|b| &b.id == parent_id);
                if parent.is_none() {
                    warn!("parent {} of {} not in body set, no gravity applied", parent_id, body.id);
                }
                parent
            }
            None => self.central_star(bodies, params),
        }
    }

    pub fn simplified(&self, bodies: &[PhysicsBody], params: &SimulationParams) -> Vec<Vector3> {
        let central = self.central_star(bodies, params);
        if central.is_none() {
            debug!("no central star; unparented bodies feel no gravity");
        }

        bodies
            .iter()
            .map(|body| {
                let gravity = match self.attractor_for(body, bodies, params) {
                    Some(attractor) if attractor.id != body.id => {
                        self.single_attractor_gravity(body, attractor, params)
                    }
                    _ => Vector3::zeros(),
                };
                gravity + self.external(body, params)
            })
            .collect()
    }

    fn single_attractor_gravity(&self, body: &PhysicsBody, attractor: &PhysicsBody, params: &SimulationParams) -> Vector3 {
        // unit-mass stand-in keeps massless bodies well defined
        let probe_mass = if body.mass > 0.0 { body.mass } else { 1.0 };
        let probe = PhysicsBody {
            mass: probe_mass,
            ..body.clone()
        };
        let force = gravitational_force(
            params.gravity_model,
            &probe,
            attractor,
            params.gravitational_constant,
            params.speed_of_light,
        );
        force / probe_mass
    }

    fn external(&self, body: &PhysicsBody, params: &SimulationParams) -> Vector3 {
        params
            .external_forces_of(&body.id)
            .map(|forces| forces.acceleration_on(body))
            .unwrap_or_else(Vector3::zeros)
    }
}
