// Simulation Parameters - Driver-supplied configuration bundle for one step
// Lookup tables keyed by body id plus numeric tuning knobs; every field is optional in JSON

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::body::{BodyId, BodyType, OrbitalParameters, Vector3};
use crate::constants::{
    C, DEFAULT_BARNES_HUT_THETA, DEFAULT_MASS_RATIO_THRESHOLD, DEFAULT_OCTREE_MAX_DEPTH,
    DEFAULT_OCTREE_MIN_CELL_SIZE, DEFAULT_OCTREE_SIZE, DEFAULT_RESTITUTION, DEFAULT_SOFTENING_LENGTH, G,
};
use crate::error::{PhysicsError, Result};
use crate::forces::{ExternalForces, ForceOrder};
use crate::octree::OctreeConfig;

// =============================================================================
// ENGINE MODE
// =============================================================================

/// Acceleration + integration strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum EngineMode {
    /// Barnes-Hut N-body gravity, velocity Verlet
    #[default]
    Verlet,
    /// Single attractor, standard Euler
    Euler,
    /// Single attractor, symplectic Euler
    Symplectic,
    /// Analytic Kepler propagation from orbital elements
    Kepler,
}

impl EngineMode {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineMode::Verlet => "verlet",
            EngineMode::Euler => "euler",
            EngineMode::Symplectic => "symplectic",
            EngineMode::Kepler => "kepler",
        }
    }

    /// Modes that take gravity from one attractor instead of the whole field
    pub fn is_simplified(self) -> bool {
        matches!(self, EngineMode::Euler | EngineMode::Symplectic)
    }
}

impl fmt::Display for EngineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "verlet" => Ok(EngineMode::Verlet),
            "euler" => Ok(EngineMode::Euler),
            "symplectic" => Ok(EngineMode::Symplectic),
            "kepler" => Ok(EngineMode::Kepler),
            other => Err(format!("unknown physics engine: {}", other)),
        }
    }
}

impl From<String> for EngineMode {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            warn!("unknown physics engine '{}', falling back to verlet", value);
            EngineMode::Verlet
        })
    }
}

// =============================================================================
// COLLISION POLICY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CollisionPolicy {
    /// General-case pairs with min/max mass below this merge instead of bouncing
    pub mass_ratio_threshold: f64,
    /// Coefficient of restitution for elastic bounces
    pub restitution: f64,
}

impl Default for CollisionPolicy {
    fn default() -> Self {
        Self {
            mass_ratio_threshold: DEFAULT_MASS_RATIO_THRESHOLD,
            restitution: DEFAULT_RESTITUTION,
        }
    }
}

// =============================================================================
// PARAMETER BUNDLE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationParams {
    /// Collision radius per body (m)
    pub radii: HashMap<BodyId, f64>,
    pub is_star: HashMap<BodyId, bool>,
    pub body_types: HashMap<BodyId, BodyType>,
    /// Parent (attractor) per body; null or absent means no parent
    pub parent_ids: HashMap<BodyId, Option<BodyId>>,

    /// Root cube width (m)
    pub octree_size: f64,
    pub octree_max_depth: usize,
    pub octree_min_cell_size: f64,
    /// Softening length (m)
    pub softening_length: f64,
    /// Barnes-Hut opening angle
    pub barnes_hut_theta: f64,

    pub physics_engine: EngineMode,
    pub gravity_model: ForceOrder,

    /// Elements for bodies driven by the analytic propagator
    pub orbital_params: HashMap<BodyId, OrbitalParameters>,
    /// Simulation time at the start of this step (s)
    pub current_time: f64,

    pub external_forces: HashMap<BodyId, ExternalForces>,
    pub collision_policy: CollisionPolicy,

    /// G (m³/(kg·s²))
    pub gravitational_constant: f64,
    /// c (m/s)
    pub speed_of_light: f64,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            radii: HashMap::new(),
            is_star: HashMap::new(),
            body_types: HashMap::new(),
            parent_ids: HashMap::new(),
            octree_size: DEFAULT_OCTREE_SIZE,
            octree_max_depth: DEFAULT_OCTREE_MAX_DEPTH,
            octree_min_cell_size: DEFAULT_OCTREE_MIN_CELL_SIZE,
            softening_length: DEFAULT_SOFTENING_LENGTH,
            barnes_hut_theta: DEFAULT_BARNES_HUT_THETA,
            physics_engine: EngineMode::default(),
            gravity_model: ForceOrder::default(),
            orbital_params: HashMap::new(),
            current_time: 0.0,
            external_forces: HashMap::new(),
            collision_policy: CollisionPolicy::default(),
            gravitational_constant: G,
            speed_of_light: C,
        }
    }
}

impl SimulationParams {
    /// Parse and validate a JSON parameter bundle
    pub fn from_json(json: &str) -> Result<Self> {
        let params: SimulationParams = serde_json::from_str(json)?;
        params.validate()?;
        for (id, kind) in &params.body_types {
            if *kind == BodyType::Other {
                warn!("unrecognised body type for {}, colliding by mass ratio", id);
            }
        }
        Ok(params)
    }

    /// Reject knobs that would make the octree or force laws meaningless
    pub fn validate(&self) -> Result<()> {
        if !(self.octree_size.is_finite() && self.octree_size > 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "octreeSize must be positive, got {}",
                self.octree_size
            )));
        }
        if !(self.barnes_hut_theta.is_finite() && self.barnes_hut_theta >= 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "barnesHutTheta must be non-negative, got {}",
                self.barnes_hut_theta
            )));
        }
        if !(self.softening_length.is_finite() && self.softening_length >= 0.0) {
            return Err(PhysicsError::InvalidConfig(format!(
                "softeningLength must be non-negative, got {}",
                self.softening_length
            )));
        }
        if !(self.speed_of_light.is_finite() && self.speed_of_light > 0.0) {
            return Err(PhysicsError::InvalidConfig("speedOfLight must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.collision_policy.restitution) {
            return Err(PhysicsError::InvalidConfig(format!(
                "restitution must lie in [0, 1], got {}",
                self.collision_policy.restitution
            )));
        }
        Ok(())
    }

    /// Same bundle with the clock moved to `time`
    pub fn at_time(&self, time: f64) -> Self {
        Self {
            current_time: time,
            ..self.clone()
        }
    }

    pub fn octree_config(&self) -> OctreeConfig {
        OctreeConfig {
            center: Vector3::zeros(),
            size: self.octree_size,
            max_depth: self.octree_max_depth,
            min_cell_size: self.octree_min_cell_size,
            softening_length: self.softening_length,
            g: self.gravitational_constant,
        }
    }

    // =========================================================================
    // LOOKUPS
    // =========================================================================

    pub fn radius_of(&self, id: &BodyId) -> Option<f64> {
        self.radii.get(id).copied()
    }

    /// Explicitly flagged star, or typed as one
    pub fn is_star(&self, id: &BodyId) -> bool {
        self.is_star.get(id).copied().unwrap_or(false) || self.body_types.get(id) == Some(&BodyType::Star)
    }

    /// Category used for collision dispatch; an unflagged, untyped body has none
    pub fn body_type_of(&self, id: &BodyId) -> Option<BodyType> {
        match self.body_types.get(id) {
            Some(t) => Some(*t),
            None if self.is_star.get(id).copied().unwrap_or(false) => Some(BodyType::Star),
            None => None,
        }
    }

    pub fn parent_of(&self, id: &BodyId) -> Option<&BodyId> {
        self.parent_ids.get(id).and_then(|p| p.as_ref())
    }

    /// A star with no parent anchors the reference frame
    pub fn is_primary_star(&self, id: &BodyId) -> bool {
        self.is_star(id) && self.parent_of(id).is_none()
    }

    pub fn orbital_params_of(&self, id: &BodyId) -> Option<&OrbitalParameters> {
        self.orbital_params.get(id)
    }

    pub fn external_forces_of(&self, id: &BodyId) -> Option<&ExternalForces> {
        self.external_forces.get(id)
    }
}
