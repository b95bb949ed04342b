// Non-Gravitational Forces - Thrust and quadratic drag
// Summed per body outside the Barnes-Hut pass, applied as an additive acceleration

use log::warn;
use serde::{Deserialize, Serialize};

use crate::body::{unit_or_zero, PhysicsBody, Vector3};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Thrust {
    /// Thrust magnitude (N)
    pub magnitude: f64,
    /// Thrust direction; normalized on use
    pub direction: Vector3,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Drag {
    /// Lumped drag constant k in F = −k·|v|·v (kg/m)
    pub coefficient: f64,
}

/// Per-body external forces supplied by the driver
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ExternalForces {
    #[serde(default)]
    pub thrust: Option<Thrust>,
    #[serde(default)]
    pub drag: Option<Drag>,
}

impl ExternalForces {
    /// Net non-gravitational force on `body` (N)
    pub fn force_on(&self, body: &PhysicsBody) -> Vector3 {
        let mut total = Vector3::zeros();

        if let Some(thrust) = &self.thrust {
            if thrust.active {
                total += unit_or_zero(&thrust.direction) * thrust.magnitude;
            }
        }

        if let Some(drag) = &self.drag {
            let speed = body.velocity.norm();
            total -= body.velocity * (drag.coefficient * speed);
        }

        total
    }

    /// Net non-gravitational acceleration on `body` (m/s²); zero for massless bodies
    pub fn acceleration_on(&self, body: &PhysicsBody) -> Vector3 {
        let force = self.force_on(body);
        if force == Vector3::zeros() {
            return force;
        }
        if body.mass <= 0.0 {
            warn!("external force on body {} with non-positive mass ignored", body.id);
            return Vector3::zeros();
        }
        force / body.mass
    }
}
