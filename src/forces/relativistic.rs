// Simplified Relativistic Gravity - Lorentz-scaled masses with gravitational time dilation

use log::warn;

use crate::body::{PhysicsBody, Vector3};
use crate::constants::MIN_SEPARATION;

use super::PairwiseForce;

#[derive(Debug, Clone, Copy)]
pub struct SimplifiedRelativistic {
    /// Speed of light (m/s)
    pub c: f64,
}

impl PairwiseForce for SimplifiedRelativistic {
    fn force(&self, body1: &PhysicsBody, body2: &PhysicsBody, g: f64) -> Vector3 {
        relativistic_force(body1, body2, g, self.c)
    }

    fn name(&self) -> &'static str {
        "simplified_relativistic"
    }
}

/// Lorentz factor γ = 1/√(1 − v²/c²); non-finite for v ≥ c
pub fn lorentz_factor(velocity: &Vector3, c: f64) -> f64 {
    let beta2 = velocity.norm_squared() / (c * c);
    1.0 / (1.0 - beta2).sqrt()
}

/// Schwarzschild radius rs = 2GM/c² (m)
pub fn schwarzschild_radius(mass: f64, g: f64, c: f64) -> f64 {
    2.0 * g * mass / (c * c)
}

/// Force on `body1`: G·(γ1·m1)(γ2·m2)/r² divided by √(1 − rs/r), rs from body1's mass.
///
/// Returns zero for superluminal bodies and for separations inside rs.
pub fn relativistic_force(body1: &PhysicsBody, body2: &PhysicsBody, g: f64, c: f64) -> Vector3 {
    let r_vec = body2.position - body1.position;
    let r = r_vec.norm();

    if r < MIN_SEPARATION {
        return Vector3::zeros();
    }

    let gamma1 = lorentz_factor(&body1.velocity, c);
    let gamma2 = lorentz_factor(&body2.velocity, c);
    if !gamma1.is_finite() || !gamma2.is_finite() {
        warn!(
            "superluminal velocity in pair {}/{}, relativistic force set to zero",
            body1.id, body2.id
        );
        return Vector3::zeros();
    }

    let rs = schwarzschild_radius(body1.mass, g, c);
    let dilation_sq = 1.0 - rs / r;
    if dilation_sq <= 0.0 {
        warn!(
            "{} is inside the Schwarzschild radius of {} (r = {:.3e} m, rs = {:.3e} m)",
            body2.id, body1.id, r, rs
        );
        return Vector3::zeros();
    }

    let magnitude = g * (gamma1 * body1.mass) * (gamma2 * body2.mass) / (r * r) / dilation_sq.sqrt();
    r_vec * (magnitude / r)
}
