// Newtonian Gravity - Inverse-square pairwise attraction

use crate::body::{PhysicsBody, Vector3};
use crate::constants::MIN_SEPARATION;

use super::PairwiseForce;

/// Unsoftened Newtonian attraction: F = G·m1·m2/r² toward body2
#[derive(Debug, Clone, Copy, Default)]
pub struct Newtonian;

impl PairwiseForce for Newtonian {
    fn force(&self, body1: &PhysicsBody, body2: &PhysicsBody, g: f64) -> Vector3 {
        newtonian_force(body1, body2, g)
    }

    fn name(&self) -> &'static str {
        "newtonian"
    }
}

/// Force on `body1` from `body2`; zero when the pair is closer than `MIN_SEPARATION`
pub fn newtonian_force(body1: &PhysicsBody, body2: &PhysicsBody, g: f64) -> Vector3 {
    let r_vec = body2.position - body1.position;
    let r = r_vec.norm();

    if r < MIN_SEPARATION {
        return Vector3::zeros();
    }

    let magnitude = g * body1.mass * body2.mass / (r * r);
    r_vec * (magnitude / r)
}

/// Softened point-mass force on a mass `m1` at `p1` from `m2` at `p2`:
/// F = G·m1·m2·r / (r² + ε²)^(3/2)
///
/// Used by the octree for both bodies and aggregate nodes.
pub fn softened_force(p1: &Vector3, m1: f64, p2: &Vector3, m2: f64, g: f64, softening: f64) -> Vector3 {
    let r_vec = p2 - p1;
    let d2 = r_vec.norm_squared() + softening * softening;

    if d2 < MIN_SEPARATION * MIN_SEPARATION {
        return Vector3::zeros();
    }

    let inv_d = d2.sqrt().recip();
    let inv_d3 = inv_d * inv_d * inv_d;
    r_vec * (g * m1 * m2 * inv_d3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::G;

    fn pair(dist: f64, m1: f64, m2: f64) -> (PhysicsBody, PhysicsBody) {
        (
            PhysicsBody::new("a", m1, Vector3::zeros(), Vector3::zeros()),
            PhysicsBody::new("b", m2, Vector3::new(dist, 0.0, 0.0), Vector3::zeros()),
        )
    }

    #[test]
    fn test_points_toward_other_body() {
        let (a, b) = pair(2.0, 1.0, 1.0);
        let f = newtonian_force(&a, &b, 1.0);
        assert!(f.x > 0.0);
        assert!((f.x - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_newton_third_law() {
        let (a, b) = pair(3.0, 2.0, 5.0);
        let f_ab = newtonian_force(&a, &b, G);
        let f_ba = newtonian_force(&b, &a, G);
        assert!((f_ab + f_ba).norm() < 1e-25);
    }

    #[test]
    fn test_inverse_square() {
        let (a, b) = pair(1.0, 1.0, 1.0);
        let (c, d) = pair(2.0, 1.0, 1.0);
        let ratio = newtonian_force(&a, &b, 1.0).norm() / newtonian_force(&c, &d, 1.0).norm();
        assert!((ratio - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_coincident_bodies_give_zero() {
        let (a, b) = pair(0.0, 1.0, 1.0);
        assert_eq!(newtonian_force(&a, &b, 1.0), Vector3::zeros());
    }

    #[test]
    fn test_softening_caps_force() {
        let p1 = Vector3::zeros();
        let p2 = Vector3::new(1e-9, 0.0, 0.0);
        let f = softened_force(&p1, 1.0, &p2, 1.0, 1.0, 0.1);
        assert!(f.norm() < 1e-6);
        assert!(f.x > 0.0);
    }
}
