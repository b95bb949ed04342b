// Energy & Momentum - Conservation diagnostics for drift monitoring

use crate::body::{PhysicsBody, Vector3};
use crate::constants::MIN_SEPARATION;

/// Total mechanical energy: Σ ½mv² − Σ_{i<j} G·mi·mj/rij (J)
pub fn total_energy(bodies: &[PhysicsBody], g: f64) -> f64 {
    let kinetic: f64 = bodies.iter().map(PhysicsBody::kinetic_energy).sum();

    // Potential energy: -G * m1 * m2 / r for each pair
    let mut potential = 0.0;
    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let r = (bodies[i].position - bodies[j].position).norm();
            if r > MIN_SEPARATION {
                potential -= g * bodies[i].mass * bodies[j].mass / r;
            }
        }
    }

    kinetic + potential
}

/// Total linear momentum (kg·m/s)
pub fn total_momentum(bodies: &[PhysicsBody]) -> Vector3 {
    bodies.iter().fold(Vector3::zeros(), |acc, b| acc + b.momentum())
}

/// |E − E0| / |E0|, zero when the reference energy is ~0
pub fn energy_drift(initial: f64, current: f64) -> f64 {
    if initial.abs() > 1e-20 {
        (current - initial).abs() / initial.abs()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_body_energy() {
        let bodies = vec![
            PhysicsBody::new(1u64, 2.0, Vector3::zeros(), Vector3::new(1.0, 0.0, 0.0)),
            PhysicsBody::new(2u64, 3.0, Vector3::new(2.0, 0.0, 0.0), Vector3::zeros()),
        ];
        // ½·2·1 − 1·2·3/2
        assert!((total_energy(&bodies, 1.0) - (1.0 - 3.0)).abs() < 1e-12);
        assert_eq!(total_momentum(&bodies), Vector3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_drift_is_relative() {
        assert!((energy_drift(-10.0, -9.0) - 0.1).abs() < 1e-12);
        assert_eq!(energy_drift(0.0, 5.0), 0.0);
    }
}
