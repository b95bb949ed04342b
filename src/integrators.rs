// Integrators - Per-body state advancement over one time step
//
// Every integrator returns a new body with the same id and mass; dt == 0
// returns the input state unchanged.

use log::warn;

use crate::body::{OrbitalParameters, PhysicsBody, StateVector, Vector3};
use crate::orbital::{mean_anomaly_at, state_at_mean_anomaly};

/// Re-evaluates acceleration for a body at its predicted state
pub type AccelerationFn<'a> = dyn Fn(&PhysicsBody) -> Vector3 + 'a;

pub trait Integrator {
    /// Advance `body` by `dt` under `acceleration`.
    ///
    /// `new_acceleration` is only consulted by schemes that need the
    /// acceleration at the end of the step.
    fn integrate(
        &self,
        body: &PhysicsBody,
        acceleration: &Vector3,
        dt: f64,
        new_acceleration: Option<&AccelerationFn<'_>>,
    ) -> PhysicsBody;

    fn name(&self) -> &'static str;
}

// =============================================================================
// EULER
// =============================================================================

/// Explicit Euler: position advances with the *old* velocity
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardEuler;

impl Integrator for StandardEuler {
    fn integrate(
        &self,
        body: &PhysicsBody,
        acceleration: &Vector3,
        dt: f64,
        _new_acceleration: Option<&AccelerationFn<'_>>,
    ) -> PhysicsBody {
        if dt == 0.0 {
            return body.clone();
        }
        let velocity = body.velocity + acceleration * dt;
        let position = body.position + body.velocity * dt;
        body.with_state(position, velocity)
    }

    fn name(&self) -> &'static str {
        "standard_euler"
    }
}

/// Semi-implicit Euler: velocity first, then position with the *new* velocity
#[derive(Debug, Clone, Copy, Default)]
pub struct SymplecticEuler;

impl Integrator for SymplecticEuler {
    fn integrate(
        &self,
        body: &PhysicsBody,
        acceleration: &Vector3,
        dt: f64,
        _new_acceleration: Option<&AccelerationFn<'_>>,
    ) -> PhysicsBody {
        if dt == 0.0 {
            return body.clone();
        }
        let velocity = body.velocity + acceleration * dt;
        let position = body.position + velocity * dt;
        body.with_state(position, velocity)
    }

    fn name(&self) -> &'static str {
        "symplectic_euler"
    }
}

// =============================================================================
// VELOCITY VERLET
// =============================================================================

/// Velocity Verlet
///
/// x(t+dt) = x(t) + v(t)·dt + ½·a(t)·dt²
/// v(t+dt) = v(t) + ½·(a(t) + a(t+dt))·dt
///
/// The N-body path runs the two half-steps separately so every body's new
/// acceleration is evaluated against the whole set of predicted positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct VelocityVerlet;

impl VelocityVerlet {
    /// Drift: predicted position, velocity untouched
    pub fn predict_position(&self, body: &PhysicsBody, acceleration: &Vector3, dt: f64) -> PhysicsBody {
        let dt_sq_half = dt * dt * 0.5;
        let position = body.position + body.velocity * dt + acceleration * dt_sq_half;
        body.with_state(position, body.velocity)
    }

    /// Kick: average the old and new accelerations into the velocity
    pub fn finish_velocity(
        &self,
        predicted: &PhysicsBody,
        acceleration: &Vector3,
        new_acceleration: &Vector3,
        dt: f64,
    ) -> PhysicsBody {
        let avg_accel = (acceleration + new_acceleration) * 0.5;
        predicted.with_velocity(predicted.velocity + avg_accel * dt)
    }
}

impl Integrator for VelocityVerlet {
    fn integrate(
        &self,
        body: &PhysicsBody,
        acceleration: &Vector3,
        dt: f64,
        new_acceleration: Option<&AccelerationFn<'_>>,
    ) -> PhysicsBody {
        if dt == 0.0 {
            return body.clone();
        }
        let predicted = self.predict_position(body, acceleration, dt);
        // without a re-evaluation the acceleration is held constant over the step
        let a_new = new_acceleration.map(|f| f(&predicted)).unwrap_or(*acceleration);
        self.finish_velocity(&predicted, acceleration, &a_new, dt)
    }

    fn name(&self) -> &'static str {
        "velocity_verlet"
    }
}

// =============================================================================
// KEPLER PROPAGATOR
// =============================================================================

/// Analytic two-body propagation: exact at any time, blind to perturbers
#[derive(Debug, Clone, Copy, Default)]
pub struct KeplerPropagator;

impl KeplerPropagator {
    /// Absolute state at time `t` for a body on `elements` around `parent`.
    ///
    /// An unbound or zero-size orbit places the body on its parent; a
    /// non-positive period freezes the mean anomaly.
    pub fn propagate(
        &self,
        elements: &OrbitalParameters,
        parent: &PhysicsBody,
        body_mass: f64,
        t: f64,
        g: f64,
    ) -> StateVector {
        if !elements.is_bound() {
            warn!(
                "orbit with a={} e={} is not a bound ellipse, placing body on its parent",
                elements.semi_major_axis, elements.eccentricity
            );
            return parent.state();
        }
        let mu = g * (parent.mass + body_mass.max(0.0));
        if mu <= 0.0 {
            warn!("parent {} has no mass, placing body on its parent", parent.id);
            return parent.state();
        }
        if elements.orbital_period <= 0.0 {
            warn!("non-positive orbital period, mean anomaly held at epoch value");
        }

        let relative = state_at_mean_anomaly(elements, mean_anomaly_at(elements, t), mu);
        StateVector::new(
            parent.position + relative.position,
            parent.velocity + relative.velocity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{AU, G, MASS_EARTH, MASS_SUN};
    use crate::orbital::orbital_period;

    fn falling_body() -> PhysicsBody {
        PhysicsBody::new("b", 3.0, Vector3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 2.0, 0.0))
    }

    #[test]
    fn test_zero_dt_is_identity() {
        let body = falling_body();
        let a = Vector3::new(5.0, 5.0, 5.0);
        assert_eq!(StandardEuler.integrate(&body, &a, 0.0, None), body);
        assert_eq!(SymplecticEuler.integrate(&body, &a, 0.0, None), body);
        assert_eq!(VelocityVerlet.integrate(&body, &a, 0.0, None), body);
    }

    #[test]
    fn test_standard_euler_uses_old_velocity() {
        let body = falling_body();
        let a = Vector3::new(-1.0, 0.0, 0.0);
        let next = StandardEuler.integrate(&body, &a, 0.5, None);
        assert_eq!(next.position, Vector3::new(1.0, 1.0, 0.0));
        assert_eq!(next.velocity, Vector3::new(-0.5, 2.0, 0.0));
        assert_eq!(next.mass, 3.0);
        assert_eq!(next.id, body.id);
    }

    #[test]
    fn test_symplectic_euler_uses_new_velocity() {
        let body = falling_body();
        let a = Vector3::new(-1.0, 0.0, 0.0);
        let next = SymplecticEuler.integrate(&body, &a, 0.5, None);
        assert_eq!(next.velocity, Vector3::new(-0.5, 2.0, 0.0));
        assert_eq!(next.position, Vector3::new(0.75, 1.0, 0.0));
    }

    #[test]
    fn test_verlet_averages_accelerations() {
        let body = falling_body();
        let a = Vector3::new(-2.0, 0.0, 0.0);
        let recompute = |_: &PhysicsBody| Vector3::new(-4.0, 0.0, 0.0);
        let next = VelocityVerlet.integrate(&body, &a, 1.0, Some(&recompute));
        // x = 1 + 0 - 1 ; v = 0 + (-3)
        assert_eq!(next.position, Vector3::new(0.0, 2.0, 0.0));
        assert_eq!(next.velocity, Vector3::new(-3.0, 2.0, 0.0));
    }

    #[test]
    fn test_verlet_without_recompute_holds_acceleration() {
        let body = falling_body();
        let a = Vector3::new(0.0, 0.0, 2.0);
        let next = VelocityVerlet.integrate(&body, &a, 1.0, None);
        assert_eq!(next.velocity, Vector3::new(0.0, 2.0, 2.0));
        assert_eq!(next.position, Vector3::new(1.0, 2.0, 1.0));
    }

    #[test]
    fn test_kepler_returns_to_start_after_one_period() {
        let sun = PhysicsBody::new("sun", MASS_SUN, Vector3::new(1e9, 0.0, 0.0), Vector3::new(0.0, 0.0, 10.0));
        let mu = G * (MASS_SUN + MASS_EARTH);
        let elements = OrbitalParameters {
            semi_major_axis: AU,
            eccentricity: 0.2,
            inclination: 0.1,
            mean_anomaly: 0.3,
            orbital_period: orbital_period(AU, mu),
            ..Default::default()
        };
        let start = KeplerPropagator.propagate(&elements, &sun, MASS_EARTH, 0.0, G);
        let later = KeplerPropagator.propagate(&elements, &sun, MASS_EARTH, elements.orbital_period, G);
        assert!((start.position - later.position).norm() < 1.0);
        // expressed relative to the parent
        let r = (start.position - sun.position).norm();
        assert!(r > AU * 0.8 - 1.0 && r < AU * 1.2 + 1.0);
    }

    #[test]
    fn test_kepler_unbound_orbit_sits_on_parent() {
        let parent = PhysicsBody::new("p", MASS_SUN, Vector3::new(5.0, 0.0, 0.0), Vector3::zeros());
        let elements = OrbitalParameters {
            semi_major_axis: AU,
            eccentricity: 1.5,
            ..Default::default()
        };
        let state = KeplerPropagator.propagate(&elements, &parent, 1.0, 100.0, G);
        assert_eq!(state, parent.state());
    }
}
