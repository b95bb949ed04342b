// Orbital Elements - Kepler's equation and state-vector <-> Keplerian element conversion
// Angles in radians, distances in meters, mu = G * (M_parent + m) in m³/s²

use std::f64::consts::TAU;

use crate::body::{OrbitalParameters, StateVector, Vector3};
use crate::constants::{KEPLER_ITERATIONS, ORBIT_EPSILON};
use crate::error::{PhysicsError, Result};

// =============================================================================
// KEPLER'S EQUATION
// =============================================================================

/// Solve Kepler's equation M = E - e*sin(E) for the eccentric anomaly E.
///
/// Fixed-iteration Newton-Raphson from Danby's starting guess; five iterations
/// reach double precision for eccentricities below ~0.9.
pub fn solve_kepler_equation(mean_anomaly: f64, eccentricity: f64) -> f64 {
    let m = wrap_angle(mean_anomaly);
    // Danby: E0 = M + 0.85 e sign(sin M)
    let mut e_anom = m + 0.85 * eccentricity * m.sin().signum();

    for _ in 0..KEPLER_ITERATIONS {
        let f = e_anom - eccentricity * e_anom.sin() - m;
        let f_prime = 1.0 - eccentricity * e_anom.cos();
        e_anom -= f / f_prime;
    }

    e_anom
}

/// True anomaly from eccentric anomaly
pub fn true_anomaly_from_eccentric(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    2.0 * ((1.0 + eccentricity).sqrt() * (eccentric_anomaly / 2.0).sin())
        .atan2((1.0 - eccentricity).sqrt() * (eccentric_anomaly / 2.0).cos())
}

/// Eccentric anomaly from true anomaly
pub fn eccentric_anomaly_from_true(true_anomaly: f64, eccentricity: f64) -> f64 {
    2.0 * ((1.0 - eccentricity).sqrt() * (true_anomaly / 2.0).sin())
        .atan2((1.0 + eccentricity).sqrt() * (true_anomaly / 2.0).cos())
}

/// Wrap an angle into [0, 2π)
pub fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Orbital period T = 2π√(a³/μ) (s)
pub fn orbital_period(semi_major_axis: f64, mu: f64) -> f64 {
    TAU * (semi_major_axis.powi(3) / mu).sqrt()
}

/// Mean anomaly at time `t`, advancing M0 at 2π per period.
///
/// A non-positive period leaves the anomaly frozen at M0.
pub fn mean_anomaly_at(elements: &OrbitalParameters, t: f64) -> f64 {
    if elements.orbital_period > 0.0 && elements.orbital_period.is_finite() {
        wrap_angle(elements.mean_anomaly + TAU * t / elements.orbital_period)
    } else {
        wrap_angle(elements.mean_anomaly)
    }
}

// =============================================================================
// ELEMENTS -> STATE
// =============================================================================

/// Position and velocity relative to the parent for the given mean anomaly
pub fn state_at_mean_anomaly(elements: &OrbitalParameters, mean_anomaly: f64, mu: f64) -> StateVector {
    let a = elements.semi_major_axis;
    let e = elements.eccentricity;
    let i = elements.inclination;
    let omega_big = elements.longitude_ascending_node; // Ω
    let omega_small = elements.argument_periapsis; // ω

    let eccentric_anomaly = solve_kepler_equation(mean_anomaly, e);
    let true_anomaly = true_anomaly_from_eccentric(eccentric_anomaly, e);

    // Distance from focus
    let r = a * (1.0 - e * eccentric_anomaly.cos());

    // Position in orbital plane (perifocal frame)
    let cos_nu = true_anomaly.cos();
    let sin_nu = true_anomaly.sin();
    let x_orb = r * cos_nu;
    let y_orb = r * sin_nu;

    // Velocity in orbital plane, from vis-viva: |v|² = μ(2/r - 1/a)
    let sqrt_mu_p = (mu / (a * (1.0 - e * e))).sqrt();
    let vx_orb = -sqrt_mu_p * sin_nu;
    let vy_orb = sqrt_mu_p * (e + cos_nu);

    // Perifocal -> inertial rotation R3(-Ω) R1(-i) R3(-ω)
    let cos_omega = omega_big.cos();
    let sin_omega = omega_big.sin();
    let cos_w = omega_small.cos();
    let sin_w = omega_small.sin();
    let cos_i = i.cos();
    let sin_i = i.sin();

    let r11 = cos_omega * cos_w - sin_omega * sin_w * cos_i;
    let r12 = -cos_omega * sin_w - sin_omega * cos_w * cos_i;
    let r21 = sin_omega * cos_w + cos_omega * sin_w * cos_i;
    let r22 = -sin_omega * sin_w + cos_omega * cos_w * cos_i;
    let r31 = sin_w * sin_i;
    let r32 = cos_w * sin_i;

    let position = Vector3::new(
        r11 * x_orb + r12 * y_orb,
        r21 * x_orb + r22 * y_orb,
        r31 * x_orb + r32 * y_orb,
    );

    let velocity = Vector3::new(
        r11 * vx_orb + r12 * vy_orb,
        r21 * vx_orb + r22 * vy_orb,
        r31 * vx_orb + r32 * vy_orb,
    );

    StateVector { position, velocity }
}

/// Relative state at time `t` since the elements' epoch
pub fn state_at_time(elements: &OrbitalParameters, t: f64, mu: f64) -> StateVector {
    state_at_mean_anomaly(elements, mean_anomaly_at(elements, t), mu)
}

// =============================================================================
// STATE -> ELEMENTS
// =============================================================================

/// Keplerian elements of a bound orbit from position/velocity relative to the parent.
///
/// Equatorial orbits put the node on +x (Ω = 0); circular orbits put the
/// periapsis at the node (ω = 0) so the anomaly is measured from there.
pub fn elements_from_state(position: &Vector3, velocity: &Vector3, mu: f64) -> Result<OrbitalParameters> {
    let r = position.norm();
    if r <= 0.0 || !r.is_finite() {
        return Err(PhysicsError::DegenerateState("zero or non-finite radius".into()));
    }
    if mu <= 0.0 || !mu.is_finite() {
        return Err(PhysicsError::DegenerateState(format!("non-positive gravitational parameter {}", mu)));
    }

    let v2 = velocity.norm_squared();
    let h = position.cross(velocity);
    let h_mag = h.norm();
    if h_mag <= ORBIT_EPSILON * r * velocity.norm().max(1.0) {
        return Err(PhysicsError::DegenerateState("radial trajectory has no orbital plane".into()));
    }

    let e_vec = (position * (v2 - mu / r) - velocity * position.dot(velocity)) / mu;
    let e = e_vec.norm();

    let energy = 0.5 * v2 - mu / r;
    if energy >= 0.0 || e >= 1.0 {
        return Err(PhysicsError::UnboundOrbit { eccentricity: e });
    }
    let a = -mu / (2.0 * energy);

    let inclination = clamp_acos(h.z / h_mag);

    // Node line: k × h
    let node = Vector3::new(-h.y, h.x, 0.0);
    let node_mag = node.norm();
    let equatorial = node_mag <= ORBIT_EPSILON * h_mag;
    let circular = e <= ORBIT_EPSILON.sqrt();

    let longitude_ascending_node = if equatorial {
        0.0
    } else {
        wrap_angle(node.y.atan2(node.x))
    };

    let argument_periapsis = if circular {
        0.0
    } else if equatorial {
        let w = e_vec.y.atan2(e_vec.x);
        wrap_angle(if h.z < 0.0 { -w } else { w })
    } else {
        let w = clamp_acos(node.dot(&e_vec) / (node_mag * e));
        if e_vec.z < 0.0 {
            TAU - w
        } else {
            w
        }
    };

    let true_anomaly = if !circular {
        let nu = clamp_acos(e_vec.dot(position) / (e * r));
        if position.dot(velocity) < 0.0 {
            TAU - nu
        } else {
            nu
        }
    } else if !equatorial {
        // argument of latitude
        let u = clamp_acos(node.dot(position) / (node_mag * r));
        if position.z < 0.0 {
            TAU - u
        } else {
            u
        }
    } else {
        // true longitude
        let l = position.y.atan2(position.x);
        if h.z < 0.0 {
            -l
        } else {
            l
        }
    };

    let ecc_used = if circular { 0.0 } else { e };
    let eccentric_anomaly = eccentric_anomaly_from_true(true_anomaly, ecc_used);
    let mean_anomaly = wrap_angle(eccentric_anomaly - ecc_used * eccentric_anomaly.sin());

    Ok(OrbitalParameters {
        semi_major_axis: a,
        eccentricity: ecc_used,
        inclination,
        longitude_ascending_node,
        argument_periapsis: wrap_angle(argument_periapsis),
        mean_anomaly,
        orbital_period: orbital_period(a, mu),
    })
}

fn clamp_acos(x: f64) -> f64 {
    x.clamp(-1.0, 1.0).acos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{AU, G, MASS_SUN};
    use std::f64::consts::PI;

    const MU: f64 = G * MASS_SUN;

    #[test]
    fn test_kepler_equation_circular() {
        // For circular orbit e=0, E = M
        let e = solve_kepler_equation(1.0, 0.0);
        assert!((e - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_kepler_equation_eccentric() {
        for &(m, ecc) in &[(0.5, 0.5), (2.0, 0.3), (0.2, 0.85), (5.5, 0.7)] {
            let e_anom = solve_kepler_equation(m, ecc);
            let check = e_anom - ecc * e_anom.sin();
            assert!((wrap_angle(check) - wrap_angle(m)).abs() < 1e-10, "M={} e={}", m, ecc);
        }
    }

    #[test]
    fn test_anomaly_conversions_invert() {
        for &nu in &[0.1, 1.0, 2.5, 4.0, 6.0] {
            let e_anom = eccentric_anomaly_from_true(nu, 0.4);
            let back = true_anomaly_from_eccentric(e_anom, 0.4);
            assert!((wrap_angle(back) - nu).abs() < 1e-12);
        }
    }

    #[test]
    fn test_mean_anomaly_advances_one_period() {
        let elements = OrbitalParameters {
            semi_major_axis: AU,
            mean_anomaly: 1.0,
            orbital_period: 100.0,
            ..Default::default()
        };
        assert!((mean_anomaly_at(&elements, 100.0) - 1.0).abs() < 1e-12);
        assert!((mean_anomaly_at(&elements, 25.0) - (1.0 + PI / 2.0)).abs() < 1e-12);
        let frozen = OrbitalParameters {
            orbital_period: 0.0,
            ..elements
        };
        assert_eq!(mean_anomaly_at(&frozen, 50.0), 1.0);
    }

    #[test]
    fn test_circular_equatorial_state() {
        let elements = OrbitalParameters {
            semi_major_axis: AU,
            ..Default::default()
        };
        let state = state_at_mean_anomaly(&elements, 0.0, MU);
        assert!((state.position.x - AU).abs() < 1e-3);
        let v_circ = (MU / AU).sqrt();
        assert!((state.velocity.y - v_circ).abs() < 1e-6);
    }

    #[test]
    fn test_elements_round_trip_inclined() {
        let original = OrbitalParameters {
            semi_major_axis: 2.0 * AU,
            eccentricity: 0.3,
            inclination: 0.4,
            longitude_ascending_node: 1.2,
            argument_periapsis: 0.7,
            mean_anomaly: 2.1,
            orbital_period: 0.0,
        };
        let state = state_at_mean_anomaly(&original, original.mean_anomaly, MU);
        let derived = elements_from_state(&state.position, &state.velocity, MU).unwrap();
        assert!((derived.semi_major_axis / original.semi_major_axis - 1.0).abs() < 1e-9);
        assert!((derived.eccentricity - 0.3).abs() < 1e-9);
        assert!((derived.inclination - 0.4).abs() < 1e-9);
        assert!((derived.longitude_ascending_node - 1.2).abs() < 1e-9);
        assert!((derived.argument_periapsis - 0.7).abs() < 1e-9);
        assert!((derived.mean_anomaly - 2.1).abs() < 1e-9);
    }

    #[test]
    fn test_unbound_orbit_rejected() {
        let r = Vector3::new(AU, 0.0, 0.0);
        let v = Vector3::new(0.0, 2.0 * (MU / AU).sqrt(), 0.0);
        assert!(matches!(
            elements_from_state(&r, &v, MU),
            Err(PhysicsError::UnboundOrbit { .. })
        ));
    }

    #[test]
    fn test_degenerate_states_rejected() {
        let v = Vector3::new(0.0, 1.0, 0.0);
        assert!(elements_from_state(&Vector3::zeros(), &v, MU).is_err());
        let radial = Vector3::new(1.0, 0.0, 0.0);
        assert!(elements_from_state(&Vector3::new(AU, 0.0, 0.0), &radial, MU).is_err());
    }
}
