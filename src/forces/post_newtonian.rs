// Post-Newtonian Gravity - 1PN, 2PN and 2.5PN corrections to two-body acceleration
// Harmonic-gauge equations of motion (Einstein-Infeld-Hoffmann at 1PN, Blanchet at 2PN/2.5PN)

use crate::body::{PhysicsBody, Vector3};
use crate::constants::MIN_SEPARATION;

use super::newtonian::newtonian_force;
use super::PairwiseForce;

/// Which correction terms are stacked on top of the Newtonian acceleration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PnOrder {
    Pn1,
    Pn2,
    Pn2_5,
}

/// Correction accelerations on body1, each already divided by its power of c
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PnTerms {
    pub pn1: Vector3,
    pub pn2: Vector3,
    pub pn2_5: Vector3,
}

impl PnTerms {
    pub fn zero() -> Self {
        Self {
            pn1: Vector3::zeros(),
            pn2: Vector3::zeros(),
            pn2_5: Vector3::zeros(),
        }
    }

    /// Sum of the terms up to and including `order`
    pub fn up_to(&self, order: PnOrder) -> Vector3 {
        match order {
            PnOrder::Pn1 => self.pn1,
            PnOrder::Pn2 => self.pn1 + self.pn2,
            PnOrder::Pn2_5 => self.pn1 + self.pn2 + self.pn2_5,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PostNewtonian {
    pub order: PnOrder,
    /// Speed of light (m/s)
    pub c: f64,
}

impl PairwiseForce for PostNewtonian {
    fn force(&self, body1: &PhysicsBody, body2: &PhysicsBody, g: f64) -> Vector3 {
        let correction = pn_correction_acceleration(body1, body2, g, self.c, self.order);
        newtonian_force(body1, body2, g) + correction * body1.mass
    }

    fn name(&self) -> &'static str {
        match self.order {
            PnOrder::Pn1 => "post_newtonian_1",
            PnOrder::Pn2 => "post_newtonian_2",
            PnOrder::Pn2_5 => "post_newtonian_2_5",
        }
    }
}

/// Correction acceleration on body1 from body2 up to `order` (excludes the Newtonian term)
pub fn pn_correction_acceleration(
    body1: &PhysicsBody,
    body2: &PhysicsBody,
    g: f64,
    c: f64,
    order: PnOrder,
) -> Vector3 {
    pn_terms(body1, body2, g, c).up_to(order)
}

/// All post-Newtonian correction terms on body1 due to body2.
///
/// With n = (x1 − x2)/r and v12 = v1 − v2, each order has the form
/// (A·n + B·v12)/cᵏ. The 2.5PN term is the radiation-reaction force: it is the
/// only dissipative one and drains orbital energy as gravitational waves.
pub fn pn_terms(body1: &PhysicsBody, body2: &PhysicsBody, g: f64, c: f64) -> PnTerms {
    let r_vec = body1.position - body2.position;
    let r = r_vec.norm();
    if r < MIN_SEPARATION || c <= 0.0 {
        return PnTerms::zero();
    }

    let n = r_vec / r;
    let v1 = body1.velocity;
    let v2 = body2.velocity;
    let v12 = v1 - v2;

    let m1 = body1.mass;
    let m2 = body2.mass;

    let nv1 = n.dot(&v1);
    let nv2 = n.dot(&v2);
    let nv12 = n.dot(&v12);
    let v1s = v1.norm_squared();
    let v2s = v2.norm_squared();
    let v1v2 = v1.dot(&v2);
    let v12s = v12.norm_squared();

    let r2 = r * r;
    let r3 = r2 * r;
    let r4 = r2 * r2;

    // G m2 / r², G² m m / r³, G³ m m m / r⁴ building blocks
    let gm2_r2 = g * m2 / r2;
    let g2_m1m2_r3 = g * g * m1 * m2 / r3;
    let g2_m2m2_r3 = g * g * m2 * m2 / r3;
    let g3 = g * g * g;
    let g3_m1m1m2_r4 = g3 * m1 * m1 * m2 / r4;
    let g3_m1m2m2_r4 = g3 * m1 * m2 * m2 / r4;
    let g3_m2m2m2_r4 = g3 * m2 * m2 * m2 / r4;

    let c2 = c * c;
    let c4 = c2 * c2;
    let c5 = c4 * c;

    // 1PN
    let a1 = 5.0 * g2_m1m2_r3 + 4.0 * g2_m2m2_r3
        + gm2_r2 * (1.5 * nv2 * nv2 - v1s + 4.0 * v1v2 - 2.0 * v2s);
    let b1 = gm2_r2 * (4.0 * nv1 - 3.0 * nv2);
    let pn1 = (n * a1 + v12 * b1) / c2;

    // 2PN
    let nv2_2 = nv2 * nv2;
    let a2 = -57.0 / 4.0 * g3_m1m1m2_r4 - 69.0 / 2.0 * g3_m1m2m2_r4 - 9.0 * g3_m2m2m2_r4
        + gm2_r2
            * (-15.0 / 8.0 * nv2_2 * nv2_2 + 1.5 * nv2_2 * v1s - 6.0 * nv2_2 * v1v2
                - 2.0 * v1v2 * v1v2
                + 4.5 * nv2_2 * v2s
                + 4.0 * v1v2 * v2s
                - 2.0 * v2s * v2s)
        + g2_m1m2_r3
            * (19.5 * nv1 * nv1 - 39.0 * nv1 * nv2 + 8.5 * nv2_2 - 3.75 * v1s - 2.5 * v1v2
                + 1.25 * v2s)
        + g2_m2m2_r3 * (2.0 * nv1 * nv1 - 4.0 * nv1 * nv2 - 6.0 * nv2_2 - 8.0 * v1v2 + 4.0 * v2s);
    let b2 = g2_m2m2_r3 * (-2.0 * nv1 - 2.0 * nv2)
        + g2_m1m2_r3 * (-63.0 / 4.0 * nv1 + 55.0 / 4.0 * nv2)
        + gm2_r2
            * (-6.0 * nv1 * nv2_2 + 4.5 * nv2_2 * nv2 + nv2 * v1s - 4.0 * nv1 * v1v2
                + 4.0 * nv2 * v1v2
                + 4.0 * nv1 * v2s
                - 5.0 * nv2 * v2s);
    let pn2 = (n * a2 + v12 * b2) / c4;

    // 2.5PN radiation reaction
    let a25 = 208.0 / 15.0 * g3_m1m2m2_r4 * nv12 - 24.0 / 5.0 * g3_m1m1m2_r4 * nv12
        + 12.0 / 5.0 * g2_m1m2_r3 * nv12 * v12s;
    let b25 = 8.0 / 5.0 * g3_m1m1m2_r4 - 32.0 / 5.0 * g3_m1m2m2_r4 - 4.0 / 5.0 * g2_m1m2_r3 * v12s;
    let pn2_5 = (n * a25 + v12 * b25) / c5;

    PnTerms { pn1, pn2, pn2_5 }
}
