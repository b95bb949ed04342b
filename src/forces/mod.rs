// Force Models - Pairwise gravitational models and per-body external forces
//
// Each gravitational model answers one question: the force on body1 due to
// body2. The selector composes Newtonian gravity with the requested
// relativistic corrections; external forces are summed separately per body.

pub mod newtonian;
pub mod non_gravitational;
pub mod post_newtonian;
pub mod relativistic;

use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::body::{PhysicsBody, Vector3};

pub use newtonian::{newtonian_force, softened_force, Newtonian};
pub use non_gravitational::{Drag, ExternalForces, Thrust};
pub use post_newtonian::{pn_correction_acceleration, pn_terms, PnOrder, PnTerms, PostNewtonian};
pub use relativistic::{lorentz_factor, relativistic_force, schwarzschild_radius, SimplifiedRelativistic};

/// A pairwise gravitational force law
pub trait PairwiseForce: Send + Sync {
    /// Force on `body1` due to `body2` (N)
    fn force(&self, body1: &PhysicsBody, body2: &PhysicsBody, g: f64) -> Vector3;

    /// Model name for logging
    fn name(&self) -> &'static str;
}

// =============================================================================
// FORCE ORDER SELECTOR
// =============================================================================

/// Gravity fidelity requested by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ForceOrder {
    #[default]
    #[serde(rename = "NEWTONIAN")]
    Newtonian,
    #[serde(rename = "SIMPLIFIED_RELATIVISTIC")]
    SimplifiedRelativistic,
    #[serde(rename = "PN1")]
    Pn1,
    #[serde(rename = "PN2")]
    Pn2,
    #[serde(rename = "PN2_5")]
    Pn2_5,
}

impl ForceOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            ForceOrder::Newtonian => "NEWTONIAN",
            ForceOrder::SimplifiedRelativistic => "SIMPLIFIED_RELATIVISTIC",
            ForceOrder::Pn1 => "PN1",
            ForceOrder::Pn2 => "PN2",
            ForceOrder::Pn2_5 => "PN2_5",
        }
    }

    /// Parse an order name, falling back to Newtonian with a warning
    pub fn parse_or_newtonian(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!("unknown gravity model '{}', falling back to NEWTONIAN", name);
            ForceOrder::Newtonian
        })
    }

    /// Post-Newtonian order, if this selection uses PN corrections
    pub fn pn_order(self) -> Option<PnOrder> {
        match self {
            ForceOrder::Pn1 => Some(PnOrder::Pn1),
            ForceOrder::Pn2 => Some(PnOrder::Pn2),
            ForceOrder::Pn2_5 => Some(PnOrder::Pn2_5),
            ForceOrder::Newtonian | ForceOrder::SimplifiedRelativistic => None,
        }
    }

    /// The full pairwise force law for this order
    pub fn model(self, c: f64) -> Box<dyn PairwiseForce> {
        match self {
            ForceOrder::Newtonian => Box::new(Newtonian),
            ForceOrder::SimplifiedRelativistic => Box::new(SimplifiedRelativistic { c }),
            ForceOrder::Pn1 => Box::new(PostNewtonian { order: PnOrder::Pn1, c }),
            ForceOrder::Pn2 => Box::new(PostNewtonian { order: PnOrder::Pn2, c }),
            ForceOrder::Pn2_5 => Box::new(PostNewtonian { order: PnOrder::Pn2_5, c }),
        }
    }
}

impl fmt::Display for ForceOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForceOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().replace(['.', '-'], "_").as_str() {
            "NEWTONIAN" => Ok(ForceOrder::Newtonian),
            "SIMPLIFIED_RELATIVISTIC" | "RELATIVISTIC" => Ok(ForceOrder::SimplifiedRelativistic),
            "PN1" => Ok(ForceOrder::Pn1),
            "PN2" => Ok(ForceOrder::Pn2),
            "PN2_5" | "PN25" => Ok(ForceOrder::Pn2_5),
            other => Err(format!("unknown gravity model: {}", other)),
        }
    }
}

impl From<String> for ForceOrder {
    fn from(value: String) -> Self {
        ForceOrder::parse_or_newtonian(&value)
    }
}

/// Force on `body1` due to `body2` under the selected order
pub fn gravitational_force(
    order: ForceOrder,
    body1: &PhysicsBody,
    body2: &PhysicsBody,
    g: f64,
    c: f64,
) -> Vector3 {
    order.model(c).force(body1, body2, g)
}

/// Acceleration on `body1` beyond plain Newtonian gravity under the selected order.
///
/// This is what gets layered on top of the (softened) Barnes-Hut field.
pub fn correction_acceleration(
    order: ForceOrder,
    body1: &PhysicsBody,
    body2: &PhysicsBody,
    g: f64,
    c: f64,
) -> Vector3 {
    match order {
        ForceOrder::Newtonian => Vector3::zeros(),
        ForceOrder::SimplifiedRelativistic => {
            if body1.mass <= 0.0 {
                return Vector3::zeros();
            }
            let delta = relativistic_force(body1, body2, g, c) - newtonian_force(body1, body2, g);
            delta / body1.mass
        }
        ForceOrder::Pn1 | ForceOrder::Pn2 | ForceOrder::Pn2_5 => {
            let terms = pn_terms(body1, body2, g, c);
            order.pn_order().map(|o| terms.up_to(o)).unwrap_or_else(Vector3::zeros)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_orders() {
        assert_eq!("PN2.5".parse::<ForceOrder>().unwrap(), ForceOrder::Pn2_5);
        assert_eq!("pn1".parse::<ForceOrder>().unwrap(), ForceOrder::Pn1);
        assert_eq!(
            "simplified_relativistic".parse::<ForceOrder>().unwrap(),
            ForceOrder::SimplifiedRelativistic
        );
    }

    #[test]
    fn test_unknown_order_falls_back_to_newtonian() {
        let order: ForceOrder = serde_json::from_str(r#""PN7""#).unwrap();
        assert_eq!(order, ForceOrder::Newtonian);
        assert_eq!(serde_json::to_string(&ForceOrder::Pn2_5).unwrap(), r#""PN2_5""#);
    }

    #[test]
    fn test_newtonian_selection_has_no_correction() {
        let a = PhysicsBody::new("a", 1.0, Vector3::zeros(), Vector3::new(0.0, 1.0, 0.0));
        let b = PhysicsBody::new("b", 1.0, Vector3::new(1.0, 0.0, 0.0), Vector3::zeros());
        assert_eq!(correction_acceleration(ForceOrder::Newtonian, &a, &b, 1.0, 10.0), Vector3::zeros());
        let f = gravitational_force(ForceOrder::Newtonian, &a, &b, 1.0, 10.0);
        assert!((f.x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_selector_composes_newtonian_and_correction() {
        let a = PhysicsBody::new("a", 2.0, Vector3::zeros(), Vector3::new(0.0, 0.3, 0.0));
        let b = PhysicsBody::new("b", 1.0, Vector3::new(1.0, 0.0, 0.0), Vector3::zeros());
        for order in [ForceOrder::SimplifiedRelativistic, ForceOrder::Pn1, ForceOrder::Pn2_5] {
            let total = gravitational_force(order, &a, &b, 1.0, 10.0);
            let split = newtonian_force(&a, &b, 1.0) + correction_acceleration(order, &a, &b, 1.0, 10.0) * a.mass;
            assert!((total - split).norm() < 1e-12, "order {}", order);
        }
    }
}
