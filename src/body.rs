// Body State - Identity, physical state and orbital parameters of simulated bodies
// Every operation returns new values; a step's output is a pure function of its input

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

// =============================================================================
// 3D VECTOR
// =============================================================================

/// 3-component real vector (meters, m/s, m/s² or newtons depending on context)
pub type Vector3 = nalgebra::Vector3<f64>;

/// Unit vector along `v`, or zero when `v` is too short to normalize
pub fn unit_or_zero(v: &Vector3) -> Vector3 {
    v.try_normalize(1e-15).unwrap_or_else(Vector3::zeros)
}

// =============================================================================
// IDENTITY
// =============================================================================

/// Stable body identifier. Drivers may use integers or strings.
///
/// JSON strings stay `Name` and JSON integers stay `Index`, so every id
/// serializes back exactly as it arrived. Equality, hashing and ordering go
/// through the canonical text form: `Name("7")` equals `Index(7)` (integer ids
/// used as JSON object keys arrive as strings) while `Name("007")` does not.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum BodyId {
    Index(u64),
    Name(String),
}

/// Canonical comparison key
#[derive(PartialEq, Eq, Hash, PartialOrd, Ord)]
enum IdKey<'a> {
    Index(u64),
    Name(&'a str),
}

impl BodyId {
    fn key(&self) -> IdKey<'_> {
        match self {
            BodyId::Index(i) => IdKey::Index(*i),
            BodyId::Name(s) => match canonical_index(s) {
                Some(i) => IdKey::Index(i),
                None => IdKey::Name(s),
            },
        }
    }
}

/// `Some(n)` only when `s` is exactly the decimal rendering of `n`
fn canonical_index(s: &str) -> Option<u64> {
    let digits = !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits || (s.len() > 1 && s.starts_with('0')) {
        return None;
    }
    s.parse().ok()
}

impl PartialEq for BodyId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for BodyId {}

impl Hash for BodyId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for BodyId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BodyId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl<'de> Deserialize<'de> for BodyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BodyIdVisitor;

        impl<'de> Visitor<'de> for BodyIdVisitor {
            type Value = BodyId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or a string body id")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<BodyId, E> {
                Ok(BodyId::Index(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<BodyId, E> {
                u64::try_from(v)
                    .map(BodyId::Index)
                    .map_err(|_| E::custom(format!("negative body id {}", v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<BodyId, E> {
                Ok(BodyId::Name(v.to_string()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<BodyId, E> {
                Ok(BodyId::Name(v))
            }
        }

        deserializer.deserialize_any(BodyIdVisitor)
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyId::Index(i) => write!(f, "{}", i),
            BodyId::Name(s) => f.write_str(s),
        }
    }
}

impl From<u64> for BodyId {
    fn from(value: u64) -> Self {
        BodyId::Index(value)
    }
}

impl From<&str> for BodyId {
    fn from(value: &str) -> Self {
        BodyId::Name(value.to_string())
    }
}

impl From<String> for BodyId {
    fn from(value: String) -> Self {
        BodyId::Name(value)
    }
}

// =============================================================================
// BODY CATEGORY
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BodyType {
    Star,
    Planet,
    #[serde(alias = "gasGiant")]
    GasGiant,
    Moon,
    #[serde(alias = "dwarfPlanet")]
    DwarfPlanet,
    Asteroid,
    Comet,
    Spacecraft,
    #[serde(alias = "ring", alias = "ringSystem")]
    RingSystem,
    /// Any category this engine does not know; collides by mass ratio
    #[serde(other)]
    Other,
}

impl BodyType {
    /// Planets, moons and dwarf planets: the bodies that bounce off gas giants
    pub fn is_rocky_satellite(self) -> bool {
        matches!(self, BodyType::Planet | BodyType::Moon | BodyType::DwarfPlanet)
    }
}

// =============================================================================
// STATE VECTOR (Position + Velocity)
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StateVector {
    pub position: Vector3, // meters (SI)
    pub velocity: Vector3, // m/s (SI)
}

impl StateVector {
    pub fn new(position: Vector3, velocity: Vector3) -> Self {
        Self { position, velocity }
    }

    pub fn zero() -> Self {
        Self {
            position: Vector3::zeros(),
            velocity: Vector3::zeros(),
        }
    }
}

// =============================================================================
// PHYSICS BODY
// =============================================================================

/// Physics state of a single body: identity, mass (kg), position (m), velocity (m/s)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    pub id: BodyId,
    pub mass: f64,
    pub position: Vector3,
    pub velocity: Vector3,
}

impl PhysicsBody {
    pub fn new(id: impl Into<BodyId>, mass: f64, position: Vector3, velocity: Vector3) -> Self {
        Self {
            id: id.into(),
            mass,
            position,
            velocity,
        }
    }

    pub fn state(&self) -> StateVector {
        StateVector::new(self.position, self.velocity)
    }

    /// Same identity and mass, new kinematic state
    pub fn with_state(&self, position: Vector3, velocity: Vector3) -> Self {
        Self {
            id: self.id.clone(),
            mass: self.mass,
            position,
            velocity,
        }
    }

    pub fn with_velocity(&self, velocity: Vector3) -> Self {
        self.with_state(self.position, velocity)
    }

    pub fn momentum(&self) -> Vector3 {
        self.velocity * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }

    pub fn is_finite(&self) -> bool {
        self.mass.is_finite()
            && self.position.iter().all(|c| c.is_finite())
            && self.velocity.iter().all(|c| c.is_finite())
    }
}

// =============================================================================
// KEPLERIAN ORBITAL PARAMETERS
// =============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrbitalParameters {
    /// Semi-major axis (meters)
    pub semi_major_axis: f64,
    /// Eccentricity, [0, 1) for bound orbits
    pub eccentricity: f64,
    /// Inclination (radians)
    pub inclination: f64,
    /// Longitude of ascending node (radians)
    pub longitude_ascending_node: f64,
    /// Argument of periapsis (radians)
    pub argument_periapsis: f64,
    /// Mean anomaly at t = 0 (radians)
    pub mean_anomaly: f64,
    /// Orbital period (seconds)
    pub orbital_period: f64,
}

impl OrbitalParameters {
    pub fn is_bound(&self) -> bool {
        (0.0..1.0).contains(&self.eccentricity) && self.semi_major_axis > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_id_from_json() {
        let ids: Vec<BodyId> = serde_json::from_str(r#"[3, "earth"]"#).unwrap();
        assert_eq!(ids[0], BodyId::Index(3));
        assert_eq!(ids[1], BodyId::Name("earth".to_string()));
        assert_eq!(ids[1].to_string(), "earth");
    }

    #[test]
    fn test_numeric_map_keys_match_indices_and_names() {
        let radii: std::collections::HashMap<BodyId, f64> =
            serde_json::from_str(r#"{"7": 1.5, "io": 2.0}"#).unwrap();
        assert_eq!(radii.get(&BodyId::Index(7)), Some(&1.5));
        assert_eq!(radii.get(&BodyId::from("7")), Some(&1.5));
        assert_eq!(radii.get(&BodyId::from("io")), Some(&2.0));
    }

    #[test]
    fn test_string_ids_keep_their_text() {
        let ids: Vec<BodyId> = serde_json::from_str(r#"["007", "7", 7]"#).unwrap();
        assert_eq!(ids[0], BodyId::Name("007".to_string()));
        assert_ne!(ids[0], ids[1]);
        assert_eq!(ids[1], ids[2]);
        assert_eq!(serde_json::to_string(&ids).unwrap(), r#"["007","7",7]"#);

        let radii: std::collections::HashMap<BodyId, f64> =
            serde_json::from_str(r#"{"007": 1.0, "7": 2.0}"#).unwrap();
        assert_eq!(radii.len(), 2);
        assert_eq!(radii.get(&BodyId::from("007")), Some(&1.0));
        assert_eq!(radii.get(&BodyId::Index(7)), Some(&2.0));
        assert!(radii.get(&BodyId::from("+7")).is_none());
    }

    #[test]
    fn test_id_ordering_is_consistent_with_equality() {
        let mut set = std::collections::BTreeSet::new();
        set.insert(BodyId::Index(7));
        set.insert(BodyId::from("7"));
        set.insert(BodyId::from("07"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_body_type_aliases() {
        let t: BodyType = serde_json::from_str(r#""gasGiant""#).unwrap();
        assert_eq!(t, BodyType::GasGiant);
        let t: BodyType = serde_json::from_str(r#""ring""#).unwrap();
        assert_eq!(t, BodyType::RingSystem);
        let t: BodyType = serde_json::from_str(r#""space_station""#).unwrap();
        assert_eq!(t, BodyType::Other);
        assert!(BodyType::DwarfPlanet.is_rocky_satellite());
        assert!(!BodyType::GasGiant.is_rocky_satellite());
    }

    #[test]
    fn test_with_state_preserves_identity() {
        let body = PhysicsBody::new("a", 2.0, Vector3::new(1.0, 0.0, 0.0), Vector3::zeros());
        let moved = body.with_state(Vector3::new(5.0, 0.0, 0.0), Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(moved.id, body.id);
        assert_eq!(moved.mass, 2.0);
        assert_eq!(body.position.x, 1.0);
        assert_eq!(moved.momentum(), Vector3::new(0.0, 2.0, 0.0));
    }

    #[test]
    fn test_non_finite_detection() {
        let body = PhysicsBody::new(1u64, 1.0, Vector3::new(f64::NAN, 0.0, 0.0), Vector3::zeros());
        assert!(!body.is_finite());
        assert_eq!(unit_or_zero(&Vector3::zeros()), Vector3::zeros());
    }
}
