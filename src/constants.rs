// Physical Constants & Engine Defaults
// SI units throughout; tuning defaults mirror the driver-facing parameter bundle

// =============================================================================
// PHYSICAL CONSTANTS (SI Units)
// =============================================================================

/// Gravitational constant (m³/(kg·s²))
pub const G: f64 = 6.67430e-11;

/// Speed of light (m/s)
pub const C: f64 = 299792458.0;

/// Astronomical Unit in meters
pub const AU: f64 = 1.495978707e11;

/// Sun mass (kg)
pub const MASS_SUN: f64 = 1.989e30;

/// Sun radius (m)
pub const RADIUS_SUN: f64 = 6.96e8;

/// Earth mass (kg)
pub const MASS_EARTH: f64 = 5.972e24;

/// Earth's equatorial radius (m)
pub const R_EARTH: f64 = 6.378137e6;

/// Moon mass (kg)
pub const MASS_MOON: f64 = 7.342e22;

// =============================================================================
// NUMERICAL GUARDS
// =============================================================================

/// Separations below this (m) produce zero pairwise force instead of NaN/Infinity
pub const MIN_SEPARATION: f64 = 1e-10;

/// Below this an eccentricity is treated as circular and an inclination as equatorial
pub const ORBIT_EPSILON: f64 = 1e-11;

/// Fixed Newton-Raphson iteration count for Kepler's equation
pub const KEPLER_ITERATIONS: usize = 5;

// =============================================================================
// ENGINE DEFAULTS
// =============================================================================

/// Octree root cube width (m)
pub const DEFAULT_OCTREE_SIZE: f64 = 5e13;

/// Octree recursion bound
pub const DEFAULT_OCTREE_MAX_DEPTH: usize = 20;

/// Octree cells at or below this width (m) never subdivide
pub const DEFAULT_OCTREE_MIN_CELL_SIZE: f64 = 1.0;

/// Gravitational softening length (m)
pub const DEFAULT_SOFTENING_LENGTH: f64 = 1e6;

/// Barnes-Hut opening angle
pub const DEFAULT_BARNES_HUT_THETA: f64 = 0.7;

/// General-case collisions below this mass ratio (min/max) merge instead of bouncing
pub const DEFAULT_MASS_RATIO_THRESHOLD: f64 = 0.1;

/// Coefficient of restitution for elastic collisions (1.0 = perfectly elastic)
pub const DEFAULT_RESTITUTION: f64 = 1.0;

/// Physics ticks a single frame may emit before the backlog is dropped
pub const DEFAULT_MAX_TICKS_PER_FRAME: usize = 5;
