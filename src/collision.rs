// Collision Subsystem - Sphere overlap detection and type-aware resolution
//
// Pairs are visited in input index order (i < j) and resolved one at a time,
// so a body's post-impact velocity feeds its later pairs within the same pass.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::body::{BodyId, BodyType, PhysicsBody, Vector3};
use crate::config::{CollisionPolicy, SimulationParams};

// =============================================================================
// RECORDS
// =============================================================================

/// Geometry of one overlapping pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionRecord {
    pub body1: BodyId,
    pub body2: BodyId,
    pub contact_point: Vector3,
    /// Overlap depth r1 + r2 − d (m)
    pub penetration_depth: f64,
    /// Unit normal pointing from body2 toward body1
    pub normal: Vector3,
    /// v1 − v2 (m/s)
    pub relative_velocity: Vector3,
}

/// One or two bodies removed by a collision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestructionEvent {
    /// None for mutual destruction
    pub survivor: Option<BodyId>,
    pub destroyed: Vec<BodyId>,
    pub impact_position: Vector3,
    pub relative_velocity: Vector3,
    pub destroyed_radius: f64,
}

impl DestructionEvent {
    pub fn is_mutual(&self) -> bool {
        self.survivor.is_none()
    }
}

// =============================================================================
// DETECTION
// =============================================================================

/// Sphere-sphere overlap test; touching or separated spheres report nothing
pub fn detect_sphere_collision(
    body1: &PhysicsBody,
    radius1: f64,
    body2: &PhysicsBody,
    radius2: f64,
) -> Option<CollisionRecord> {
    let delta = body1.position - body2.position;
    let dist_sq = delta.norm_squared();
    let radius_sum = radius1 + radius2;

    if dist_sq >= radius_sum * radius_sum {
        return None;
    }

    let distance = dist_sq.sqrt();
    let normal = if distance > 0.0 {
        delta / distance
    } else {
        // coincident centres: any axis will do, pick +x
        Vector3::x()
    };
    let penetration_depth = radius_sum - distance;
    let contact_point = body2.position + normal * (radius2 - penetration_depth * 0.5);

    Some(CollisionRecord {
        body1: body1.id.clone(),
        body2: body2.id.clone(),
        contact_point,
        penetration_depth,
        normal,
        relative_velocity: body1.velocity - body2.velocity,
    })
}

// =============================================================================
// TYPE DISPATCH
// =============================================================================

/// Which side of a pair is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

/// Outcome chosen for a colliding pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Ring systems never collide
    Ignore,
    /// Two stars merge, heavier one survives
    StarMerger(Side),
    /// A star swallows a non-star
    StarAbsorption(Side),
    /// Two moons annihilate each other
    MutualDestruction,
    /// Impulse exchange along the normal
    Elastic,
    /// Momentum-conserving merger, heavier one survives
    Absorption(Side),
}

fn heavier(mass1: f64, mass2: f64) -> Side {
    if mass2 > mass1 {
        Side::Second
    } else {
        Side::First
    }
}

/// Resolution for a pair by category, in priority order
pub fn classify_collision(
    type1: BodyType,
    mass1: f64,
    type2: BodyType,
    mass2: f64,
    policy: &CollisionPolicy,
) -> Resolution {
    use BodyType::*;

    match (type1, type2) {
        (RingSystem, _) | (_, RingSystem) => Resolution::Ignore,
        (Star, Star) => Resolution::StarMerger(heavier(mass1, mass2)),
        (Star, _) => Resolution::StarAbsorption(Side::First),
        (_, Star) => Resolution::StarAbsorption(Side::Second),
        (Moon, Moon) => Resolution::MutualDestruction,
        (t, GasGiant) if t.is_rocky_satellite() => Resolution::Elastic,
        (GasGiant, t) if t.is_rocky_satellite() => Resolution::Elastic,
        _ => {
            let max = mass1.max(mass2);
            if max > 0.0 && mass1.min(mass2) / max < policy.mass_ratio_threshold {
                Resolution::Absorption(heavier(mass1, mass2))
            } else {
                Resolution::Elastic
            }
        }
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// Impulse exchange along the contact normal.
///
/// Returns `None` when the pair is already separating or either mass is
/// non-positive.
pub fn resolve_elastic(
    body1: &PhysicsBody,
    body2: &PhysicsBody,
    record: &CollisionRecord,
    restitution: f64,
) -> Option<(PhysicsBody, PhysicsBody)> {
    if body1.mass <= 0.0 || body2.mass <= 0.0 {
        return None;
    }

    let vn = record.relative_velocity.dot(&record.normal);
    if vn > 0.0 {
        return None;
    }

    let inv1 = 1.0 / body1.mass;
    let inv2 = 1.0 / body2.mass;
    let j = -(1.0 + restitution) * vn / (inv1 + inv2);
    let impulse = record.normal * j;

    Some((
        body1.with_velocity(body1.velocity + impulse * inv1),
        body2.with_velocity(body2.velocity - impulse * inv2),
    ))
}

/// Survivor after swallowing `destroyed`: summed mass, total momentum / total mass
pub fn absorb(survivor: &PhysicsBody, destroyed: &PhysicsBody) -> PhysicsBody {
    let total_mass = survivor.mass + destroyed.mass;
    let velocity = if total_mass > 0.0 {
        (survivor.momentum() + destroyed.momentum()) / total_mass
    } else {
        survivor.velocity
    };
    PhysicsBody {
        mass: total_mass,
        ..survivor.with_velocity(velocity)
    }
}

// =============================================================================
// BATCH HANDLING
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionOutcome {
    /// Surviving bodies in input order
    pub bodies: Vec<PhysicsBody>,
    pub destroyed_ids: BTreeSet<BodyId>,
    pub events: Vec<DestructionEvent>,
}

/// Detect and resolve every overlapping pair of live bodies.
///
/// Pairs lacking a radius or category are skipped with a warning.
pub fn handle_collisions(bodies: &[PhysicsBody], params: &SimulationParams) -> CollisionOutcome {
    let mut working: Vec<PhysicsBody> = bodies.to_vec();
    let mut destroyed = vec![false; working.len()];
    let mut destroyed_ids = BTreeSet::new();
    let mut events = Vec::new();
    let policy = &params.collision_policy;

    for i in 0..working.len() {
        for j in (i + 1)..working.len() {
            if destroyed[i] || destroyed[j] {
                continue;
            }

            let (id1, id2) = (&working[i].id, &working[j].id);
            let (r1, r2) = match (params.radius_of(id1), params.radius_of(id2)) {
                (Some(r1), Some(r2)) => (r1, r2),
                _ => {
                    warn!("missing radius for pair ({}, {}), collision check skipped", id1, id2);
                    continue;
                }
            };

            let Some(record) = detect_sphere_collision(&working[i], r1, &working[j], r2) else {
                continue;
            };

            let (t1, t2) = match (params.body_type_of(id1), params.body_type_of(id2)) {
                (Some(t1), Some(t2)) => (t1, t2),
                _ => {
                    warn!("missing body type for pair ({}, {}), collision skipped", id1, id2);
                    continue;
                }
            };

            let resolution = classify_collision(t1, working[i].mass, t2, working[j].mass, policy);
            debug!("collision {} <-> {}: {:?}", record.body1, record.body2, resolution);

            match resolution {
                Resolution::Ignore => {}
                Resolution::Elastic => {
                    if let Some((a, b)) = resolve_elastic(&working[i], &working[j], &record, policy.restitution) {
                        working[i] = a;
                        working[j] = b;
                    }
                }
                Resolution::MutualDestruction => {
                    destroyed[i] = true;
                    destroyed[j] = true;
                    destroyed_ids.insert(record.body1.clone());
                    destroyed_ids.insert(record.body2.clone());
                    info!("mutual destruction of {} and {}", record.body1, record.body2);
                    events.push(DestructionEvent {
                        survivor: None,
                        destroyed: vec![record.body1.clone(), record.body2.clone()],
                        impact_position: record.contact_point,
                        relative_velocity: record.relative_velocity,
                        destroyed_radius: r1.max(r2),
                    });
                }
                Resolution::StarMerger(side) | Resolution::StarAbsorption(side) | Resolution::Absorption(side) => {
                    let (keep, lose, lost_radius) = match side {
                        Side::First => (i, j, r2),
                        Side::Second => (j, i, r1),
                    };
                    let merged = absorb(&working[keep], &working[lose]);
                    let lost_id = working[lose].id.clone();
                    info!("{} absorbed {}", merged.id, lost_id);
                    events.push(DestructionEvent {
                        survivor: Some(merged.id.clone()),
                        destroyed: vec![lost_id.clone()],
                        impact_position: record.contact_point,
                        relative_velocity: record.relative_velocity,
                        destroyed_radius: lost_radius,
                    });
                    working[keep] = merged;
                    destroyed[lose] = true;
                    destroyed_ids.insert(lost_id);
                }
            }
        }
    }

    let bodies = working
        .into_iter()
        .zip(destroyed)
        .filter_map(|(body, gone)| (!gone).then_some(body))
        .collect();

    CollisionOutcome {
        bodies,
        destroyed_ids,
        events,
    }
}
