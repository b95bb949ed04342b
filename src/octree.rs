// Barnes-Hut Octree - Hierarchical spatial index for approximate N-body gravity
//
// Nodes live in a flat arena and reference their children by index, so the
// whole tree is dropped or rebuilt in one go every step. Aggregate mass and
// center of mass are updated along the insertion path.

use crate::body::{PhysicsBody, Vector3};
use crate::constants::{
    DEFAULT_OCTREE_MAX_DEPTH, DEFAULT_OCTREE_MIN_CELL_SIZE, DEFAULT_OCTREE_SIZE,
    DEFAULT_SOFTENING_LENGTH, G,
};
use crate::forces::softened_force;

// =============================================================================
// CONFIGURATION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeConfig {
    /// Root cube center (m)
    pub center: Vector3,
    /// Full width of the root cube (m)
    pub size: f64,
    /// Deepest level at which a leaf may still subdivide
    pub max_depth: usize,
    /// Cells this wide (m) or smaller never subdivide
    pub min_cell_size: f64,
    /// Softening length ε (m) for the default force law
    pub softening_length: f64,
    /// Gravitational constant for the default force law
    pub g: f64,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            center: Vector3::zeros(),
            size: DEFAULT_OCTREE_SIZE,
            max_depth: DEFAULT_OCTREE_MAX_DEPTH,
            min_cell_size: DEFAULT_OCTREE_MIN_CELL_SIZE,
            softening_length: DEFAULT_SOFTENING_LENGTH,
            g: G,
        }
    }
}

// =============================================================================
// NODES
// =============================================================================

/// Index of a node in the octree arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);

    fn new(index: usize) -> Self {
        debug_assert!(index < u32::MAX as usize, "octree node arena overflow");
        NodeId(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A point mass handed to the force law: either a single body or a node aggregate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMass {
    pub position: Vector3,
    pub mass: f64,
}

/// Force on a target body from a point mass
pub type ForceFn<'a> = dyn Fn(&PhysicsBody, &PointMass) -> Vector3 + 'a;

/// Axis-aligned cube of space.
///
/// Leaves hold bodies directly; once subdivided a node holds none and
/// delegates to its eight children.
#[derive(Debug, Clone)]
pub struct OctreeNode {
    pub center: Vector3,
    pub half_width: f64,
    pub depth: usize,
    pub bodies: Vec<usize>,
    pub children: Option<[NodeId; 8]>,
    pub total_mass: f64,
    pub center_of_mass: Vector3,
}

impl OctreeNode {
    fn empty(center: Vector3, half_width: f64, depth: usize) -> Self {
        Self {
            center,
            half_width,
            depth,
            bodies: Vec::new(),
            children: None,
            total_mass: 0.0,
            // empty node: COM sits at the geometric center
            center_of_mass: center,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn width(&self) -> f64 {
        2.0 * self.half_width
    }

    pub fn contains(&self, point: &Vector3) -> bool {
        let d = point - self.center;
        d.x.abs() <= self.half_width && d.y.abs() <= self.half_width && d.z.abs() <= self.half_width
    }

    /// Octant index: bit 0 = +x, bit 1 = +y, bit 2 = +z
    fn octant(&self, point: &Vector3) -> usize {
        let x_bit = (point.x >= self.center.x) as usize;
        let y_bit = (point.y >= self.center.y) as usize;
        let z_bit = (point.z >= self.center.z) as usize;
        x_bit | (y_bit << 1) | (z_bit << 2)
    }

    fn child_center(&self, octant: usize) -> Vector3 {
        let q = self.half_width * 0.5;
        let sign = |bit: usize| if octant & bit != 0 { q } else { -q };
        self.center + Vector3::new(sign(1), sign(2), sign(4))
    }

    fn absorb(&mut self, position: &Vector3, mass: f64) {
        let total = self.total_mass + mass;
        if total > 0.0 {
            self.center_of_mass = (self.center_of_mass * self.total_mass + position * mass) / total;
        }
        self.total_mass = total;
    }
}

// =============================================================================
// OCTREE
// =============================================================================

#[derive(Debug, Clone)]
pub struct Octree {
    config: OctreeConfig,
    nodes: Vec<OctreeNode>,
    bodies: Vec<PhysicsBody>,
}

impl Octree {
    pub fn new(config: OctreeConfig) -> Self {
        let root = OctreeNode::empty(config.center, config.size * 0.5, 0);
        Self {
            config,
            nodes: vec![root],
            bodies: Vec::new(),
        }
    }

    /// Build a tree holding every body in `bodies`
    pub fn from_bodies(config: OctreeConfig, bodies: &[PhysicsBody]) -> Self {
        let mut tree = Self::new(config);
        for body in bodies {
            tree.insert(body);
        }
        tree
    }

    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    pub fn root(&self) -> &OctreeNode {
        &self.nodes[NodeId::ROOT.index()]
    }

    pub fn node(&self, id: NodeId) -> &OctreeNode {
        &self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn total_mass(&self) -> f64 {
        self.root().total_mass
    }

    pub fn center_of_mass(&self) -> Vector3 {
        self.root().center_of_mass
    }

    /// Deepest level currently present in the arena
    pub fn depth(&self) -> usize {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Reset to an empty root of the same extent, keeping the arena allocations
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.bodies.clear();
        self.nodes
            .push(OctreeNode::empty(self.config.center, self.config.size * 0.5, 0));
    }

    /// Add a body, updating aggregate mass and COM along its insertion path
    pub fn insert(&mut self, body: &PhysicsBody) {
        let body_idx = self.bodies.len();
        self.bodies.push(body.clone());
        self.insert_at(NodeId::ROOT, body_idx);
    }

    fn insert_at(&mut self, start: NodeId, body_idx: usize) {
        let position = self.bodies[body_idx].position;
        let mass = self.bodies[body_idx].mass;
        let mut current = start;

        loop {
            let node = &mut self.nodes[current.index()];
            node.absorb(&position, mass);

            if let Some(children) = node.children {
                current = children[node.octant(&position)];
                continue;
            }

            if node.bodies.is_empty() || !self.can_subdivide(current) {
                self.nodes[current.index()].bodies.push(body_idx);
                return;
            }

            // occupied leaf: split and push the residents one level down
            let residents = std::mem::take(&mut self.nodes[current.index()].bodies);
            let children = self.subdivide(current);
            for resident in residents {
                let octant = self.nodes[current.index()].octant(&self.bodies[resident].position);
                self.insert_at(children[octant], resident);
            }

            let octant = self.nodes[current.index()].octant(&position);
            current = children[octant];
        }
    }

    fn can_subdivide(&self, id: NodeId) -> bool {
        let node = &self.nodes[id.index()];
        node.depth < self.config.max_depth && node.width() > self.config.min_cell_size
    }

    fn subdivide(&mut self, id: NodeId) -> [NodeId; 8] {
        let parent = self.nodes[id.index()].clone();
        let mut children = [NodeId::ROOT; 8];
        for (octant, slot) in children.iter_mut().enumerate() {
            *slot = NodeId::new(self.nodes.len());
            self.nodes.push(OctreeNode::empty(
                parent.child_center(octant),
                parent.half_width * 0.5,
                parent.depth + 1,
            ));
        }
        self.nodes[id.index()].children = Some(children);
        children
    }

    // =========================================================================
    // FORCE EVALUATION
    // =========================================================================

    /// Softened Newtonian force from a point mass, using this tree's G and ε
    pub fn default_force(&self, target: &PhysicsBody, source: &PointMass) -> Vector3 {
        softened_force(
            &target.position,
            target.mass,
            &source.position,
            source.mass,
            self.config.g,
            self.config.softening_length,
        )
    }

    /// Net force on `body` from every other body in the tree.
    ///
    /// Distant nodes (width / distance < `theta`) are collapsed into one mass
    /// at their COM. A node containing the target is always opened and leaf
    /// bodies sharing the target's id are skipped, so self-interaction is zero.
    pub fn calculate_force_on(&self, body: &PhysicsBody, theta: f64, force_fn: Option<&ForceFn<'_>>) -> Vector3 {
        let mut total = Vector3::zeros();
        match force_fn {
            Some(f) => self.accumulate_force(NodeId::ROOT, body, theta, f, &mut total),
            None => {
                let f = |target: &PhysicsBody, source: &PointMass| self.default_force(target, source);
                self.accumulate_force(NodeId::ROOT, body, theta, &f, &mut total);
            }
        }
        total
    }

    /// Gravitational acceleration at `body` (m/s²), defined for massless bodies too
    pub fn calculate_acceleration_on(&self, body: &PhysicsBody, theta: f64) -> Vector3 {
        let probe = PhysicsBody {
            mass: 1.0,
            ..body.clone()
        };
        self.calculate_force_on(&probe, theta, None)
    }

    fn accumulate_force(
        &self,
        id: NodeId,
        target: &PhysicsBody,
        theta: f64,
        force_fn: &ForceFn<'_>,
        total: &mut Vector3,
    ) {
        let node = &self.nodes[id.index()];
        if node.total_mass <= 0.0 {
            return;
        }

        match node.children {
            None => {
                for &idx in &node.bodies {
                    let other = &self.bodies[idx];
                    if other.id == target.id {
                        continue;
                    }
                    let source = PointMass {
                        position: other.position,
                        mass: other.mass,
                    };
                    *total += force_fn(target, &source);
                }
            }
            Some(children) => {
                let distance = (node.center_of_mass - target.position).norm();
                let far_enough =
                    !node.contains(&target.position) && distance > 0.0 && node.width() / distance < theta;

                if far_enough {
                    let source = PointMass {
                        position: node.center_of_mass,
                        mass: node.total_mass,
                    };
                    *total += force_fn(target, &source);
                } else {
                    for child in children {
                        self.accumulate_force(child, target, theta, force_fn, total);
                    }
                }
            }
        }
    }
}

impl Default for Octree {
    fn default() -> Self {
        Self::new(OctreeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_config() -> OctreeConfig {
        OctreeConfig {
            center: Vector3::zeros(),
            size: 100.0,
            max_depth: 20,
            min_cell_size: 1e-6,
            softening_length: 0.0,
            g: 1.0,
        }
    }

    fn body(id: u64, mass: f64, x: f64, y: f64, z: f64) -> PhysicsBody {
        PhysicsBody::new(id, mass, Vector3::new(x, y, z), Vector3::zeros())
    }

    #[test]
    fn test_empty_tree_has_center_com() {
        let tree = Octree::new(unit_config());
        assert_eq!(tree.total_mass(), 0.0);
        assert_eq!(tree.center_of_mass(), Vector3::zeros());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_no_self_force() {
        let b = body(1, 5.0, 3.0, -2.0, 1.0);
        let tree = Octree::from_bodies(unit_config(), std::slice::from_ref(&b));
        assert_eq!(tree.calculate_force_on(&b, 0.7, None), Vector3::zeros());
    }

    #[test]
    fn test_aggregate_mass_and_com() {
        let bodies = vec![
            body(1, 1.0, 10.0, 0.0, 0.0),
            body(2, 3.0, -10.0, 0.0, 0.0),
            body(3, 4.0, 0.0, 20.0, 5.0),
        ];
        let tree = Octree::from_bodies(unit_config(), &bodies);
        assert!((tree.total_mass() - 8.0).abs() < 1e-12);
        let expected = (Vector3::new(10.0, 0.0, 0.0) * 1.0
            + Vector3::new(-10.0, 0.0, 0.0) * 3.0
            + Vector3::new(0.0, 20.0, 5.0) * 4.0)
            / 8.0;
        assert!((tree.center_of_mass() - expected).norm() < 1e-12);
        assert!(!tree.root().is_leaf());
    }

    #[test]
    fn test_every_subtree_aggregate_matches_its_bodies() {
        let bodies: Vec<PhysicsBody> = (0..40)
            .map(|i| {
                let f = i as f64;
                body(i, 1.0 + f * 0.1, (f * 0.37).sin() * 40.0, (f * 0.13).cos() * 40.0, (f * 0.07).sin() * 40.0)
            })
            .collect();
        let tree = Octree::from_bodies(unit_config(), &bodies);

        fn collect(tree: &Octree, id: NodeId, out: &mut Vec<usize>) {
            let node = tree.node(id);
            out.extend(node.bodies.iter().copied());
            if let Some(children) = node.children {
                for c in children {
                    collect(tree, c, out);
                }
            }
        }

        for i in 0..tree.node_count() {
            let id = NodeId::new(i);
            let mut members = Vec::new();
            collect(&tree, id, &mut members);
            let mass: f64 = members.iter().map(|&m| tree.bodies[m].mass).sum();
            assert!((tree.node(id).total_mass - mass).abs() < 1e-9);
            if mass > 0.0 {
                let com: Vector3 = members
                    .iter()
                    .map(|&m| tree.bodies[m].position * tree.bodies[m].mass)
                    .sum::<Vector3>()
                    / mass;
                assert!((tree.node(id).center_of_mass - com).norm() < 1e-9);
            } else {
                assert_eq!(tree.node(id).center_of_mass, tree.node(id).center);
            }
        }
    }

    #[test]
    fn test_two_bodies_match_direct_force() {
        let a = body(1, 2.0, -5.0, 0.0, 0.0);
        let b = body(2, 3.0, 5.0, 0.0, 0.0);
        let tree = Octree::from_bodies(unit_config(), &[a.clone(), b]);
        let f = tree.calculate_force_on(&a, 0.7, None);
        assert!((f.x - 2.0 * 3.0 / 100.0).abs() < 1e-12);
        assert!(f.y.abs() < 1e-15);
    }

    #[test]
    fn test_coincident_bodies_stop_at_max_depth() {
        let config = OctreeConfig {
            max_depth: 6,
            ..unit_config()
        };
        let bodies = vec![body(1, 1.0, 1.0, 1.0, 1.0), body(2, 1.0, 1.0, 1.0, 1.0), body(3, 1.0, 1.0, 1.0, 1.0)];
        let tree = Octree::from_bodies(config, &bodies);
        assert_eq!(tree.depth(), 6);
        assert!((tree.total_mass() - 3.0).abs() < 1e-12);
        // coincident neighbours produce no force without softening
        assert_eq!(tree.calculate_force_on(&bodies[0], 0.7, None), Vector3::zeros());
    }

    #[test]
    fn test_min_cell_size_forces_shared_leaf() {
        let config = OctreeConfig {
            min_cell_size: 60.0,
            ..unit_config()
        };
        let bodies = vec![body(1, 1.0, 1.0, 1.0, 1.0), body(2, 1.0, 2.0, 2.0, 2.0), body(3, 1.0, 3.0, 1.0, 1.0)];
        let tree = Octree::from_bodies(config, &bodies);
        // root (100 m) splits once; 50 m children never split
        assert_eq!(tree.node_count(), 9);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn test_clear_resets_to_empty_root() {
        let mut tree = Octree::from_bodies(unit_config(), &[body(1, 1.0, 1.0, 0.0, 0.0), body(2, 1.0, -1.0, 0.0, 0.0)]);
        tree.clear();
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.total_mass(), 0.0);
        assert_eq!(tree.root().half_width, 50.0);
        tree.insert(&body(3, 2.0, 4.0, 0.0, 0.0));
        assert!((tree.center_of_mass().x - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_custom_force_fn_is_used() {
        let a = body(1, 1.0, 0.0, 0.0, 0.0);
        let b = body(2, 1.0, 10.0, 0.0, 0.0);
        let tree = Octree::from_bodies(unit_config(), &[a.clone(), b]);
        let constant = |_: &PhysicsBody, _: &PointMass| Vector3::new(1.0, 1.0, 1.0);
        assert_eq!(tree.calculate_force_on(&a, 0.7, Some(&constant)), Vector3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_massless_probe_acceleration() {
        let sun = body(1, 100.0, 0.0, 0.0, 0.0);
        let probe = body(2, 0.0, 10.0, 0.0, 0.0);
        let tree = Octree::from_bodies(unit_config(), &[sun, probe.clone()]);
        let a = tree.calculate_acceleration_on(&probe, 0.7);
        assert!((a.x + 1.0).abs() < 1e-12);
    }
}
