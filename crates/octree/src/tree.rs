use crate::{octant::Octant, preprocess, voxel::Voxel};
use glam::Vec3;
use thiserror::Error;

/// Errors from tree construction. Both are caller input problems; a built
/// tree itself has no failure modes.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("point cloud is empty")]
    EmptyCloud,
    #[error("resolution must be a positive number, got {0}")]
    NonPositiveResolution(f32),
}

/// A node of the sparse point-region octree.
///
/// Children are lazily materialized: an absent slot is an empty octant, not
/// an unexplored one. A node keeps a point while it is a leaf; once it
/// subdivides, the point sinks into a child. Nodes whose half-extent has
/// fallen below the build resolution stay leaves forever and keep the first
/// point that reached them.
#[derive(Debug)]
pub struct OctreeNode {
    center: Vec3,
    half_size: f32,
    depth: u32,
    children: [Option<Box<OctreeNode>>; 8],
    point: Option<Vec3>,
}

impl OctreeNode {
    fn new(center: Vec3, half_size: f32, depth: u32) -> Self {
        Self {
            center,
            half_size,
            depth,
            children: std::array::from_fn(|_| None),
            point: None,
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn half_size(&self) -> f32 {
        self.half_size
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(|child| child.is_none())
    }

    pub fn holds_point(&self) -> bool {
        self.point.is_some()
    }

    pub fn child(&self, octant: Octant) -> Option<&OctreeNode> {
        self.children[octant.index()].as_deref()
    }

    /// Center a child in `octant` has, whether or not it is materialized.
    pub(crate) fn child_center(&self, octant: Octant) -> Vec3 {
        self.center + octant.sign() * (self.half_size / 2.0)
    }

    fn spawn_child(&mut self, octant: Octant) -> &mut OctreeNode {
        let quarter = self.half_size / 2.0;
        let center = self.center + octant.sign() * quarter;
        let depth = self.depth + 1;
        self.children[octant.index()]
            .get_or_insert_with(|| Box::new(OctreeNode::new(center, quarter, depth)))
    }

    fn insert(&mut self, point: Vec3, resolution: f32) {
        // Resolution floor: this node is terminal. It keeps the first point
        // that arrives; later points landing here are dropped, not averaged.
        if self.half_size < resolution {
            if self.point.is_none() {
                self.point = Some(point);
            }
            return;
        }

        if self.is_leaf() {
            let Some(existing) = self.point.take() else {
                self.point = Some(point);
                return;
            };
            // Occupied leaf: subdivide, re-sinking the stored point next to
            // the new one. Only the octants actually hit get materialized.
            let old_octant = Octant::containing(existing, self.center);
            let new_octant = Octant::containing(point, self.center);
            self.spawn_child(old_octant).insert(existing, resolution);
            self.spawn_child(new_octant).insert(point, resolution);
        } else {
            let octant = Octant::containing(point, self.center);
            self.spawn_child(octant).insert(point, resolution);
        }
    }
}

/// An immutable, frozen point-region octree over a centered point cloud.
#[derive(Debug)]
pub struct Octree {
    root: OctreeNode,
    resolution: f32,
}

impl Octree {
    /// Builds a tree from a raw (uncentered) point cloud. The cloud is
    /// centered on its centroid and inserted point by point; subdivision
    /// stops once a node's half-extent falls below `resolution`.
    pub fn build(mut points: Vec<Vec3>, resolution: f32) -> Result<Self, BuildError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(BuildError::NonPositiveResolution(resolution));
        }

        let half_size = preprocess::center_cloud(&mut points)?;
        let mut root = OctreeNode::new(Vec3::ZERO, half_size, 0);
        for point in points {
            root.insert(point, resolution);
        }

        Ok(Self { root, resolution })
    }

    pub fn root(&self) -> &OctreeNode {
        &self.root
    }

    /// Full edge length of the root cube.
    pub fn root_size(&self) -> f32 {
        self.root.half_size * 2.0
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// Materializes voxels for every octant down to `max_depth`. See
    /// [`crate::voxel::collect`].
    pub fn voxels(&self, max_depth: u32) -> Vec<Voxel> {
        crate::voxel::collect(&self.root, max_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk<'a>(node: &'a OctreeNode, out: &mut Vec<&'a OctreeNode>) {
        out.push(node);
        for octant in Octant::all() {
            if let Some(child) = node.child(octant) {
                walk(child, out);
            }
        }
    }

    #[test]
    fn test_rejects_empty_cloud() {
        assert!(matches!(
            Octree::build(Vec::new(), 1.0),
            Err(BuildError::EmptyCloud)
        ));
    }

    #[test]
    fn test_rejects_non_positive_resolution() {
        let points = vec![Vec3::ZERO];
        assert!(matches!(
            Octree::build(points.clone(), 0.0),
            Err(BuildError::NonPositiveResolution(_))
        ));
        assert!(matches!(
            Octree::build(points.clone(), -0.5),
            Err(BuildError::NonPositiveResolution(_))
        ));
        assert!(matches!(
            Octree::build(points, f32::NAN),
            Err(BuildError::NonPositiveResolution(_))
        ));
    }

    #[test]
    fn test_two_point_cloud_scenario() {
        // Centroid (5,0,0), centered points (-5,0,0) and (5,0,0), root
        // half-extent rounds 5 up to 8.
        let points = vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)];
        let tree = Octree::build(points, 1.0).unwrap();
        assert_eq!(tree.root_size(), 16.0);

        let voxels = tree.voxels(1);
        assert_eq!(voxels.len(), 8);
        assert_eq!(voxels.iter().filter(|v| v.occupied).count(), 2);
        assert_eq!(voxels.iter().filter(|v| !v.occupied).count(), 6);
    }

    #[test]
    fn test_node_half_size_halves_per_depth() {
        let points = vec![
            Vec3::new(-3.0, -3.0, -3.0),
            Vec3::new(3.0, 3.0, 3.0),
            Vec3::new(3.0, -3.0, 3.0),
            Vec3::new(-2.9, -3.1, -3.0),
        ];
        let tree = Octree::build(points, 0.25).unwrap();

        let mut nodes = Vec::new();
        walk(tree.root(), &mut nodes);
        let root_half = tree.root().half_size();
        for node in nodes {
            let expected = root_half / 2f32.powi(node.depth() as i32);
            assert!((node.half_size() - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_points_only_live_in_leaves() {
        let points = vec![
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(-4.0, 0.5, 2.0),
            Vec3::new(1.1, 2.1, 3.1),
            Vec3::new(-4.0, 0.5, -2.0),
        ];
        let tree = Octree::build(points, 0.5).unwrap();

        let mut nodes = Vec::new();
        walk(tree.root(), &mut nodes);
        for node in nodes {
            if node.holds_point() {
                assert!(node.is_leaf());
            }
        }
    }

    #[test]
    fn test_terminal_leaf_keeps_first_point() {
        // All points identical: after centering they collapse to the
        // origin and chase the same octant path down to the resolution
        // floor. The first arrival sticks, the rest are dropped.
        let points = vec![Vec3::new(2.0, 2.0, 2.0); 5];
        let tree = Octree::build(points, 0.5).unwrap();

        let mut nodes = Vec::new();
        walk(tree.root(), &mut nodes);
        let holders: Vec<_> = nodes.iter().filter(|n| n.holds_point()).collect();
        assert_eq!(holders.len(), 1);
        assert!(holders[0].half_size() < 0.5);
    }

    #[test]
    fn test_subdivision_stops_at_resolution() {
        // (1,1,1) and (1.1,1,1) chase each other down until the resolution
        // floor cuts the subdivision off and merges them; the mirrored pair
        // separates one level earlier. Centroid is exactly the origin, so
        // the geometry below is deterministic: root half-extent 2.
        let points = vec![
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(1.1, 1.0, 1.0),
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(-1.1, -1.0, -1.0),
        ];
        let tree = Octree::build(points, 0.5).unwrap();
        assert_eq!(tree.root_size(), 4.0);
        assert_eq!(tree.resolution(), 0.5);

        let mut nodes = Vec::new();
        walk(tree.root(), &mut nodes);
        for node in &nodes {
            // Internal nodes never sit below the resolution floor.
            if !node.is_leaf() {
                assert!(node.half_size() >= 0.5);
            }
        }
        // The close pair shares one terminal leaf (second point dropped),
        // the mirrored pair splits into two leaves.
        assert_eq!(nodes.iter().filter(|n| n.holds_point()).count(), 3);
    }

    #[test]
    fn test_sparse_children_only_where_points_fall() {
        // Two points in opposite octants: the root materializes exactly two
        // children.
        let points = vec![Vec3::new(-6.0, -6.0, -6.0), Vec3::new(6.0, 6.0, 6.0)];
        let tree = Octree::build(points, 1.0).unwrap();

        let materialized = Octant::all()
            .iter()
            .filter(|&&o| tree.root().child(o).is_some())
            .count();
        assert_eq!(materialized, 2);
    }
}
