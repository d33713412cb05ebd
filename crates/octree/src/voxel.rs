use crate::{octant::Octant, tree::OctreeNode};
use glam::Vec3;

/// An axis-aligned cube descriptor emitted for visualization. Never stored
/// in the tree; produced fresh on every materialization call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voxel {
    pub center: Vec3,
    /// Full edge length of the cube (twice the node half-extent).
    pub size: f32,
    pub occupied: bool,
    pub depth: u32,
}

/// Walks the tree down to `max_depth` and emits one voxel per visited
/// octant. Absent octants synthesize a transient unoccupied descriptor one
/// level down; by construction they have no content at any deeper level, so
/// the walk never recurses into them.
pub fn collect(root: &OctreeNode, max_depth: u32) -> Vec<Voxel> {
    let mut voxels = Vec::new();
    collect_into(root, max_depth, &mut voxels);
    voxels
}

fn collect_into(node: &OctreeNode, max_depth: u32, voxels: &mut Vec<Voxel>) {
    if node.depth() == max_depth {
        // Depth cap: the whole subtree collapses into one voxel, occupied
        // iff anything lives beneath this node.
        voxels.push(Voxel {
            center: node.center(),
            size: node.half_size() * 2.0,
            occupied: node.holds_point() || !node.is_leaf(),
            depth: node.depth(),
        });
        return;
    }

    if node.is_leaf() {
        voxels.push(Voxel {
            center: node.center(),
            size: node.half_size() * 2.0,
            occupied: node.holds_point(),
            depth: node.depth(),
        });
        return;
    }

    for octant in Octant::all() {
        match node.child(octant) {
            Some(child) => collect_into(child, max_depth, voxels),
            // Empty octant: emit a placeholder sized like the missing
            // child and stop, nothing exists beneath it.
            None => voxels.push(Voxel {
                center: node.child_center(octant),
                size: node.half_size(),
                occupied: false,
                depth: node.depth() + 1,
            }),
        }
    }
}
