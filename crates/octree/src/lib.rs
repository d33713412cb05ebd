//! Sparse point-region octree for point-cloud voxelization.
//!
//! The crate covers the full pipeline from a raw point cloud to a
//! depth-bounded voxel view: [`preprocess`] centers the cloud and sizes the
//! cubic root region, [`tree`] builds the adaptive, resolution-limited
//! octree, and [`voxel`] materializes occupancy descriptors for
//! visualization. Everything here is pure, synchronous computation; file
//! decoding and transport live with the callers.

pub mod octant;
pub mod preprocess;
pub mod tree;
pub mod voxel;

pub use glam;
pub use octant::Octant;
pub use tree::{BuildError, Octree, OctreeNode};
pub use voxel::Voxel;
