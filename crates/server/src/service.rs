use crate::{error::ApiError, state::SceneState};
use glam::Vec3;
use octree::{Octree, Voxel};
use serde::Serialize;
use std::time::Instant;

/// Wire shape of a voxel query reply. Field names (`rootSize`, `treeDepth`,
/// `c`/`o`/`d`) are what the visualizer client expects.
#[derive(Debug, Serialize)]
pub struct QueryReply {
    #[serde(rename = "rootSize")]
    pub root_size: f32,
    #[serde(rename = "treeDepth")]
    pub tree_depth: u32,
    pub voxels: Vec<VoxelDto>,
}

#[derive(Debug, Serialize)]
pub struct VoxelDto {
    pub c: Coordinates,
    pub o: bool,
    pub d: u32,
}

#[derive(Debug, Serialize)]
pub struct Coordinates {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<&Voxel> for VoxelDto {
    fn from(voxel: &Voxel) -> Self {
        Self {
            c: Coordinates {
                x: voxel.center.x,
                y: voxel.center.y,
                z: voxel.center.z,
            },
            o: voxel.occupied,
            d: voxel.depth,
        }
    }
}

/// Transport-free service operations behind the HTTP gateway.
#[derive(Debug, Clone)]
pub struct OctreeService {
    state: SceneState,
    default_depth: u32,
}

impl OctreeService {
    pub fn new(default_depth: u32) -> Self {
        Self {
            state: SceneState::new(),
            default_depth,
        }
    }

    pub fn default_depth(&self) -> u32 {
        self.default_depth
    }

    /// Builds a tree from a decoded cloud, installs it as the current tree
    /// (discarding the previous one) and replies with the default-depth
    /// voxel view. The build runs on the blocking pool; it has no
    /// cancellation or timeout, arbitrarily large clouds run to completion.
    pub async fn submit_cloud(
        &self,
        points: Vec<Vec3>,
        resolution: f32,
    ) -> Result<QueryReply, ApiError> {
        let count = points.len();
        let started = Instant::now();
        let tree = tokio::task::spawn_blocking(move || Octree::build(points, resolution))
            .await
            .map_err(|err| ApiError::Internal(format!("octree build task failed: {err}")))??;
        tracing::info!(
            points = count,
            resolution,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "octree built"
        );

        let tree = self.state.install(tree).await;
        Ok(materialize(&tree, self.default_depth))
    }

    /// Depth-bounded voxel view of the current tree. Fails with
    /// [`ApiError::NoTree`] before the first successful submission.
    pub async fn get_voxels(&self, max_depth: u32) -> Result<QueryReply, ApiError> {
        let tree = self.state.snapshot().await.ok_or(ApiError::NoTree)?;
        let started = Instant::now();
        let reply = materialize(&tree, max_depth);
        tracing::info!(
            max_depth,
            voxels = reply.voxels.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "materialized voxels"
        );
        Ok(reply)
    }
}

fn materialize(tree: &Octree, max_depth: u32) -> QueryReply {
    let voxels = tree.voxels(max_depth);
    QueryReply {
        root_size: tree.root_size(),
        tree_depth: max_depth,
        voxels: voxels.iter().map(VoxelDto::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use octree::BuildError;

    fn sample_points() -> Vec<Vec3> {
        vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)]
    }

    #[tokio::test]
    async fn test_query_before_submit_is_a_state_error() {
        let service = OctreeService::new(5);
        assert!(matches!(
            service.get_voxels(3).await,
            Err(ApiError::NoTree)
        ));
    }

    #[tokio::test]
    async fn test_submit_replies_with_default_depth_view() {
        let service = OctreeService::new(1);
        let reply = service.submit_cloud(sample_points(), 1.0).await.unwrap();
        assert_eq!(reply.root_size, 16.0);
        assert_eq!(reply.tree_depth, 1);
        assert_eq!(reply.voxels.len(), 8);
        assert_eq!(reply.voxels.iter().filter(|v| v.o).count(), 2);
    }

    #[tokio::test]
    async fn test_query_after_submit() {
        let service = OctreeService::new(5);
        service.submit_cloud(sample_points(), 1.0).await.unwrap();

        let reply = service.get_voxels(0).await.unwrap();
        assert_eq!(reply.voxels.len(), 1);
        assert!(reply.voxels[0].o);
        assert_eq!(reply.voxels[0].d, 0);
    }

    #[tokio::test]
    async fn test_empty_cloud_is_an_input_error() {
        let service = OctreeService::new(5);
        assert!(matches!(
            service.submit_cloud(Vec::new(), 1.0).await,
            Err(ApiError::Build(BuildError::EmptyCloud))
        ));
    }

    #[tokio::test]
    async fn test_bad_resolution_is_an_input_error() {
        let service = OctreeService::new(5);
        assert!(matches!(
            service.submit_cloud(sample_points(), 0.0).await,
            Err(ApiError::Build(BuildError::NonPositiveResolution(_)))
        ));
    }

    #[tokio::test]
    async fn test_resubmission_replaces_the_tree() {
        let service = OctreeService::new(0);
        service.submit_cloud(sample_points(), 1.0).await.unwrap();
        let reply = service
            .submit_cloud(vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)], 0.1)
            .await
            .unwrap();
        assert_eq!(reply.root_size, 2.0);

        let queried = service.get_voxels(0).await.unwrap();
        assert_eq!(queried.root_size, 2.0);
    }

    #[tokio::test]
    async fn test_reply_wire_shape() {
        let service = OctreeService::new(5);
        service.submit_cloud(sample_points(), 1.0).await.unwrap();
        let reply = service.get_voxels(0).await.unwrap();

        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["rootSize"], serde_json::json!(16.0));
        assert_eq!(value["treeDepth"], serde_json::json!(0));
        let voxel = &value["voxels"][0];
        assert_eq!(voxel["c"]["x"], serde_json::json!(0.0));
        assert_eq!(voxel["o"], serde_json::json!(true));
        assert_eq!(voxel["d"], serde_json::json!(0));
    }
}
