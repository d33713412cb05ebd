//! Cloudtree server crate.
//!
//! HTTP/JSON gateway over the `octree` crate: clients POST a PCD point
//! cloud together with a target resolution, the server builds a fresh
//! octree from it and serves depth-bounded voxel views for visualization.
//! The modules exposed here cover configuration, PCD decoding, the shared
//! current-tree handle and the axum transport.

pub mod config;
pub mod error;
pub mod http;
pub mod pcd;
pub mod service;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use http::{router, AppState};
pub use service::{OctreeService, QueryReply, VoxelDto};
pub use state::SceneState;
