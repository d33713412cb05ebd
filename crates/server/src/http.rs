use crate::{error::ApiError, pcd, service::{OctreeService, QueryReply}};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Shared state handed to every handler. Cheap to clone: the service is an
/// `Arc` handle underneath.
#[derive(Clone)]
pub struct AppState {
    pub service: OctreeService,
    pub upload_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(hello))
        .route("/octree", get(get_octree))
        .route("/new-pcd", post(new_pcd))
        // Scanned clouds run well past the default 2 MB body cap.
        .layer(DefaultBodyLimit::max(512 * 1024 * 1024))
        .with_state(state)
}

async fn hello() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "data": "cloudtree octree service" }))
}

#[derive(Debug, Deserialize)]
struct OctreeQuery {
    height: Option<String>,
}

async fn get_octree(
    State(state): State<AppState>,
    Query(query): Query<OctreeQuery>,
) -> Result<Json<QueryReply>, ApiError> {
    let depth = match query.height {
        Some(raw) => raw.trim().parse().map_err(|_| ApiError::InvalidDepth)?,
        None => state.service.default_depth(),
    };
    let reply = state.service.get_voxels(depth).await?;
    Ok(Json(reply))
}

async fn new_pcd(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<QueryReply>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut resolution_cm: Option<f32> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::Upload(err.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload.pcd").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ApiError::Upload(err.to_string()))?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("resolution") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| ApiError::Upload(err.to_string()))?;
                resolution_cm =
                    Some(text.trim().parse().map_err(|_| ApiError::InvalidResolution)?);
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or(ApiError::MissingField("file"))?;
    let resolution_cm = resolution_cm.ok_or(ApiError::MissingField("resolution"))?;
    // Resolution arrives in centimeters; the tree works in meters.
    let resolution = resolution_cm * 0.01;

    persist_upload(&state.upload_dir, &filename, &bytes).await?;

    let points = pcd::parse(&bytes)?;
    tracing::info!(points = points.len(), file = %filename, "decoded point cloud");

    let reply = state.service.submit_cloud(points, resolution).await?;
    Ok(Json(reply))
}

/// Keeps a copy of the raw upload under the configured data directory.
async fn persist_upload(dir: &Path, filename: &str, bytes: &[u8]) -> Result<(), ApiError> {
    tokio::fs::create_dir_all(dir).await?;
    // Strip any path components a client smuggles into the filename.
    let name = Path::new(filename)
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_else(|| "upload.pcd".into());
    tokio::fs::write(dir.join(name), bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_upload_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("uploads");
        persist_upload(&target, "scan.pcd", b"payload").await.unwrap();
        let stored = tokio::fs::read(target.join("scan.pcd")).await.unwrap();
        assert_eq!(stored, b"payload");
    }

    #[tokio::test]
    async fn test_persist_upload_strips_path_components() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("uploads");
        persist_upload(&target, "../../etc/scan.pcd", b"x")
            .await
            .unwrap();
        assert!(target.join("scan.pcd").exists());
        assert!(!dir.path().join("etc").exists());
    }
}
