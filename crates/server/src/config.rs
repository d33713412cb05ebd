use std::{env, path::PathBuf};

/// Configuration for the cloudtree server binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address and port the server binds to (e.g. `0.0.0.0:3000`).
    pub bind_address: String,
    /// Directory where uploaded point-cloud files are kept.
    pub upload_dir: PathBuf,
    /// Voxel query depth used when a request does not specify one.
    pub default_depth: u32,
}

impl ServerConfig {
    /// Builds a configuration from environment variables while falling back
    /// to sensible defaults that match the documentation examples.
    pub fn from_env() -> anyhow::Result<Self> {
        let data_dir = env::var("CLOUDTREE_DATA").unwrap_or_else(|_| "data".to_string());
        let bind_address = env::var("CLOUDTREE_BIND").unwrap_or_else(|_| "0.0.0.0:3000".into());
        let upload_dir = env::var("CLOUDTREE_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(&data_dir).join("pcd-files"));
        let default_depth = match env::var("CLOUDTREE_DEFAULT_DEPTH") {
            Ok(raw) => raw.parse().map_err(|_| {
                anyhow::anyhow!("CLOUDTREE_DEFAULT_DEPTH must be a non-negative integer, got {raw:?}")
            })?,
            Err(_) => 5,
        };

        anyhow::ensure!(!bind_address.is_empty(), "bind address must not be empty");

        Ok(Self {
            bind_address,
            upload_dir,
            default_depth,
        })
    }
}
