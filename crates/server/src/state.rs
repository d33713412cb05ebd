use octree::Octree;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The single replaceable "current tree" handle.
///
/// Readers take an `Arc` snapshot and query it without holding the lock, so
/// a rebuild can never tear an in-flight query; writers publish a tree only
/// after it is fully built. The previous tree drops once its last reader is
/// done with it.
#[derive(Debug, Clone, Default)]
pub struct SceneState {
    current: Arc<RwLock<Option<Arc<Octree>>>>,
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a freshly built tree, discarding the previous one.
    pub async fn install(&self, tree: Octree) -> Arc<Octree> {
        let tree = Arc::new(tree);
        *self.current.write().await = Some(tree.clone());
        tree
    }

    /// Snapshot of the current tree, if any build has completed.
    pub async fn snapshot(&self) -> Option<Arc<Octree>> {
        self.current.read().await.clone()
    }
}
