use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;

/// Durable file storage. Paths are relative to the public root so they can
/// be stored as-is and joined with a base URL or base directory by any
/// consumer.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn put(&self, relative_path: &str, body: Bytes) -> anyhow::Result<()>;
    async fn delete(&self, relative_path: &str) -> anyhow::Result<()>;
}

/// Filesystem storage rooted at the public directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(&self, relative_path: &str, body: Bytes) -> anyhow::Result<()> {
        let full = self.resolve(relative_path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create dir {}", parent.display()))?;
        }
        tokio::fs::write(&full, &body)
            .await
            .with_context(|| format!("write {}", full.display()))?;
        Ok(())
    }

    async fn delete(&self, relative_path: &str) -> anyhow::Result<()> {
        let full = self.resolve(relative_path);
        tokio::fs::remove_file(&full)
            .await
            .with_context(|| format!("delete {}", full.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("surveyhub-storage-{}", Uuid::new_v4().simple()))
    }

    #[tokio::test]
    async fn put_creates_missing_directories_and_writes_bytes() {
        let root = temp_root();
        let storage = LocalStorage::new(&root);

        storage
            .put("images/a.png", Bytes::from_static(b"png-bytes"))
            .await
            .unwrap();

        let written = tokio::fs::read(root.join("images/a.png")).await.unwrap();
        assert_eq!(written, b"png-bytes");

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn delete_removes_the_file() {
        let root = temp_root();
        let storage = LocalStorage::new(&root);

        storage
            .put("images/b.gif", Bytes::from_static(b"gif"))
            .await
            .unwrap();
        storage.delete("images/b.gif").await.unwrap();

        assert!(!root.join("images/b.gif").exists());
        tokio::fs::remove_dir_all(&root).await.unwrap();
    }

    #[tokio::test]
    async fn delete_of_missing_file_errors() {
        let storage = LocalStorage::new(temp_root());
        assert!(storage.delete("images/none.jpg").await.is_err());
    }
}
