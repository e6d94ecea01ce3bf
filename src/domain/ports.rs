use crate::utils::error::Result;
use async_trait::async_trait;

/// Byte-level document storage. Paths are relative to the storage root.
pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Replaces `to` with `from`. Must be atomic on the same filesystem.
    fn rename(&self, from: &str, to: &str)
        -> impl std::future::Future<Output = Result<()>> + Send;
    fn remove_file(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;
    fn exists(&self, path: &str) -> impl std::future::Future<Output = Result<bool>> + Send;
}

/// Turns a platform user id into something readable for the ratings view.
#[async_trait]
pub trait UserNameResolver: Send + Sync {
    async fn resolve(&self, user_id: &str) -> Result<String>;
}
