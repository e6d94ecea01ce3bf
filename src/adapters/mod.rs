// Adapters layer: concrete implementations for external systems (storage, chat platform).

pub mod discord;
pub mod storage;

use crate::domain::ports::UserNameResolver;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Resolver used when no bot token is configured: shows ids as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawIdResolver;

#[async_trait]
impl UserNameResolver for RawIdResolver {
    async fn resolve(&self, user_id: &str) -> Result<String> {
        Ok(user_id.to_string())
    }
}
