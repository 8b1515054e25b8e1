use crate::core::errors::DripsplitError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Resolves a user to their published ledger address. The engine never keys
/// money movement on anything but the address this collaborator reports.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn address_of(&self, user_id: &str) -> Result<Option<String>, DripsplitError>;
}

#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    addresses: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, user_id: &str, address: &str) {
        let mut addresses = self.addresses.write().await;
        addresses.insert(user_id.to_string(), address.to_string());
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn address_of(&self, user_id: &str) -> Result<Option<String>, DripsplitError> {
        let addresses = self.addresses.read().await;
        Ok(addresses.get(user_id).cloned())
    }
}
