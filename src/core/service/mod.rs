use crate::core::errors::DripsplitError;
use crate::core::models::{group::Group, user::User};
use crate::core::split::RemainderPolicy;
use crate::infrastructure::audit::AuditLog;
use crate::infrastructure::directory::Directory;
use crate::infrastructure::ledger::LedgerGateway;
use crate::infrastructure::notify::Notifier;
use crate::infrastructure::storage::Storage;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub mod groups;
pub mod settlement;

/// Bounds for polling the eventually-consistent external ledger: a
/// just-submitted payment may take several seconds to become queryable.
#[derive(Clone, Debug)]
pub struct VerifyPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        VerifyPolicy {
            attempts: 20,
            delay: Duration::from_millis(500),
        }
    }
}

/// The group ledger and settlement verification engine. Collaborators are
/// injected at construction; the single composition point is the binary.
pub struct DripsplitService<S: Storage, G: LedgerGateway, D: Directory, N: Notifier, A: AuditLog> {
    storage: S,
    ledger: G,
    directory: D,
    notifier: N,
    audit: A,
    verify_policy: VerifyPolicy,
    remainder_policy: RemainderPolicy,
    // Serializes balance mutation per group; never held across ledger I/O.
    group_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: Storage, G: LedgerGateway, D: Directory, N: Notifier, A: AuditLog> DripsplitService<S, G, D, N, A> {
    pub fn new(storage: S, ledger: G, directory: D, notifier: N, audit: A) -> Self {
        DripsplitService {
            storage,
            ledger,
            directory,
            notifier,
            audit,
            verify_policy: VerifyPolicy::default(),
            remainder_policy: RemainderPolicy::default(),
            group_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_verify_policy(mut self, policy: VerifyPolicy) -> Self {
        self.verify_policy = policy;
        self
    }

    pub fn with_remainder_policy(mut self, policy: RemainderPolicy) -> Self {
        self.remainder_policy = policy;
        self
    }

    async fn group_lock(&self, group_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.group_locks.lock().await;
        locks
            .entry(group_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn require_user(&self, user_id: &str) -> Result<User, DripsplitError> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| DripsplitError::UserNotFound(user_id.to_string()))
    }

    async fn require_group(&self, group_id: &str) -> Result<Group, DripsplitError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| DripsplitError::GroupNotFound(group_id.to_string()))
    }
}
