use crate::core::errors::DripsplitError;
use crate::core::models::{
    balance::GroupBalance, bill::Bill, group::Group, request::TransactionRequest, user::User,
};
use crate::core::money::Drops;
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    users: Arc<RwLock<HashMap<String, User>>>,
    users_by_username: Arc<RwLock<HashMap<String, String>>>,
    groups: Arc<RwLock<HashMap<String, Group>>>,
    bills: Arc<RwLock<HashMap<String, Bill>>>,
    // group_id -> user_id -> balance row
    balances: Arc<RwLock<HashMap<String, HashMap<String, GroupBalance>>>>,
    requests: Arc<RwLock<HashMap<String, TransactionRequest>>>,
    // external reference -> request id; entries persist once a request is paid
    used_references: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: User) -> Result<(), DripsplitError> {
        let mut users_by_username = self.users_by_username.write().await;
        let mut users = self.users.write().await;
        users_by_username.insert(user.username.clone(), user.id.clone());
        users.insert(user.id.clone(), user);
        Ok(())
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DripsplitError> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DripsplitError> {
        let users_by_username = self.users_by_username.read().await;
        let users = self.users.read().await;
        Ok(users_by_username
            .get(username)
            .and_then(|id| users.get(id).cloned()))
    }

    async fn save_group(&self, group: Group) -> Result<(), DripsplitError> {
        let mut groups = self.groups.write().await;
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, DripsplitError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, DripsplitError> {
        let groups = self.groups.read().await;
        Ok(groups
            .values()
            .filter(|g| g.is_member(user_id))
            .cloned()
            .collect())
    }

    async fn save_bill(&self, bill: Bill) -> Result<(), DripsplitError> {
        let mut bills = self.bills.write().await;
        bills.insert(bill.id.clone(), bill);
        Ok(())
    }

    async fn get_bill(&self, bill_id: &str) -> Result<Option<Bill>, DripsplitError> {
        let bills = self.bills.read().await;
        Ok(bills.get(bill_id).cloned())
    }

    async fn get_group_bills(&self, group_id: &str) -> Result<Vec<Bill>, DripsplitError> {
        let bills = self.bills.read().await;
        Ok(bills
            .values()
            .filter(|b| b.group_id.as_deref() == Some(group_id))
            .cloned()
            .collect())
    }

    async fn create_balance(&self, balance: GroupBalance) -> Result<(), DripsplitError> {
        let mut balances = self.balances.write().await;
        balances
            .entry(balance.group_id.clone())
            .or_default()
            .insert(balance.user_id.clone(), balance);
        Ok(())
    }

    async fn get_group_balances(&self, group_id: &str) -> Result<Vec<GroupBalance>, DripsplitError> {
        let balances = self.balances.read().await;
        let mut rows: Vec<GroupBalance> = balances
            .get(group_id)
            .map(|group| group.values().cloned().collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(rows)
    }

    async fn apply_balance_deltas(
        &self,
        group_id: &str,
        deltas: &[(String, Drops)],
    ) -> Result<Vec<GroupBalance>, DripsplitError> {
        let mut balances = self.balances.write().await;
        let group = balances
            .get_mut(group_id)
            .ok_or_else(|| DripsplitError::GroupNotFound(group_id.to_string()))?;

        // Validate every row exists before touching any of them.
        for (user_id, _) in deltas {
            if !group.contains_key(user_id) {
                return Err(DripsplitError::NotGroupMember(user_id.clone()));
            }
        }

        for (user_id, delta) in deltas {
            if let Some(row) = group.get_mut(user_id) {
                row.drops += delta;
            }
        }

        let mut rows: Vec<GroupBalance> = group.values().cloned().collect();
        rows.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(rows)
    }

    async fn save_request(&self, request: TransactionRequest) -> Result<(), DripsplitError> {
        let mut requests = self.requests.write().await;
        requests.insert(request.id.clone(), request);
        Ok(())
    }

    async fn get_request(&self, request_id: &str) -> Result<Option<TransactionRequest>, DripsplitError> {
        let requests = self.requests.read().await;
        Ok(requests.get(request_id).cloned())
    }

    async fn get_requests_to_user(&self, debtor_id: &str) -> Result<Vec<TransactionRequest>, DripsplitError> {
        let requests = self.requests.read().await;
        let mut rows: Vec<TransactionRequest> = requests
            .values()
            .filter(|r| r.debtor_id == debtor_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn find_request_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<TransactionRequest>, DripsplitError> {
        let used_references = self.used_references.read().await;
        let requests = self.requests.read().await;
        Ok(used_references
            .get(reference)
            .and_then(|id| requests.get(id).cloned()))
    }

    async fn reserve_reference(&self, reference: &str, request_id: &str) -> Result<(), DripsplitError> {
        let mut used_references = self.used_references.write().await;
        if used_references.contains_key(reference) {
            return Err(DripsplitError::DuplicateReference(reference.to_string()));
        }
        used_references.insert(reference.to_string(), request_id.to_string());
        Ok(())
    }

    async fn release_reference(&self, reference: &str) -> Result<(), DripsplitError> {
        let mut used_references = self.used_references.write().await;
        used_references.remove(reference);
        Ok(())
    }

    async fn mark_request_paid(
        &self,
        request_id: &str,
        reference: &str,
    ) -> Result<TransactionRequest, DripsplitError> {
        let mut requests = self.requests.write().await;
        let request = requests
            .get_mut(request_id)
            .ok_or_else(|| DripsplitError::RequestNotFound(request_id.to_string()))?;
        if request.paid {
            return Err(DripsplitError::AlreadyPaid(request_id.to_string()));
        }
        request.external_reference = Some(reference.to_string());
        request.paid = true;
        Ok(request.clone())
    }
}
