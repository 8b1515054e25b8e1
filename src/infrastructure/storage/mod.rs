use crate::core::errors::DripsplitError;
use crate::core::models::{
    balance::GroupBalance, bill::Bill, group::Group, request::TransactionRequest, user::User,
};
use crate::core::money::Drops;
use async_trait::async_trait;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_user(&self, user: User) -> Result<(), DripsplitError>;
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, DripsplitError>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, DripsplitError>;

    async fn save_group(&self, group: Group) -> Result<(), DripsplitError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, DripsplitError>;
    async fn get_user_groups(&self, user_id: &str) -> Result<Vec<Group>, DripsplitError>;

    async fn save_bill(&self, bill: Bill) -> Result<(), DripsplitError>;
    async fn get_bill(&self, bill_id: &str) -> Result<Option<Bill>, DripsplitError>;
    async fn get_group_bills(&self, group_id: &str) -> Result<Vec<Bill>, DripsplitError>;

    async fn create_balance(&self, balance: GroupBalance) -> Result<(), DripsplitError>;
    async fn get_group_balances(&self, group_id: &str) -> Result<Vec<GroupBalance>, DripsplitError>;
    /// Applies every delta or none: if any referenced user has no balance row
    /// in the group, nothing is written and `NotGroupMember` is returned.
    async fn apply_balance_deltas(
        &self,
        group_id: &str,
        deltas: &[(String, Drops)],
    ) -> Result<Vec<GroupBalance>, DripsplitError>;

    async fn save_request(&self, request: TransactionRequest) -> Result<(), DripsplitError>;
    async fn get_request(&self, request_id: &str) -> Result<Option<TransactionRequest>, DripsplitError>;
    async fn get_requests_to_user(&self, debtor_id: &str) -> Result<Vec<TransactionRequest>, DripsplitError>;
    async fn find_request_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<TransactionRequest>, DripsplitError>;

    /// Claims `reference` for `request_id` iff no other request holds or has
    /// consumed it. The claim and the uniqueness check happen under one lock.
    async fn reserve_reference(&self, reference: &str, request_id: &str) -> Result<(), DripsplitError>;
    /// Releases a reservation after a failed verification so a corrected
    /// payment can retry with the same reference.
    async fn release_reference(&self, reference: &str) -> Result<(), DripsplitError>;
    /// Transitions `paid: false -> true` and attaches the reference. The paid
    /// check and the write happen under one lock; an already-paid request
    /// yields `AlreadyPaid` and is left untouched.
    async fn mark_request_paid(
        &self,
        request_id: &str,
        reference: &str,
    ) -> Result<TransactionRequest, DripsplitError>;
}

pub mod in_memory;
