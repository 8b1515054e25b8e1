use crate::constants::{BILL_APPLIED, BILL_CREATED, GROUP_CREATED, GROUP_SETTLED, MEMBER_ADDED, USER_CREATED};
use crate::core::errors::DripsplitError;
use crate::core::models::{
    balance::GroupBalance, bill::Bill, group::Group, request::TransactionRequest, user::User,
};
use crate::core::money::Drops;
use crate::core::service::DripsplitService;
use crate::core::split::allocate;
use crate::infrastructure::audit::AuditLog;
use crate::infrastructure::directory::Directory;
use crate::infrastructure::ledger::LedgerGateway;
use crate::infrastructure::notify::Notifier;
use crate::infrastructure::storage::Storage;
use chrono::Utc;
use serde_json::json;
use std::collections::HashSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

impl<S: Storage, G: LedgerGateway, D: Directory, N: Notifier, A: AuditLog> DripsplitService<S, G, D, N, A> {
    // USERS

    pub async fn create_user(&self, username: String) -> Result<User, DripsplitError> {
        if self.storage.get_user_by_username(&username).await?.is_some() {
            return Err(DripsplitError::UsernameTaken(username));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username,
            created_at: Utc::now(),
        };
        self.storage.create_user(user.clone()).await?;
        info!(user_id = %user.id, username = %user.username, "user created");

        self.audit
            .record(
                USER_CREATED,
                json!({ "user_id": user.id, "username": user.username }),
                Some(&user.id),
            )
            .await?;
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, DripsplitError> {
        self.storage.get_user(user_id).await
    }

    // GROUPS & MEMBERSHIP

    pub async fn create_group(
        &self,
        name: String,
        description: String,
        member_ids: Vec<String>,
        created_by: &User,
    ) -> Result<Group, DripsplitError> {
        let mut all_members = member_ids;
        if !all_members.iter().any(|id| *id == created_by.id) {
            all_members.push(created_by.id.clone());
        }
        for member_id in &all_members {
            self.require_user(member_id).await?;
        }

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            member_ids: all_members,
            created_at: Utc::now(),
        };
        self.storage.save_group(group.clone()).await?;

        // Membership implies a balance row for the lifetime of the group.
        for member_id in &group.member_ids {
            self.storage
                .create_balance(GroupBalance {
                    group_id: group.id.clone(),
                    user_id: member_id.clone(),
                    drops: 0,
                })
                .await?;
        }
        info!(group_id = %group.id, members = group.member_ids.len(), "group created");

        self.audit
            .record(
                GROUP_CREATED,
                json!({ "group_id": group.id, "name": group.name, "member_ids": group.member_ids }),
                Some(&created_by.id),
            )
            .await?;
        Ok(group)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>, DripsplitError> {
        self.storage.get_group(group_id).await
    }

    pub async fn user_groups(&self, user_id: &str) -> Result<Vec<Group>, DripsplitError> {
        self.storage.get_user_groups(user_id).await
    }

    pub async fn add_member(&self, group_id: &str, user_id: &str) -> Result<Group, DripsplitError> {
        let mut group = self.require_group(group_id).await?;
        let user = self.require_user(user_id).await?;
        if group.is_member(&user.id) {
            warn!(group_id, user_id, "duplicate member add");
            return Err(DripsplitError::AlreadyGroupMember(user.id));
        }

        group.member_ids.push(user.id.clone());
        self.storage.save_group(group.clone()).await?;
        self.storage
            .create_balance(GroupBalance {
                group_id: group.id.clone(),
                user_id: user.id.clone(),
                drops: 0,
            })
            .await?;

        self.audit
            .record(
                MEMBER_ADDED,
                json!({ "group_id": group.id, "user_id": user.id }),
                Some(&user.id),
            )
            .await?;
        Ok(group)
    }

    pub async fn group_balances(&self, group_id: &str) -> Result<Vec<GroupBalance>, DripsplitError> {
        self.require_group(group_id).await?;
        self.storage.get_group_balances(group_id).await
    }

    // BILLS

    /// Applies a bill inside a group: the creditor's balance rises by the
    /// full amount and every participant's balance drops by their allocated
    /// share, atomically, so the group's balances keep summing to zero.
    pub async fn add_group_bill(
        &self,
        group_id: &str,
        description: String,
        creditor_id: &str,
        participant_ids: Vec<String>,
        weights: Vec<u64>,
        total_drops: Drops,
    ) -> Result<(Bill, Vec<GroupBalance>), DripsplitError> {
        let group = self.require_group(group_id).await?;
        validate_bill_shape(&participant_ids, &weights, total_drops)?;
        if !group.is_member(creditor_id) {
            return Err(DripsplitError::NotGroupMember(creditor_id.to_string()));
        }
        for participant_id in &participant_ids {
            if !group.is_member(participant_id) {
                warn!(group_id, participant_id = %participant_id, "bill names a non-member");
                return Err(DripsplitError::NotGroupMember(participant_id.clone()));
            }
        }

        let shares = allocate(total_drops, &weights, &self.remainder_policy)?;

        let mut deltas: Vec<(String, Drops)> = vec![(creditor_id.to_string(), total_drops)];
        deltas.extend(
            participant_ids
                .iter()
                .zip(shares.iter())
                .map(|(participant_id, share)| (participant_id.clone(), -share)),
        );

        let bill = Bill {
            id: Uuid::new_v4().to_string(),
            description,
            creditor_id: creditor_id.to_string(),
            participant_ids,
            weights,
            total_drops,
            group_id: Some(group.id.clone()),
            created_at: Utc::now(),
        };

        let lock = self.group_lock(&group.id).await;
        let balances = {
            let _guard = lock.lock().await;
            let balances = self.storage.apply_balance_deltas(&group.id, &deltas).await?;
            // The bill is persisted only after the deltas landed, so a failed
            // application leaves no half-recorded bill behind.
            self.storage.save_bill(bill.clone()).await?;
            balances
        };
        debug!(bill_id = %bill.id, group_id = %group.id, total_drops, "bill applied");

        self.audit
            .record(
                BILL_APPLIED,
                json!({ "bill_id": bill.id, "group_id": group.id, "total_drops": total_drops }),
                Some(creditor_id),
            )
            .await?;
        Ok((bill, balances))
    }

    /// A bill outside any group skips the balance ledger entirely: each
    /// participant's share becomes an unpaid transaction request right away.
    /// The creditor's own share, if they take part, produces no request.
    pub async fn add_bill(
        &self,
        description: String,
        creditor_id: &str,
        participant_ids: Vec<String>,
        weights: Vec<u64>,
        total_drops: Drops,
    ) -> Result<(Bill, Vec<TransactionRequest>), DripsplitError> {
        self.require_user(creditor_id).await?;
        validate_bill_shape(&participant_ids, &weights, total_drops)?;
        for participant_id in &participant_ids {
            self.require_user(participant_id).await?;
        }

        let shares = allocate(total_drops, &weights, &self.remainder_policy)?;

        let bill = Bill {
            id: Uuid::new_v4().to_string(),
            description,
            creditor_id: creditor_id.to_string(),
            participant_ids: participant_ids.clone(),
            weights,
            total_drops,
            group_id: None,
            created_at: Utc::now(),
        };
        self.storage.save_bill(bill.clone()).await?;

        let mut requests = Vec::new();
        for (participant_id, share) in participant_ids.iter().zip(shares.iter()) {
            if participant_id == creditor_id || *share == 0 {
                continue;
            }
            let request = TransactionRequest {
                id: Uuid::new_v4().to_string(),
                creditor_id: creditor_id.to_string(),
                debtor_id: participant_id.clone(),
                total_drops: *share,
                bill_id: Some(bill.id.clone()),
                group_id: None,
                external_reference: None,
                paid: false,
                created_at: Utc::now(),
            };
            self.storage.save_request(request.clone()).await?;
            requests.push(request);
        }
        info!(bill_id = %bill.id, requests = requests.len(), "bill created");

        self.audit
            .record(
                BILL_CREATED,
                json!({ "bill_id": bill.id, "total_drops": total_drops, "requests": requests.len() }),
                Some(creditor_id),
            )
            .await?;
        Ok((bill, requests))
    }

    pub async fn get_bill(&self, bill_id: &str) -> Result<Bill, DripsplitError> {
        self.storage
            .get_bill(bill_id)
            .await?
            .ok_or_else(|| DripsplitError::BillNotFound(bill_id.to_string()))
    }

    pub async fn group_bills(&self, group_id: &str) -> Result<Vec<Bill>, DripsplitError> {
        self.require_group(group_id).await?;
        self.storage.get_group_bills(group_id).await
    }

    // SETTLEMENT DERIVATION

    /// Turns the group's current negative balances into settlement
    /// obligations: debtors are matched against creditors greedily, largest
    /// creditor first. The requests created for one debtor always sum to the
    /// absolute value of that debtor's negative balance; members at or above
    /// zero get none. Balances themselves move only as payments verify.
    pub async fn settle(&self, group_id: &str) -> Result<Vec<TransactionRequest>, DripsplitError> {
        let group = self.require_group(group_id).await?;

        let lock = self.group_lock(&group.id).await;
        let _guard = lock.lock().await;

        let balances = self.storage.get_group_balances(&group.id).await?;
        let mut creditors: Vec<(String, Drops)> = balances
            .iter()
            .filter(|b| b.drops > 0)
            .map(|b| (b.user_id.clone(), b.drops))
            .collect();
        let mut debtors: Vec<(String, Drops)> = balances
            .iter()
            .filter(|b| b.drops < 0)
            .map(|b| (b.user_id.clone(), -b.drops))
            .collect();
        creditors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        debtors.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut requests = Vec::new();
        let mut j = 0;
        for (debtor_id, mut debt) in debtors {
            while debt > 0 && j < creditors.len() {
                let (creditor_id, credit) = creditors[j].clone();
                let amount = debt.min(credit);
                let request = TransactionRequest {
                    id: Uuid::new_v4().to_string(),
                    creditor_id: creditor_id.clone(),
                    debtor_id: debtor_id.clone(),
                    total_drops: amount,
                    bill_id: None,
                    group_id: Some(group.id.clone()),
                    external_reference: None,
                    paid: false,
                    created_at: Utc::now(),
                };
                self.storage.save_request(request.clone()).await?;
                requests.push(request);

                debt -= amount;
                creditors[j].1 -= amount;
                if creditors[j].1 == 0 {
                    j += 1;
                }
            }
        }
        info!(group_id = %group.id, requests = requests.len(), "group settled");

        self.audit
            .record(
                GROUP_SETTLED,
                json!({
                    "group_id": group.id,
                    "request_ids": requests.iter().map(|r| r.id.clone()).collect::<Vec<_>>()
                }),
                None,
            )
            .await?;
        Ok(requests)
    }
}

fn validate_bill_shape(
    participant_ids: &[String],
    weights: &[u64],
    total_drops: Drops,
) -> Result<(), DripsplitError> {
    if total_drops < 0 {
        return Err(DripsplitError::InvalidAmount(total_drops));
    }
    if participant_ids.is_empty() {
        return Err(DripsplitError::InvalidSplit("bill has no participants".into()));
    }
    if participant_ids.len() != weights.len() {
        return Err(DripsplitError::InvalidSplit(format!(
            "{} participants but {} weights",
            participant_ids.len(),
            weights.len()
        )));
    }
    let unique: HashSet<&String> = participant_ids.iter().collect();
    if unique.len() != participant_ids.len() {
        return Err(DripsplitError::InvalidSplit("duplicate participant".into()));
    }
    Ok(())
}
