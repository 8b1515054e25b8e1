use crate::constants::{
    LEDGER_CURRENCY, MAX_REFERENCE_LEN, PAYMENT_REJECTED, PAYMENT_VERIFIED, TX_RESULT_SUCCESS,
    TX_TYPE_PAYMENT,
};
use crate::core::errors::DripsplitError;
use crate::core::models::request::TransactionRequest;
use crate::core::money::{xrp_str_to_drops, Drops};
use crate::core::service::DripsplitService;
use crate::infrastructure::audit::AuditLog;
use crate::infrastructure::directory::Directory;
use crate::infrastructure::ledger::{LedgerGateway, LedgerGatewayError, LedgerTransaction};
use crate::infrastructure::notify::Notifier;
use crate::infrastructure::storage::Storage;
use serde_json::json;
use tracing::{debug, info, warn};

impl<S: Storage, G: LedgerGateway, D: Directory, N: Notifier, A: AuditLog> DripsplitService<S, G, D, N, A> {
    pub async fn get_request(&self, request_id: &str) -> Result<TransactionRequest, DripsplitError> {
        self.storage
            .get_request(request_id)
            .await?
            .ok_or_else(|| DripsplitError::RequestNotFound(request_id.to_string()))
    }

    pub async fn requests_to_user(&self, debtor_id: &str) -> Result<Vec<TransactionRequest>, DripsplitError> {
        self.storage.get_requests_to_user(debtor_id).await
    }

    /// Verifies that the ledger transaction behind `reference` discharges the
    /// request, and marks it paid if so.
    ///
    /// The reference is reserved against the durable store before any ledger
    /// call, so no two requests can ever accept the same payment; a failed
    /// verification releases the reservation and leaves the request unpaid so
    /// a corrected payment can retry. No balance lock is held while the
    /// ledger is being polled.
    pub async fn pay_request(
        &self,
        request_id: &str,
        reference: &str,
    ) -> Result<TransactionRequest, DripsplitError> {
        validate_reference(reference)?;

        let request = self.get_request(request_id).await?;
        if request.paid {
            return Err(DripsplitError::AlreadyPaid(request.id));
        }

        self.storage.reserve_reference(reference, &request.id).await?;

        // Verification holds no balance lock; a failure here releases the
        // reservation so a corrected payment can reuse the reference.
        // Marking paid is the point of no return: afterwards the reference
        // belongs to this request for good.
        let commit = match self.verify_payment(&request, reference).await {
            Ok(()) => self.storage.mark_request_paid(&request.id, reference).await,
            Err(err) => Err(err),
        };
        let paid = match commit {
            Ok(paid) => paid,
            Err(err) => {
                self.storage.release_reference(reference).await?;
                warn!(request_id = %request.id, reference, error = %err, "payment rejected");
                self.audit
                    .record(
                        PAYMENT_REJECTED,
                        json!({ "request_id": request.id, "reference": reference, "reason": err.to_string() }),
                        Some(&request.debtor_id),
                    )
                    .await?;
                return Err(err);
            }
        };

        self.apply_paid_request(&paid, reference).await?;
        Ok(paid)
    }

    async fn verify_payment(
        &self,
        request: &TransactionRequest,
        reference: &str,
    ) -> Result<(), DripsplitError> {
        let debtor_address = self
            .directory
            .address_of(&request.debtor_id)
            .await?
            .ok_or_else(|| DripsplitError::AddressNotFound(request.debtor_id.clone()))?;
        let creditor_address = self
            .directory
            .address_of(&request.creditor_id)
            .await?
            .ok_or_else(|| DripsplitError::AddressNotFound(request.creditor_id.clone()))?;

        let transaction = self.fetch_with_retry(reference).await?;
        check_payment(
            &transaction,
            &debtor_address,
            &creditor_address,
            request.total_drops,
        )
    }

    async fn apply_paid_request(
        &self,
        paid: &TransactionRequest,
        reference: &str,
    ) -> Result<(), DripsplitError> {
        if let Some(group_id) = &paid.group_id {
            let lock = self.group_lock(group_id).await;
            let _guard = lock.lock().await;
            self.storage
                .apply_balance_deltas(
                    group_id,
                    &[
                        (paid.debtor_id.clone(), paid.total_drops),
                        (paid.creditor_id.clone(), -paid.total_drops),
                    ],
                )
                .await?;
        }
        info!(request_id = %paid.id, reference, drops = paid.total_drops, "payment verified");

        self.audit
            .record(
                PAYMENT_VERIFIED,
                json!({ "request_id": paid.id, "reference": reference, "total_drops": paid.total_drops }),
                Some(&paid.debtor_id),
            )
            .await?;

        if let Some(creditor) = self.storage.get_user(&paid.creditor_id).await? {
            self.notifier.payment_received(&creditor, paid).await;
        }
        Ok(())
    }

    /// The ledger is eventually consistent, so a fresh transaction may not be
    /// queryable for a few seconds. Polls up to the configured bound, then
    /// gives up with `PaymentNotFound` — distinct from a verification
    /// mismatch. A ledger that never even answered surfaces as
    /// `LedgerUnavailable` instead.
    async fn fetch_with_retry(&self, reference: &str) -> Result<LedgerTransaction, DripsplitError> {
        let policy = &self.verify_policy;
        let mut saw_not_found = false;
        let mut last_failure = String::new();
        for attempt in 1..=policy.attempts {
            match self.ledger.fetch_transaction(reference).await {
                Ok(transaction) => return Ok(transaction),
                Err(LedgerGatewayError::NotFound) => {
                    saw_not_found = true;
                    debug!(reference, attempt, "transaction not yet visible");
                }
                Err(LedgerGatewayError::Request(msg)) => {
                    debug!(reference, attempt, error = %msg, "ledger fetch failed");
                    last_failure = msg;
                }
            }
            if attempt < policy.attempts {
                tokio::time::sleep(policy.delay).await;
            }
        }
        if saw_not_found {
            Err(DripsplitError::PaymentNotFound(reference.to_string()))
        } else {
            Err(DripsplitError::LedgerUnavailable(last_failure))
        }
    }
}

fn validate_reference(reference: &str) -> Result<(), DripsplitError> {
    if reference.is_empty()
        || reference.len() > MAX_REFERENCE_LEN
        || !reference.chars().all(|c| c.is_ascii_hexdigit())
    {
        return Err(DripsplitError::InvalidReference(reference.to_string()));
    }
    Ok(())
}

/// A payment discharges an obligation only if every check passes: definitive
/// success result, payment type, sender is the debtor's address, and the
/// creditor's address gained exactly the owed amount in the base currency.
/// Amount comparison is integer equality after exact string conversion.
fn check_payment(
    transaction: &LedgerTransaction,
    debtor_address: &str,
    creditor_address: &str,
    expected_drops: Drops,
) -> Result<(), DripsplitError> {
    if transaction.result != TX_RESULT_SUCCESS {
        return Err(DripsplitError::VerificationFailed(format!(
            "transaction result is {}",
            transaction.result
        )));
    }
    if transaction.tx_type != TX_TYPE_PAYMENT {
        return Err(DripsplitError::VerificationFailed(format!(
            "transaction type is {}",
            transaction.tx_type
        )));
    }
    if transaction.sender != debtor_address {
        return Err(DripsplitError::VerificationFailed(
            "sender is not the debtor's address".into(),
        ));
    }

    let credited = transaction.balance_changes.iter().any(|change| {
        change.address == creditor_address
            && change.currency == LEDGER_CURRENCY
            && xrp_str_to_drops(&change.value) == Some(expected_drops)
    });
    if !credited {
        return Err(DripsplitError::VerificationFailed(format!(
            "no {} drop credit to the creditor's address",
            expected_drops
        )));
    }
    Ok(())
}
