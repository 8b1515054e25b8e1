use crate::core::money::Drops;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One concrete settlement obligation: `debtor_id` owes `creditor_id`
/// `total_drops`, discharged by a payment on the external ledger.
///
/// `external_reference` is attached only after the referenced ledger
/// transaction has been verified, and is globally unique across all requests.
/// A failed verification leaves the request unpaid with the reference
/// released so a corrected payment can be retried.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub id: String,
    pub creditor_id: String,
    pub debtor_id: String,
    pub total_drops: Drops,
    pub bill_id: Option<String>,
    pub group_id: Option<String>,
    pub external_reference: Option<String>,
    pub paid: bool,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}
