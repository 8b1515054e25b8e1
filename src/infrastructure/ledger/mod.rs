use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One address whose holdings changed as part of a ledger transaction.
/// `value` is the ledger's decimal string notation ("1.5" XRP), converted to
/// drops only through the exact parser in `core::money`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BalanceChange {
    pub address: String,
    pub currency: String,
    pub value: String,
}

/// A validated transaction as reported by the external ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Engine result code, e.g. "tesSUCCESS".
    pub result: String,
    /// Lowercased transaction type, e.g. "payment".
    pub tx_type: String,
    /// Address that submitted the transaction.
    pub sender: String,
    pub balance_changes: Vec<BalanceChange>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerInfo {
    pub build_version: String,
    pub complete_ledgers: String,
}

#[derive(Error, Debug)]
pub enum LedgerGatewayError {
    /// The ledger does not know the transaction (yet). A just-submitted
    /// transaction may take several seconds to become queryable.
    #[error("transaction not found on the ledger")]
    NotFound,
    #[error("ledger request failed: {0}")]
    Request(String),
}

/// Read-only capability onto the external payment ledger. The engine only
/// observes transactions through this trait; it never constructs or signs
/// them.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    async fn server_info(&self) -> Result<ServerInfo, LedgerGatewayError>;
    async fn fetch_transaction(&self, reference: &str) -> Result<LedgerTransaction, LedgerGatewayError>;
}

pub mod json_rpc;
