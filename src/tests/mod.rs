mod group_tests;
mod money_tests;

use crate::core::models::{request::TransactionRequest, user::User};
use crate::core::service::{DripsplitService, VerifyPolicy};
use crate::infrastructure::audit::in_memory::InMemoryAuditLog;
use crate::infrastructure::directory::InMemoryDirectory;
use crate::infrastructure::ledger::{
    BalanceChange, LedgerGateway, LedgerGatewayError, LedgerTransaction, ServerInfo,
};
use crate::infrastructure::notify::Notifier;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Ledger double: transactions become visible after a configurable number of
/// fetches, like a real ledger that has not caught up yet.
#[derive(Clone, Default)]
pub struct MockLedger {
    transactions: Arc<RwLock<HashMap<String, LedgerTransaction>>>,
    visible_after: Arc<RwLock<HashMap<String, u32>>>,
    fetch_counts: Arc<RwLock<HashMap<String, u32>>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_transaction(&self, reference: &str, transaction: LedgerTransaction) {
        let mut transactions = self.transactions.write().await;
        transactions.insert(reference.to_string(), transaction);
    }

    pub async fn set_visible_after(&self, reference: &str, fetches: u32) {
        let mut visible_after = self.visible_after.write().await;
        visible_after.insert(reference.to_string(), fetches);
    }

    pub async fn fetch_count(&self, reference: &str) -> u32 {
        let fetch_counts = self.fetch_counts.read().await;
        fetch_counts.get(reference).copied().unwrap_or(0)
    }
}

#[async_trait]
impl LedgerGateway for MockLedger {
    async fn server_info(&self) -> Result<ServerInfo, LedgerGatewayError> {
        Ok(ServerInfo {
            build_version: "mock".to_string(),
            complete_ledgers: "1-100".to_string(),
        })
    }

    async fn fetch_transaction(&self, reference: &str) -> Result<LedgerTransaction, LedgerGatewayError> {
        let count = {
            let mut fetch_counts = self.fetch_counts.write().await;
            let count = fetch_counts.entry(reference.to_string()).or_insert(0);
            *count += 1;
            *count
        };
        let visible_after = self.visible_after.read().await;
        if count <= visible_after.get(reference).copied().unwrap_or(0) {
            return Err(LedgerGatewayError::NotFound);
        }
        let transactions = self.transactions.read().await;
        transactions
            .get(reference)
            .cloned()
            .ok_or(LedgerGatewayError::NotFound)
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    received: Arc<RwLock<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn notifications(&self) -> Vec<(String, String)> {
        self.received.read().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn payment_received(&self, creditor: &User, request: &TransactionRequest) {
        let mut received = self.received.write().await;
        received.push((creditor.id.clone(), request.id.clone()));
    }
}

pub type TestService =
    DripsplitService<InMemoryStorage, MockLedger, InMemoryDirectory, RecordingNotifier, InMemoryAuditLog>;

pub struct TestHarness {
    pub service: TestService,
    pub ledger: MockLedger,
    pub directory: InMemoryDirectory,
    pub notifier: RecordingNotifier,
}

pub fn create_test_harness() -> TestHarness {
    let ledger = MockLedger::new();
    let directory = InMemoryDirectory::new();
    let notifier = RecordingNotifier::new();
    let service = DripsplitService::new(
        InMemoryStorage::new(),
        ledger.clone(),
        directory.clone(),
        notifier.clone(),
        InMemoryAuditLog::new(),
    )
    .with_verify_policy(VerifyPolicy {
        attempts: 3,
        delay: Duration::ZERO,
    });
    TestHarness {
        service,
        ledger,
        directory,
        notifier,
    }
}

/// Ledger transaction that would discharge a request of `drops` from
/// `sender` to `destination`.
pub fn payment_transaction(sender: &str, destination: &str, drops: i64) -> LedgerTransaction {
    LedgerTransaction {
        result: "tesSUCCESS".to_string(),
        tx_type: "payment".to_string(),
        sender: sender.to_string(),
        balance_changes: vec![BalanceChange {
            address: destination.to_string(),
            currency: "XRP".to_string(),
            value: crate::core::money::drops_to_xrp_string(drops),
        }],
    }
}
