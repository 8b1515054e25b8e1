use crate::core::models::{request::TransactionRequest, user::User};
use async_trait::async_trait;
use tracing::info;

/// Best-effort notification channel. Implementations swallow their own
/// failures; a lost notification never fails a verified payment.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn payment_received(&self, creditor: &User, request: &TransactionRequest);
}

/// Notifier for deployments without a push channel: the confirmation is
/// visible in the service logs only.
#[derive(Clone, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        TracingNotifier
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn payment_received(&self, creditor: &User, request: &TransactionRequest) {
        info!(
            creditor = %creditor.username,
            request_id = %request.id,
            drops = request.total_drops,
            "payment received"
        );
    }
}
