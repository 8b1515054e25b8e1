use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Serialize)]
pub enum DripsplitError {
    #[error("User {0} not found")]
    UserNotFound(String),
    #[error("Username {0} already taken")]
    UsernameTaken(String),
    #[error("Group {0} not found")]
    GroupNotFound(String),
    #[error("Bill {0} not found")]
    BillNotFound(String),
    #[error("Transaction request {0} not found")]
    RequestNotFound(String),
    #[error("User {0} is already a group member")]
    AlreadyGroupMember(String),
    #[error("User {0} is not a group member")]
    NotGroupMember(String),
    #[error("No ledger address published for user {0}")]
    AddressNotFound(String),
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
    #[error("Invalid amount: {0} drops")]
    InvalidAmount(i64),
    #[error("Invalid ledger reference: {0}")]
    InvalidReference(String),
    #[error("Ledger reference {0} already used")]
    DuplicateReference(String),
    #[error("Payment {0} could not be found on the ledger")]
    PaymentNotFound(String),
    #[error("Payment verification failed: {0}")]
    VerificationFailed(String),
    #[error("Transaction request {0} already paid")]
    AlreadyPaid(String),
    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(String),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Audit error: {0}")]
    AuditError(String),
}
