// Audit action names.
pub const USER_CREATED: &str = "USER_CREATED";
pub const GROUP_CREATED: &str = "GROUP_CREATED";
pub const MEMBER_ADDED: &str = "MEMBER_ADDED";
pub const BILL_CREATED: &str = "BILL_CREATED";
pub const BILL_APPLIED: &str = "BILL_APPLIED";
pub const GROUP_SETTLED: &str = "GROUP_SETTLED";
pub const PAYMENT_VERIFIED: &str = "PAYMENT_VERIFIED";
pub const PAYMENT_REJECTED: &str = "PAYMENT_REJECTED";

// External ledger literals.
pub const TX_RESULT_SUCCESS: &str = "tesSUCCESS";
pub const TX_TYPE_PAYMENT: &str = "payment";
pub const LEDGER_CURRENCY: &str = "XRP";
pub const TXN_NOT_FOUND: &str = "txnNotFound";

/// Ledger transaction hashes are 64 hex characters; anything longer is noise.
pub const MAX_REFERENCE_LEN: usize = 128;
