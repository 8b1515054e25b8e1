use crate::core::money::Drops;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shared expense: the creditor fronted `total_drops`, split across
/// `participant_ids` proportionally to the parallel `weights` list.
/// Immutable once persisted.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bill {
    pub id: String,
    pub description: String,
    pub creditor_id: String,
    pub participant_ids: Vec<String>,
    pub weights: Vec<u64>,
    pub total_drops: Drops,
    pub group_id: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}
