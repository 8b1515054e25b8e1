use crate::core::money::Drops;
use serde::{Deserialize, Serialize};

/// A member's signed net position inside one group: positive means the group
/// owes the member, negative means the member owes the group. Rows are
/// created at membership time and mutated only by bill application and
/// settlement-paid events.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupBalance {
    pub group_id: String,
    pub user_id: String,
    pub drops: Drops,
}
