use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a source table; selects which cleaning rules apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableId {
    Users,
    Transactions,
    Products,
}

impl TableId {
    /// All identifiers in load order.
    pub const ALL: [TableId; 3] = [TableId::Users, TableId::Transactions, TableId::Products];

    /// Name used for the store table and the cleaned side file.
    pub fn as_str(&self) -> &'static str {
        match self {
            TableId::Users => "users",
            TableId::Transactions => "transactions",
            TableId::Products => "products",
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
