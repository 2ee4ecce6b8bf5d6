//! Type-safe identifiers for every record table.
//!
//! Each id wraps the `u32` handed out by its store actor and displays with a table prefix
//! (`table_5`, `order_12`), which keeps log lines readable.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

macro_rules! record_id {
    ($($record:ident => $prefix:literal),* $(,)?) => {
        paste::paste! {
            $(
                #[doc = concat!("Identifier of a `", stringify!($record), "` row.")]
                #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
                #[serde(transparent)]
                pub struct [<$record Id>](pub u32);

                impl From<u32> for [<$record Id>] {
                    fn from(id: u32) -> Self {
                        Self(id)
                    }
                }

                impl Display for [<$record Id>] {
                    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                        write!(f, concat!($prefix, "_{}"), self.0)
                    }
                }
            )*
        }
    };
}

record_id! {
    Table => "table",
    Session => "session",
    Order => "order",
    OrderItem => "item",
    Bill => "bill",
    Payment => "payment",
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display_with_table_prefix() {
        assert_eq!(TableId(5).to_string(), "table_5");
        assert_eq!(OrderItemId::from(3).to_string(), "item_3");
        assert_eq!(serde_json::to_string(&BillId(9)).unwrap(), "9");
    }
}
