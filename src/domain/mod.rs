pub mod category;
pub mod common;
pub mod form;
pub mod household;
pub mod transaction;

pub use category::Category;
pub use common::{
    round_cents, Displayable, HouseholdId, MemberId, Timestamp, TransactionId,
};
pub use form::{rebalance_split, TransactionForm};
pub use household::{Household, Member};
pub use transaction::{RecurringTransaction, Transaction, TransactionKind};

// Re-export common dependencies so consumers can rely on this module as a façade.
pub use chrono;
pub use rust_decimal;
