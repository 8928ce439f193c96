//! Rollup arithmetic, period calendar, and recurring-template materialization.

pub mod months;
pub mod mutator;
pub mod period;
pub mod recurrence;

pub use months::{
    adjust_counter, apply_delta, ensure_bucket, CategoryTotals, MonthBucket, Months,
};
pub use mutator::{LedgerMutator, WritePlan, DEFAULT_PLAN_LIMIT};
pub use period::{Calendar, Period, UnknownPeriod};
pub use recurrence::{RecurrenceEngine, RecurrencePlan, DEFAULT_MAX_BACKFILL};
