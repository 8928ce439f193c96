#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use household_core::{
    config::Config,
    core::{FixedClock, HouseholdManager},
    domain::{Category, Household, HouseholdId, MemberId, Timestamp, Transaction},
    storage::MemoryBackend,
};
use rust_decimal::Decimal;
use tempfile::TempDir;

pub const HOUSEHOLD: &str = "house";

pub fn member(id: &str) -> MemberId {
    MemberId::from(id)
}

pub fn household_id() -> HouseholdId {
    HouseholdId::from(HOUSEHOLD)
}

/// UTC midnight of the given date.
pub fn day(year: i32, month: u32, day: u32) -> Timestamp {
    Timestamp::from(
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
            .single()
            .expect("valid date"),
    )
}

/// Household with members `a` (Ana) and `b` (Bruno).
pub fn two_member_household() -> Household {
    let mut household = Household::new(member("a"), "Ana", "EUR");
    household.access.insert(
        member("b"),
        household_core::domain::Member {
            name: "Bruno".into(),
            active: true,
        },
    );
    household
}

/// Transaction split as given; the amount is the sum of the split.
pub fn split_transaction(
    title: &str,
    category: Category,
    timestamp: Timestamp,
    split: &[(&str, Decimal)],
) -> Transaction {
    let members: BTreeMap<MemberId, Decimal> = split
        .iter()
        .map(|(id, amount)| (member(id), *amount))
        .collect();
    let amount = members.values().copied().sum();
    Transaction::new(title, amount, category, timestamp, members)
}

/// Manager over a fresh in-memory backend with the clock pinned to `now`.
pub fn manager_at(now: chrono::DateTime<Utc>) -> (HouseholdManager, MemoryBackend) {
    let backend = MemoryBackend::new();
    let manager = HouseholdManager::new(
        Arc::new(backend.clone()),
        &Config::default(),
        Box::new(FixedClock::new(now)),
    )
    .expect("default config is valid");
    (manager, backend)
}

/// Temporary directory kept alive by the returned guard.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}
