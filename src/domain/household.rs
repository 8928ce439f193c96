//! Household document: members, currency, plan, and the monthly rollup.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::common::MemberId;
use crate::ledger::months::Months;

/// Access entry of a household member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Household {
    #[serde(default)]
    pub access: BTreeMap<MemberId, Member>,
    pub currency: String,
    #[serde(rename = "isPaid", default)]
    pub is_paid: bool,
    #[serde(default)]
    pub months: Months,
}

impl Household {
    /// Fresh household owned by its creator.
    pub fn new(creator: MemberId, name: impl Into<String>, currency: impl Into<String>) -> Self {
        let mut access = BTreeMap::new();
        access.insert(
            creator,
            Member {
                name: name.into(),
                active: true,
            },
        );
        Self {
            access,
            currency: currency.into(),
            is_paid: false,
            months: Months::new(),
        }
    }

    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.access.get(id)
    }

    pub fn active_members(&self) -> impl Iterator<Item = (&MemberId, &Member)> {
        self.access.iter().filter(|(_, member)| member.active)
    }
}
