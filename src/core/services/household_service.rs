//! Household administration: creation, settings, and membership.

use serde_json::{json, Value};

use crate::core::services::{commit, ServiceResult};
use crate::domain::{Household, HouseholdId, MemberId};
use crate::errors::{LedgerError, ValidationErrors};
use crate::storage::{Backend, DocumentPath, Snapshot, Subscription, Target, WriteBatch};

const USER_HOUSEHOLD_FIELD: &str = "householdID";

pub struct HouseholdService;

impl HouseholdService {
    pub fn load(backend: &dyn Backend, household_id: &HouseholdId) -> ServiceResult<Household> {
        let path = DocumentPath::household(household_id);
        let value = backend
            .get(&path)?
            .ok_or_else(|| LedgerError::NotFound(path.to_string()))?;
        Ok(serde_json::from_value(value)?)
    }

    /// Household the user currently belongs to, if any.
    pub fn household_of(backend: &dyn Backend, user: &MemberId) -> ServiceResult<Option<HouseholdId>> {
        let household = backend
            .get(&DocumentPath::user(user))?
            .and_then(|doc| match doc.get(USER_HOUSEHOLD_FIELD) {
                Some(Value::String(id)) => Some(HouseholdId::from(id.as_str())),
                _ => None,
            });
        Ok(household)
    }

    /// Creates a household owned by `creator` and points the creator's user
    /// document at it.
    pub fn create(
        backend: &dyn Backend,
        creator: &MemberId,
        name: &str,
        currency: &str,
    ) -> ServiceResult<(HouseholdId, Household)> {
        let name = required(name, "Name cannot be empty")?;
        let currency = required(currency, "Currency cannot be empty")?;
        let id = HouseholdId::generate();
        let household = Household::new(creator.clone(), name, currency);

        let mut batch = WriteBatch::new();
        batch.set(DocumentPath::household(&id), serde_json::to_value(&household)?);
        batch.merge(
            DocumentPath::user(creator),
            json!({ USER_HOUSEHOLD_FIELD: id.as_str() }),
        );
        commit(backend, batch, "create household")?;
        tracing::info!(household = %id, creator = %creator, "household created");
        Ok((id, household))
    }

    pub fn change_currency(
        backend: &dyn Backend,
        household_id: &HouseholdId,
        currency: &str,
    ) -> ServiceResult<()> {
        let currency = required(currency, "Currency cannot be empty")?;
        let mut batch = WriteBatch::new();
        batch.merge(
            DocumentPath::household(household_id),
            json!({ "currency": currency }),
        );
        commit(backend, batch, "change currency")
    }

    pub fn rename_member(
        backend: &dyn Backend,
        household_id: &HouseholdId,
        household: &Household,
        member: &MemberId,
        name: &str,
    ) -> ServiceResult<()> {
        let name = required(name, "Name cannot be empty")?;
        ensure_member(household, member)?;
        let mut batch = WriteBatch::new();
        batch.merge(
            DocumentPath::household(household_id),
            json!({ "access": { member.as_str(): { "name": name } } }),
        );
        commit(backend, batch, "rename member")
    }

    /// Marks `member` inactive and clears their household pointer in one batch.
    /// Their past contributions remain in the rollup.
    pub fn leave(
        backend: &dyn Backend,
        household_id: &HouseholdId,
        household: &Household,
        member: &MemberId,
    ) -> ServiceResult<()> {
        ensure_member(household, member)?;
        let mut batch = WriteBatch::new();
        batch.merge(
            DocumentPath::household(household_id),
            json!({ "access": { member.as_str(): { "active": false } } }),
        );
        batch.merge(
            DocumentPath::user(member),
            json!({ USER_HOUSEHOLD_FIELD: Value::Null }),
        );
        commit(backend, batch, "leave household")
    }

    /// Pushes the household document now and after every change. `None`
    /// means the document is missing or no longer decodes.
    pub fn subscribe<F>(
        backend: &dyn Backend,
        household_id: &HouseholdId,
        mut on_data: F,
    ) -> ServiceResult<Subscription>
    where
        F: FnMut(Option<Household>) + Send + 'static,
    {
        let target = Target::Document(DocumentPath::household(household_id));
        backend.subscribe(
            target,
            Box::new(move |snapshot: &Snapshot| {
                if let Snapshot::Document(doc) = snapshot {
                    let household = doc.as_ref().and_then(|value| {
                        serde_json::from_value::<Household>(value.clone())
                            .map_err(|err| tracing::warn!(error = %err, "undecodable household"))
                            .ok()
                    });
                    on_data(household);
                }
            }),
        )
    }
}

fn required<'a>(value: &'a str, message: &str) -> ServiceResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationErrors::general(message).into());
    }
    Ok(trimmed)
}

fn ensure_member(household: &Household, member: &MemberId) -> ServiceResult<()> {
    if household.member(member).is_none() {
        return Err(LedgerError::NotFound(format!("member {}", member)));
    }
    Ok(())
}
