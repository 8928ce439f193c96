use std::sync::Arc;

use crate::config::Config;
use crate::core::services::{
    HouseholdService, MonthRow, RecurringService, SavedTemplate, SavedTransaction, SummaryService,
    SummaryTable, TransactionService,
};
use crate::core::time::{Clock, SystemClock};
use crate::domain::{
    Household, HouseholdId, MemberId, Timestamp, TransactionForm, TransactionId, TransactionKind,
};
use crate::errors::Result;
use crate::ledger::{Calendar, LedgerMutator, Months, RecurrenceEngine};
use crate::storage::Backend;

/// Facade that loads the current household snapshot, runs the mutator or
/// recurrence engine against it, and commits through the backend.
pub struct HouseholdManager {
    backend: Arc<dyn Backend>,
    engine: RecurrenceEngine,
    default_currency: String,
    clock: Box<dyn Clock>,
}

impl HouseholdManager {
    pub fn new(backend: Arc<dyn Backend>, config: &Config, clock: Box<dyn Clock>) -> Result<Self> {
        Ok(Self {
            backend,
            engine: config.recurrence_engine()?,
            default_currency: config.default_currency.clone(),
            clock,
        })
    }

    /// Default configuration and the wall clock.
    pub fn with_backend(backend: Arc<dyn Backend>) -> Result<Self> {
        Self::new(backend, &Config::default(), Box::new(SystemClock))
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn mutator(&self) -> &LedgerMutator {
        self.engine.mutator()
    }

    pub fn calendar(&self) -> &Calendar {
        self.mutator().calendar()
    }

    /// Local start of the current day.
    pub fn today(&self) -> Result<Timestamp> {
        self.calendar().start_of_day(self.clock.now_timestamp())
    }

    pub fn household(&self, id: &HouseholdId) -> Result<Household> {
        HouseholdService::load(self.backend(), id)
    }

    /// Creates a household, falling back to the configured currency.
    pub fn create_household(
        &self,
        creator: &MemberId,
        name: &str,
        currency: Option<&str>,
    ) -> Result<HouseholdId> {
        let currency = currency.unwrap_or(&self.default_currency);
        let (id, _) = HouseholdService::create(self.backend(), creator, name, currency)?;
        Ok(id)
    }

    /// Parses `form` and adds it, or edits the record `editing` when given.
    pub fn save_transaction(
        &self,
        household_id: &HouseholdId,
        form: &TransactionForm,
        editing: Option<&TransactionId>,
        kind: TransactionKind,
    ) -> Result<SavedTransaction> {
        let new = form.parse_transaction()?;
        let household = self.household(household_id)?;
        let old = editing
            .map(|id| TransactionService::get(self.backend(), household_id, kind, id))
            .transpose()?;
        TransactionService::submit(
            self.backend(),
            self.mutator(),
            household_id,
            &household,
            old.as_ref(),
            &new,
            kind,
        )
    }

    pub fn delete_transaction(
        &self,
        household_id: &HouseholdId,
        id: &TransactionId,
        kind: TransactionKind,
    ) -> Result<Months> {
        let household = self.household(household_id)?;
        let transaction = TransactionService::get(self.backend(), household_id, kind, id)?;
        TransactionService::delete(
            self.backend(),
            self.mutator(),
            household_id,
            &household,
            &transaction,
            kind,
        )
    }

    /// Parses `form` as a recurring template and saves it, materializing
    /// whatever is already due.
    pub fn save_recurring(
        &self,
        household_id: &HouseholdId,
        form: &TransactionForm,
        editing: Option<&TransactionId>,
        kind: TransactionKind,
    ) -> Result<SavedTemplate> {
        let template = form.parse_recurring()?;
        let household = self.household(household_id)?;
        let old = editing
            .map(|id| RecurringService::get(self.backend(), household_id, kind, id))
            .transpose()?;
        let today = self.today()?;
        RecurringService::submit(
            self.backend(),
            &self.engine,
            household_id,
            &household,
            old.as_ref(),
            &template,
            kind,
            today,
        )
    }

    pub fn delete_recurring(
        &self,
        household_id: &HouseholdId,
        id: &TransactionId,
        kind: TransactionKind,
    ) -> Result<()> {
        RecurringService::delete(self.backend(), household_id, id, kind)
    }

    pub fn member_year(
        &self,
        household_id: &HouseholdId,
        member: &MemberId,
        year: i32,
    ) -> Result<SummaryTable<MonthRow>> {
        let household = self.household(household_id)?;
        SummaryService::member_year(self.calendar(), &household, member, year)
    }
}
