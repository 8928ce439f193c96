pub mod household_manager;
pub mod services;
pub mod time;

pub use household_manager::HouseholdManager;
pub use time::{Clock, FixedClock, SystemClock};
