//! Concurrency control for the shared toggle record.

pub mod clock;
pub mod controller;
pub mod error;
pub mod policy;
pub mod validate;

pub use crate::clock::{Clock, ManualClock, SystemClock};
pub use crate::controller::{ToggleController, WriteOutcome};
pub use crate::error::{Result, ToggleError, ValidationError};
pub use crate::policy::{ConcurrencyPolicy, Decision, Precondition, WriteIntent};
