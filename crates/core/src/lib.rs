pub mod alert;
pub mod config;
pub mod deployment;
pub mod error;
pub mod policy;
pub mod report;
pub mod state;
pub mod stats;

pub use alert::{evaluate, AlertDecision};
pub use config::Config;
pub use deployment::{Deployment, Target};
pub use error::*;
pub use policy::ActionableSlotsPolicy;
pub use report::format_digest;
pub use state::{SlotCounts, SlotState, StateSet, StateSpec};
pub use stats::{PeriodStatistics, RunStatistics, RunTotals, UNKNOWN_PERIOD};
