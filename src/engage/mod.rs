//! Profile engagement
//!
//! # Flow
//!
//! 1. Open the profile on a fresh page
//! 2. Read the primary action label and classify it into an [`Affordance`]
//! 3. Run the click sequence for the requested action and detected state
//! 4. Report an [`EngagementOutcome`]; failures are outcomes, not panics

mod affordance;
mod machine;
mod outcome;

pub use affordance::{classify_affordance, Affordance};
pub use machine::EngagementStateMachine;
pub use outcome::{EngagementAction, EngagementError, EngagementOutcome};
