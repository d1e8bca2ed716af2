//! New-website wizard: the multi-step flow a customer walks through to
//! configure a website before submitting it for approval.
//!
//! Each stage fills one slot of the shared [`Selections`]; the
//! [`StageSequencer`] only lets the customer move forward once the active
//! stage's slot is filled, while stepping back is always allowed. A
//! [`WizardSession`] owns all of this state for one run, and the
//! [`WizardManager`] keeps the live sessions.

pub mod manager;
pub mod model;
pub mod routes;
pub mod session;
pub mod stage;
pub mod store;

pub use manager::{SessionHandle, Transition, WizardManager, spawn_prune_task};
pub use model::{
    CompleteSelections, ContentSource, Field, Plan, Selections, SelectionsUpdate, WebsiteType,
};
pub use routes::wizard_routes;
pub use session::{Confirmation, SessionStatus, WizardSession};
pub use stage::{Stage, StageIndicator, StageProgress, StageSequencer};
pub use store::SelectionsStore;
