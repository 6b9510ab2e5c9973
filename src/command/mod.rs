//! Unit command layer
//!
//! Proposals from every in-core source are resolved to one per unit per
//! tick, committed to the controller, and executed into world mutations.

pub mod controller;
pub mod proposals;
pub mod types;

pub use controller::{CommandContext, CommandOutcome, Commit, EndReason, EndedCommand, UnitCommandController};
pub use proposals::{Proposal, ProposalBuffer, ProposalSource};
pub use types::{CommandIssuer, CommandKind, CommandPriority, CommandTarget, Order, UnitCommand};
