//! Notarization orchestrator
//!
//! Drives one document through storage and attestation, in that order.
//! The current [`Phase`] is published on a watch channel so observers can
//! follow along while the owner drives the flow:
//!
//! ```text
//! Idle ─store─▶ Storing ─ok─▶ Ready ─attest─▶ Attesting ─ok─▶ Confirming ─final─▶ Confirmed
//!                  │            ▲                 │                 │
//!                  └─err─▶ Failed ◀──unavailable──┤                 └─timeout/error─▶ Failed
//!                                   Ready ◀──declined/rejected──────┘ (from Attesting)
//! ```
//!
//! `reset` returns to `Idle` from anywhere. `resume` and `recheck` are the
//! user-driven ways back out of `Failed`; nothing is retried automatically.

mod notarizer;
mod phase;

pub use notarizer::{Notarizer, Submission};
pub use phase::{Actions, Failure, Phase};
