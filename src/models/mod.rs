//! Domain models for a retrospective session.
//!
//! # Core Concepts
//!
//! - [`Session`]: The root aggregate for one retrospective run. It tracks the
//!   current [`RetroStep`], the collected cards, the vote tally and the
//!   resulting action items.
//! - [`Card`]: A note submitted under a fixed [`CardCategory`]
//!   (good / bad / change). Cards gain a topic only through a bulk grouping.
//! - [`TopicGroup`]: A derived view grouping cards by topic. Never stored.
//! - [`ActionItem`]: A follow-up tied to a topic. The last-retro step shows a
//!   static seed of prior items that sessions never modify.

mod action_item;
mod card;
mod session;
mod step;

pub use action_item::*;
pub use card::*;
pub use session::*;
pub use step::*;
