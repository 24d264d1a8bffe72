//! Framework-agnostic case and billing logic.
//!
//! Every operation takes an [`AppContext`] and the authenticated [`Actor`];
//! the request layer that produces them lives outside this crate.

pub mod actor;
pub mod analysis;
pub mod billing;
pub mod case;
pub mod clock;
pub mod context;
pub mod numbering;
pub mod pagination;

pub use actor::Actor;
pub use context::AppContext;
pub use pagination::{Page, PageRequest};
