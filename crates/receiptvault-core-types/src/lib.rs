//! Core types shared across receiptvault facilities
//!
//! - **Schema constants**: canonical structured-logging field keys and event names
//! - **Actor reference**: the explicit "who did this" threaded through mutations

pub mod actor;
pub mod schema;

pub use actor::ActorRef;
