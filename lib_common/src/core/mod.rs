//! # Core Distribution Module
//!
//! - **`hub`**: the central broadcaster. It takes one rendered state payload
//!   and pushes it to every registered subscriber channel, isolating each
//!   subscriber from the others' failures.

/// The central broadcaster for distributing rendered state payloads.
pub mod hub;

pub use hub::BroadcastHub;
