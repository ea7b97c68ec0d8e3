// src/core/mod.rs — Chat turn state machine and domain types

pub mod controller;
pub mod types;

pub use controller::{ChatSession, RejectReason, SubmitOutcome, APOLOGY, GREETING};
