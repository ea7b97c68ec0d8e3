// src/lib.rs — Library root for counselbot

pub mod backend;
pub mod cli;
pub mod core;
pub mod history;
pub mod infra;
