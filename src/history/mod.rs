// src/history/mod.rs — Local conversation history

pub mod store;

pub use store::HistoryStore;
