// src/history/mod.rs
pub mod runs;

pub use runs::RunHistory;
