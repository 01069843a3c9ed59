//! CLI command implementations.

pub mod common;
pub mod exact;
pub mod evolve;
pub mod mhets;
pub mod qmetts;
