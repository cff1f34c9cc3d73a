//! Command implementations for the Apex CLI

pub mod license;
