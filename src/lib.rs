//! condor: short iron condor entry/exit backtester.
//!
//! Hexagonal architecture: the simulation core in [`domain`], port traits in
//! [`ports`], concrete file-based implementations in [`adapters`].

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod ports;
