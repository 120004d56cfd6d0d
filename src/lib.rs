//! redblue — intake/outflow ratios of U.S. states split by election result.
//!
//! Hexagonal architecture: domain logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`], orchestration in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
