//! Core domain types and logic.

pub mod record;
pub mod affiliation;
pub mod ratio;
pub mod deviation;
pub mod config_validation;
pub mod error;
