//! Core domain types and logic.

pub mod trade;
pub mod validation;
pub mod filter;
pub mod analytics;
pub mod error;
