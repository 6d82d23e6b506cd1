//! Shared types and domain logic for the retail POS backend
//!
//! This crate contains the domain vocabulary (currencies, movement types,
//! statuses) and the pure business calculations (transition classification,
//! stock valuation, shrinkage math, stock-take balancing) used by the
//! backend server. It performs no I/O.

pub mod models;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
pub use validation::*;
