//! # Database management and control.
//!
//! This module provides the interfaces that define the contracts of the engine database
//! *backends*.
//!
//! ## Traits
//! * [`MarketplaceDatabase`] defines the highest level of behaviour for backends supporting the
//!   engine: atomic order intake, item mutation with totals recomputation, guarded status
//!   transitions, payment reconciliation and agent assignment.
//! * [`OrderManagement`] provides read-side queries over orders, items, status history, earnings
//!   and sessions.
//! * [`CatalogManagement`] provides read-side queries over markets, catalog entries and their
//!   priced variants.
mod catalog_management;
mod data_objects;
mod marketplace_database;
mod order_management;

pub use catalog_management::{CatalogError, CatalogManagement};
pub use data_objects::PaymentOutcome;
pub use marketplace_database::{MarketplaceDatabase, MarketplaceError};
pub use order_management::OrderManagement;
