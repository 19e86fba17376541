//! Oja Marketplace Engine
//!
//! The engine contains the provider-agnostic core of the oja marketplace backend: the order
//! lifecycle, the fuzzy catalog resolver, agent assignment and the payment reconciliation flow.
//!
//! The library is divided into three main sections:
//! 1. Database management and control ([`mod@db`]). Currently, Sqlite is the only supported
//!    backend. You should never need to access the database directly. Instead, use the public API
//!    provided by the engine. The exception is the data types used in the database. These are
//!    defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@oja_api`]). This provides the public-facing functionality of
//!    the engine: order intake, status transitions, payment reconciliation and catalog
//!    resolution. Specific backends need to implement the traits in [`mod@traits`] in order to
//!    act as a backend for the oja server.
//! 3. The catalog matcher ([`mod@matching`]). A pure string-similarity cascade with no database
//!    dependencies, so it can be unit tested in isolation.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted
//! when certain actions occur within the engine, e.g. when an order is marked as paid, an
//! `OrderPaidEvent` is emitted. A simple actor framework is used so that you can hook into these
//! events and perform custom actions off the request path.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod matching;
mod oja_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits;
pub use db::traits::{
    CatalogError,
    CatalogManagement,
    MarketplaceDatabase,
    MarketplaceError,
    OrderManagement,
    PaymentOutcome,
};
pub use oja_api::{catalog_api::CatalogApi, catalog_objects, order_flow_api::OrderFlowApi, order_objects};
