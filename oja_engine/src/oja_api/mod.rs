//! The public API of the engine.
//!
//! [`order_flow_api::OrderFlowApi`] owns every write path: order intake, item mutation, status
//! transitions, payment reconciliation and agent assignment, publishing events after each
//! committed change. [`catalog_api::CatalogApi`] owns catalog resolution. Both are generic over
//! the backend traits so the server's endpoint tests can run against mocks.
pub mod catalog_api;
pub mod catalog_objects;
pub mod order_flow_api;
pub mod order_objects;
