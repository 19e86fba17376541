//! # Oja server
//! This module hosts the HTTP front-end for the oja marketplace backend. It is responsible for:
//! Receiving customer orders over REST and resolving their free-text cart lines.
//! Listening for incoming webhook notifications from Paystack and reconciling payments.
//! Driving the agent-assignment sweep and the customer notification relay.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/...`: The order, catalog and payment REST surface.
//! * `/paystack/webhook`: The webhook route for receiving charge events from Paystack.

pub mod assignment_worker;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod paystack_routes;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
