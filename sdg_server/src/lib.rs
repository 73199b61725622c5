//! # Stream donation gateway server
//! This crate hosts the HTTP side of the donation gateway. It is responsible for:
//! * Accepting donation requests from the donation page, and handing back a signed checkout form for the donor's
//!   chosen payment gateway.
//! * Receiving payment callbacks from ECPay and O'Pay, and acknowledging them in the `1|OK` / `0|ErrorMessage` format
//!   the gateways expect.
//! * Streaming confirmed donations to any connected overlay as server-sent events.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `POST /api/donations`, `GET /api/donations`: donation intake and the recent donations list.
//! * `GET /checkout/{id}`: the auto-submitting checkout form for a pending donation.
//! * `POST /api/payment/{ecpay,opay}/callback`: gateway payment callbacks.
//! * `GET /api/alerts/stream`, `POST /api/alerts/test`: the live alert stream, and a way to test it.
//! * `GET /api/settings`: the alert settings the overlay renders with.

pub mod cli;
pub mod config;
pub mod errors;

pub mod helpers;
pub mod payment_routes;
pub mod routes;
pub mod server;
pub mod sse;

#[cfg(test)]
mod endpoint_tests;
