//! Orderflow - order payment confirmation and fulfillment tracking
//!
//! Customers create an order, pay for it through the processor's hosted
//! checkout, and the processor's webhook confirms the payment. This crate
//! verifies those webhooks, maps them back to orders, and applies each
//! confirmation exactly once. It also carries the client-side tracker that
//! reports payment state from the server rather than from the checkout widget.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod fulfillment;
pub mod handlers;
pub mod id;
pub mod middleware;
pub mod models;
pub mod payments;
pub mod reconcile;
pub mod tracker;
