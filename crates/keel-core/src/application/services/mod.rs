//! Application services - orchestrate use cases.
//!
//! The front controller turns a raw request path into a response by
//! coordinating routing, controller lookup and dispatch.

pub mod front_controller;

pub use front_controller::{Application, ApplicationBuilder, DispatchOutcome, RoutePlan};
