//! API Route Handlers

pub mod command;
pub mod health;
pub mod metrics;
