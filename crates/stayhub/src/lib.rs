//! Booking lifecycle, review gating, and listing rating aggregation for the StayHub marketplace.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod telemetry;
